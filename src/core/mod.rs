//! Core business logic module
//!
//! This module contains all business logic for ripple. External programs
//! are reached only through the traits in [`collaborators`]; their real
//! implementations live in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`changes`] - Changed files to owning package roots
//! - [`collaborators`] - Change source, package manager and script runner seams
//! - [`config`] - `ripple.toml` handling
//! - [`consumers`] - Consumer graph expansion
//! - [`executor`] - Parallel execution of one command stage
//! - [`manifest`] - `package.json` and dependency tree parsing
//! - [`order`] - Location resolution and workspace ordering
//! - [`pipeline`] - Orchestration of a whole run
//! - [`report`] - Result aggregation and failure reports

pub mod changes;
pub mod collaborators;
pub mod config;
pub mod consumers;
pub mod executor;
pub mod manifest;
pub mod order;
pub mod pipeline;
pub mod report;
