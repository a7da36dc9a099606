//! Ripple - build, lint and test only what changed
//!
//! This library finds the workspace packages touched by uncommitted changes,
//! expands them to every package that consumes them, orders the result by
//! the workspace declaration and runs each command stage against the
//! survivors in parallel.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic, generic over its collaborators
//! - [`infra`] - Infrastructure layer (filesystem, git, package manager, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
