//! Infrastructure layer
//!
//! Handles I/O against the filesystem and external programs.

pub mod filesystem;
pub mod git;
pub mod npm;
pub mod process;
