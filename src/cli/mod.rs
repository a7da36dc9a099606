//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Args, Parser};
use std::path::{Path, PathBuf};

use commands::Commands;
use output::OutputConfig;

use crate::core::manifest::normalize_path;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    " built ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")"
);

/// Ripple - build, lint and test only what changed
///
/// Finds the workspace packages affected by uncommitted changes and runs
/// each configured stage against them in parallel.
#[derive(Parser, Debug)]
#[command(name = "ripple")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Workspace root (defaults to the current directory)
    #[arg(short = 'C', long = "cwd", global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Command-line overrides for `ripple.toml`
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Configuration file (defaults to ripple.toml in the workspace root)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Baseline revision to diff against
    #[arg(long, global = true, env = "RIPPLE_BASE")]
    pub base: Option<String>,

    /// Only consider changes under this path
    #[arg(long, global = true, env = "RIPPLE_FILTER", value_name = "PATH")]
    pub filter: Option<String>,

    /// Leave changed packages out and run only their consumers
    #[arg(long, global = true)]
    pub only_consumers: bool,

    /// Stage to run, as `command` or `command:flags` (repeatable, replaces configured stages)
    #[arg(long = "stage", global = true, value_name = "STAGE")]
    pub stages: Vec<String>,

    /// Seconds before an unresponsive script is treated as failed
    #[arg(long, global = true, env = "RIPPLE_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of scripts running at once
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    /// Package manager program
    #[arg(long, global = true, env = "RIPPLE_PACKAGE_MANAGER", value_name = "PROGRAM")]
    pub package_manager: Option<String>,
}

impl Cli {
    /// Output settings requested on the command line
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::new(self.quiet, self.json, self.verbose)
    }

    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let output = self.output_config();
        let workspace_root = resolve_workspace_root(self.cwd.as_deref())?;
        let command = self.command.unwrap_or_default();
        command.run(&workspace_root, &self.overrides, output).await
    }
}

/// Absolute, normalized workspace root for an optional `--cwd`
fn resolve_workspace_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    Ok(match cwd {
        Some(dir) => normalize_path(&current.join(dir)),
        None => current,
    })
}
