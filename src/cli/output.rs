//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! colored output, and formatted messages to the user.

use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

/// How the user asked to see output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Machine-readable JSON on stdout
    pub json: bool,
    /// Verbosity level (0 = default, 1 = info, 2+ = debug)
    pub verbose: u8,
}

impl OutputConfig {
    /// Create an output configuration from CLI flags
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Whether human-readable messages should be printed
    pub fn is_human(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Tracing filter directive matching the requested verbosity
    pub fn log_directive(&self) -> String {
        let level = if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                _ => "debug",
            }
        };
        format!("ripple={level}")
    }

    /// Create a spinner, hidden unless output is human-readable
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.is_human() {
            create_spinner(message)
        } else {
            ProgressBar::hidden()
        }
    }

    /// Create a stage progress bar, hidden unless output is human-readable
    pub fn stage_bar(&self, command: &str, total: u64) -> ProgressBar {
        if self.is_human() {
            create_stage_bar(command, total)
        } else {
            ProgressBar::hidden()
        }
    }

    /// Print a success line
    pub fn success(&self, message: &str) {
        if self.is_human() {
            println!("{}", paint(status::SUCCESS, message, Tone::Success));
        }
    }

    /// Print an informational line
    pub fn info(&self, message: &str) {
        if self.is_human() {
            println!("{}", paint(status::INFO, message, Tone::Info));
        }
    }

    /// Print a warning line
    pub fn warning(&self, message: &str) {
        if self.is_human() {
            eprintln!("{}", paint(status::WARNING, message, Tone::Warning));
        }
    }

    /// Print an error line (shown even in quiet mode)
    pub fn error(&self, message: &str) {
        if !self.json {
            eprintln!("{}", paint(status::ERROR, message, Tone::Error));
        }
    }

    /// Print raw text, unless quiet or JSON
    pub fn plain(&self, text: &str) {
        if self.is_human() {
            println!("{text}");
        }
    }

    /// Print a value as pretty JSON on stdout
    pub fn json<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Create a progress bar for one command stage
pub fn create_stage_bar(command: &str, total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} modules ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░"),
    );
    pb.set_prefix(command.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// Print a top-level error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{}", paint(status::ERROR, &error.to_string(), Tone::Error));
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Success,
    Info,
    Warning,
    Error,
}

fn paint(prefix: &str, message: &str, tone: Tone) -> String {
    let line = format!("{prefix} {message}");
    if !std::io::stderr().is_terminal() || std::env::var_os("NO_COLOR").is_some() {
        return line;
    }
    match tone {
        Tone::Success => line.green().to_string(),
        Tone::Info => line.blue().to_string(),
        Tone::Warning => line.yellow().to_string(),
        Tone::Error => line.red().to_string(),
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
