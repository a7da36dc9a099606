//! Ripple - build, lint and test only what changed
//!
//! Entry point for the ripple command-line application.

use std::process::ExitCode;

use clap::Parser;

use ripple::cli::output::display_error;
use ripple::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let output_config = cli.output_config();

    // RUST_LOG wins over -v/-q
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(output_config.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Return instead of exiting: runtime shutdown kills running scripts
    let result = tokio::select! {
        result = cli.run() => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow::anyhow!("Interrupted")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display_error(&e);
            ExitCode::FAILURE
        }
    }
}
