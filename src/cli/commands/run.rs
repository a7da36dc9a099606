//! CLI command for running stages against affected packages
//!
//! Implements the `ripple run` command (also the default).

use std::cell::RefCell;

use anyhow::{bail, Result};
use indicatif::ProgressBar;

use super::WorkspacePipeline;
use crate::cli::output::OutputConfig;
use crate::core::pipeline::PipelineEvent;
use crate::core::report::{RunOutcome, RunReport};

/// Execute the run command
pub async fn execute(pipeline: &WorkspacePipeline, output: OutputConfig) -> Result<()> {
    let stage_bar: RefCell<Option<ProgressBar>> = RefCell::new(None);
    let spinner = output.spinner("Resolving affected packages...");

    let outcome = pipeline
        .run(|event| match event {
            PipelineEvent::StageStarted { stage, modules } => {
                spinner.finish_and_clear();
                output.info(&format!("Running {} on:", stage.command));
                for module in modules {
                    output.plain(&format!("  {}", module.name));
                }
                *stage_bar.borrow_mut() = Some(output.stage_bar(&stage.command, modules.len() as u64));
            }
            PipelineEvent::ModuleFinished(result) => {
                if let Some(bar) = stage_bar.borrow().as_ref() {
                    bar.set_message(result.module.clone());
                    bar.inc(1);
                }
            }
            PipelineEvent::StageFinished(summary) => {
                if let Some(bar) = stage_bar.borrow_mut().take() {
                    bar.finish_and_clear();
                }
                if summary.failed.is_empty() {
                    output.success(&format!(
                        "{} passed for {} modules",
                        summary.command,
                        summary.succeeded.len()
                    ));
                } else {
                    output.warning(&format!(
                        "{} failed for {} modules",
                        summary.command,
                        summary.failed.len()
                    ));
                }
            }
            PipelineEvent::StageSkipped(stage) => {
                output.warning(&format!("Skipping {}: no modules left to run", stage.command));
            }
        })
        .await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    if output.json {
        output.json(&outcome)?;
    }

    match outcome {
        RunOutcome::NoChanges => {
            output.warning("No changes recorded");
            Ok(())
        }
        RunOutcome::Completed(report) => summarize(&report, output),
    }
}

/// Print the final summary and turn failures into an error
fn summarize(report: &RunReport, output: OutputConfig) -> Result<()> {
    if report.modules.is_empty() {
        output.info("No affected modules, nothing to run");
        return Ok(());
    }

    if report.is_success() {
        output.success("All commands completed successfully");
        return Ok(());
    }

    output.error("Errors occurred while executing the following commands:");
    for failure in report.failures() {
        output.plain(&failure.to_string());
    }
    bail!("Errors occurred in: {}", report.failed_modules().join(", "))
}
