//! CLI command for listing affected packages
//!
//! Implements the `ripple affected` command.

use anyhow::Result;

use super::WorkspacePipeline;
use crate::cli::output::OutputConfig;

/// Execute the affected command
pub async fn execute(pipeline: &WorkspacePipeline, output: OutputConfig) -> Result<()> {
    let spinner = output.spinner("Resolving affected packages...");
    let affected = pipeline.affected().await;
    spinner.finish_and_clear();

    let Some(affected) = affected? else {
        if output.json {
            output.json(&Vec::<String>::new())?;
        }
        output.warning("No changes recorded");
        return Ok(());
    };

    if output.json {
        return output.json(&affected);
    }

    if affected.modules.is_empty() {
        output.info("No affected modules");
        return Ok(());
    }

    output.info(&format!("{} affected modules, in execution order:", affected.modules.len()));
    for (index, module) in affected.modules.iter().enumerate() {
        output.plain(&format!(
            "{:>3}. {} ({})",
            index + 1,
            module.name,
            module.absolute_path.display()
        ));
    }
    Ok(())
}
