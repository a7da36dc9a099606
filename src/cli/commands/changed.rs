//! CLI command for listing changed package roots
//!
//! Implements the `ripple changed` command. Only git and the filesystem are
//! consulted, so no package manager is needed.

use std::path::Path;

use anyhow::Result;

use crate::cli::output::OutputConfig;
use crate::core::config::RunConfig;
use crate::core::pipeline::changed_roots;
use crate::infra::git::GitChangeSource;

/// Execute the changed command
pub async fn execute(workspace_root: &Path, config: &RunConfig, output: OutputConfig) -> Result<()> {
    let source = GitChangeSource::new(workspace_root, config.base())
        .with_path_filter(config.changes.path_filter.clone());

    let Some(changes) = changed_roots(&source, workspace_root, config.manifest_file()).await? else {
        if output.json {
            output.json(&Vec::<String>::new())?;
        }
        output.warning("No changes recorded");
        return Ok(());
    };

    if output.json {
        return output.json(&changes);
    }

    output.info(&format!(
        "{} changed files in {} packages:",
        changes.files.len(),
        changes.roots.len()
    ));
    for root in &changes.roots {
        let shown = root.strip_prefix(workspace_root).unwrap_or(root);
        output.plain(&format!("  {}", shown.display()));
    }
    Ok(())
}
