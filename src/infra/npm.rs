//! Package manager queries
//!
//! Answers dependency questions by running `<manager> list <names> --json`
//! in the workspace root.

use std::path::PathBuf;
use tokio::process::Command;

use crate::core::collaborators::PackageManager;
use crate::core::manifest::DependencyTree;
use crate::error::ManifestError;

/// Package manager backed by the npm CLI (or a compatible program)
#[derive(Debug, Clone)]
pub struct NpmPackageManager {
    /// Workspace root
    work_dir: PathBuf,
    /// Package manager program
    program: String,
}

impl NpmPackageManager {
    /// Create a package manager running `program` in `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>, program: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            program: program.into(),
        }
    }

    /// Arguments for a `list` query
    pub fn list_args(names: &[String]) -> Vec<String> {
        let mut args = Vec::with_capacity(names.len() + 2);
        args.push("list".to_string());
        args.extend(names.iter().cloned());
        args.push("--json".to_string());
        args
    }
}

impl PackageManager for NpmPackageManager {
    async fn list(&self, names: &[String]) -> Result<DependencyTree, ManifestError> {
        let args = Self::list_args(names);
        let command = format!("{} {}", self.program, args.join(" "));
        tracing::debug!("Running {command}");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.work_dir)
            .output()
            .await
            .map_err(|e| ManifestError::SpawnFailed {
                program: self.program.clone(),
                error: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_list_output(&command, output.status.success(), &stdout, &output.stderr)
    }
}

/// Interpret a `list --json` answer.
///
/// npm exits non-zero for tree problems (extraneous or invalid packages)
/// while still printing a usable document, so parseable stdout wins over the
/// exit status.
fn parse_list_output(
    command: &str,
    success: bool,
    stdout: &str,
    stderr: &[u8],
) -> Result<DependencyTree, ManifestError> {
    match DependencyTree::from_json(stdout) {
        Ok(tree) => {
            if !success {
                tracing::warn!("{command} exited unsuccessfully; using its output anyway");
            }
            Ok(tree)
        }
        Err(parse_error) => {
            let error = if success {
                parse_error.to_string()
            } else {
                String::from_utf8_lossy(stderr).trim().to_string()
            };
            Err(ManifestError::QueryFailed {
                command: command.to_string(),
                error,
            })
        }
    }
}
