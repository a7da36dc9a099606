//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod affected;
pub mod changed;
pub mod run;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::cli::output::OutputConfig;
use crate::cli::Overrides;
use crate::core::config::RunConfig;
use crate::core::executor::CommandStage;
use crate::core::pipeline::Pipeline;
use crate::infra::git::GitChangeSource;
use crate::infra::npm::NpmPackageManager;
use crate::infra::process::ProcessScriptRunner;

/// Available CLI commands
#[derive(Subcommand, Debug, Default)]
pub enum Commands {
    /// Run every stage against the affected packages (default)
    #[default]
    Run,

    /// List the affected packages in execution order without running anything
    Affected,

    /// List the package roots that own changed files
    Changed,
}

impl Commands {
    /// Execute the command
    pub async fn run(
        self,
        workspace_root: &Path,
        overrides: &Overrides,
        output: OutputConfig,
    ) -> Result<()> {
        let config = load_config(workspace_root, overrides)?;
        check_workspace(workspace_root, &config)?;

        match self {
            Self::Run => {
                check_package_manager(&config)?;
                run::execute(&build_pipeline(workspace_root, config), output).await
            }
            Self::Affected => {
                check_package_manager(&config)?;
                affected::execute(&build_pipeline(workspace_root, config), output).await
            }
            Self::Changed => changed::execute(workspace_root, &config, output).await,
        }
    }
}

/// Real collaborators wired into a pipeline
pub type WorkspacePipeline = Pipeline<GitChangeSource, NpmPackageManager, ProcessScriptRunner>;

/// Load `ripple.toml` and apply command-line overrides on top
pub fn load_config(workspace_root: &Path, overrides: &Overrides) -> Result<RunConfig> {
    let mut config = match &overrides.config {
        Some(path) => RunConfig::load_from_path(path),
        None => RunConfig::load(workspace_root),
    }
    .context("Failed to load configuration")?;

    if let Some(base) = &overrides.base {
        config.changes.base = Some(base.clone());
    }
    if let Some(filter) = &overrides.filter {
        config.changes.path_filter = Some(filter.clone());
    }
    if overrides.only_consumers {
        config.packages.only_consumers = Some(true);
    }
    if let Some(program) = &overrides.package_manager {
        config.packages.manager = Some(program.clone());
    }
    if let Some(timeout) = overrides.timeout {
        config.execution.timeout_secs = Some(timeout);
    }
    if let Some(jobs) = overrides.jobs {
        config.execution.max_parallel = Some(jobs);
    }
    if !overrides.stages.is_empty() {
        let stages = overrides
            .stages
            .iter()
            .map(|spec| CommandStage::parse(spec))
            .collect::<Result<Vec<_>, _>>()?;
        config.stages = Some(stages);
    }

    Ok(config)
}

/// Wire the git, npm and child-process collaborators into a pipeline
pub fn build_pipeline(workspace_root: &Path, config: RunConfig) -> WorkspacePipeline {
    let change_source = GitChangeSource::new(workspace_root, config.base())
        .with_path_filter(config.changes.path_filter.clone());
    let package_manager = NpmPackageManager::new(workspace_root, config.package_manager());
    let runner = ProcessScriptRunner::with_args(
        workspace_root,
        config.package_manager(),
        config.script_args(),
    );

    Pipeline::new(workspace_root, config, change_source, package_manager, runner)
}

/// Fail early when the workspace manifest is missing
fn check_workspace(workspace_root: &Path, config: &RunConfig) -> Result<PathBuf> {
    let manifest = workspace_root.join(config.manifest_file());
    if !manifest.is_file() {
        bail!(
            "No {} found in {}. Run ripple from the workspace root or pass --cwd.",
            config.manifest_file(),
            workspace_root.display()
        );
    }
    Ok(manifest)
}

/// Fail early when the package manager is not installed
fn check_package_manager(config: &RunConfig) -> Result<PathBuf> {
    which::which(config.package_manager()).with_context(|| {
        format!(
            "Package manager '{}' not found in PATH",
            config.package_manager()
        )
    })
}
