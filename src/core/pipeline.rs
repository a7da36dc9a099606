//! Run orchestration
//!
//! Drives change resolution, consumer expansion, ordering and the staged
//! execution loop. Stage N+1 starts only after every module of stage N has
//! reported, and only the modules that passed stage N take part in it.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::changes::{parse_changed_files, resolve_package_roots};
use crate::core::collaborators::{ChangeSource, PackageManager, ScriptRunner};
use crate::core::config::RunConfig;
use crate::core::consumers::{expand_consumers, ConsumerReport};
use crate::core::executor::{run_stage, CommandStage, ExecutionResult};
use crate::core::manifest::PackageManifest;
use crate::core::order::{order_modules, OrderedModule};
use crate::core::report::{aggregate, RunOutcome, RunReport, StageSummary};
use crate::error::RippleError;

/// Changed files and the package roots that own them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedRoots {
    /// Changed paths relative to the workspace root
    pub files: Vec<PathBuf>,
    /// Owning package roots
    pub roots: Vec<PathBuf>,
}

/// Everything known about the affected packages before any stage runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedSet {
    /// Changed files and their roots
    pub changes: ChangedRoots,
    /// Consumer expansion result
    pub consumers: ConsumerReport,
    /// Modules in execution order
    pub modules: Vec<OrderedModule>,
}

/// Progress notifications emitted while stages run
#[derive(Debug, Clone, Copy)]
pub enum PipelineEvent<'a> {
    /// A stage is about to dispatch `modules`
    StageStarted {
        stage: &'a CommandStage,
        modules: &'a [OrderedModule],
    },
    /// One module reached a terminal outcome
    ModuleFinished(&'a ExecutionResult),
    /// A stage passed its barrier
    StageFinished(&'a StageSummary),
    /// A stage was skipped because no module survived
    StageSkipped(&'a CommandStage),
}

/// Query `source` and resolve the changed files to package roots.
///
/// Returns `None` when nothing changed.
pub async fn changed_roots<S: ChangeSource>(
    source: &S,
    workspace_root: &Path,
    manifest_file: &str,
) -> Result<Option<ChangedRoots>, RippleError> {
    let raw = source.changed_files().await?;
    let files = parse_changed_files(&raw);
    if files.is_empty() {
        tracing::info!("No changes recorded");
        return Ok(None);
    }
    tracing::info!("Files changed resolved: {}", files.len());

    let roots = resolve_package_roots(workspace_root, &files, manifest_file)?;
    Ok(Some(ChangedRoots { files, roots }))
}

/// The orchestrator for one invocation
pub struct Pipeline<S, P, R> {
    workspace_root: PathBuf,
    config: RunConfig,
    change_source: S,
    package_manager: P,
    runner: Arc<R>,
}

impl<S, P, R> Pipeline<S, P, R>
where
    S: ChangeSource,
    P: PackageManager,
    R: ScriptRunner,
{
    /// Create a pipeline over the workspace at `workspace_root`
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        config: RunConfig,
        change_source: S,
        package_manager: P,
        runner: R,
    ) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            config,
            change_source,
            package_manager,
            runner: Arc::new(runner),
        }
    }

    /// Package manager queried for consumers and locations
    pub fn package_manager(&self) -> &P {
        &self.package_manager
    }

    /// Script runner shared with the stage workers
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Resolve, expand and order the affected packages.
    ///
    /// Returns `None` when nothing changed.
    pub async fn affected(&self) -> Result<Option<AffectedSet>, RippleError> {
        let manifest_file = self.config.manifest_file();
        let Some(changes) =
            changed_roots(&self.change_source, &self.workspace_root, manifest_file).await?
        else {
            return Ok(None);
        };

        let consumers = expand_consumers(
            &changes.roots,
            &self.package_manager,
            &self.config.consumer_options(),
        )
        .await?;

        let workspace_manifest = PackageManifest::load(&self.workspace_root.join(manifest_file))?;
        let declared = workspace_manifest.workspace_paths(&self.workspace_root);
        let modules = order_modules(
            &consumers.consumers,
            &self.package_manager,
            &self.workspace_root,
            &declared,
        )
        .await?;

        tracing::info!("{} affected modules", modules.len());
        Ok(Some(AffectedSet {
            changes,
            consumers,
            modules,
        }))
    }

    /// Run every configured stage against the affected packages
    pub async fn run<F>(&self, on_event: F) -> Result<RunOutcome, RippleError>
    where
        F: Fn(PipelineEvent<'_>),
    {
        let Some(affected) = self.affected().await? else {
            return Ok(RunOutcome::NoChanges);
        };

        let mut modules = affected.modules.clone();
        let mut report = RunReport::new(affected.modules, affected.consumers.without_consumers);
        if modules.is_empty() {
            tracing::info!("No modules affected, nothing to run");
            return Ok(RunOutcome::Completed(report));
        }

        let options = self.config.stage_options();
        for stage in self.config.stages() {
            if modules.is_empty() {
                tracing::info!("Skipping {}: no modules left to run", stage.command);
                on_event(PipelineEvent::StageSkipped(&stage));
                report.skipped_stages.push(stage.command.clone());
                continue;
            }

            on_event(PipelineEvent::StageStarted {
                stage: &stage,
                modules: &modules,
            });
            let results = run_stage(&modules, &stage, &self.runner, &options, |result| {
                on_event(PipelineEvent::ModuleFinished(result));
            })
            .await;

            let summary = aggregate(&stage.command, &results, &modules);
            on_event(PipelineEvent::StageFinished(&summary));
            if !summary.failed.is_empty() {
                tracing::warn!(
                    "{} of {} modules failed {}",
                    summary.failed.len(),
                    modules.len(),
                    stage.command
                );
            }

            modules.clone_from(&summary.succeeded);
            report.record(summary);
        }

        Ok(RunOutcome::Completed(report))
    }
}
