//! Integration tests for the run pipeline
//!
//! Drives change resolution, consumer expansion, ordering and staged
//! execution against a real workspace on disk with in-memory collaborators.

mod common;

use std::cell::RefCell;

use common::{sample_workspace, FakeChangeSource, FakePackageManager, FakeScriptRunner, TestProject};
use ripple::core::config::RunConfig;
use ripple::core::executor::CommandStage;
use ripple::core::pipeline::{Pipeline, PipelineEvent};
use ripple::core::report::{RunOutcome, RunReport};
use ripple::error::{ResolverError, RippleError};

type TestPipeline = Pipeline<FakeChangeSource, FakePackageManager, FakeScriptRunner>;

fn logger_consumers() -> FakePackageManager {
    FakePackageManager::sample()
        .with_consumer("@batman/core-logger", "@batman/footer")
        .with_consumer("@batman/core-logger", "@batman/app-shell")
}

fn pipeline(
    project: &TestProject,
    config: RunConfig,
    changes: FakeChangeSource,
    packages: FakePackageManager,
    runner: FakeScriptRunner,
) -> TestPipeline {
    Pipeline::new(project.path(), config, changes, packages, runner)
}

fn completed(outcome: RunOutcome) -> RunReport {
    match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::NoChanges => panic!("expected a completed run"),
    }
}

fn names(report: &RunReport, stage: usize) -> Vec<String> {
    report.stages[stage]
        .succeeded
        .iter()
        .map(|m| m.name.clone())
        .collect()
}

#[tokio::test]
async fn test_logger_change_orders_consumers_by_workspace() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&["libs/framework/logger/src/index.ts"]),
        logger_consumers(),
        FakeScriptRunner::default(),
    );

    let affected = pipeline.affected().await.unwrap().unwrap();

    assert_eq!(affected.changes.roots, vec![project.path().join("libs/framework/logger")]);
    let ordered: Vec<&str> = affected.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(ordered, vec!["@batman/core-logger", "@batman/app-shell", "@batman/footer"]);
    assert_eq!(
        affected.modules[2].absolute_path,
        project.path().join("apps/MFE/Footer")
    );
}

#[tokio::test]
async fn test_ordering_uses_one_batched_query() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&["libs/framework/logger/src/index.ts"]),
        logger_consumers(),
        FakeScriptRunner::default(),
    );

    pipeline.affected().await.unwrap();

    // One consumer query for the changed root, one location query for all
    let queries = pipeline.package_manager().queries.lock().unwrap();
    assert_eq!(
        *queries,
        vec![
            vec!["@batman/core-logger".to_string()],
            vec![
                "@batman/app-shell".to_string(),
                "@batman/core-logger".to_string(),
                "@batman/footer".to_string()
            ],
        ]
    );
    assert!(pipeline.runner().requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_all_stages_pass() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&["libs/framework/logger/src/index.ts"]),
        logger_consumers(),
        FakeScriptRunner::default(),
    );

    let report = completed(pipeline.run(|_| {}).await.unwrap());

    assert!(report.is_success());
    let commands: Vec<&str> = report.stages.iter().map(|s| s.command.as_str()).collect();
    assert_eq!(commands, vec!["build", "lint", "test"]);
    for stage in 0..3 {
        assert_eq!(
            names(&report, stage),
            vec!["@batman/core-logger", "@batman/app-shell", "@batman/footer"]
        );
    }

    let requests = pipeline.runner().requests.lock().unwrap();
    assert_eq!(requests.len(), 9);
    assert!(requests
        .iter()
        .filter(|r| r.command() == "test")
        .all(|r| r.flags() == "-- --reporters=jest-standard-reporter"));
}

#[tokio::test]
async fn test_empty_diff_is_no_changes() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&[]),
        logger_consumers(),
        FakeScriptRunner::default(),
    );

    let outcome = pipeline.run(|_| {}).await.unwrap();

    assert_eq!(outcome, RunOutcome::NoChanges);
    assert!(pipeline.runner().requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_module_leaves_later_stages() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&["libs/framework/logger/src/index.ts"]),
        logger_consumers(),
        FakeScriptRunner::default().failing("@batman/footer", "lint"),
    );

    let report = completed(pipeline.run(|_| {}).await.unwrap());

    assert!(!report.is_success());
    assert_eq!(names(&report, 1), vec!["@batman/core-logger", "@batman/app-shell"]);
    assert_eq!(names(&report, 2), vec!["@batman/core-logger", "@batman/app-shell"]);
    assert_eq!(report.failed_modules(), vec!["@batman/footer"]);

    let failure = report.failures().next().unwrap();
    assert_eq!(failure.command, "lint");
    assert!(failure.to_string().contains("@batman/footer: lint exited with code 1"));

    let requests = pipeline.runner().requests.lock().unwrap();
    assert!(!requests
        .iter()
        .any(|r| r.module() == "@batman/footer" && r.command() == "test"));
}

#[tokio::test]
async fn test_stages_skipped_when_nothing_survives() {
    let project = sample_workspace();
    let runner = FakeScriptRunner::default()
        .failing("@batman/core-logger", "build")
        .failing("@batman/app-shell", "build")
        .failing("@batman/footer", "build");
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&["libs/framework/logger/src/index.ts"]),
        logger_consumers(),
        runner,
    );

    let skipped = RefCell::new(Vec::new());
    let report = completed(
        pipeline
            .run(|event| {
                if let PipelineEvent::StageSkipped(stage) = event {
                    skipped.borrow_mut().push(stage.command.clone());
                }
            })
            .await
            .unwrap(),
    );

    assert_eq!(report.stages.len(), 1);
    assert_eq!(report.skipped_stages, vec!["lint", "test"]);
    assert_eq!(*skipped.borrow(), vec!["lint", "test"]);
    assert_eq!(report.failed_modules().len(), 3);
}

#[tokio::test]
async fn test_runs_are_idempotent() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&[
            "libs/framework/logger/src/index.ts",
            "apps/MFE/Header/src/index.ts",
        ]),
        logger_consumers(),
        FakeScriptRunner::default().failing("@batman/header", "test"),
    );

    let first = pipeline.run(|_| {}).await.unwrap();
    let second = pipeline.run(|_| {}).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_only_consumers_leaves_changed_package_out() {
    let project = sample_workspace();
    let mut config = RunConfig::default();
    config.packages.only_consumers = Some(true);
    config.stages = Some(vec![CommandStage::new("build", "")]);
    let pipeline = pipeline(
        &project,
        config,
        FakeChangeSource::changed(&["libs/framework/logger/src/index.ts"]),
        logger_consumers(),
        FakeScriptRunner::default(),
    );

    let report = completed(pipeline.run(|_| {}).await.unwrap());

    assert_eq!(names(&report, 0), vec!["@batman/app-shell", "@batman/footer"]);
}

#[tokio::test]
async fn test_orphan_package_completes_without_stages() {
    let project = sample_workspace();
    project.create_package("libs/orphan", "@batman/orphan");
    let mut config = RunConfig::default();
    config.packages.only_consumers = Some(true);
    let pipeline = pipeline(
        &project,
        config,
        FakeChangeSource::changed(&["libs/orphan/index.js"]),
        logger_consumers(),
        FakeScriptRunner::default(),
    );

    let report = completed(pipeline.run(|_| {}).await.unwrap());

    assert!(report.modules.is_empty());
    assert!(report.stages.is_empty());
    assert_eq!(report.without_consumers, vec!["@batman/orphan"]);
    assert!(pipeline.runner().requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unresolved_module_is_fatal() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&["libs/framework/logger/src/index.ts"]),
        logger_consumers().without_location("@batman/footer"),
        FakeScriptRunner::default(),
    );

    let err = pipeline.run(|_| {}).await.unwrap_err();

    match err {
        RippleError::Resolver(ResolverError::Unresolved { module }) => {
            assert_eq!(module, "@batman/footer");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(pipeline.runner().requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_vcs_failure_is_fatal() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::failing("fatal: not a git repository"),
        logger_consumers(),
        FakeScriptRunner::default(),
    );

    let err = pipeline.run(|_| {}).await.unwrap_err();

    assert!(matches!(err, RippleError::Vcs(_)));
    assert!(err.to_string().contains("not a git repository"));
}

#[tokio::test]
async fn test_deleted_file_resolves_to_surviving_package() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&["apps/MFE/Footer/src/removed/old.ts"]),
        FakePackageManager::sample(),
        FakeScriptRunner::default(),
    );

    let affected = pipeline.affected().await.unwrap().unwrap();

    assert_eq!(affected.changes.roots, vec![project.path().join("apps/MFE/Footer")]);
    let ordered: Vec<&str> = affected.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(ordered, vec!["@batman/footer"]);
}

#[tokio::test]
async fn test_workspace_level_changes_do_not_hide_packages() {
    let project = sample_workspace();
    project.create_file("package-lock.json", "{}\n");
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&[
            "libs/framework/logger/src/index.ts",
            "package-lock.json",
            "package.json",
            "README.md",
        ]),
        logger_consumers(),
        FakeScriptRunner::default(),
    );

    let report = completed(pipeline.run(|_| {}).await.unwrap());

    assert!(report.is_success());
    let ordered: Vec<&str> = report.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(ordered, vec!["@batman/core-logger", "@batman/app-shell", "@batman/footer"]);
    assert!(!pipeline
        .package_manager()
        .queries
        .lock()
        .unwrap()
        .iter()
        .flatten()
        .any(|name| name == "@batman/monorepo"));
}

#[tokio::test]
async fn test_only_workspace_level_changes_run_nothing() {
    let project = sample_workspace();
    let pipeline = pipeline(
        &project,
        RunConfig::default(),
        FakeChangeSource::changed(&["package-lock.json"]),
        logger_consumers(),
        FakeScriptRunner::default(),
    );

    let report = completed(pipeline.run(|_| {}).await.unwrap());

    assert!(report.modules.is_empty());
    assert!(report.stages.is_empty());
    assert!(pipeline.runner().requests.lock().unwrap().is_empty());
}
