//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: a temporary
//! npm-style workspace and in-memory collaborators.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use ripple::core::collaborators::{ChangeSource, PackageManager, ScriptRunner, WorkerMessage, WorkerRequest};
use ripple::core::manifest::DependencyTree;
use ripple::error::{ManifestError, VcsError};
use serde_json::json;
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for test workspaces and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Write the workspace manifest declaring `members` in order
    pub fn create_workspace(&self, members: &[&str]) {
        let manifest = json!({
            "name": "@batman/monorepo",
            "version": "1.0.0",
            "private": true,
            "workspaces": members,
        });
        self.create_file("package.json", &manifest.to_string());
    }

    /// Write a package manifest at `dir`
    pub fn create_package(&self, dir: &str, name: &str) {
        let manifest = json!({ "name": name, "version": "1.0.0" });
        self.create_file(&format!("{dir}/package.json"), &manifest.to_string());
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// The sample monorepo used across tests: (directory, package name)
pub const SAMPLE_PACKAGES: &[(&str, &str)] = &[
    ("libs/framework/logger", "@batman/core-logger"),
    ("libs/federate-component", "@batman/federate-component"),
    ("apps/AppShell", "@batman/app-shell"),
    ("apps/MFE/Header", "@batman/header"),
    ("apps/MFE/Footer", "@batman/footer"),
];

/// Build the sample monorepo on disk
pub fn sample_workspace() -> TestProject {
    let project = TestProject::new();
    let members: Vec<&str> = SAMPLE_PACKAGES.iter().map(|(dir, _)| *dir).collect();
    project.create_workspace(&members);
    for (dir, name) in SAMPLE_PACKAGES {
        project.create_package(dir, name);
        project.create_file(&format!("{dir}/src/index.ts"), "export {};\n");
    }
    project
}

/// Change source returning a canned diff
pub struct FakeChangeSource {
    answer: Result<String, String>,
}

impl FakeChangeSource {
    /// Report `files` as changed
    pub fn changed(files: &[&str]) -> Self {
        Self {
            answer: Ok(files.join("\n")),
        }
    }

    /// Fail as if the diff had failed with `error`
    pub fn failing(error: &str) -> Self {
        Self {
            answer: Err(error.to_string()),
        }
    }
}

impl ChangeSource for FakeChangeSource {
    async fn changed_files(&self) -> Result<String, VcsError> {
        self.answer.clone().map_err(|error| VcsError::DiffFailed {
            base: "HEAD".to_string(),
            error,
        })
    }
}

/// In-memory dependency graph answering `list` queries the way npm does:
/// every queried package plus every package depending on it. Packages
/// outside `SAMPLE_PACKAGES` are unknown and never listed.
pub struct FakePackageManager {
    /// Package name to directory relative to the workspace root
    locations: BTreeMap<String, String>,
    /// Package name to the packages that depend on it
    consumers: BTreeMap<String, Vec<String>>,
    /// Packages listed without a resolved location
    unresolved: HashSet<String>,
    /// Every query received
    pub queries: Mutex<Vec<Vec<String>>>,
}

impl FakePackageManager {
    /// Graph over `SAMPLE_PACKAGES` with no dependencies
    pub fn sample() -> Self {
        Self {
            locations: SAMPLE_PACKAGES
                .iter()
                .map(|(dir, name)| ((*name).to_string(), (*dir).to_string()))
                .collect(),
            consumers: BTreeMap::new(),
            unresolved: HashSet::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Declare that `consumer` depends on `package`
    #[must_use]
    pub fn with_consumer(mut self, package: &str, consumer: &str) -> Self {
        self.consumers
            .entry(package.to_string())
            .or_default()
            .push(consumer.to_string());
        self
    }

    /// Forget where `package` lives, as if npm could not resolve it
    #[must_use]
    pub fn without_location(mut self, package: &str) -> Self {
        self.unresolved.insert(package.to_string());
        self
    }
}

impl PackageManager for FakePackageManager {
    async fn list(&self, names: &[String]) -> Result<DependencyTree, ManifestError> {
        self.queries.lock().unwrap().push(names.to_vec());

        let mut dependencies = serde_json::Map::new();
        for name in names {
            let related = std::iter::once(name).chain(self.consumers.get(name).into_iter().flatten());
            for package in related {
                let Some(dir) = self.locations.get(package) else {
                    continue;
                };
                let node = if self.unresolved.contains(package) {
                    json!({ "version": "1.0.0" })
                } else {
                    json!({ "version": "1.0.0", "resolved": format!("file:../../{dir}") })
                };
                dependencies.insert(package.clone(), node);
            }
        }

        let tree = json!({ "name": "@batman/monorepo", "dependencies": dependencies });
        Ok(DependencyTree::from_json(&tree.to_string()).unwrap())
    }
}

/// Script runner that fails chosen (module, command) pairs and records calls
#[derive(Default)]
pub struct FakeScriptRunner {
    failing: HashSet<(String, String)>,
    /// Every request received
    pub requests: Mutex<Vec<WorkerRequest>>,
}

impl FakeScriptRunner {
    /// Make `module` fail `command`
    #[must_use]
    pub fn failing(mut self, module: &str, command: &str) -> Self {
        self.failing.insert((module.to_string(), command.to_string()));
        self
    }
}

impl ScriptRunner for FakeScriptRunner {
    async fn run(&self, request: WorkerRequest) -> WorkerMessage {
        self.requests.lock().unwrap().push(request.clone());
        let key = (request.module().to_string(), request.command().to_string());
        if self.failing.contains(&key) {
            WorkerMessage::Error {
                message: format!("{}: {} exited with code 1\n", key.0, key.1),
            }
        } else {
            WorkerMessage::Success {
                message: format!("{} {} ok\n", key.0, key.1),
            }
        }
    }
}

/// Make `project` a git repository with everything committed
pub fn commit_all(project: &TestProject) {
    let repo = git2::Repository::open(project.path())
        .or_else(|_| git2::Repository::init(project.path()))
        .expect("Failed to init repository");
    let mut index = repo.index().expect("Failed to open index");
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .expect("Failed to stage files");
    index.write().expect("Failed to write index");
    let tree = repo
        .find_tree(index.write_tree().expect("Failed to write tree"))
        .expect("Failed to find tree");
    let sig = git2::Signature::now("Test", "test@example.com").expect("Failed to create signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "Commit", &tree, &parents)
        .expect("Failed to commit");
}
