//! External collaborator interfaces
//!
//! The orchestrator talks to version control, the package manager and the
//! script runner only through these traits. Real implementations live in
//! [`crate::infra`]; tests substitute in-memory fakes.

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::core::manifest::DependencyTree;
use crate::error::{ManifestError, VcsError};

/// Source of changed files relative to a baseline
pub trait ChangeSource: Send + Sync {
    /// Newline-separated changed paths, relative to the workspace root
    fn changed_files(&self) -> impl Future<Output = Result<String, VcsError>> + Send;
}

/// Package manager queries
pub trait PackageManager: Send + Sync {
    /// Dependency tree listing every top-level package whose installed tree
    /// contains any of `names`
    fn list(
        &self,
        names: &[String],
    ) -> impl Future<Output = Result<DependencyTree, ManifestError>> + Send;
}

/// Runs one script for one package in its own execution context
pub trait ScriptRunner: Send + Sync + 'static {
    /// Execute `request` and report exactly one terminal message
    fn run(&self, request: WorkerRequest) -> impl Future<Output = WorkerMessage> + Send;
}

/// Coordinator to worker message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "lowercase")]
pub enum WorkerRequest {
    /// Start running `command` for `module`
    Start {
        /// Script name
        command: String,
        /// Extra arguments, whitespace separated
        flags: String,
        /// Package name
        module: String,
    },
}

impl WorkerRequest {
    /// Build a start request
    pub fn start(command: &str, flags: &str, module: &str) -> Self {
        Self::Start {
            command: command.to_string(),
            flags: flags.to_string(),
            module: module.to_string(),
        }
    }

    /// Script name
    pub fn command(&self) -> &str {
        match self {
            Self::Start { command, .. } => command,
        }
    }

    /// Extra arguments
    pub fn flags(&self) -> &str {
        match self {
            Self::Start { flags, .. } => flags,
        }
    }

    /// Package name
    pub fn module(&self) -> &str {
        match self {
            Self::Start { module, .. } => module,
        }
    }
}

/// Worker to coordinator message, exactly one per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerMessage {
    /// Script completed with output
    Success { message: String },
    /// Script completed but produced no output
    Warning { message: String },
    /// Script failed or could not run
    Error { message: String },
}
