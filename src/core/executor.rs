//! Staged execution
//!
//! Runs one command stage against every affected module at once. Each module
//! gets its own worker task and its own reply channel; the stage finishes
//! only once every worker has reported.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;

use crate::core::collaborators::{ScriptRunner, WorkerMessage, WorkerRequest};
use crate::core::order::OrderedModule;
use crate::error::ConfigError;

/// One script applied to every surviving module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStage {
    /// Script name (e.g. `build`)
    pub command: String,
    /// Extra arguments, whitespace separated
    #[serde(default)]
    pub flags: String,
}

impl CommandStage {
    /// Create a new stage
    pub fn new(command: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            flags: flags.into(),
        }
    }

    /// Parse `command` or `command:flags`
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let (command, flags) = spec.split_once(':').unwrap_or((spec, ""));
        let command = command.trim();
        if command.is_empty() {
            return Err(ConfigError::InvalidStage {
                spec: spec.to_string(),
            });
        }
        Ok(Self::new(command, flags.trim()))
    }
}

/// Outcome of one module in one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// The script completed
    Success { message: String },
    /// The script failed or its worker faulted
    Failure { message: String },
}

impl Outcome {
    /// Captured output or error text
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message } | Self::Failure { message } => message,
        }
    }
}

/// Result of running one stage against one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Package name
    pub module: String,
    /// Script name
    pub command: String,
    /// What happened
    pub outcome: Outcome,
    /// Wall time from dispatch to terminal report
    pub duration: Duration,
}

impl ExecutionResult {
    /// Whether the module failed this stage
    pub fn has_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failure { .. })
    }

    /// Captured output or error text
    pub fn message(&self) -> &str {
        self.outcome.message()
    }
}

/// Per-stage execution limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageOptions {
    /// Treat a worker that has not reported after this long as faulted
    pub timeout: Option<Duration>,
    /// Cap on concurrently running workers (unbounded when `None`)
    pub max_parallel: Option<usize>,
}

/// A dispatched worker and the channel it reports on
struct Worker {
    handle: JoinHandle<()>,
    reply: oneshot::Receiver<WorkerMessage>,
}

/// Run `stage` against every module and wait for all of them.
///
/// Results come back in `modules` order. `on_result` is called once per
/// module as soon as that module reaches a terminal outcome.
pub async fn run_stage<R, F>(
    modules: &[OrderedModule],
    stage: &CommandStage,
    runner: &Arc<R>,
    options: &StageOptions,
    on_result: F,
) -> Vec<ExecutionResult>
where
    R: ScriptRunner,
    F: Fn(&ExecutionResult),
{
    let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
    tracing::info!("Running {} on: {}", stage.command, names.join(", "));

    let limiter = options.max_parallel.map(|n| Semaphore::new(n.max(1)));
    let limiter = limiter.as_ref();
    let on_result = &on_result;

    let workers = modules.iter().map(|module| async move {
        let _permit = match limiter {
            Some(semaphore) => semaphore.acquire().await.ok(),
            None => None,
        };

        let started = Instant::now();
        let request = WorkerRequest::start(&stage.command, &stage.flags, &module.name);
        let worker = dispatch(runner, request);
        let reply = await_reply(worker, options.timeout).await;

        let result = to_result(module, stage, reply, started.elapsed());
        on_result(&result);
        result
    });

    join_all(workers).await
}

/// Spawn a worker task that reports on its own channel
fn dispatch<R: ScriptRunner>(runner: &Arc<R>, request: WorkerRequest) -> Worker {
    let (tx, reply) = oneshot::channel();
    let runner = Arc::clone(runner);

    let handle = tokio::spawn(async move {
        let message = runner.run(request).await;
        // The coordinator may already have given up on this worker
        let _ = tx.send(message);
    });

    Worker { handle, reply }
}

/// Wait for the worker's single message, turning faults into errors
async fn await_reply(worker: Worker, timeout: Option<Duration>) -> Result<WorkerMessage, String> {
    let Worker { handle, reply } = worker;

    let received = match timeout {
        Some(limit) => {
            if let Ok(received) = tokio::time::timeout(limit, reply).await {
                received
            } else {
                handle.abort();
                return Err(format!("no response within {}s", limit.as_secs_f64()));
            }
        }
        None => reply.await,
    };

    match received {
        Ok(message) => Ok(message),
        Err(_) => {
            handle.abort();
            match handle.await {
                Err(e) if e.is_panic() => Err("worker panicked before reporting".to_string()),
                _ => Err("worker exited without reporting".to_string()),
            }
        }
    }
}

fn to_result(
    module: &OrderedModule,
    stage: &CommandStage,
    reply: Result<WorkerMessage, String>,
    duration: Duration,
) -> ExecutionResult {
    let outcome = match reply {
        Ok(WorkerMessage::Success { message }) => {
            tracing::info!("{} - {} complete ({duration:.2?})", module.name, stage.command);
            Outcome::Success { message }
        }
        Ok(WorkerMessage::Warning { message }) => {
            tracing::warn!("{} - {}: {message}", module.name, stage.command);
            Outcome::Success { message }
        }
        Ok(WorkerMessage::Error { message }) => {
            tracing::error!("{} - {} failed", module.name, stage.command);
            Outcome::Failure { message }
        }
        Err(fault) => {
            tracing::error!("{} - {} faulted: {fault}", module.name, stage.command);
            Outcome::Failure {
                message: format!("{} error: {fault}", module.name),
            }
        }
    };

    ExecutionResult {
        module: module.name.clone(),
        command: stage.command.clone(),
        outcome,
        duration,
    }
}
