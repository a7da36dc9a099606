//! Script execution in child processes
//!
//! Every request runs as its own OS process, so a crashing or hanging
//! script cannot disturb its siblings. On unix each child leads its own
//! process group, and dropping the run future before the script finishes
//! kills the whole group, grandchildren included.

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::defaults;
use crate::core::collaborators::{ScriptRunner, WorkerMessage, WorkerRequest};

/// Runs `<program> <args...> <flags...>` for each request
#[derive(Debug, Clone)]
pub struct ProcessScriptRunner {
    /// Working directory for every child
    work_dir: PathBuf,
    /// Program to run
    program: String,
    /// Argument template; `{command}` and `{module}` are substituted
    args: Vec<String>,
}

impl ProcessScriptRunner {
    /// Create a runner using the default `npm run` template
    pub fn new(work_dir: impl Into<PathBuf>, program: impl Into<String>) -> Self {
        Self::with_args(
            work_dir,
            program,
            defaults::SCRIPT_ARGS.iter().map(ToString::to_string).collect(),
        )
    }

    /// Create a runner with a custom argument template
    pub fn with_args(
        work_dir: impl Into<PathBuf>,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            program: program.into(),
            args,
        }
    }

    /// Full argument list for `request`
    pub fn command_args(&self, request: &WorkerRequest) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{command}", request.command())
                    .replace("{module}", request.module())
            })
            .chain(request.flags().split_whitespace().map(str::to_string))
            .collect()
    }
}

impl ScriptRunner for ProcessScriptRunner {
    async fn run(&self, request: WorkerRequest) -> WorkerMessage {
        let args = self.command_args(&request);
        tracing::debug!("Running {} {}", self.program, args.join(" "));

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                return WorkerMessage::Error {
                    message: format!("Failed to run '{}': {e}", self.program),
                }
            }
        };

        let mut group = ProcessGroup::new(child.id());
        let output = child.wait_with_output().await;
        group.release();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return WorkerMessage::Error {
                    message: format!("Failed waiting for '{}': {e}", self.program),
                }
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return WorkerMessage::Error {
                message: format!("{stdout}{stderr}"),
            };
        }

        if stdout.trim().is_empty() {
            WorkerMessage::Warning {
                message: format!("No output received from {}", request.command()),
            }
        } else {
            WorkerMessage::Success {
                message: stdout.into_owned(),
            }
        }
    }
}

/// Kills a child's process group unless released first
struct ProcessGroup {
    leader: Option<u32>,
}

impl ProcessGroup {
    fn new(leader: Option<u32>) -> Self {
        Self { leader }
    }

    /// The script finished on its own; leave the group alone
    fn release(&mut self) {
        self.leader = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        let Some(leader) = self.leader.take() else {
            return;
        };
        tracing::debug!("Killing process group {leader}");
        #[cfg(unix)]
        if let Ok(pgid) = i32::try_from(leader) {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
                tracing::debug!("Process group {leader} already gone: {e}");
            }
        }
    }
}
