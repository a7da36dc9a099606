//! Result aggregation
//!
//! Splits a stage's results into surviving and failed modules and keeps the
//! failure reports of a whole run.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::core::executor::ExecutionResult;
use crate::core::order::OrderedModule;

const DIVIDER: &str = "-------------------------------------------";

/// One module's failure in one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Package name
    pub module: String,
    /// Script that failed
    pub command: String,
    /// Captured error output, verbatim
    pub message: String,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{DIVIDER}")?;
        writeln!(f, "{}: {} failed", self.module, self.command)?;
        writeln!(f, "{DIVIDER}")?;
        write!(f, "{}", self.message)?;
        if !self.message.ends_with('\n') {
            writeln!(f)?;
        }
        write!(f, "{DIVIDER}")
    }
}

/// Partitioned results of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    /// Script that ran
    pub command: String,
    /// Modules that passed, in their original order
    pub succeeded: Vec<OrderedModule>,
    /// Modules that failed
    pub failed: Vec<FailureReport>,
}

/// Partition `results` of `command` against the `modules` that entered the stage.
///
/// `succeeded` is `modules` with every failing module filtered out; it is
/// never re-sorted.
pub fn aggregate(
    command: &str,
    results: &[ExecutionResult],
    modules: &[OrderedModule],
) -> StageSummary {
    let failed: Vec<FailureReport> = results
        .iter()
        .filter(|result| result.has_error())
        .map(|result| FailureReport {
            module: result.module.clone(),
            command: result.command.clone(),
            message: result.message().to_string(),
        })
        .collect();

    let failed_names: HashSet<&str> = failed.iter().map(|f| f.module.as_str()).collect();
    let succeeded = modules
        .iter()
        .filter(|module| !failed_names.contains(module.name.as_str()))
        .cloned()
        .collect();

    StageSummary {
        command: command.to_string(),
        succeeded,
        failed,
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Modules that entered the first stage, in execution order
    pub modules: Vec<OrderedModule>,
    /// Changed packages that nothing consumes
    pub without_consumers: Vec<String>,
    /// One summary per stage that ran
    pub stages: Vec<StageSummary>,
    /// Stages skipped because no module survived
    pub skipped_stages: Vec<String>,
}

impl RunReport {
    /// Create a report for a run over `modules`
    pub fn new(modules: Vec<OrderedModule>, without_consumers: Vec<String>) -> Self {
        Self {
            modules,
            without_consumers,
            ..Self::default()
        }
    }

    /// Record a finished stage
    pub fn record(&mut self, summary: StageSummary) {
        self.stages.push(summary);
    }

    /// Every failure across all stages, in stage order
    pub fn failures(&self) -> impl Iterator<Item = &FailureReport> {
        self.stages.iter().flat_map(|stage| stage.failed.iter())
    }

    /// Names of modules that failed any stage, without duplicates
    pub fn failed_modules(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.failures()
            .map(|f| f.module.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Whether every stage passed for every module
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// No changed files; nothing to do
    NoChanges,
    /// Stages ran (possibly none, if nothing was affected)
    Completed(RunReport),
}
