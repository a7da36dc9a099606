//! Project configuration
//!
//! Reads `ripple.toml` from the workspace root. Every setting is optional;
//! unset values fall back to [`crate::config::defaults`], and command-line
//! flags override both.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::defaults;
use crate::core::consumers::ConsumerOptions;
use crate::core::executor::{CommandStage, StageOptions};
use crate::error::ConfigError;

/// Run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Change detection settings
    #[serde(default)]
    pub changes: ChangesConfig,

    /// Package manager settings
    #[serde(default)]
    pub packages: PackagesConfig,

    /// Script execution settings
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Command stages, in execution order
    #[serde(default)]
    pub stages: Option<Vec<CommandStage>>,
}

/// Change detection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangesConfig {
    /// Baseline revision to diff against
    pub base: Option<String>,

    /// Only consider changes under this path
    pub path_filter: Option<String>,
}

/// Package manager settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PackagesConfig {
    /// Package manager program
    pub manager: Option<String>,

    /// Manifest file name
    pub manifest_file: Option<String>,

    /// Leave changed packages out of their own consumer set
    pub only_consumers: Option<bool>,
}

/// Script execution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    /// Script argument template (`{command}` and `{module}` are substituted)
    pub script_args: Option<Vec<String>>,

    /// Seconds before a silent worker is treated as faulted
    pub timeout_secs: Option<u64>,

    /// Cap on concurrently running scripts
    pub max_parallel: Option<usize>,
}

impl RunConfig {
    /// Load `ripple.toml` from `workspace_root`, or defaults if absent
    pub fn load(workspace_root: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path(&workspace_root.join(defaults::CONFIG_FILE))
    }

    /// Load configuration from a specific path, or defaults if absent
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Effective baseline revision
    pub fn base(&self) -> &str {
        self.changes.base.as_deref().unwrap_or(defaults::DEFAULT_BASE)
    }

    /// Effective package manager program
    pub fn package_manager(&self) -> &str {
        self.packages
            .manager
            .as_deref()
            .unwrap_or(defaults::PACKAGE_MANAGER)
    }

    /// Effective manifest file name
    pub fn manifest_file(&self) -> &str {
        self.packages
            .manifest_file
            .as_deref()
            .unwrap_or(defaults::MANIFEST_FILE)
    }

    /// Effective script argument template
    pub fn script_args(&self) -> Vec<String> {
        self.execution.script_args.clone().unwrap_or_else(|| {
            defaults::SCRIPT_ARGS
                .iter()
                .map(ToString::to_string)
                .collect()
        })
    }

    /// Effective command stages
    pub fn stages(&self) -> Vec<CommandStage> {
        self.stages.clone().unwrap_or_else(|| {
            defaults::DEFAULT_STAGES
                .iter()
                .map(|(command, flags)| CommandStage::new(*command, *flags))
                .collect()
        })
    }

    /// Options for consumer expansion
    pub fn consumer_options(&self) -> ConsumerOptions {
        ConsumerOptions {
            only_consumers: self.packages.only_consumers.unwrap_or(false),
            manifest_file: self.manifest_file().to_string(),
        }
    }

    /// Options for each stage
    pub fn stage_options(&self) -> StageOptions {
        StageOptions {
            timeout: self.execution.timeout_secs.map(Duration::from_secs),
            max_parallel: self.execution.max_parallel,
        }
    }
}
