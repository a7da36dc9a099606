//! Package manifest (package.json) and package manager answer models
//!
//! Covers the workspace manifest, per-package manifests, and the
//! `list --json` documents returned by the package manager.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::ManifestError;

/// A package manifest (package.json)
///
/// Only the fields the orchestrator needs are modelled; everything else in
/// the file is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PackageManifest {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,

    /// Package version
    #[serde(default)]
    pub version: Option<String>,

    /// Declared workspace members (root manifest only)
    #[serde(default)]
    pub workspaces: Option<Workspaces>,
}

/// Workspace member declaration
///
/// npm uses a plain array; yarn also accepts `{ "packages": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Workspaces {
    /// `"workspaces": ["./libs/a", "./apps/b"]`
    List(Vec<String>),
    /// `"workspaces": { "packages": ["./libs/a"] }`
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl Workspaces {
    /// Declared member paths in declaration order
    pub fn members(&self) -> &[String] {
        match self {
            Self::List(members) | Self::Object { packages: members } => members,
        }
    }
}

impl PackageManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Load a manifest from a file path
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::ReadFailed {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| ManifestError::ParseFailed {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load the manifest in `dir` and return its package name
    pub fn load_name(dir: &Path, manifest_file: &str) -> Result<String, ManifestError> {
        let path = dir.join(manifest_file);
        Self::load(&path)?
            .name
            .filter(|name| !name.is_empty())
            .ok_or(ManifestError::MissingName { path })
    }

    /// Workspace member directories resolved against `root` and normalized
    pub fn workspace_paths(&self, root: &Path) -> Vec<PathBuf> {
        self.workspaces
            .as_ref()
            .map(|ws| {
                ws.members()
                    .iter()
                    .map(|member| normalize_path(&root.join(member)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Answer of `<package manager> list <names> --json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DependencyTree {
    /// Root package name
    #[serde(default)]
    pub name: Option<String>,

    /// Root package version
    #[serde(default)]
    pub version: Option<String>,

    /// Top-level packages whose tree contains the queried names
    #[serde(default)]
    pub dependencies: Option<BTreeMap<String, DependencyNode>>,
}

/// One package entry in a dependency tree
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DependencyNode {
    /// Installed version
    #[serde(default)]
    pub version: Option<String>,

    /// Install location, e.g. `file:../../apps/AppShell`
    #[serde(default)]
    pub resolved: Option<String>,

    /// Nested dependencies
    #[serde(default)]
    pub dependencies: Option<BTreeMap<String, DependencyNode>>,
}

impl DependencyTree {
    /// Parse a dependency tree from JSON text
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Names of the top-level packages, in sorted order
    pub fn package_names(&self) -> Vec<&str> {
        self.dependencies
            .as_ref()
            .map(|deps| deps.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Look up a top-level package entry
    pub fn get(&self, name: &str) -> Option<&DependencyNode> {
        self.dependencies.as_ref().and_then(|deps| deps.get(name))
    }
}

/// Lexically normalize a path, resolving `.` and `..` without touching the
/// filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
