//! Error types for ripple
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Change resolution errors
#[derive(Error, Debug)]
pub enum ChangeError {
    /// Walked to the filesystem root without finding a manifest
    #[error("No {manifest} found for '{file}' in any parent directory")]
    NoOwningManifest { file: PathBuf, manifest: String },

    /// IO error while probing a directory
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Version-control errors
#[derive(Error, Debug)]
pub enum VcsError {
    /// No repository at or above the workspace root
    #[error("Failed to open git repository at '{path}': {error}")]
    OpenFailed { path: PathBuf, error: String },

    /// The baseline revision does not name a tree
    #[error("Revision '{revision}' not found: {error}")]
    RevisionNotFound { revision: String, error: String },

    /// Computing the diff failed
    #[error("Failed to diff against '{base}': {error}")]
    DiffFailed { base: String, error: String },
}

/// Package manifest and package manager errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read a manifest file
    #[error("Failed to read manifest '{path}': {error}")]
    ReadFailed { path: PathBuf, error: String },

    /// Failed to parse a manifest file
    #[error("Failed to parse manifest '{path}': {error}")]
    ParseFailed { path: PathBuf, error: String },

    /// Manifest has no package name
    #[error("Manifest '{path}' does not declare a package name")]
    MissingName { path: PathBuf },

    /// The package manager could not be started
    #[error("Failed to run '{program}': {error}")]
    SpawnFailed { program: String, error: String },

    /// The package manager returned an unusable answer
    #[error("'{command}' failed: {error}")]
    QueryFailed { command: String, error: String },
}

/// Module ordering errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Package manager gave no location for a module
    #[error("Unable to resolve a location for module '{module}'")]
    Unresolved { module: String },

    /// Location string too short to carry the expected scheme prefix
    #[error("Invalid resolved location '{resolved}' for module '{module}'")]
    InvalidLocation { module: String, resolved: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// Invalid stage specification
    #[error("Invalid stage '{spec}': command must not be empty")]
    InvalidStage { spec: String },
}

/// Top-level ripple error type
#[derive(Error, Debug)]
pub enum RippleError {
    /// Change resolution error
    #[error("Change error: {0}")]
    Change(#[from] ChangeError),

    /// Version-control error
    #[error("VCS error: {0}")]
    Vcs(#[from] VcsError),

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Config error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
