//! Git operations
//!
//! Lists files changed against a baseline revision. The work tree and index
//! are compared with the baseline tree, and paths are reported relative to
//! the workspace root.

use std::path::{Path, PathBuf};

use crate::core::collaborators::ChangeSource;
use crate::error::VcsError;

/// Change source backed by a git repository
#[derive(Debug, Clone)]
pub struct GitChangeSource {
    /// Workspace root; the repository is discovered at or above it
    work_dir: PathBuf,
    /// Baseline revision
    base: String,
    /// Restrict the diff to this path, relative to `work_dir`
    path_filter: Option<String>,
}

impl GitChangeSource {
    /// Create a change source diffing `work_dir` against `base`
    pub fn new(work_dir: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            base: base.into(),
            path_filter: None,
        }
    }

    /// Only report changes under `filter`
    #[must_use]
    pub fn with_path_filter(mut self, filter: Option<String>) -> Self {
        self.path_filter = filter;
        self
    }

    /// Changed paths relative to `work_dir`
    fn diff_names(&self) -> Result<Vec<PathBuf>, VcsError> {
        let repo = git2::Repository::discover(&self.work_dir).map_err(|e| VcsError::OpenFailed {
            path: self.work_dir.clone(),
            error: e.message().to_string(),
        })?;
        let prefix = workspace_prefix(&repo, &self.work_dir)?;

        let base_tree = repo
            .revparse_single(&self.base)
            .and_then(|object| object.peel_to_tree())
            .map_err(|e| VcsError::RevisionNotFound {
                revision: self.base.clone(),
                error: e.message().to_string(),
            })?;

        let mut options = git2::DiffOptions::new();
        let scope = match &self.path_filter {
            Some(filter) => prefix.join(filter),
            None => prefix.clone(),
        };
        if !scope.as_os_str().is_empty() {
            options.pathspec(scope);
        }

        let diff = repo
            .diff_tree_to_workdir_with_index(Some(&base_tree), Some(&mut options))
            .map_err(|e| VcsError::DiffFailed {
                base: self.base.clone(),
                error: e.message().to_string(),
            })?;

        let files = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .filter_map(|path| path.strip_prefix(&prefix).ok())
            .map(Path::to_path_buf)
            .collect();
        Ok(files)
    }
}

/// Location of `work_dir` inside the repository's work tree
fn workspace_prefix(repo: &git2::Repository, work_dir: &Path) -> Result<PathBuf, VcsError> {
    let open_failed = |error: String| VcsError::OpenFailed {
        path: work_dir.to_path_buf(),
        error,
    };

    let tree_root = repo
        .workdir()
        .ok_or_else(|| open_failed("bare repositories have no work tree".to_string()))?;
    let tree_root = tree_root.canonicalize().map_err(|e| open_failed(e.to_string()))?;
    let work_dir = work_dir.canonicalize().map_err(|e| open_failed(e.to_string()))?;

    work_dir
        .strip_prefix(&tree_root)
        .map(Path::to_path_buf)
        .map_err(|e| open_failed(e.to_string()))
}

impl ChangeSource for GitChangeSource {
    async fn changed_files(&self) -> Result<String, VcsError> {
        tracing::debug!(
            "Diffing {} against {}",
            self.work_dir.display(),
            self.base
        );

        let source = self.clone();
        let files = tokio::task::spawn_blocking(move || source.diff_names())
            .await
            .map_err(|e| VcsError::DiffFailed {
                base: self.base.clone(),
                error: e.to_string(),
            })??;

        Ok(files
            .iter()
            .map(|path| path.to_string_lossy())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
