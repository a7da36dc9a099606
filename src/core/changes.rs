//! Change resolution
//!
//! Turns the raw output of the change source into changed files, then maps
//! each changed file onto the package root that owns it.

use std::path::{Path, PathBuf};

use crate::core::manifest::normalize_path;
use crate::error::ChangeError;
use crate::infra::filesystem;

/// Split raw change-source output into changed file paths.
///
/// One path per line. Blank records, including the one left by a trailing
/// newline, are dropped, so empty output yields an empty list.
pub fn parse_changed_files(raw: &str) -> Vec<PathBuf> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Find the nearest directory at or above `dir`, but strictly below
/// `workspace_root`, that contains `manifest_file`.
pub fn find_package_root(
    dir: &Path,
    workspace_root: &Path,
    manifest_file: &str,
) -> Result<Option<PathBuf>, ChangeError> {
    let below_root = dir
        .ancestors()
        .take_while(|candidate| candidate.starts_with(workspace_root) && *candidate != workspace_root);
    for candidate in below_root {
        tracing::trace!("Probing {} for {manifest_file}", candidate.display());
        if filesystem::dir_contains(candidate, manifest_file)? {
            return Ok(Some(candidate.to_path_buf()));
        }
    }
    Ok(None)
}

/// Resolve changed files to the de-duplicated package roots that own them.
///
/// Relative paths are taken from `workspace_root`. A file whose directory is
/// already covered by a discovered root is not walked again. Coverage uses
/// path components, so `libs/foo` never covers `libs/foobar`. When a newly
/// discovered root is an ancestor of earlier roots it absorbs them, so no
/// returned root lies inside another.
///
/// The walk never reaches the workspace root itself. Files owned only by the
/// workspace manifest (lock files, top-level docs) are skipped; they are an
/// error only when the workspace root has no manifest either.
pub fn resolve_package_roots(
    workspace_root: &Path,
    files: &[PathBuf],
    manifest_file: &str,
) -> Result<Vec<PathBuf>, ChangeError> {
    let workspace_root = normalize_path(workspace_root);
    let mut roots: Vec<PathBuf> = Vec::new();

    for file in files {
        let absolute = normalize_path(&workspace_root.join(file));
        let Some(dir) = absolute.parent() else {
            return Err(ChangeError::NoOwningManifest {
                file: file.clone(),
                manifest: manifest_file.to_string(),
            });
        };

        if let Some(root) = roots.iter().find(|root| dir.starts_with(root)) {
            tracing::debug!("{} already covered by {}", file.display(), root.display());
            continue;
        }

        let Some(root) = find_package_root(dir, &workspace_root, manifest_file)? else {
            if filesystem::dir_contains(&workspace_root, manifest_file)? {
                tracing::warn!(
                    "{} is not inside a workspace package, skipping",
                    file.display()
                );
                continue;
            }
            return Err(ChangeError::NoOwningManifest {
                file: file.clone(),
                manifest: manifest_file.to_string(),
            });
        };

        tracing::debug!("{} owned by {}", file.display(), root.display());
        roots.retain(|existing| !existing.starts_with(&root));
        roots.push(root);
    }

    tracing::info!("{} package roots for {} changed files", roots.len(), files.len());
    Ok(roots)
}
