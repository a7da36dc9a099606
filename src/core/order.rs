//! Module ordering
//!
//! Places the affected packages in the order the workspace declares them.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::defaults::RESOLVED_PREFIX_LEN;
use crate::core::collaborators::PackageManager;
use crate::core::manifest::{normalize_path, DependencyTree};
use crate::error::{ResolverError, RippleError};

/// A package placed in the execution order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedModule {
    /// Package name
    pub name: String,
    /// Absolute package directory
    pub absolute_path: PathBuf,
}

/// Resolve and order `consumers` by the workspace declaration order.
///
/// Locations come from a single batched package manager query, never one
/// query per package.
pub async fn order_modules<P: PackageManager>(
    consumers: &BTreeSet<String>,
    package_manager: &P,
    workspace_root: &Path,
    declared: &[PathBuf],
) -> Result<Vec<OrderedModule>, RippleError> {
    if consumers.is_empty() {
        return Ok(Vec::new());
    }

    let names: Vec<String> = consumers.iter().cloned().collect();
    let tree = package_manager.list(&names).await?;
    let modules = resolve_locations(&names, &tree, workspace_root)?;

    Ok(rank_modules(modules, declared))
}

/// Map each name to its absolute location in `tree`.
///
/// A name without a `resolved` location cannot be placed and is fatal.
pub fn resolve_locations(
    names: &[String],
    tree: &DependencyTree,
    workspace_root: &Path,
) -> Result<Vec<OrderedModule>, ResolverError> {
    names
        .iter()
        .map(|name| {
            let resolved = tree
                .get(name)
                .and_then(|node| node.resolved.as_deref())
                .ok_or_else(|| ResolverError::Unresolved {
                    module: name.clone(),
                })?;
            let relative = resolved.get(RESOLVED_PREFIX_LEN..).ok_or_else(|| {
                ResolverError::InvalidLocation {
                    module: name.clone(),
                    resolved: resolved.to_string(),
                }
            })?;

            Ok(OrderedModule {
                name: name.clone(),
                absolute_path: normalize_path(&workspace_root.join(relative)),
            })
        })
        .collect()
}

/// Stable sort of `modules` by the index of their path in `declared`.
///
/// Modules missing from `declared` go after every declared module and keep
/// their relative input order.
pub fn rank_modules(mut modules: Vec<OrderedModule>, declared: &[PathBuf]) -> Vec<OrderedModule> {
    modules.sort_by_key(|module| {
        declared
            .iter()
            .position(|path| *path == module.absolute_path)
            .unwrap_or(usize::MAX)
    });
    modules
}
