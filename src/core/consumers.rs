//! Consumer expansion
//!
//! Expands changed package roots into every package that consumes them.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::core::collaborators::PackageManager;
use crate::core::manifest::PackageManifest;
use crate::error::RippleError;

/// Options for consumer expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerOptions {
    /// Leave a changed package out of its own consumer set
    pub only_consumers: bool,
    /// Manifest file name inside each package root
    pub manifest_file: String,
}

/// Result of consumer expansion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerReport {
    /// Every affected package name
    pub consumers: BTreeSet<String>,
    /// Changed packages that nothing consumes
    pub without_consumers: Vec<String>,
}

/// Collect the consumer set for `roots`.
///
/// Each root's manifest name is queried through `package_manager`, and every
/// top-level package in the answer is a consumer. A package always consumes
/// itself unless `options.only_consumers` is set. Roots without consumers are
/// reported, not fatal.
pub async fn expand_consumers<P: PackageManager>(
    roots: &[PathBuf],
    package_manager: &P,
    options: &ConsumerOptions,
) -> Result<ConsumerReport, RippleError> {
    let mut report = ConsumerReport::default();

    for root in roots {
        let name = PackageManifest::load_name(root, &options.manifest_file)?;
        tracing::info!("Searching {name} for package dependencies...");

        let tree = package_manager.list(std::slice::from_ref(&name)).await?;
        let dependents = tree.package_names();

        if dependents.is_empty() {
            tracing::warn!("No consumers for the {name} module");
            report.without_consumers.push(name.clone());
        } else {
            tracing::debug!("{name} consumed by {}", dependents.join(", "));
        }

        report.consumers.extend(
            dependents
                .into_iter()
                .filter(|dep| !options.only_consumers || *dep != name)
                .map(str::to_string),
        );

        if !options.only_consumers {
            report.consumers.insert(name);
        }
    }

    Ok(report)
}
