//! Bounded retention of installed asset versions.
//!
//! Several processes, possibly running different versions, may still be using
//! older asset directories and nothing tracks them. Instead of monitoring
//! processes, the cleaner assumes the application is not upgraded more than
//! `keep` times while an old process is still alive, and reclaims at most one
//! directory (the oldest) per run.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use hearth_version::Version;
use serde::Serialize;

use crate::error::{HomeError, Result};
use crate::layout::HomeLayout;
use crate::util::{hidden_sibling_path, remove_dir_all_nofollow};

/// Marks an asset directory renamed aside for deletion: `.<name>.removing-<pid>-<n>`.
const REMOVING_SUFFIX: &str = "removing";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RetentionPolicy {
    /// Installed versions tolerated before the oldest is removed.
    pub keep: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { keep: 3 }
    }
}

/// An asset directory found under `<home>/assets`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstalledAssets {
    pub name: String,
    pub path: PathBuf,
    /// `None` when the directory name is not a valid version.
    pub version: Option<Version>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CleanupOutcome {
    /// Nothing to do, `installed` is at or below the policy.
    WithinLimit { installed: usize },
    /// The oldest installed version is the current one; kept.
    CurrentIsOldest { version: String },
    Removed { name: String, path: PathBuf },
}

/// Lists installed asset directories, oldest first.
///
/// Names that don't parse as versions sort after every valid version (and
/// among themselves by name); they are logged but never abort the listing.
/// Hidden entries are skipped. A missing assets root means nothing installed.
pub fn installed_versions(layout: &HomeLayout) -> Result<Vec<InstalledAssets>> {
    let root = layout.assets_root();
    let read_error = |source| HomeError::ReadAssets {
        path: root.clone(),
        source,
    };

    let dir = match std::fs::read_dir(&root) {
        Ok(dir) => dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(read_error(err)),
    };

    let mut installed = Vec::new();
    for entry in dir {
        let entry = entry.map_err(read_error)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().map_err(read_error)?;
        if !(file_type.is_dir() || file_type.is_symlink()) {
            continue;
        }

        let version = match Version::parse(&name) {
            Ok(version) => Some(version),
            Err(err) => {
                tracing::warn!(
                    target = "hearth.home",
                    assets = %name,
                    error = %err,
                    "failed to read assets version"
                );
                None
            }
        };
        installed.push(InstalledAssets {
            name,
            path: entry.path(),
            version,
        });
    }

    installed.sort_by(compare_installed);
    Ok(installed)
}

fn compare_installed(a: &InstalledAssets, b: &InstalledAssets) -> Ordering {
    match (&a.version, &b.version) {
        (Some(a_version), Some(b_version)) => a_version.cmp(b_version),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}

/// Removes the single oldest asset directory once more than `policy.keep`
/// versions are installed, unless that oldest one is `current`.
///
/// Directories left half-deleted by an earlier interrupted removal are swept
/// first; they never count as installed.
pub fn cleanup_assets(
    layout: &HomeLayout,
    current: &Version,
    policy: &RetentionPolicy,
) -> Result<CleanupOutcome> {
    sweep_removal_leftovers(&layout.assets_root());

    let installed = installed_versions(layout)?;
    if installed.len() <= policy.keep {
        return Ok(CleanupOutcome::WithinLimit {
            installed: installed.len(),
        });
    }

    let Some(oldest) = installed.into_iter().next() else {
        return Ok(CleanupOutcome::WithinLimit { installed: 0 });
    };
    if oldest.name == current.to_string() {
        tracing::debug!(
            target = "hearth.home",
            assets = %oldest.name,
            "oldest app assets version is currently used version, not cleaning it up"
        );
        return Ok(CleanupOutcome::CurrentIsOldest {
            version: oldest.name,
        });
    }

    remove_assets_dir(&layout.assets_root(), &oldest.path)?;
    tracing::info!(
        target = "hearth.home",
        assets = %oldest.name,
        path = %oldest.path.display(),
        "removed old app assets"
    );
    Ok(CleanupOutcome::Removed {
        name: oldest.name,
        path: oldest.path,
    })
}

fn is_removal_leftover(name: &str) -> bool {
    name.starts_with('.') && name.contains(&format!(".{REMOVING_SUFFIX}-"))
}

/// Best effort: failures are logged and retried on the next cleanup.
fn sweep_removal_leftovers(root: &Path) {
    let dir = match std::fs::read_dir(root) {
        Ok(dir) => dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
        Err(err) => {
            tracing::debug!(
                target = "hearth.home",
                path = %root.display(),
                error = %err,
                "failed to scan assets for removal leftovers"
            );
            return;
        }
    };

    for entry in dir.flatten() {
        let name = entry.file_name();
        if !is_removal_leftover(&name.to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        match remove_dir_all_nofollow(&path) {
            Ok(()) => tracing::debug!(
                target = "hearth.home",
                path = %path.display(),
                "removed leftover of interrupted assets removal"
            ),
            Err(err) => tracing::warn!(
                target = "hearth.home",
                path = %path.display(),
                error = %err,
                "failed to remove leftover of interrupted assets removal"
            ),
        }
    }
}

/// Removes an asset directory by first renaming it to a hidden sibling, so a
/// half-deleted tree never looks like an installed version.
fn remove_assets_dir(root: &Path, path: &Path) -> Result<()> {
    // Lexical check only; do not follow symlinks.
    if path.strip_prefix(root).is_err() {
        return Err(HomeError::PathNotUnderAssetsRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        });
    }
    let cleanup_error = |source| HomeError::Cleanup {
        path: path.to_path_buf(),
        source,
    };

    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(cleanup_error(err)),
    };
    if !meta.is_dir() {
        // Symlinked version: drop the link itself, never its target.
        return remove_dir_all_nofollow(path).map_err(cleanup_error);
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let trash = hidden_sibling_path(root, &name, REMOVING_SUFFIX);
    match std::fs::rename(path, &trash) {
        Ok(()) => remove_dir_all_nofollow(&trash).map_err(cleanup_error),
        // Fall back to removing in place if the rename fails (e.g. Windows file locks).
        Err(_) => remove_dir_all_nofollow(path).map_err(cleanup_error),
    }
}
