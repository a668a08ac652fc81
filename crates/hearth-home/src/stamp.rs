//! The `<home>/version` file: the last version whose assets were fully provisioned.

use hearth_version::Version;

use crate::error::{HomeError, Result};
use crate::layout::HomeLayout;
use crate::util::atomic_write;

/// Reads the version stamp.
///
/// A missing or unreadable stamp is expected on first run and yields `None`
/// after a warning; it is never an error.
pub fn read_stamp(layout: &HomeLayout) -> Option<String> {
    let path = layout.version_path();
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(text.trim().to_owned()),
        Err(err) => {
            tracing::warn!(
                target = "hearth.home",
                path = %path.display(),
                error = %err,
                "failed to read home version, may be first run"
            );
            None
        }
    }
}

/// Records `version` as fully provisioned.
pub fn write_stamp(layout: &HomeLayout, version: &Version) -> Result<()> {
    let path = layout.version_path();
    atomic_write(&path, version.to_string().as_bytes())
        .map_err(|source| HomeError::WriteStamp { path, source })
}
