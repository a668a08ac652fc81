use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{HomeError, Result};

/// Loads the optional YAML configuration at `path` into `C`.
///
/// An absent or empty file is `Ok(None)`. Read and parse failures are errors.
pub fn load_config<C: DeserializeOwned>(path: &Path) -> Result<Option<C>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(target = "hearth.home", path = %path.display(), "no configuration file");
            return Ok(None);
        }
        Err(source) => {
            return Err(HomeError::ReadConfig {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if text.trim().is_empty() {
        return Ok(None);
    }

    serde_yaml::from_str(&text)
        .map(Some)
        .map_err(|source| HomeError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
}
