use std::path::{Path, PathBuf};

use hearth_version::Version;

use crate::error::{HomeError, Result};

pub const LOCK_FILENAME: &str = "lock";
pub const VERSION_FILENAME: &str = "version";
pub const CONFIG_FILENAME: &str = "config.yaml";
pub const ASSETS_DIRNAME: &str = "assets";

/// Configuration for selecting the application home directory.
#[derive(Clone, Debug, Default)]
pub struct HomeConfig {
    /// Override the default `~/.config/<app>` home directory.
    pub home_override: Option<PathBuf>,
}

impl HomeConfig {
    pub fn from_env() -> Self {
        Self {
            home_override: std::env::var_os("HEARTH_HOME").map(PathBuf::from),
        }
    }

    pub fn resolve(&self, app_name: &str) -> PathBuf {
        match &self.home_override {
            Some(home) => home.clone(),
            None => default_home_dir(app_name),
        }
    }
}

/// On-disk layout of an application home:
///
/// ```text
/// <home>/lock                 zero-length lock marker
/// <home>/version              last provisioned version
/// <home>/config.yaml          optional configuration
/// <home>/assets/<version>/    one extracted tree per version
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HomeLayout {
    root: PathBuf,
}

impl HomeLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILENAME)
    }

    pub fn version_path(&self) -> PathBuf {
        self.root.join(VERSION_FILENAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }

    pub fn assets_root(&self) -> PathBuf {
        self.root.join(ASSETS_DIRNAME)
    }

    pub fn assets_dir(&self, version: &Version) -> PathBuf {
        self.assets_root().join(version.to_string())
    }

    /// Creates the home directory (and its parents) if missing.
    pub fn create(&self, app_name: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|source| HomeError::CreateHome {
            app: app_name.to_owned(),
            path: self.root.clone(),
            source,
        })
    }
}

/// Returns `~/.config/<app_name>`.
///
/// When no home directory can be determined, a directory under the system temp
/// dir stands in for it so the application can still start.
pub fn default_home_dir(app_name: &str) -> PathBuf {
    let home = match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let fallback = std::env::temp_dir().join(app_name);
            tracing::warn!(
                target = "hearth.home",
                fallback = %fallback.display(),
                "failed to find home directory"
            );
            fallback
        }
    };
    home.join(".config").join(app_name)
}
