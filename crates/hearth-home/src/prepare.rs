use std::path::PathBuf;

use hearth_version::Version;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::assets::AssetSource;
use crate::config::load_config;
use crate::error::{HomeError, Result};
use crate::extract::{extract_assets, ExtractReport};
use crate::layout::HomeLayout;
use crate::lock::HomeLock;
use crate::retention::{cleanup_assets, CleanupOutcome, RetentionPolicy};
use crate::stamp::{read_stamp, write_stamp};
use crate::util::remove_dir_all_nofollow;

/// What a [`AppHome::prepare`] run observed and did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrepareReport {
    /// Assets directory of the running version.
    pub assets_dir: PathBuf,
    /// Stamp found before this run, if any.
    pub previous_version: Option<String>,
    /// Set when assets were (re-)extracted.
    pub extracted: Option<ExtractReport>,
    /// `None` when cleanup failed; the failure was logged.
    pub cleanup: Option<CleanupOutcome>,
    pub stamp_written: bool,
}

/// An application's home directory together with the assets of the running version.
#[derive(Clone, Debug)]
pub struct AppHome<A> {
    name: String,
    layout: HomeLayout,
    version: Version,
    assets: A,
    retention: RetentionPolicy,
}

impl<A: AssetSource> AppHome<A> {
    pub fn new(name: impl Into<String>, home: impl Into<PathBuf>, version: Version, assets: A) -> Self {
        Self {
            name: name.into(),
            layout: HomeLayout::new(home),
            version,
            assets,
            retention: RetentionPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &HomeLayout {
        &self.layout
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.layout.assets_dir(&self.version)
    }

    /// Provisions the home for the running version. See [`AppHome::prepare_with_config`].
    pub fn prepare(&self) -> Result<PrepareReport> {
        self.prepare_locked(|_| Ok(())).map(|(report, ())| report)
    }

    /// Provisions the home for the running version and loads `<home>/config.yaml`.
    ///
    /// Under the home lock: reads the version stamp, loads the configuration,
    /// re-extracts assets when the stamp differs from the running version (or
    /// the running version is `0.0.0`), prunes old asset versions and updates
    /// the stamp. Only home creation, locking, configuration and extraction
    /// failures are returned; everything else is logged.
    pub fn prepare_with_config<C: DeserializeOwned>(&self) -> Result<(PrepareReport, Option<C>)> {
        self.prepare_locked(|layout| load_config(&layout.config_path()))
    }

    fn prepare_locked<T>(
        &self,
        load: impl FnOnce(&HomeLayout) -> Result<T>,
    ) -> Result<(PrepareReport, T)> {
        self.layout.create(&self.name)?;
        let lock = HomeLock::acquire(&self.layout.lock_path())?;

        let previous_version = read_stamp(&self.layout);
        let loaded = load(&self.layout)?;

        let current = self.version.to_string();
        let assets_dir = self.assets_dir();
        let changed =
            self.version.is_development() || previous_version.as_deref() != Some(current.as_str());

        let mut extracted = None;
        if changed {
            tracing::info!(
                target = "hearth.home",
                home_version = previous_version.as_deref().unwrap_or_default(),
                current_version = %current,
                "{} version changed",
                self.name
            );

            if let Err(err) = remove_dir_all_nofollow(&assets_dir) {
                tracing::warn!(
                    target = "hearth.home",
                    path = %assets_dir.display(),
                    error = %err,
                    "failed to cleanup current assets before extract"
                );
            }

            let report =
                extract_assets(&self.assets, &assets_dir).map_err(|source| HomeError::Restore {
                    path: assets_dir.clone(),
                    source: Box::new(source),
                })?;
            extracted = Some(report);
        }

        let cleanup = match cleanup_assets(&self.layout, &self.version, &self.retention) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::warn!(
                    target = "hearth.home",
                    error = %err,
                    "problem during assets cleanup"
                );
                None
            }
        };

        let mut stamp_written = false;
        if changed {
            match write_stamp(&self.layout, &self.version) {
                Ok(()) => stamp_written = true,
                Err(err) => tracing::error!(
                    target = "hearth.home",
                    error = %err,
                    "failed to write current {} version to home",
                    self.name
                ),
            }
        }

        lock.release();
        Ok((
            PrepareReport {
                assets_dir,
                previous_version,
                extracted,
                cleanup,
                stamp_written,
            },
            loaded,
        ))
    }
}
