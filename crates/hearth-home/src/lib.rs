//! Provisioning of versioned, read-only application assets into a per-user home.
//!
//! An application embeds its assets at build time and calls
//! [`AppHome::prepare`] on start. Any number of processes, possibly of
//! different versions, may do so concurrently against the same home; the
//! [`HomeLock`] serializes them.
//!
//! ## On-disk layout
//!
//! - `<home>/lock`: zero-length file carrying the advisory lock
//! - `<home>/version`: the last version whose assets were fully provisioned
//! - `<home>/config.yaml`: optional, loaded by [`AppHome::prepare_with_config`]
//! - `<home>/assets/<version>/`: one extracted asset tree per version, at most
//!   [`RetentionPolicy::keep`] (+1 being installed) of them

mod assets;
mod config;
mod error;
mod extract;
mod layout;
mod lock;
mod prepare;
mod retention;
mod stamp;
mod util;

pub use assets::{
    AssetEntry, AssetKind, AssetSource, DirAssets, StaticAsset, StaticAssets, DEFAULT_ASSET_MODE,
};
pub use config::load_config;
pub use error::{HomeError, Result};
pub use extract::{extract_assets, extracted_file_mode, ExtractReport, EXTRACTED_FILE_BASE_MODE};
pub use layout::{
    default_home_dir, HomeConfig, HomeLayout, ASSETS_DIRNAME, CONFIG_FILENAME, LOCK_FILENAME,
    VERSION_FILENAME,
};
pub use lock::HomeLock;
pub use prepare::{AppHome, PrepareReport};
pub use retention::{cleanup_assets, installed_versions, CleanupOutcome, InstalledAssets, RetentionPolicy};
pub use stamp::{read_stamp, write_stamp};

pub use hearth_version::Version;
