//! Version model for hearth-provisioned application homes.
//!
//! Installed asset directories are named after the application [`Version`] that
//! produced them, so everything that orders or prunes those directories goes
//! through this crate:
//! - [`Version`]: a semantic version with a single total order
//! - [`date_commit_version`]: synthetic `MAJOR.YYMMDD.HMM-H<commit>` versions
//! - [`Version::calendar_date`]: recovers the build date from a synthetic version
//! - [`SourceRepository`]/[`GitRepository`]: the commit-hash collaborator

mod date;
mod error;
mod repo;
mod synthetic;
mod version;

pub use date::DateEncoding;
pub use error::{Result, VersionError};
pub use repo::{GitRepository, SourceRepository};
pub use synthetic::{date_commit_version, generate_date_commit_version, generate_from_repository};
pub use version::{compare, Version};
