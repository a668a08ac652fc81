use std::path::PathBuf;

use crate::DateEncoding;

pub type Result<T> = std::result::Result<T, VersionError>;

/// Errors produced while parsing, generating, or decoding versions.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("invalid semantic version {input:?}")]
    Parse {
        input: String,
        #[source]
        source: semver::Error,
    },

    #[error("failed to open repository at {path} to get commit hash")]
    OpenRepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("failed to resolve head commit of repository at {path}")]
    HeadCommit {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("minor component of {version} has {found} digits, {encoding:?} date layout needs {expected}")]
    DateLayout {
        version: String,
        encoding: DateEncoding,
        expected: usize,
        found: usize,
    },

    #[error("minor component of {version} is not a calendar date")]
    InvalidDate {
        version: String,
        #[source]
        source: time::error::ComponentRange,
    },
}
