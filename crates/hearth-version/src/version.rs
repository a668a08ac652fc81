use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VersionError};

/// An application version, `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`.
///
/// Ordering follows semantic-version precedence. Build metadata never decides
/// precedence; it is only consulted as the last tie-breaker so that `Ord`
/// agrees with `Eq` (two versions compare equal iff every field matches).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(semver::Version);

impl Version {
    pub fn parse(text: &str) -> Result<Self> {
        semver::Version::parse(text)
            .map(Self)
            .map_err(|source| VersionError::Parse {
                input: text.to_owned(),
                source,
            })
    }

    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    pub fn as_semver(&self) -> &semver::Version {
        &self.0
    }

    /// `0.0.0` marks an unversioned development build.
    pub fn is_development(&self) -> bool {
        self.0 == semver::Version::new(0, 0, 0)
    }

    /// Precedence-only comparison; ignores build metadata entirely.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.0.cmp_precedence(&other.0)
    }
}

/// Total order over versions, see [`Version`].
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp(b)
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<semver::Version> for Version {
    fn from(value: semver::Version) -> Self {
        Self(value)
    }
}
