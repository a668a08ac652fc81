use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, VersionError};

/// Source-control collaborator used by the synthetic version generator.
pub trait SourceRepository {
    /// Returns the head commit id, abbreviated when `short` is set.
    fn head_commit_hash(&self, short: bool) -> Result<String>;
}

/// A git working tree (or bare repository) opened through libgit2.
pub struct GitRepository {
    path: PathBuf,
    repository: git2::Repository,
}

impl GitRepository {
    /// Opens the repository containing `path`, searching parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repository =
            git2::Repository::discover(path).map_err(|source| VersionError::OpenRepository {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            repository,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceRepository for GitRepository {
    fn head_commit_hash(&self, short: bool) -> Result<String> {
        let head_error = |source| VersionError::HeadCommit {
            path: self.path.clone(),
            source,
        };

        let commit = self
            .repository
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(head_error)?;
        if !short {
            return Ok(commit.id().to_string());
        }

        let short_id = commit.as_object().short_id().map_err(head_error)?;
        match short_id.as_str() {
            Some(id) => Ok(id.to_owned()),
            None => Err(head_error(git2::Error::from_str(
                "abbreviated commit id is not valid UTF-8",
            ))),
        }
    }
}

impl fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
