//! Read-only asset trees that can be provisioned into a home directory.

use std::collections::BTreeSet;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use crate::error::{HomeError, Result};

/// Mode reported for embedded files that don't carry one.
pub const DEFAULT_ASSET_MODE: u32 = 0o644;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Directory,
    File,
    /// Symlinks, devices, sockets, ... Never extracted.
    Other,
}

/// One node of an asset tree, addressed relative to the tree root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetEntry {
    pub path: PathBuf,
    pub kind: AssetKind,
    pub mode: u32,
}

/// A walkable, read-only file tree supplied by the application.
pub trait AssetSource {
    /// All entries of the tree in depth-first order, each directory before its
    /// contents. The root itself is not listed.
    fn walk(&self) -> Result<Vec<AssetEntry>>;

    /// Opens the file at the relative `path` for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;
}

impl<T: AssetSource + ?Sized> AssetSource for &T {
    fn walk(&self) -> Result<Vec<AssetEntry>> {
        (**self).walk()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        (**self).open(path)
    }
}

/// A file compiled into the binary, typically with `include_bytes!`.
#[derive(Clone, Copy, Debug)]
pub struct StaticAsset {
    /// `/`-separated path relative to the asset root.
    pub path: &'static str,
    pub contents: &'static [u8],
    pub mode: u32,
}

impl StaticAsset {
    pub const fn file(path: &'static str, contents: &'static [u8]) -> Self {
        Self {
            path,
            contents,
            mode: DEFAULT_ASSET_MODE,
        }
    }

    pub const fn executable(path: &'static str, contents: &'static [u8]) -> Self {
        Self {
            path,
            contents,
            mode: 0o755,
        }
    }
}

/// An asset tree embedded at build time.
///
/// ```
/// use hearth_home::{StaticAsset, StaticAssets};
///
/// static ASSETS: StaticAssets = StaticAssets::new(&[
///     StaticAsset::file("templates/default.yaml", b"name: default\n"),
///     StaticAsset::executable("bin/hook.sh", b"#!/bin/sh\n"),
/// ]);
/// # let _ = &ASSETS;
/// ```
#[derive(Clone, Copy, Debug)]
pub struct StaticAssets {
    files: &'static [StaticAsset],
}

impl StaticAssets {
    pub const fn new(files: &'static [StaticAsset]) -> Self {
        Self { files }
    }

    fn find(&self, path: &Path) -> Option<&StaticAsset> {
        let path = normal_components(path);
        self.files
            .iter()
            .find(|asset| normal_components(Path::new(asset.path)) == path)
    }
}

impl AssetSource for StaticAssets {
    fn walk(&self) -> Result<Vec<AssetEntry>> {
        let mut dirs = BTreeSet::new();
        let mut entries = Vec::with_capacity(self.files.len());
        for asset in self.files {
            let raw = Path::new(asset.path);
            validate_relative_path(raw)?;
            let path = normal_components(raw);
            for ancestor in path.ancestors().skip(1) {
                if ancestor.as_os_str().is_empty() {
                    break;
                }
                dirs.insert(ancestor.to_path_buf());
            }
            entries.push(AssetEntry {
                path,
                kind: AssetKind::File,
                mode: asset.mode,
            });
        }

        entries.extend(dirs.into_iter().map(|path| AssetEntry {
            path,
            kind: AssetKind::Directory,
            mode: 0o755,
        }));
        // `Path` ordering is per component, so parents sort before their children.
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        match self.find(path) {
            Some(asset) => Ok(Box::new(asset.contents)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no embedded asset at {}", path.display()),
            )),
        }
    }
}

/// An asset tree read from a directory on disk.
#[derive(Clone, Debug)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirAssets {
    fn walk(&self) -> Result<Vec<AssetEntry>> {
        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| HomeError::AssetWalk {
                path: err.path().unwrap_or(self.root.as_path()).to_path_buf(),
                source: io::Error::from(err),
            })?;
            let path = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| HomeError::InvalidAssetPath {
                    path: entry.path().to_path_buf(),
                })?
                .to_path_buf();

            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                AssetKind::Directory
            } else if file_type.is_file() {
                AssetKind::File
            } else {
                AssetKind::Other
            };
            let metadata = entry.metadata().map_err(|err| HomeError::AssetWalk {
                path: entry.path().to_path_buf(),
                source: io::Error::from(err),
            })?;

            entries.push(AssetEntry {
                path,
                kind,
                mode: permission_bits(&metadata),
            });
        }
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let file = std::fs::File::open(self.root.join(path))?;
        Ok(Box::new(file))
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn permission_bits(metadata: &std::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        DEFAULT_ASSET_MODE
    }
}

/// `path` with `.` components dropped, so `./a.txt` and `a.txt` name the same asset.
fn normal_components(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect()
}

/// Rejects absolute paths and any `..`/root component.
pub(crate) fn validate_relative_path(path: &Path) -> Result<()> {
    let mut normal = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal = true,
            Component::CurDir => {}
            _ => {
                return Err(HomeError::InvalidAssetPath {
                    path: path.to_path_buf(),
                })
            }
        }
    }
    if !normal {
        return Err(HomeError::InvalidAssetPath {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
