use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::assets::{validate_relative_path, AssetEntry, AssetKind, AssetSource};
use crate::error::{HomeError, Result};

/// Extracted files are always at least owner read/write, world readable.
pub const EXTRACTED_FILE_BASE_MODE: u32 = 0o644;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    pub directories: usize,
    pub files: usize,
    pub bytes: u64,
}

/// Mode for an extracted file: the source permission bits on top of the base mode.
pub fn extracted_file_mode(source_mode: u32) -> u32 {
    EXTRACTED_FILE_BASE_MODE | (source_mode & 0o777)
}

/// Copies every entry of `source` under `target`.
///
/// Directories are created idempotently. Files are created exclusively: an
/// existing file at a destination path fails the extraction instead of being
/// overwritten. Stops at the first error.
pub fn extract_assets<S: AssetSource + ?Sized>(source: &S, target: &Path) -> Result<ExtractReport> {
    create_dir(target)?;

    let mut report = ExtractReport::default();
    for entry in source.walk()? {
        validate_relative_path(&entry.path)?;
        let out = target.join(&entry.path);
        match entry.kind {
            AssetKind::Directory => {
                create_dir(&out)?;
                report.directories += 1;
            }
            AssetKind::File => {
                report.bytes += extract_file(source, &entry, &out)?;
                report.files += 1;
            }
            AssetKind::Other => {
                return Err(HomeError::NotRegularFile { path: entry.path });
            }
        }
    }

    tracing::debug!(
        target = "hearth.home",
        path = %target.display(),
        files = report.files,
        directories = report.directories,
        bytes = report.bytes,
        "extracted assets"
    );
    Ok(report)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| HomeError::Extract {
        path: path.to_path_buf(),
        source,
    })
}

fn extract_file<S: AssetSource + ?Sized>(source: &S, entry: &AssetEntry, out: &Path) -> Result<u64> {
    if let Some(parent) = out.parent() {
        create_dir(parent)?;
    }

    let mut reader = source.open(&entry.path).map_err(|err| HomeError::Extract {
        path: entry.path.clone(),
        source: err,
    })?;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(extracted_file_mode(entry.mode));
    }
    let mut file = options.open(out).map_err(|source| HomeError::Extract {
        path: out.to_path_buf(),
        source,
    })?;

    io::copy(&mut reader, &mut file).map_err(|source| HomeError::Extract {
        path: out.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{DirAssets, StaticAsset, StaticAssets};
    use std::io::Read;
    use std::path::PathBuf;

    static TREE: StaticAssets = StaticAssets::new(&[
        StaticAsset::file("conf/app.yaml", b"name: app\n"),
        StaticAsset::executable("bin/start", b"#!/bin/sh\nexit 0\n"),
    ]);

    struct WithOther;

    impl AssetSource for WithOther {
        fn walk(&self) -> Result<Vec<AssetEntry>> {
            Ok(vec![
                AssetEntry {
                    path: PathBuf::from("ok.txt"),
                    kind: AssetKind::File,
                    mode: 0o644,
                },
                AssetEntry {
                    path: PathBuf::from("fifo"),
                    kind: AssetKind::Other,
                    mode: 0o644,
                },
            ])
        }

        fn open(&self, _path: &Path) -> io::Result<Box<dyn Read + '_>> {
            Ok(Box::new(&b"ok"[..]))
        }
    }

    #[test]
    fn mode_keeps_permission_bits_only() {
        assert_eq!(extracted_file_mode(0o100755), 0o755);
        assert_eq!(extracted_file_mode(0o400), 0o644);
        assert_eq!(extracted_file_mode(0o4711), 0o755);
    }

    #[test]
    fn extracts_static_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("assets/1.0.0");

        let report = extract_assets(&TREE, &target).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.directories, 2);
        assert_eq!(report.bytes, 10 + 17);
        assert_eq!(fs::read(target.join("conf/app.yaml")).unwrap(), b"name: app\n");
        assert_eq!(fs::read(target.join("bin/start")).unwrap(), b"#!/bin/sh\nexit 0\n");
    }

    #[cfg(unix)]
    #[test]
    fn preserves_executable_bits() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        extract_assets(&TREE, tmp.path()).unwrap();

        let exec = fs::metadata(tmp.path().join("bin/start")).unwrap().permissions().mode();
        assert_eq!(exec & 0o700, 0o700, "mode {exec:o}");
        let plain = fs::metadata(tmp.path().join("conf/app.yaml")).unwrap().permissions().mode();
        assert_eq!(plain & 0o700, 0o600, "mode {plain:o}");
    }

    #[test]
    fn refuses_to_overwrite_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path();
        fs::create_dir_all(target.join("conf")).unwrap();
        fs::write(target.join("conf/app.yaml"), b"local edit").unwrap();

        let err = extract_assets(&TREE, target).unwrap_err();
        match err {
            HomeError::Extract { path, source } => {
                assert_eq!(path, target.join("conf/app.yaml"));
                assert_eq!(source.kind(), io::ErrorKind::AlreadyExists);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read(target.join("conf/app.yaml")).unwrap(), b"local edit");
    }

    #[test]
    fn second_extraction_into_same_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        extract_assets(&TREE, tmp.path()).unwrap();
        assert!(extract_assets(&TREE, tmp.path()).is_err());
    }

    #[test]
    fn non_regular_entry_fails_fast_with_its_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = extract_assets(&WithOther, tmp.path()).unwrap_err();
        match err {
            HomeError::NotRegularFile { path } => assert_eq!(path, PathBuf::from("fifo")),
            other => panic!("unexpected error: {other}"),
        }
        // Entries before the offending one were already written.
        assert!(tmp.path().join("ok.txt").is_file());
    }

    #[test]
    fn extracts_directory_source() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("empty")).unwrap();
        fs::create_dir_all(src.path().join("nested/deeper")).unwrap();
        fs::write(src.path().join("nested/deeper/data.bin"), [0u8, 1, 2, 3]).unwrap();

        let dst = tempfile::tempdir().unwrap();
        let report = extract_assets(&DirAssets::new(src.path()), dst.path()).unwrap();

        assert_eq!(report.files, 1);
        assert_eq!(report.directories, 3);
        assert!(dst.path().join("empty").is_dir());
        assert_eq!(
            fs::read(dst.path().join("nested/deeper/data.bin")).unwrap(),
            [0u8, 1, 2, 3]
        );
    }
}
