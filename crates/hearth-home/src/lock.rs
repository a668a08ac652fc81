use fs2::FileExt as _;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::error::{HomeError, Result};

/// Exclusive lock over an application home, shared across processes.
///
/// The OS advisory lock on the lock file is the real primitive: if the holder
/// dies, the kernel drops it and the next process proceeds. The lock is
/// released when the value is dropped.
#[derive(Debug)]
pub struct HomeLock {
    file: File,
    path: PathBuf,
    // `fs2` locks are process-scoped on Unix and don't exclude other threads of
    // the same process, so threads also serialize on a per-path mutex.
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl HomeLock {
    /// Blocks until the home lock at `path` is held, creating the lock file if needed.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_error = |source| HomeError::Lock {
            path: path.to_path_buf(),
            source,
        };

        let home = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(home).map_err(lock_error)?;
        let key = lock_key(home, path).map_err(lock_error)?;

        let guard = process_lock_for_home(key)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(lock_error)?;
        if file.try_lock_exclusive().is_err() {
            tracing::debug!(
                target = "hearth.home",
                path = %path.display(),
                "home is locked by another process, waiting"
            );
            file.lock_exclusive().map_err(lock_error)?;
        }

        tracing::debug!(target = "hearth.home", path = %path.display(), "acquired home lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for HomeLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::debug!(
                target = "hearth.home",
                path = %self.path.display(),
                error = %err,
                "failed to unlock home lock; closing the file releases it"
            );
        }
    }
}

/// Identifies a lock file independently of how its path was spelled, so
/// `home/lock` and `./home/lock` share one in-process mutex.
fn lock_key(home: &Path, path: &Path) -> std::io::Result<PathBuf> {
    let home = home.canonicalize()?;
    Ok(match path.file_name() {
        Some(name) => home.join(name),
        None => home,
    })
}

fn process_lock_for_home(key: PathBuf) -> &'static Mutex<()> {
    static HOME_LOCKS: OnceLock<Mutex<HashMap<PathBuf, &'static Mutex<()>>>> = OnceLock::new();

    let mut homes = HOME_LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *homes.entry(key).or_insert_with(|| {
        let mutex: &'static Mutex<()> = Box::leak(Box::new(Mutex::new(())));
        mutex
    })
}
