use hearth_home::{
    AppHome, AssetEntry, AssetSource, HomeError, StaticAsset, StaticAssets, Version,
};
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

static FILES: StaticAssets = StaticAssets::new(&[
    StaticAsset::file("a.txt", b"a"),
    StaticAsset::file("dir/b.txt", b"b"),
]);

/// Asset source that records how many extractions are running at once.
#[derive(Clone)]
struct CountingAssets {
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    walks: Arc<AtomicUsize>,
}

impl AssetSource for CountingAssets {
    fn walk(&self) -> Result<Vec<AssetEntry>, HomeError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.walks.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which an unserialized caller would overlap.
        thread::sleep(Duration::from_millis(20));
        self.active.fetch_sub(1, Ordering::SeqCst);
        FILES.walk()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        FILES.open(path)
    }
}

#[test]
fn concurrent_prepares_never_overlap() {
    let tmp = tempfile::tempdir().unwrap();
    let source = CountingAssets {
        active: Arc::new(AtomicUsize::new(0)),
        max_active: Arc::new(AtomicUsize::new(0)),
        walks: Arc::new(AtomicUsize::new(0)),
    };

    let threads = 6;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads as u64)
        .map(|i| {
            let home = tmp.path().to_path_buf();
            let source = source.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let app = AppHome::new("demo", home, Version::new(1, i, 0), source);
                barrier.wait();
                app.prepare().unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(source.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(source.walks.load(Ordering::SeqCst), threads);

    // The stamped version is always fully present.
    let stamped = std::fs::read_to_string(tmp.path().join("version")).unwrap();
    let dir = tmp.path().join("assets").join(&stamped);
    assert_eq!(std::fs::read(dir.join("a.txt")).unwrap(), b"a");
    assert_eq!(std::fs::read(dir.join("dir/b.txt")).unwrap(), b"b");
}

#[test]
fn concurrent_prepares_of_same_version_extract_once() {
    let tmp = tempfile::tempdir().unwrap();
    let source = CountingAssets {
        active: Arc::new(AtomicUsize::new(0)),
        max_active: Arc::new(AtomicUsize::new(0)),
        walks: Arc::new(AtomicUsize::new(0)),
    };

    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let home = tmp.path().to_path_buf();
            let source = source.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let app = AppHome::new("demo", home, Version::new(3, 0, 0), source);
                barrier.wait();
                app.prepare().unwrap().extracted.is_some()
            })
        })
        .collect();
    let extracted: usize = handles
        .into_iter()
        .map(|handle| usize::from(handle.join().unwrap()))
        .sum();

    assert_eq!(extracted, 1);
    assert_eq!(source.walks.load(Ordering::SeqCst), 1);
}
