use super::*;
use crate::kernel::services::ports::ErrorKind;
use crate::kernel::services::ports::file::{DirEntry, Result};
use crate::test_support::{runtime, MemoryFs};
use std::sync::mpsc;
use std::time::Duration;

fn loader_with(fs: Arc<MemoryFs>, capacity: usize) -> AssetLoader {
    AssetLoader::new(fs, capacity)
}

#[test]
fn media_subtype_follows_extension() {
    assert_eq!(media_subtype(Path::new("/a/b.PNG")), "png");
    assert_eq!(media_subtype(Path::new("/a/b.jpg")), "jpeg");
    assert_eq!(media_subtype(Path::new("/a/b.svg")), "svg+xml");
    assert_eq!(media_subtype(Path::new("/a/b")), "png");
    assert_eq!(media_subtype(Path::new("/a/b.xyz")), "png");
}

#[test]
fn encodes_as_data_uri() {
    assert_eq!(
        encode_data_uri(Path::new("x.gif"), b"hi"),
        "data:image/gif;base64,aGk="
    );
}

#[test]
fn second_load_is_a_cache_hit_without_io() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/x.png", vec![1u8, 2, 3]);
    let loader = loader_with(fs.clone(), 16);
    let rt = runtime();

    let first = rt.block_on(loader.load(Path::new("/ws/x.png"))).unwrap();
    let second = rt.block_on(loader.load(Path::new("/ws/x.png"))).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, "data:image/png;base64,AQID");
    assert_eq!(fs.read_calls(), 1);
}

#[test]
fn cache_is_not_invalidated_by_file_changes() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/x.png", vec![1u8]);
    let loader = loader_with(fs.clone(), 16);
    let rt = runtime();

    let before = rt.block_on(loader.load(Path::new("/ws/x.png"))).unwrap();
    fs.add_file("/ws/x.png", vec![9u8, 9]);
    let after = rt.block_on(loader.load(Path::new("/ws/x.png"))).unwrap();
    assert_eq!(before, after);

    loader.invalidate_all();
    let reloaded = rt.block_on(loader.load(Path::new("/ws/x.png"))).unwrap();
    assert_ne!(before, reloaded);
    assert_eq!(fs.read_calls(), 2);
}

#[test]
fn failures_are_typed_and_not_cached() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/locked.png", vec![1u8]);
    fs.deny("/ws/locked.png");
    let loader = loader_with(fs.clone(), 16);
    let rt = runtime();

    let missing = rt
        .block_on(loader.load_or_fallback(Path::new("/ws/missing.png"), "missing.png"))
        .unwrap_err();
    assert_eq!(missing.kind, ErrorKind::NotFound);
    assert_eq!(missing.fallback, "missing.png");

    let denied = rt
        .block_on(loader.load(Path::new("/ws/locked.png")))
        .unwrap_err();
    assert_eq!(denied.kind(), ErrorKind::PermissionDenied);

    fs.allow("/ws/locked.png");
    assert!(rt.block_on(loader.load(Path::new("/ws/locked.png"))).is_ok());
    assert_eq!(loader.cached_len(), 1);
}

#[test]
fn duplicate_in_flight_loads_are_tolerated_not_deduplicated() {
    let fs = Arc::new(MemoryFs::with_root("/ws"));
    fs.add_file("/ws/x.png", vec![4u8, 5]);
    let loader = Arc::new(loader_with(fs.clone(), 16));
    let rt = runtime();

    let (a, b) = rt.block_on(async {
        let l1 = Arc::clone(&loader);
        let l2 = Arc::clone(&loader);
        let h1 = tokio::spawn(async move { l1.load(Path::new("/ws/x.png")).await });
        let h2 = tokio::spawn(async move { l2.load(Path::new("/ws/x.png")).await });
        (h1.await.unwrap().unwrap(), h2.await.unwrap().unwrap())
    });

    assert_eq!(a, b);
    assert!((1..=2).contains(&fs.read_calls()));
    assert_eq!(loader.cached_len(), 1);
}

#[test]
fn lru_cache_evicts_least_recently_used() {
    let mut cache = LoadCache::new(2);
    cache.insert(PathBuf::from("/a"), "A".into());
    cache.insert(PathBuf::from("/b"), "B".into());
    assert_eq!(cache.get(Path::new("/a")).as_deref(), Some("A"));

    cache.insert(PathBuf::from("/c"), "C".into());
    assert_eq!(cache.len(), 2);
    assert!(cache.get(Path::new("/b")).is_none());
    assert!(cache.get(Path::new("/a")).is_some());
    assert!(cache.get(Path::new("/c")).is_some());

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn zero_capacity_is_unbounded() {
    let mut cache = LoadCache::new(0);
    for i in 0..100 {
        cache.insert(PathBuf::from(format!("/{i}")), String::new());
    }
    assert_eq!(cache.len(), 100);
}

/// Delegates to a [`MemoryFs`], holding each binary read until released.
struct GatedFs {
    inner: MemoryFs,
    started: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl FileProvider for GatedFs {
    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        self.inner.list_directory(path)
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        self.inner.read_text(path)
    }

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>> {
        self.started.lock().unwrap().send(()).unwrap();
        self.release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        self.inner.read_binary(path)
    }

    fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        self.inner.write_text(path, content)
    }

    fn create_file(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        self.inner.create_file(parent, name)
    }

    fn create_directory(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        self.inner.create_directory(parent, name)
    }

    fn import_file(&self, dest_dir: &Path) -> Result<PathBuf> {
        self.inner.import_file(dest_dir)
    }

    fn pick_directory(&self) -> Result<PathBuf> {
        self.inner.pick_directory()
    }
}

#[test]
fn load_in_flight_during_invalidate_is_not_cached() {
    let inner = MemoryFs::with_root("/ws");
    inner.add_file("/ws/x.png", vec![7u8]);
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let fs = Arc::new(GatedFs {
        inner,
        started: Mutex::new(started_tx),
        release: Mutex::new(release_rx),
    });
    let loader = Arc::new(AssetLoader::new(fs, 16));
    let rt = runtime();

    let task = {
        let loader = Arc::clone(&loader);
        rt.spawn(async move { loader.load(Path::new("/ws/x.png")).await })
    };
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    loader.invalidate_all();
    release_tx.send(()).unwrap();

    let loaded = rt.block_on(task).unwrap().unwrap();
    assert_eq!(loaded, "data:image/png;base64,Bw==");
    assert_eq!(loader.cached_len(), 0);
}

#[test]
fn clear_rejects_inserts_from_an_older_generation() {
    let mut cache = LoadCache::new(4);
    let before = cache.generation();
    cache.clear();
    assert_eq!(cache.generation(), before + 1);

    assert!(!cache.insert_if_current(before, PathBuf::from("/a"), "A".into()));
    assert!(cache.is_empty());
    assert!(cache.insert_if_current(cache.generation(), PathBuf::from("/a"), "A".into()));
    assert_eq!(cache.len(), 1);
}
