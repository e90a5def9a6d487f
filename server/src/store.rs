use crate::error::{Result, StoreError};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tokio::{io::AsyncWriteExt, sync::RwLock};

// ── Store ──────────────────────────────────────────────────────────────────

/// Key → target mapping persisted as a flat JSON object.
///
/// A single read/write lock guards both the entries and the bound filename.
/// `add` and `load` take the write half; `get` and `save` take the read half,
/// so saves run alongside lookups but never alongside a mutation.
///
/// Nothing is written to disk until [`Store::save`] is called.
#[derive(Debug)]
pub struct Store {
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    filename: PathBuf,
    entries: HashMap<String, String>,
}

impl Store {
    /// Create an empty store bound to `filename`.
    pub fn new(filename: impl Into<PathBuf>) -> Result<Self> {
        let filename = filename.into();
        if filename.as_os_str().is_empty() {
            return Err(StoreError::InvalidArgument("Empty Filename"));
        }

        Ok(Self {
            inner: RwLock::new(Inner {
                filename,
                entries: HashMap::new(),
            }),
        })
    }

    /// Replace every entry with the contents of `filename`.
    ///
    /// An empty `filename` falls back to the bound one; a non-empty one
    /// becomes the new bound filename. The current entries are kept if the
    /// file cannot be read or parsed.
    pub async fn load(&self, filename: impl AsRef<Path>) -> Result<()> {
        let mut inner = self.inner.write().await;
        let path = pick_filename(filename.as_ref(), &inner.filename)?;
        inner.filename = path.clone();

        let data = tokio::fs::read(&path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        let mut entries: HashMap<String, String> = serde_json::from_slice(&data)
            .map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;

        let before = entries.len();
        entries.retain(|key, target| !key.is_empty() && !target.is_empty());
        if entries.len() != before {
            tracing::warn!(
                "Dropped {} empty entr(ies) while loading {}",
                before - entries.len(),
                path.display()
            );
        }

        inner.entries = entries;
        tracing::info!(
            "Loaded {} link(s) from {}",
            inner.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Write every entry to `filename` (or the bound filename when empty).
    pub async fn save(&self, filename: impl AsRef<Path>) -> Result<()> {
        let inner = self.inner.read().await;
        let path = pick_filename(filename.as_ref(), &inner.filename)?;

        let data = serde_json::to_vec(&inner.entries).map_err(StoreError::Serialization)?;

        write_file(&path, &data)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Saved {} link(s) to {}", inner.entries.len(), path.display());
        Ok(())
    }

    /// Register `target` under `key`. The first write for a key wins.
    pub async fn add(&self, key: &str, target: &str) -> Result<()> {
        match (key.is_empty(), target.is_empty()) {
            (true, true) => {
                return Err(StoreError::InvalidArgument(
                    "Provided Key and Value are empty",
                ))
            }
            (true, false) => return Err(StoreError::InvalidArgument("Provided Key is empty")),
            (false, true) => return Err(StoreError::InvalidArgument("Provided Value is empty")),
            (false, false) => {}
        }

        let mut inner = self.inner.write().await;
        match inner.entries.get(key) {
            Some(existing) if !existing.is_empty() => Err(StoreError::KeyConflict),
            _ => {
                inner.entries.insert(key.to_owned(), target.to_owned());
                Ok(())
            }
        }
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub async fn remove(&self, key: &str) -> bool {
        self.inner.write().await.entries.remove(key).is_some()
    }

    /// Look up the target registered for `key`.
    pub async fn get(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(StoreError::InvalidArgument("Provided Key is empty"));
        }

        let inner = self.inner.read().await;
        match inner.entries.get(key) {
            Some(target) if !target.is_empty() => Ok(target.clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    /// Number of stored links.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// The filename used when `load`/`save` are called with an empty path.
    pub async fn filename(&self) -> PathBuf {
        self.inner.read().await.filename.clone()
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn pick_filename(requested: &Path, bound: &Path) -> Result<PathBuf> {
    let path = if requested.as_os_str().is_empty() {
        bound
    } else {
        requested
    };

    if path.as_os_str().is_empty() {
        return Err(StoreError::InvalidArgument("Empty Filename"));
    }
    Ok(path.to_path_buf())
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o755);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const FILE_CONTENT: &str = r#"{"key1":"value1","key2":"value2"}"#;

    fn temp_db() -> PathBuf {
        std::env::temp_dir().join(format!("shortlink_store_{}.db", uuid::Uuid::new_v4()))
    }

    #[test]
    fn new_binds_filename() {
        let store = Store::new("./test.db").unwrap();
        assert_eq!(store.inner.try_read().unwrap().filename, Path::new("./test.db"));
        assert!(store.inner.try_read().unwrap().entries.is_empty());
    }

    #[test]
    fn new_rejects_empty_filename() {
        let err = Store::new("").unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "Empty Filename");
    }

    #[tokio::test]
    async fn add_rejects_empty_arguments() {
        let store = Store::new("./test.db").unwrap();

        let err = store.add("", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Provided Key and Value are empty");

        let err = store.add("", "value").await.unwrap_err();
        assert_eq!(err.to_string(), "Provided Key is empty");

        let err = store.add("key", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Provided Value is empty");

        assert!(store.is_empty().await);
        store.add("key", "value").await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn add_keeps_first_value() {
        let store = Store::new("./test.db").unwrap();

        store.add("key", "first_value").await.unwrap();
        let err = store.add("key", "second_value").await.unwrap_err();

        assert!(matches!(err, StoreError::KeyConflict));
        assert_eq!(err.to_string(), "Key is already in use");
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("key").await.unwrap(), "first_value");
    }

    #[tokio::test]
    async fn get_errors() {
        let store = Store::new("./test.db").unwrap();
        store.add("key", "value").await.unwrap();

        let err = store.get("").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        let err = store.get("fail").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert_eq!(err.to_string(), "No value found for provided key");
    }

    #[tokio::test]
    async fn get_returns_target() {
        let store = Store::new("./test.db").unwrap();
        store.add("key", "value").await.unwrap();

        assert_eq!(store.get("key").await.unwrap(), "value");
    }

    #[tokio::test]
    async fn save_falls_back_to_bound_filename() {
        let path = temp_db();
        let store = Store::new(&path).unwrap();

        store.save("").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "{}");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn save_writes_flat_object() {
        let path = temp_db();
        let store = Store::new(&path).unwrap();
        store.add("key1", "value1").await.unwrap();
        store.add("key2", "value2").await.unwrap();

        store.save("").await.unwrap();

        let written: HashMap<String, String> =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        let expected: HashMap<String, String> = serde_json::from_str(FILE_CONTENT).unwrap();
        assert_eq!(written, expected);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_sets_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_db();
        let store = Store::new(&path).unwrap();
        store.save("").await.unwrap();

        let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode();
        // umask may clear group/other bits, but the owner can always read it back.
        assert_eq!(mode & 0o700, 0o700);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn load_replaces_entries() {
        let path = temp_db();
        tokio::fs::write(&path, FILE_CONTENT).await.unwrap();

        let store = Store::new("./unused.db").unwrap();
        store.add("stale", "gone").await.unwrap();
        store.load(&path).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.get("key2").await.unwrap(), "value2");
        assert!(matches!(store.get("stale").await, Err(StoreError::NotFound)));
        assert_eq!(store.filename().await, path);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn load_failure_keeps_entries() {
        let path = temp_db();
        let store = Store::new(&path).unwrap();
        store.add("key", "value").await.unwrap();

        let err = store.load("").await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        tokio::fs::write(&path, "[1, 2, 3]").await.unwrap();
        let err = store.load("").await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));

        assert_eq!(store.get("key").await.unwrap(), "value");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn load_drops_empty_entries() {
        let path = temp_db();
        tokio::fs::write(&path, r#"{"":"x","blank":"","ok":"target"}"#)
            .await
            .unwrap();

        let store = Store::new(&path).unwrap();
        store.load("").await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("ok").await.unwrap(), "target");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn save_then_load_round_trip() {
        let path = temp_db();
        let store = Store::new(&path).unwrap();
        store.add("a", "https://a.example").await.unwrap();
        store.add("b", "https://b.example").await.unwrap();
        store.save("").await.unwrap();

        let reloaded = Store::new(&path).unwrap();
        reloaded.load("").await.unwrap();

        assert_eq!(reloaded.len().await, 2);
        assert_eq!(reloaded.get("a").await.unwrap(), "https://a.example");
        assert_eq!(reloaded.get("b").await.unwrap(), "https://b.example");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn concurrent_adds_and_gets() {
        let store = Arc::new(Store::new("./test.db").unwrap());
        let mut handles = vec![];

        for i in 0..10u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .add(&format!("code-{i:03}"), &format!("https://example{i}.com"))
                    .await
                    .unwrap();
            }));
        }

        for i in 0..10u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let _ = store.get(&format!("code-{i:03}")).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 10);
        for i in 0..10u64 {
            assert_eq!(
                store.get(&format!("code-{i:03}")).await.unwrap(),
                format!("https://example{i}.com")
            );
        }
    }

    #[tokio::test]
    async fn remove_drops_entry() {
        let store = Store::new("./test.db").unwrap();
        store.add("key", "value").await.unwrap();

        assert!(store.remove("key").await);
        assert!(!store.remove("key").await);
        assert!(matches!(store.get("key").await, Err(StoreError::NotFound)));

        store.add("key", "other").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), "other");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn save_snapshots_while_adding() {
        const LINKS: usize = 200;

        let path = temp_db();
        let store = Arc::new(Store::new(&path).unwrap());
        let mut writers = vec![];

        for i in 0..LINKS {
            let store = Arc::clone(&store);
            writers.push(tokio::spawn(async move {
                store
                    .add(&format!("code-{i:03}"), &format!("https://example{i}.com"))
                    .await
                    .unwrap();
            }));
        }

        // One saver, so no two writes to the file overlap.
        for _ in 0..20 {
            store.save("").await.unwrap();

            let snapshot = Store::new(&path).unwrap();
            snapshot.load("").await.unwrap();
            let inner = snapshot.inner.read().await;
            for (key, target) in &inner.entries {
                let i: usize = key.trim_start_matches("code-").parse().unwrap();
                assert_eq!(target, &format!("https://example{i}.com"));
            }
            tokio::task::yield_now().await;
        }

        for writer in writers {
            writer.await.unwrap();
        }
        store.save("").await.unwrap();

        let reloaded = Store::new(&path).unwrap();
        reloaded.load("").await.unwrap();
        assert_eq!(reloaded.len().await, LINKS);
        for i in 0..LINKS {
            assert_eq!(
                reloaded.get(&format!("code-{i:03}")).await.unwrap(),
                format!("https://example{i}.com")
            );
        }

        let _ = tokio::fs::remove_file(&path).await;
    }
}
