//! Core SessionStore implementation

use eyre::{Context, Result};
use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Key naming one session (one conversation per key)
pub type SessionKey = String;

/// Persistent key -> record map, flushed as a whole on every write.
///
/// The store is single-writer: opening takes an exclusive lock file, and all
/// mutation goes through `&mut self`. Callers that need cross-task access
/// own the store from a single task.
pub struct SessionStore<R> {
    /// Snapshot file path
    path: PathBuf,
    /// Lock file handle, held exclusively for the lifetime of the store
    #[allow(dead_code)]
    lock: File,
    /// In-memory view of the last durable snapshot
    records: BTreeMap<SessionKey, R>,
}

impl<R> SessionStore<R>
where
    R: Serialize + DeserializeOwned,
{
    /// Open a store at the given snapshot path, loading the snapshot if one
    /// exists.
    ///
    /// Fails if another process already holds the store open, or if an
    /// existing snapshot cannot be parsed. A corrupt snapshot is an error,
    /// never a silent empty start.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory {}", parent.display()))?;
        }

        let lock_path = lock_path(&path);
        let lock = File::create(&lock_path)
            .with_context(|| format!("Failed to create lock file {}", lock_path.display()))?;
        FileExt::try_lock_exclusive(&lock)
            .with_context(|| format!("Store is locked by another process: {}", lock_path.display()))?;

        let records = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Snapshot is not valid JSON: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        info!(path = %path.display(), records = records.len(), "Opened session store");
        Ok(Self { path, lock, records })
    }

    /// Get the record for a key, if one has been stored.
    pub fn get(&self, key: &str) -> Option<&R> {
        self.records.get(key)
    }

    /// Store a record under a key and flush the whole snapshot.
    ///
    /// Atomic from the caller's perspective: on success the entire updated
    /// map is durable before this returns; on failure the in-memory entry is
    /// rolled back and the prior durable snapshot is untouched.
    pub fn put(&mut self, key: impl Into<SessionKey>, record: R) -> Result<()> {
        let key = key.into();
        let prev = self.records.insert(key.clone(), record);

        if let Err(e) = self.persist() {
            // Roll back so memory never runs ahead of disk
            match prev {
                Some(old) => {
                    self.records.insert(key, old);
                }
                None => {
                    self.records.remove(&key);
                }
            }
            return Err(e);
        }

        debug!(%key, "Persisted record");
        Ok(())
    }

    /// All keys currently stored, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &SessionKey> {
        self.records.keys()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the snapshot: serialize the whole map, stage it next to the
    /// snapshot, fsync, then rename into place.
    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records).context("Failed to serialize snapshot")?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp = File::create(&tmp_path)
            .with_context(|| format!("Failed to create staging file {}", tmp_path.display()))?;
        tmp.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write staging file {}", tmp_path.display()))?;
        tmp.sync_all()
            .with_context(|| format!("Failed to flush staging file {}", tmp_path.display()))?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace snapshot {}", self.path.display()))?;

        // The rename itself must survive a crash too
        #[cfg(unix)]
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            File::open(parent)
                .and_then(|dir| dir.sync_all())
                .with_context(|| format!("Failed to flush store directory {}", parent.display()))?;
        }

        Ok(())
    }
}

/// Lock file path for a snapshot path
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestRecord {
        state: String,
        note: Option<String>,
    }

    fn record(state: &str) -> TestRecord {
        TestRecord {
            state: state.to_string(),
            note: None,
        }
    }

    #[test]
    fn test_open_empty() {
        let temp = TempDir::new().unwrap();
        let store: SessionStore<TestRecord> = SessionStore::open(temp.path().join("sessions.json")).unwrap();

        assert!(store.is_empty());
        assert!(store.get("anyone").is_none());
    }

    #[test]
    fn test_put_and_get() {
        let temp = TempDir::new().unwrap();
        let mut store = SessionStore::open(temp.path().join("sessions.json")).unwrap();

        store.put("chat-1", record("start")).unwrap();
        assert_eq!(store.get("chat-1"), Some(&record("start")));
        assert_eq!(store.len(), 1);

        // Overwrite is a plain put
        store.put("chat-1", record("collect_list")).unwrap();
        assert_eq!(store.get("chat-1"), Some(&record("collect_list")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_roundtrip_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");

        {
            let mut store = SessionStore::open(&path).unwrap();
            store.put("chat-1", record("confirm_send")).unwrap();
            store
                .put(
                    "chat-2",
                    TestRecord {
                        state: "start".to_string(),
                        note: Some("hello".to_string()),
                    },
                )
                .unwrap();
        }

        let store: SessionStore<TestRecord> = SessionStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("chat-1"), Some(&record("confirm_send")));
        assert_eq!(store.get("chat-2").unwrap().note.as_deref(), Some("hello"));
    }

    #[test]
    fn test_missing_snapshot_starts_empty() {
        let temp = TempDir::new().unwrap();
        let store: SessionStore<TestRecord> = SessionStore::open(temp.path().join("nothing-here.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");
        fs::write(&path, "{ not json").unwrap();

        let result: Result<SessionStore<TestRecord>> = SessionStore::open(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_put_rolls_back_memory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("store");
        let path = dir.join("sessions.json");

        let mut store = SessionStore::open(&path).unwrap();
        store.put("chat-1", record("start")).unwrap();

        // Yank the directory out from under the store so the rewrite fails
        fs::remove_dir_all(&dir).unwrap();

        let result = store.put("chat-1", record("collect_list"));
        assert!(result.is_err());

        // The entry still reads as the last durable value
        assert_eq!(store.get("chat-1"), Some(&record("start")));

        let result = store.put("chat-2", record("start"));
        assert!(result.is_err());
        assert!(store.get("chat-2").is_none());
    }

    #[test]
    fn test_second_writer_is_locked_out() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");

        let _store: SessionStore<TestRecord> = SessionStore::open(&path).unwrap();
        let second: Result<SessionStore<TestRecord>> = SessionStore::open(&path);
        assert!(second.is_err());
    }

    #[test]
    fn test_keys_sorted() {
        let temp = TempDir::new().unwrap();
        let mut store = SessionStore::open(temp.path().join("sessions.json")).unwrap();

        store.put("zeta", record("start")).unwrap();
        store.put("alpha", record("start")).unwrap();

        let keys: Vec<_> = store.keys().cloned().collect();
        assert_eq!(keys, vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
