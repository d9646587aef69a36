use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::cache::segment::{CacheEntry, CacheSegment};
use crate::error::TransportError;
use crate::helpers::time::{hours_to_ms, now_ms};

const LOCK_RETRY: Duration = Duration::from_millis(10);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
/// A lock file older than this is left over by a crashed writer.
const LOCK_STALE_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    cache_value: String,
    expires_at_ms: i64,
}

type FileDocument = HashMap<String, FileEntry>;

/// Cache segment stored as one json document on disk.
///
/// Several processes pointing at the same path share tokens. Writers take
/// `<path>.lock` (created exclusively) for the whole read, merge, write cycle
/// and replace the document through a uniquely named temporary file, so
/// readers only ever see a complete document.
#[derive(Debug, Clone)]
pub struct FileSegment {
    path: Arc<PathBuf>,
    lock_path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

/// Held while this process owns `<path>.lock`; removes the file on drop.
struct LockFile {
    path: PathBuf,
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release cache lock");
        }
    }
}

impl FileSegment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let mut lock_path = OsString::from(path.as_os_str());
        lock_path.push(".lock");
        Self {
            path: Arc::new(path),
            lock_path: Arc::new(PathBuf::from(lock_path)),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> TransportError {
        TransportError::cache(format!("{} {}: {}", action, self.path.display(), e))
    }

    async fn acquire_lock(&self) -> Result<LockFile, TransportError> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            let created = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.lock_path.as_path())
                .await;
            match created {
                Ok(_) => return Ok(LockFile { path: self.lock_path.to_path_buf() }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if self.lock_is_stale().await {
                        warn!(path = %self.lock_path.display(), "removing stale cache lock");
                        let _ = fs::remove_file(self.lock_path.as_path()).await;
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(TransportError::cache(format!(
                            "timed out waiting for {}",
                            self.lock_path.display()
                        )));
                    }
                    sleep(LOCK_RETRY).await;
                }
                Err(e) => return Err(self.io_error("lock", e)),
            }
        }
    }

    async fn lock_is_stale(&self) -> bool {
        let modified = match fs::metadata(self.lock_path.as_path()).await {
            Ok(metadata) => metadata.modified(),
            Err(_) => return false,
        };
        modified
            .ok()
            .and_then(|at| SystemTime::now().duration_since(at).ok())
            .is_some_and(|age| age > LOCK_STALE_AFTER)
    }

    async fn read_document(&self) -> Result<FileDocument, TransportError> {
        let content = match fs::read_to_string(self.path.as_path()).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileDocument::new()),
            Err(e) => return Err(self.io_error("read", e)),
        };
        if content.trim().is_empty() {
            return Ok(FileDocument::new());
        }
        serde_json::from_str(&content).or_else(|e| {
            // a foreign file is treated as empty and rewritten on next put
            warn!(path = %self.path.display(), error = %e, "cache file is not a valid document");
            Ok(FileDocument::new())
        })
    }

    async fn write_document(&self, dir: PathBuf, document: &FileDocument) -> Result<(), TransportError> {
        let body = serde_json::to_vec(document)
            .map_err(|e| TransportError::cache(format!("encode cache document: {}", e)))?;
        let path = self.path.to_path_buf();

        let written = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                tmp.as_file().set_permissions(std::fs::Permissions::from_mode(0o600))?;
            }
            tmp.write_all(&body)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| TransportError::cache(format!("cache writer task failed: {}", e)))?;

        written.map_err(|e| self.io_error("write", e))
    }
}

impl CacheSegment for FileSegment {
    async fn get(&self, key: &str) -> Result<CacheEntry, TransportError> {
        let document = self.read_document().await?;
        let entry = document
            .get(key)
            .filter(|entry| now_ms() < entry.expires_at_ms)
            .map(|entry| CacheEntry::hit(entry.cache_value.clone()))
            .unwrap_or_else(CacheEntry::miss);
        Ok(entry)
    }

    async fn put(&self, key: &str, value: &Value, ttl_hours: u64) -> Result<(), TransportError> {
        let _guard = self.write_lock.lock().await;
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).await.map_err(|e| self.io_error("create dir for", e))?;
        let _lock = self.acquire_lock().await?;

        let now = now_ms();
        let mut document = self.read_document().await?;
        document.retain(|_, entry| now < entry.expires_at_ms);
        document.insert(
            key.to_owned(),
            FileEntry {
                cache_value: value.to_string(),
                expires_at_ms: now.saturating_add(hours_to_ms(ttl_hours)),
            },
        );
        debug!(path = %self.path.display(), entries = document.len(), "writing cache file");
        self.write_document(dir, &document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let segment = FileSegment::new(dir.path().join("cache.json"));
        assert_eq!(segment.get("k").await.unwrap(), CacheEntry::miss());
    }

    #[tokio::test]
    async fn entries_are_visible_to_another_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let writer = FileSegment::new(&path);
        writer.put("ZC_CONN_crm:cd1b9", &json!({"access_token": "abc"}), 1).await.unwrap();

        let reader = FileSegment::new(&path);
        let entry = reader.get("ZC_CONN_crm:cd1b9").await.unwrap();
        let value: Value = serde_json::from_str(entry.cache_value.as_deref().unwrap()).unwrap();
        assert_eq!(value["access_token"], "abc");
        assert!(!path.with_extension("json.lock").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cache_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let segment = FileSegment::new(dir.path().join("cache.json"));
        segment.put("k", &json!(1), 1).await.unwrap();

        let mode = std::fs::metadata(segment.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[tokio::test]
    async fn garbage_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{{ not json").unwrap();

        let segment = FileSegment::new(&path);
        assert_eq!(segment.get("k").await.unwrap(), CacheEntry::miss());
        segment.put("k", &json!("v"), 1).await.unwrap();
        assert_eq!(segment.get("k").await.unwrap(), CacheEntry::hit("\"v\"".into()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn independent_writers_keep_each_others_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let first = FileSegment::new(&path);
        let second = FileSegment::new(&path);

        for round in 0..25 {
            let (a, b) = tokio::join!(
                tokio::spawn({
                    let first = first.clone();
                    async move { first.put(&format!("a{}", round), &json!(round), 1).await }
                }),
                tokio::spawn({
                    let second = second.clone();
                    async move { second.put(&format!("b{}", round), &json!(round), 1).await }
                }),
            );
            a.unwrap().unwrap();
            b.unwrap().unwrap();
        }

        let reader = FileSegment::new(&path);
        for round in 0..25 {
            for prefix in ["a", "b"] {
                let entry = reader.get(&format!("{}{}", prefix, round)).await.unwrap();
                assert_eq!(entry, CacheEntry::hit(round.to_string()), "{}{} lost", prefix, round);
            }
        }
        assert!(!path.with_extension("json.lock").exists());
    }

    #[tokio::test]
    async fn stale_lock_is_taken_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let lock = path.with_extension("json.lock");
        let file = std::fs::File::create(&lock).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(120)).unwrap();
        drop(file);

        let segment = FileSegment::new(&path);
        segment.put("k", &json!("v"), 1).await.unwrap();
        assert_eq!(segment.get("k").await.unwrap(), CacheEntry::hit("\"v\"".into()));
        assert!(!lock.exists());
    }
}
