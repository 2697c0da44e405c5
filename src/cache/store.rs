use crate::cache::key::is_hex_digest;
use crate::foundation::error::{ManimlineError, ManimlineResult};
use anyhow::Context as _;
use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One stored value with its expiry metadata.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CacheEntry {
    /// Hex content hash.
    pub key: String,
    /// Opaque payload.
    pub value: serde_json::Value,
    /// Creation time in unix milliseconds.
    pub created_at_ms: u64,
    /// Time to live in milliseconds.
    pub ttl_ms: u64,
}

impl CacheEntry {
    /// Return `true` when `now - created_at > ttl`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > self.ttl_ms
    }
}

/// Summary of a backing store.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Stored entries, expired ones included.
    pub entry_count: usize,
    /// Approximate payload size.
    pub total_bytes: u64,
    /// Human-readable location of the store.
    pub location: String,
}

/// Backing storage for [`ContentCache`](crate::ContentCache).
///
/// Stores know nothing about expiry; the cache evaluates TTLs on access.
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// Load the entry stored under `key`.
    fn load(&self, key: &str) -> ManimlineResult<Option<CacheEntry>>;
    /// Store `entry`, replacing any previous one.
    fn save(&self, entry: CacheEntry) -> ManimlineResult<()>;
    /// Delete the entry under `key`. Returns `false` when absent.
    fn remove(&self, key: &str) -> ManimlineResult<bool>;
    /// Delete every entry and return how many were removed.
    fn clear(&self) -> ManimlineResult<usize>;
    /// Report entry count and size.
    fn stats(&self) -> ManimlineResult<CacheStats>;
}

/// Process-local store backed by a mutex-protected map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panicking writer cannot leave a half-written entry behind.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> ManimlineResult<Option<CacheEntry>> {
        Ok(self.lock().get(key).cloned())
    }

    fn save(&self, entry: CacheEntry) -> ManimlineResult<()> {
        self.lock().insert(entry.key.clone(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> ManimlineResult<bool> {
        Ok(self.lock().remove(key).is_some())
    }

    fn clear(&self) -> ManimlineResult<usize> {
        let mut map = self.lock();
        let n = map.len();
        map.clear();
        Ok(n)
    }

    fn stats(&self) -> ManimlineResult<CacheStats> {
        let map = self.lock();
        let total_bytes = map
            .values()
            .map(|e| e.value.to_string().len() as u64)
            .sum();
        Ok(CacheStats {
            entry_count: map.len(),
            total_bytes,
            location: "memory".to_owned(),
        })
    }
}

/// Directory-backed store: one JSON file per key.
///
/// Files that cannot be parsed are removed and reported as misses.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

const ENTRY_EXT: &str = "json";

impl FileStore {
    /// Use (and create if needed) `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> ManimlineResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create cache dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Per-user default location (`<cache dir>/manimline`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("manimline"))
    }

    /// Directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> ManimlineResult<PathBuf> {
        if !is_hex_digest(key) {
            return Err(ManimlineError::validation(format!(
                "cache key '{key}' is not a hex digest"
            )));
        }
        Ok(self.dir.join(format!("{key}.{ENTRY_EXT}")))
    }

    fn entry_files(&self) -> ManimlineResult<Vec<PathBuf>> {
        let rd = std::fs::read_dir(&self.dir)
            .with_context(|| format!("list cache dir '{}'", self.dir.display()))?;
        let mut out = Vec::new();
        for ent in rd {
            let path = ent?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXT) && path.is_file() {
                out.push(path);
            }
        }
        Ok(out)
    }
}

impl CacheStore for FileStore {
    fn load(&self, key: &str) -> ManimlineResult<Option<CacheEntry>> {
        let path = self.entry_path(key)?;
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read cache entry '{}'", path.display()))
                    .into());
            }
        };
        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.key == key => Ok(Some(entry)),
            Ok(_) => {
                tracing::warn!(key, "cache file holds a different key; removing");
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(key, "unreadable cache file ({e}); removing");
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    fn save(&self, entry: CacheEntry) -> ManimlineResult<()> {
        let path = self.entry_path(&entry.key)?;
        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| ManimlineError::serde(format!("encode cache entry: {e}")))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("create temp file in '{}'", self.dir.display()))?;
        tmp.write_all(&bytes)
            .with_context(|| format!("write cache entry '{}'", tmp.path().display()))?;
        tmp.persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("commit cache entry '{}'", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> ManimlineResult<bool> {
        let path = self.entry_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> ManimlineResult<usize> {
        let files = self.entry_files()?;
        for f in &files {
            std::fs::remove_file(f)
                .with_context(|| format!("remove cache entry '{}'", f.display()))?;
        }
        tracing::info!(removed = files.len(), dir = %self.dir.display(), "cleared cache");
        Ok(files.len())
    }

    fn stats(&self) -> ManimlineResult<CacheStats> {
        let files = self.entry_files()?;
        let mut total_bytes = 0u64;
        for f in &files {
            total_bytes += std::fs::metadata(f)?.len();
        }
        Ok(CacheStats {
            entry_count: files.len(),
            total_bytes,
            location: self.dir.display().to_string(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
