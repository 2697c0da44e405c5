use crate::cache::key::CacheKey;
use crate::cache::store::{CacheEntry, CacheStats, CacheStore, MemoryStore};
use crate::foundation::error::ManimlineResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// One day in milliseconds.
pub const DEFAULT_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// Time source used for TTL evaluation.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time in unix milliseconds.
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock frozen at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(now_ms),
        }
    }

    /// Jump to `now_ms`.
    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Move forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// TTLs per entry type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CacheTtls {
    /// Lifetime of generated code fragments.
    pub code_gen_ms: u64,
    /// Lifetime of transcripts.
    pub transcription_ms: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            code_gen_ms: DEFAULT_TTL_MS,
            transcription_ms: DEFAULT_TTL_MS,
        }
    }
}

/// Content-addressed cache handle.
///
/// Cloning is cheap and every clone shares the same backing store. Expired entries are evicted
/// lazily on access; nothing sweeps in the background. Concurrent writers race and the last
/// `put` wins.
#[derive(Clone, Debug)]
pub struct ContentCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttls: CacheTtls,
}

impl ContentCache {
    /// Cache over `store` using the wall clock and default TTLs.
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self::with_store(Arc::new(store))
    }

    /// Cache over an already shared store.
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttls: CacheTtls::default(),
        }
    }

    /// Fresh in-memory cache.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the per-type TTLs.
    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    /// Configured TTLs.
    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    /// Look up `key`. Absent, expired and unreadable entries are misses.
    pub fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let entry = match self.store.load(key.as_str()) {
            Ok(Some(e)) => e,
            Ok(None) => {
                tracing::debug!(%key, "cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(%key, "cache read failed: {e}");
                return None;
            }
        };
        if entry.is_expired(self.clock.now_ms()) {
            tracing::debug!(%key, "cache entry expired");
            if let Err(e) = self.store.remove(key.as_str()) {
                tracing::warn!(%key, "failed to evict expired entry: {e}");
            }
            return None;
        }
        tracing::debug!(%key, "cache hit");
        Some(entry.value)
    }

    /// Store `value` under `key`, overwriting unconditionally.
    pub fn put(&self, key: &CacheKey, value: serde_json::Value, ttl_ms: u64) -> ManimlineResult<()> {
        self.store.save(CacheEntry {
            key: key.as_str().to_owned(),
            value,
            created_at_ms: self.clock.now_ms(),
            ttl_ms,
        })
    }

    /// Drop the entry under `key`. Reserved for callers that caught a corrupted value.
    pub(crate) fn invalidate(&self, key: &CacheKey) -> bool {
        match self.store.remove(key.as_str()) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(%key, "failed to invalidate entry: {e}");
                false
            }
        }
    }

    /// Backing store summary.
    pub fn stats(&self) -> ManimlineResult<CacheStats> {
        self.store.stats()
    }

    /// Delete every entry.
    pub fn clear(&self) -> ManimlineResult<usize> {
        self.store.clear()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/content.rs"]
mod tests;
