//! In-process response store.
//!
//! Provides a bounded LRU with TTL expiration. Nothing survives the
//! process; useful for replaying within one run and in tests.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::backend::CacheBackend;
use crate::config::MemorySettings;
use crate::error::CacheResult;

/// A stored response with expiration tracking.
#[derive(Debug, Clone)]
struct Entry {
    response: Vec<u8>,
    stored_at: Instant,
}

impl Entry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }
}

/// Thread-safe LRU store with TTL expiration.
///
/// When full, the least recently used entry is evicted. Expired entries
/// are dropped lazily on lookup.
pub struct MemoryBackend {
    inner: Mutex<LruCache<(String, Vec<u8>), Entry>>,
    ttl: Duration,
}

impl MemoryBackend {
    /// Creates a store with the given capacity and TTL.
    pub fn new(settings: &MemorySettings) -> Self {
        let capacity = NonZeroUsize::new(settings.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl: settings.ttl,
        }
    }

    /// Number of entries, possibly including expired ones.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl CacheBackend for MemoryBackend {
    fn lookup(&self, url: &str, key: &[u8]) -> CacheResult<Option<Vec<u8>>> {
        let mut cache = self.inner.lock();
        let slot = (url.to_string(), key.to_vec());
        match cache.get(&slot) {
            Some(entry) if entry.is_expired(self.ttl) => {
                cache.pop(&slot);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.response.clone())),
            None => Ok(None),
        }
    }

    fn store(&self, url: &str, key: &[u8], response: &[u8]) -> CacheResult<()> {
        self.inner.lock().put(
            (url.to_string(), key.to_vec()),
            Entry {
                response: response.to_vec(),
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    fn flush(&self) -> CacheResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn backend(max_entries: usize, ttl: Duration) -> MemoryBackend {
        MemoryBackend::new(&MemorySettings { max_entries, ttl })
    }

    #[test]
    fn test_store_then_lookup() {
        let store = backend(10, Duration::from_secs(60));
        store.store("http://a", b"req", b"resp").unwrap();

        assert_eq!(store.lookup("http://a", b"req").unwrap(), Some(b"resp".to_vec()));
        assert_eq!(store.lookup("http://a", b"other").unwrap(), None);
        assert_eq!(store.lookup("http://b", b"req").unwrap(), None);
    }

    #[test]
    fn test_store_replaces() {
        let store = backend(10, Duration::from_secs(60));
        store.store("u", b"k", b"one").unwrap();
        store.store("u", b"k", b"two").unwrap();
        assert_eq!(store.lookup("u", b"k").unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let store = backend(2, Duration::from_secs(60));
        store.store("u", b"1", b"a").unwrap();
        store.store("u", b"2", b"b").unwrap();
        // Touch 1 so 2 becomes least recently used.
        store.lookup("u", b"1").unwrap();
        store.store("u", b"3", b"c").unwrap();

        assert!(store.lookup("u", b"1").unwrap().is_some());
        assert!(store.lookup("u", b"2").unwrap().is_none());
        assert!(store.lookup("u", b"3").unwrap().is_some());
    }

    #[test]
    fn test_ttl_expiration() {
        let store = backend(10, Duration::from_millis(20));
        store.store("u", b"k", b"v").unwrap();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(store.lookup("u", b"k").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_one_entry() {
        let store = backend(0, Duration::from_secs(60));
        store.store("u", b"k", b"v").unwrap();
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }
}
