use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;

use crate::Rank;

/// Default number of pieces kept by a codec's cache.
pub const DEFAULT_CACHE_SIZE: usize = 8192;

/// Strict-LRU memo of piece text → token ids.
///
/// Keys are the exact regex-matched fragments. The lock is the only
/// synchronization inside a codec; a poisoned lock is recovered since the cache
/// only memoizes pure results.
pub struct PieceCache {
    inner: Mutex<LruCache<String, Vec<Rank>>>,
    capacity: usize,
}

impl PieceCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        PieceCache {
            inner: Mutex::new(LruCache::new(cap)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<Rank>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the cached ids and marks the piece most recently used.
    pub fn lookup(&self, piece: &str) -> Option<Vec<Rank>> {
        self.lock().get(piece).cloned()
    }

    /// Stores the ids, evicting the least recently used piece when full.
    pub fn insert(&self, piece: &str, tokens: &[Rank]) {
        self.lock().put(piece.to_string(), tokens.to_vec());
    }

    pub fn contains(&self, piece: &str) -> bool {
        self.lock().contains(piece)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for PieceCache {
    fn default() -> Self {
        PieceCache::new(DEFAULT_CACHE_SIZE)
    }
}
