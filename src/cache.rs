//! Optional include cache (spec.md §4.7): compiled units keyed by canonical
//! path, invalidated on mtime change and (if enabled) content-hash mismatch.
//! Grounded on the teacher's general content-addressed caching idiom
//! (`CACHE_POINT`/`CACHE_RESET` in `global/binary_codes.rs` key compiled DXB
//! blocks the same way this keys compiled PHP units) even though the cached
//! artifact itself is unrelated.
//!
//! Concurrent readers must be safe per spec.md §9 ("guarded with a
//! readers-writer lock"); writes take the writer half of an `RwLock`.

use crate::compiler::CompiledUnit;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::SystemTime;

pub struct CacheEntry {
    pub unit: std::rc::Rc<CompiledUnit>,
    pub mtime: SystemTime,
    pub content_hash: u64,
}

/// `None` disables hash validation (mtime-only invalidation); `Some` also
/// rejects entries whose hash no longer matches the freshly-read source.
pub struct IncludeCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl IncludeCache {
    pub fn new(max_entries: usize) -> Self {
        IncludeCache { entries: RwLock::new(HashMap::new()), max_entries }
    }

    /// Returns the cached unit if present, its recorded mtime still matches
    /// `current_mtime`, and (when `current_hash` is given) the content hash
    /// still matches.
    pub fn get(&self, path: &str, current_mtime: SystemTime, current_hash: Option<u64>) -> Option<std::rc::Rc<CompiledUnit>> {
        let entries = self.entries.read().unwrap();
        let entry = entries.get(path)?;
        if entry.mtime != current_mtime {
            return None;
        }
        if let Some(hash) = current_hash {
            if entry.content_hash != hash {
                return None;
            }
        }
        Some(entry.unit.clone())
    }

    pub fn insert(&self, path: String, unit: std::rc::Rc<CompiledUnit>, mtime: SystemTime, content_hash: u64) {
        let mut entries = self.entries.write().unwrap();
        if entries.len() >= self.max_entries && !entries.contains_key(&path) {
            if let Some(oldest_key) = entries.iter().min_by_key(|(_, e)| e.mtime).map(|(k, _)| k.clone()) {
                entries.remove(&oldest_key);
            }
        }
        entries.insert(path, CacheEntry { unit, mtime, content_hash });
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A simple, dependency-free FNV-1a hash, sufficient for cache invalidation
/// (not a cryptographic guarantee).
pub fn content_hash(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;

    fn unit() -> std::rc::Rc<CompiledUnit> {
        std::rc::Rc::new(Compiler::new("<cache-test>").compile(&[]).unwrap())
    }

    #[test]
    fn hit_requires_matching_mtime() {
        let cache = IncludeCache::new(8);
        let mtime = SystemTime::now();
        cache.insert("a.php".to_string(), unit(), mtime, 42);
        assert!(cache.get("a.php", mtime, Some(42)).is_some());
        assert!(cache.get("a.php", mtime + std::time::Duration::from_secs(1), Some(42)).is_none());
    }

    #[test]
    fn hit_requires_matching_hash_when_checked() {
        let cache = IncludeCache::new(8);
        let mtime = SystemTime::now();
        cache.insert("a.php".to_string(), unit(), mtime, 42);
        assert!(cache.get("a.php", mtime, Some(7)).is_none());
        assert!(cache.get("a.php", mtime, None).is_some());
    }

    #[test]
    fn evicts_oldest_entry_when_full() {
        let cache = IncludeCache::new(1);
        let base = SystemTime::now();
        cache.insert("old.php".to_string(), unit(), base, 1);
        cache.insert("new.php".to_string(), unit(), base + std::time::Duration::from_secs(10), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("old.php", base, Some(1)).is_none());
        assert!(cache.get("new.php", base + std::time::Duration::from_secs(10), Some(2)).is_some());
    }
}
