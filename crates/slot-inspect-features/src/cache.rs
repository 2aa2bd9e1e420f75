//! Small LRU of extracted reference features keyed by image content.

use crate::FeatureSet;
use slot_inspect_core::GrayImageView;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

/// Content fingerprint of a grayscale image: dimensions plus every byte.
pub fn fingerprint(img: &GrayImageView<'_>) -> u64 {
    let mut h = DefaultHasher::new();
    img.width.hash(&mut h);
    img.height.hash(&mut h);
    img.data.hash(&mut h);
    h.finish()
}

/// Hit/miss counters since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Inner {
    // most recently used first
    entries: Vec<(u64, Arc<FeatureSet>)>,
    hits: u64,
    misses: u64,
}

/// Thread-safe bounded cache of [`FeatureSet`]s.
///
/// Concurrent callers may compute the same entry twice on a miss; the
/// second insert simply refreshes it.
#[derive(Debug)]
pub struct FeatureCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl FeatureCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // The cache holds no invariants a panicking holder could break.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: u64) -> Option<Arc<FeatureSet>> {
        let mut inner = self.lock();
        match inner.entries.iter().position(|(k, _)| *k == key) {
            Some(pos) => {
                let entry = inner.entries.remove(pos);
                let value = Arc::clone(&entry.1);
                inner.entries.insert(0, entry);
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, key: u64, value: Arc<FeatureSet>) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.lock();
        inner.entries.retain(|(k, _)| *k != key);
        inner.entries.insert(0, (key, value));
        let cap = self.capacity;
        inner.entries.truncate(cap);
    }

    /// Look up `key`, computing and inserting on a miss. Errors are not cached.
    pub fn get_or_try_insert<E>(
        &self,
        key: u64,
        compute: impl FnOnce() -> Result<FeatureSet, E>,
    ) -> Result<Arc<FeatureSet>, E> {
        if let Some(hit) = self.get(key) {
            log::trace!("feature cache hit {key:016x}");
            return Ok(hit);
        }
        let value = Arc::new(compute()?);
        self.insert(key, Arc::clone(&value));
        Ok(value)
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
        }
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl Default for FeatureCache {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slot_inspect_core::GrayImage;

    fn set(n: usize) -> FeatureSet {
        FeatureSet {
            keypoints: Vec::new(),
            descriptors: vec![crate::Descriptor([n as u64; 4]); n],
        }
    }

    #[test]
    fn fingerprint_depends_on_content_and_shape() {
        let a = GrayImage {
            width: 4,
            height: 2,
            data: vec![1; 8],
        };
        let b = GrayImage {
            width: 2,
            height: 4,
            data: vec![1; 8],
        };
        let mut c = a.clone();
        c.data[7] = 2;
        assert_eq!(fingerprint(&a.view()), fingerprint(&a.clone().view()));
        assert_ne!(fingerprint(&a.view()), fingerprint(&b.view()));
        assert_ne!(fingerprint(&a.view()), fingerprint(&c.view()));
    }

    #[test]
    fn second_lookup_hits() {
        let cache = FeatureCache::new(2);
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache
                .get_or_try_insert::<()>(7, || {
                    calls += 1;
                    Ok(set(3))
                })
                .expect("ok");
            assert_eq!(v.len(), 3);
        }
        assert_eq!(calls, 1);
        let s = cache.stats();
        assert_eq!((s.hits, s.misses, s.entries), (2, 1, 1));
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = FeatureCache::new(2);
        cache.insert(1, Arc::new(set(1)));
        cache.insert(2, Arc::new(set(2)));
        assert!(cache.get(1).is_some());
        cache.insert(3, Arc::new(set(3)));
        assert!(cache.get(2).is_none());
        assert!(cache.get(1).is_some());
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = FeatureCache::new(2);
        let r = cache.get_or_try_insert(5, || Err("boom"));
        assert_eq!(r.err(), Some("boom"));
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn zero_capacity_never_stores() {
        let cache = FeatureCache::new(0);
        cache.insert(1, Arc::new(set(1)));
        assert!(cache.get(1).is_none());
    }
}
