//! Reusable integer sets for collecting document ids.
//!
//! A [`ScratchSetCache`] owns one set and hands it out cleared on every call, so a
//! worker that compiles many requests allocates its buffer once. Caches are not
//! shared: each worker either owns one outright, keeps one in thread-local storage,
//! or checks one out of a [`ScratchSetPool`].

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tagsieve_bitmap::PackedBitArray;
use tagsieve_common::{Result, verify_arg};

use crate::identity_hash::{IdentityHashSet, identity_set_with_capacity};

/// Backing structure of a [`ScratchSet`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScratchRepresentation {
    /// Identity-hashed set pre-sized to the capacity hint.
    #[default]
    HashSet,
    /// One bit per id in `[0, capacity_hint)`. Only valid for dense ids.
    BitArray,
}

/// An integer set in one of the [`ScratchRepresentation`] layouts.
#[derive(Debug)]
pub enum ScratchSet {
    Hash(IdentityHashSet<u32>),
    Bits {
        bits: PackedBitArray<Box<[u32]>>,
        len: usize,
    },
}

impl ScratchSet {
    pub fn new(capacity_hint: usize, representation: ScratchRepresentation) -> ScratchSet {
        match representation {
            ScratchRepresentation::HashSet => {
                ScratchSet::Hash(identity_set_with_capacity(capacity_hint))
            }
            ScratchRepresentation::BitArray => ScratchSet::Bits {
                bits: PackedBitArray::zeroed(capacity_hint),
                len: 0,
            },
        }
    }

    pub fn representation(&self) -> ScratchRepresentation {
        match self {
            ScratchSet::Hash(_) => ScratchRepresentation::HashSet,
            ScratchSet::Bits { .. } => ScratchRepresentation::BitArray,
        }
    }

    /// Adds `id`; returns whether it was newly inserted.
    ///
    /// The bit representation fails with `InvalidArgument` for ids outside its
    /// universe.
    pub fn insert(&mut self, id: u32) -> Result<bool> {
        match self {
            ScratchSet::Hash(set) => Ok(set.insert(id)),
            ScratchSet::Bits { bits, len } => {
                let pos = id as usize;
                verify_arg!(id, pos < bits.logical_len());
                if bits.is_marked(pos) {
                    return Ok(false);
                }
                bits.mark_bit(pos)?;
                *len += 1;
                Ok(true)
            }
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        match self {
            ScratchSet::Hash(set) => set.contains(&id),
            ScratchSet::Bits { bits, .. } => bits.is_marked(id as usize),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ScratchSet::Hash(set) => set.len(),
            ScratchSet::Bits { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every element, keeping the allocation.
    pub fn clear(&mut self) {
        match self {
            ScratchSet::Hash(set) => set.clear(),
            ScratchSet::Bits { bits, len } => {
                if *len != 0 {
                    bits.clear();
                    *len = 0;
                }
            }
        }
    }
}

/// A single reusable scratch set, sized by a capacity hint (usually the document
/// count).
#[derive(Debug)]
pub struct ScratchSetCache {
    capacity_hint: usize,
    set: ScratchSet,
}

impl ScratchSetCache {
    pub fn new(capacity_hint: usize) -> ScratchSetCache {
        Self::with_representation(capacity_hint, ScratchRepresentation::default())
    }

    pub fn with_representation(
        capacity_hint: usize,
        representation: ScratchRepresentation,
    ) -> ScratchSetCache {
        ScratchSetCache {
            capacity_hint,
            set: ScratchSet::new(capacity_hint, representation),
        }
    }

    pub fn capacity_hint(&self) -> usize {
        self.capacity_hint
    }

    pub fn representation(&self) -> ScratchRepresentation {
        self.set.representation()
    }

    /// Returns the cached set, cleared.
    pub fn get_scratch_set(&mut self) -> &mut ScratchSet {
        self.set.clear();
        &mut self.set
    }
}

impl Default for ScratchSetCache {
    /// An unallocated placeholder with a zero capacity hint.
    fn default() -> ScratchSetCache {
        ScratchSetCache::new(0)
    }
}

/// A lock-protected stack of [`ScratchSetCache`]s shared by a group of workers.
///
/// [`acquire`](Self::acquire) pops a cache (or creates one) and returns it wrapped
/// in a [`PooledScratch`] handle that puts it back on drop. At most `keep_limit`
/// idle caches are retained.
#[derive(Debug)]
pub struct ScratchSetPool {
    pool: Mutex<Vec<ScratchSetCache>>,
    capacity_hint: usize,
    representation: ScratchRepresentation,
    keep_limit: usize,
}

impl ScratchSetPool {
    pub fn new(capacity_hint: usize, representation: ScratchRepresentation) -> ScratchSetPool {
        let keep_limit = num_cpus::get().clamp(8, 128);
        ScratchSetPool {
            pool: Mutex::new(Vec::with_capacity(keep_limit)),
            capacity_hint,
            representation,
            keep_limit,
        }
    }

    pub fn with_keep_limit(mut self, keep_limit: usize) -> ScratchSetPool {
        self.keep_limit = keep_limit;
        self
    }

    pub fn keep_limit(&self) -> usize {
        self.keep_limit
    }

    /// Number of idle caches currently held.
    pub fn idle_count(&self) -> usize {
        self.pool.lock().len()
    }

    pub fn acquire(&self) -> PooledScratch<'_> {
        let cache = self.pool.lock().pop().unwrap_or_else(|| {
            ScratchSetCache::with_representation(self.capacity_hint, self.representation)
        });
        PooledScratch { pool: self, cache }
    }

    fn return_back(&self, cache: ScratchSetCache) {
        let mut pool = self.pool.lock();
        if pool.len() < self.keep_limit {
            pool.push(cache);
        }
    }
}

/// Exclusive handle to a pooled [`ScratchSetCache`]; returns it to the pool on drop.
#[derive(Debug)]
pub struct PooledScratch<'a> {
    pool: &'a ScratchSetPool,
    cache: ScratchSetCache,
}

impl Deref for PooledScratch<'_> {
    type Target = ScratchSetCache;

    fn deref(&self) -> &ScratchSetCache {
        &self.cache
    }
}

impl DerefMut for PooledScratch<'_> {
    fn deref_mut(&mut self) -> &mut ScratchSetCache {
        &mut self.cache
    }
}

impl Drop for PooledScratch<'_> {
    fn drop(&mut self) {
        self.pool.return_back(std::mem::take(&mut self.cache));
    }
}

#[cfg(test)]
mod tests {
    use tagsieve_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_hash_scratch_set() {
        let mut cache = ScratchSetCache::new(100);
        let set = cache.get_scratch_set();
        assert!(set.insert(5).unwrap());
        assert!(!set.insert(5).unwrap());
        assert!(set.insert(1_000_000).unwrap());
        assert_eq!(set.len(), 2);
        assert!(set.contains(1_000_000));

        let set = cache.get_scratch_set();
        assert!(set.is_empty());
        assert!(!set.contains(5));
    }

    #[test]
    fn test_bit_scratch_set() {
        let mut cache = ScratchSetCache::with_representation(100, ScratchRepresentation::BitArray);
        assert_eq!(cache.representation(), ScratchRepresentation::BitArray);
        let set = cache.get_scratch_set();
        assert!(set.insert(0).unwrap());
        assert!(set.insert(99).unwrap());
        assert!(!set.insert(99).unwrap());
        assert_eq!(set.len(), 2);
        let err = set.insert(100).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidArgument { name, .. } if name == "id"
        ));
        assert!(!set.contains(100));

        let set = cache.get_scratch_set();
        assert_eq!(set.len(), 0);
        assert!(!set.contains(99));
    }

    #[test]
    fn test_pool_returns_caches_on_drop() {
        let pool = ScratchSetPool::new(10, ScratchRepresentation::HashSet).with_keep_limit(1);
        assert_eq!(pool.idle_count(), 0);
        {
            let mut first = pool.acquire();
            let mut second = pool.acquire();
            first.get_scratch_set().insert(3).unwrap();
            second.get_scratch_set().insert(4).unwrap();
        }
        // Only one cache is kept.
        assert_eq!(pool.idle_count(), 1);

        let mut reused = pool.acquire();
        assert_eq!(pool.idle_count(), 0);
        assert!(reused.get_scratch_set().is_empty());
        drop(reused);
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_pool_across_threads() {
        let pool = ScratchSetPool::new(1000, ScratchRepresentation::BitArray);
        std::thread::scope(|scope| {
            for t in 0..4u32 {
                let pool = &pool;
                scope.spawn(move || {
                    for _ in 0..50 {
                        let mut scratch = pool.acquire();
                        let set = scratch.get_scratch_set();
                        for id in (t..1000).step_by(4) {
                            set.insert(id).unwrap();
                        }
                        assert_eq!(set.len(), 250);
                    }
                });
            }
        });
        assert!(pool.idle_count() <= 4);
        assert!(pool.idle_count() >= 1);
    }
}
