use std::{
    collections::{HashMap, HashSet},
    hash::{BuildHasherDefault, Hasher},
};

/// A `HashMap` keyed by primitive integers, hashed by identity.
pub type IdentityHashMap<K, V> = HashMap<K, V, BuildHasherDefault<IdentityHasher>>;

/// A `HashSet` of primitive integers, hashed by identity.
///
/// Document ids are dense and evenly spread, so the id itself is a good enough hash.
///
/// ```
/// use tagsieve_collections::identity_hash::IdentityHashSet;
///
/// let mut set: IdentityHashSet<u32> = IdentityHashSet::default();
/// set.insert(42);
/// assert!(set.contains(&42));
/// ```
pub type IdentityHashSet<K> = HashSet<K, BuildHasherDefault<IdentityHasher>>;

/// Returns an empty identity set able to hold `capacity` elements without rehashing.
pub fn identity_set_with_capacity<K>(capacity: usize) -> IdentityHashSet<K> {
    IdentityHashSet::with_capacity_and_hasher(capacity, Default::default())
}

/// A hasher that returns the written integer as the hash.
///
/// Only primitive integer writes up to 64 bits are supported; hashing any other type
/// panics.
#[derive(Default)]
pub struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline]
    fn write(&mut self, _: &[u8]) {
        unimplemented!("IdentityHasher only supports primitive integers up to 64 bits");
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.0 = i as u64;
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.0 = i as u64;
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.0 = i as u64;
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.0 = i as u64;
    }

    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.write_u32(i as u32)
    }

    #[inline]
    fn write_i64(&mut self, i: i64) {
        self.write_u64(i as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{Hash, Hasher};

    use super::*;

    #[test]
    fn test_hash_is_identity() {
        let mut hasher = IdentityHasher::default();
        7u32.hash(&mut hasher);
        assert_eq!(hasher.finish(), 7);

        let mut hasher = IdentityHasher::default();
        (-1i32).hash(&mut hasher);
        assert_eq!(hasher.finish(), u32::MAX as u64);
    }

    #[test]
    fn test_preallocated_set() {
        let mut set = identity_set_with_capacity::<u32>(1000);
        assert!(set.capacity() >= 1000);
        for id in 0..1000 {
            set.insert(id);
        }
        assert_eq!(set.len(), 1000);
        assert!(set.contains(&999));

        let map: IdentityHashMap<u64, &str> = [(1, "a"), (2, "b")].into_iter().collect();
        assert_eq!(map.get(&2), Some(&"b"));
    }
}
