//! Faster (but not DoS-resistant) hashmaps
//!
//! Word ids are already the prefix of a digest, so maps keyed by them skip hashing entirely
//! (`PlainMap`). Everything else goes through farmhash.
use hash_hasher::HashBuildHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasherDefault, Hash, Hasher};

/// Streaming farmhash
///
/// farmhash isn't a streaming hash, so each write is chained through the seed of the next.
/// Compound keys like `(i64, i64)` see every field this way.
pub struct FarmHasher(u64);

impl Default for FarmHasher {
    #[inline]
    fn default() -> FarmHasher { FarmHasher(0) }
}

impl Hasher for FarmHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = farmhash::hash64_with_seed(bytes, self.0);
    }
}

pub type Farm = BuildHasherDefault<FarmHasher>;
pub type FarmMap<X, Y> = HashMap<X, Y, Farm>;
pub type FarmSet<X> = HashSet<X, Farm>;

pub fn new_farm<X: Hash + Eq, Y>() -> FarmMap<X, Y> {
    Default::default()
}

pub fn new_farm_set<X: Hash + Eq>() -> FarmSet<X> {
    Default::default()
}

/// For keys that are hashes already
pub type PlainMap<X, Y> = HashMap<X, Y, HashBuildHasher>;

pub fn new_plain<X: Hash + Eq, Y>() -> PlainMap<X, Y> {
    Default::default()
}
