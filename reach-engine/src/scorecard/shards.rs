//! Lock-sharded hash map.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, RandomState};
use std::sync::{Mutex, MutexGuard, PoisonError};

const DEFAULT_SHARDS: usize = 64;

/// A hash map split across independently locked shards.
///
/// Every operation on one key holds exactly one shard lock, which makes
/// [`ShardedMap::update`] an atomic read-modify-write for that key. Entries
/// are only ever replaced whole, so a poisoned shard still holds valid data
/// and is used as-is.
pub(crate) struct ShardedMap<K, V> {
    shards: Vec<Mutex<HashMap<K, V>>>,
    hasher: RandomState,
}

impl<K: Hash + Eq, V> ShardedMap<K, V> {
    pub(crate) fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    pub(crate) fn with_shards(n: usize) -> Self {
        let n = n.max(1);
        Self {
            shards: (0..n).map(|_| Mutex::new(HashMap::new())).collect(),
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, key: &K) -> MutexGuard<'_, HashMap<K, V>> {
        let idx = (self.hasher.hash_one(key) % self.shards.len() as u64) as usize;
        self.shards[idx]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the current value for `key` under its shard lock.
    pub(crate) fn read<R>(&self, key: &K, f: impl FnOnce(Option<&V>) -> R) -> R {
        let shard = self.shard(key);
        f(shard.get(key))
    }

    pub(crate) fn insert(&self, key: K, value: V) {
        self.shard(&key).insert(key, value);
    }

    /// Store `value` if `replaces(existing)` holds or there is no entry.
    /// Returns whether it was stored.
    pub(crate) fn update(&self, key: K, value: V, replaces: impl FnOnce(&V) -> bool) -> bool {
        let mut shard = self.shard(&key);
        if shard.get(&key).is_some_and(|existing| !replaces(existing)) {
            return false;
        }
        shard.insert(key, value);
        true
    }

    /// Mutate the entry for `key` in place, creating it first if absent.
    pub(crate) fn modify<R>(&self, key: K, f: impl FnOnce(&mut V) -> R) -> R
    where
        V: Default,
    {
        let mut shard = self.shard(&key);
        f(shard.entry(key).or_default())
    }

    /// Collect from every entry, shard by shard.
    pub(crate) fn collect<R>(&self, mut f: impl FnMut(&K, &V) -> Option<R>) -> Vec<R> {
        let mut out = Vec::new();
        for shard in &self.shards {
            let shard = shard.lock().unwrap_or_else(PoisonError::into_inner);
            out.extend(shard.iter().filter_map(|(k, v)| f(k, v)));
        }
        out
    }

    pub(crate) fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }
}
