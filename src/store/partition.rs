//! One shard of the intermediate key space.

use crate::error::{Error, Result};
use crate::store::values::ValueSequence;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use std::sync::OnceLock;
use tracing::trace;

// types related to this store
type Entries = DashMap<String, ValueSequence>;

/// A borrowed view of one key's values.
///
/// Holding it blocks writers to the same shard, so drop it before emitting.
pub type EntryRef<'a> = Ref<'a, String, ValueSequence>;

/// Concurrent set of uniquely keyed [`ValueSequence`]s.
///
/// Mapper threads insert concurrently. After the map phase the store is
/// sorted once, and from then on a single reducer thread walks the keys in
/// ascending byte order and drains each sequence through
/// [`PartitionStore::get_next_value`].
#[derive(Debug)]
pub struct PartitionStore {
    index: usize,
    entries: Entries,
    sorted: OnceLock<Vec<String>>,
}

impl PartitionStore {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            entries: Entries::new(),
            sorted: OnceLock::new(),
        }
    }

    /// Appends `value` to the sequence for `key`, creating the sequence on
    /// first sight of the key.
    ///
    /// Appends to the same key are ordered by lock acquisition.
    pub fn insert(&self, key: &str, value: String) -> Result<()> {
        if let Some(mut seq) = self.entries.get_mut(key) {
            trace!(partition = self.index, key, "append");
            return seq.push(value);
        }

        // Another mapper may have created the key since the lookup above.
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(value),
            Entry::Vacant(entry) => {
                trace!(partition = self.index, key, "new key");
                entry.insert(ValueSequence::with_first(key.to_owned(), value)?);
                Ok(())
            }
        }
    }

    /// Finds the sequence for `key`.
    pub fn lookup(&self, key: &str) -> Option<EntryRef<'_>> {
        self.entries.get(key)
    }

    /// Fixes the key order used by the reduce phase: ascending, compared
    /// byte by byte. Only the first call does any work.
    ///
    /// Returns the number of keys in the store.
    pub fn sort_by_key(&self) -> Result<usize> {
        if let Some(keys) = self.sorted.get() {
            return Ok(keys.len());
        }

        let mut keys = Vec::new();
        keys.try_reserve_exact(self.entries.len())
            .map_err(|source| Error::Allocation {
                what: "sorted key index",
                source,
            })?;
        keys.extend(self.entries.iter().map(|entry| entry.key().clone()));
        // Keys are unique, so an unstable sort is still deterministic.
        keys.sort_unstable();

        let count = keys.len();
        // A concurrent caller may have won the race; its order is identical.
        let _ = self.sorted.set(keys);
        Ok(count)
    }

    /// Keys in reduce order, or `None` before [`PartitionStore::sort_by_key`].
    pub fn sorted_keys(&self) -> Option<&[String]> {
        self.sorted.get().map(Vec::as_slice)
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted.get().is_some()
    }

    /// One-shot forward read of the values for `key`.
    ///
    /// Unknown keys and exhausted sequences both report `None`.
    pub fn get_next_value(&self, key: &str) -> Option<String> {
        let value = self.entries.get_mut(key)?.next_value();
        trace!(partition = self.index, key, found = value.is_some(), "get next value");
        value
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of values across all keys.
    pub fn total_values(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }
}
