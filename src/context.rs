//! State shared by every worker of one run.
//!
//! A [`RunContext`] is built by the orchestrator for a single run and lent
//! to the worker threads, so two runs never see each other's stores.

use crate::error::{Error, Result};
use crate::store::PartitionStore;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{trace, warn};

/// A partition function: maps a key and the partition count to an index.
pub type Partitioner<'a> = dyn Fn(&str, usize) -> usize + Sync + 'a;

pub struct RunContext<'a> {
    stores: Vec<PartitionStore>,
    partitioner: &'a Partitioner<'a>,
    aborted: AtomicBool,
    failure: Mutex<Option<Error>>,
}

impl<'a> RunContext<'a> {
    pub fn new(num_partitions: usize, partitioner: &'a Partitioner<'a>) -> Result<Self> {
        let mut stores = Vec::new();
        stores
            .try_reserve_exact(num_partitions)
            .map_err(|source| Error::Allocation {
                what: "partition stores",
                source,
            })?;
        stores.extend((0..num_partitions).map(PartitionStore::new));

        Ok(Self {
            stores,
            partitioner,
            aborted: AtomicBool::new(false),
            failure: Mutex::new(None),
        })
    }

    pub fn stores(&self) -> &[PartitionStore] {
        &self.stores
    }

    pub fn store(&self, partition: usize) -> Option<&PartitionStore> {
        self.stores.get(partition)
    }

    pub fn num_partitions(&self) -> usize {
        self.stores.len()
    }

    /// Routes `key` to its store and appends `value`.
    pub fn emit(&self, key: &str, value: String) -> Result<()> {
        let num_partitions = self.stores.len();
        let index = (self.partitioner)(key, num_partitions);
        let store = self
            .stores
            .get(index)
            .ok_or_else(|| Error::PartitionOutOfRange {
                key: key.to_owned(),
                index,
                num_partitions,
            })?;
        trace!(key, partition = index, "emit");
        store.insert(key, value)
    }

    /// Records `error` as the reason the run stops. Only the first error is
    /// kept; later ones are logged and dropped.
    pub fn abort(&self, error: Error) {
        self.aborted.store(true, Ordering::SeqCst);
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        match failure.as_ref() {
            None => {
                warn!(%error, "aborting run");
                *failure = Some(error);
            }
            Some(first) => warn!(%error, %first, "run already aborting, dropping error"),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Takes the error that aborted the run, if any.
    pub fn take_failure(&self) -> Option<Error> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Handle a map callback uses to publish key/value pairs.
///
/// An emitter lives for one map invocation on one worker thread. A failed
/// emit also aborts the run, so swallowing the returned error does not
/// hide the failure.
pub struct Emitter<'a> {
    ctx: &'a RunContext<'a>,
    emitted: Cell<u64>,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(ctx: &'a RunContext<'a>) -> Self {
        Self {
            ctx,
            emitted: Cell::new(0),
        }
    }

    /// Publishes one key/value pair.
    pub fn emit(&self, key: impl AsRef<str>, value: impl Into<String>) -> Result<()> {
        match self.ctx.emit(key.as_ref(), value.into()) {
            Ok(()) => {
                self.emitted.set(self.emitted.get() + 1);
                Ok(())
            }
            Err(error) => {
                if let Some(copy) = error.try_clone() {
                    self.ctx.abort(copy);
                }
                Err(error)
            }
        }
    }

    /// Number of successful emits through this handle.
    pub fn emitted(&self) -> u64 {
        self.emitted.get()
    }
}

/// One-shot iterator over the values of a single key, in emission order.
///
/// This is the getter handed to reduce callbacks. Once it returns `None`
/// it keeps returning `None`.
pub struct Getter<'a> {
    store: &'a PartitionStore,
    key: &'a str,
    delivered: u64,
}

impl<'a> Getter<'a> {
    pub(crate) fn new(store: &'a PartitionStore, key: &'a str) -> Self {
        Self {
            store,
            key,
            delivered: 0,
        }
    }

    /// Next value for the key, or `None` at the end of the values.
    pub fn next_value(&mut self) -> Option<String> {
        let value = self.store.get_next_value(self.key)?;
        self.delivered += 1;
        Some(value)
    }

    pub fn key(&self) -> &str {
        self.key
    }

    /// Index of the partition this key belongs to.
    pub fn partition_index(&self) -> usize {
        self.store.index()
    }

    /// Values handed out by this getter.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl Iterator for Getter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_value()
    }
}
