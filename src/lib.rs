//! An in-process MapReduce runtime.
//!
//! Users supply a map function, a reduce function and a partition function,
//! and the runtime drives them over a list of input units on real threads:
//! a pool of mappers drains the units and emits key/value pairs into
//! per-partition stores, every partition is sorted by key, and one reducer
//! thread per partition hands each key's values, in emission order, to the
//! reduce function exactly once.
//!
//! ```no_run
//! # fn main() -> Result<(), mrlocal::Error> {
//! use mrlocal::{default_hash_partition, Emitter, Getter};
//!
//! fn map(unit: &str, emit: &Emitter<'_>) -> anyhow::Result<()> {
//!     for word in std::fs::read_to_string(unit)?.split_whitespace() {
//!         emit.emit(word, "1")?;
//!     }
//!     Ok(())
//! }
//!
//! fn reduce(key: &str, values: &mut Getter<'_>, _partition: usize) -> anyhow::Result<()> {
//!     println!("{} {}", key, values.count());
//!     Ok(())
//! }
//!
//! let inputs = vec!["a.txt".to_string(), "b.txt".to_string()];
//! mrlocal::run(inputs, map, 4, reduce, 4, default_hash_partition)?;
//! # Ok(())
//! # }
//! ```

use std::hash::Hasher;

pub mod config;
pub mod context;
pub mod error;
pub mod mapper;
pub mod queue;
pub mod reducer;
pub mod runtime;
pub mod standalone;
pub mod stats;
pub mod store;
pub mod utils;
pub mod workload;

pub use config::RunConfig;
pub use context::{Emitter, Getter};
pub use error::Error;
pub use runtime::{run, MapReduce, Phase};
pub use stats::RunStats;

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// A workload's map function takes an input unit (a file path), the
/// emitter for the current run, and auxiliary arguments.
pub type MapFn = fn(unit: &str, emit: &Emitter<'_>, aux: &[String]) -> anyhow::Result<()>;

/// A workload's reduce function takes a key, the getter over that key's
/// values, and auxiliary arguments. It returns the text to output for
/// the key.
pub type ReduceFn =
    fn(key: &str, values: &mut Getter<'_>, aux: &[String]) -> anyhow::Result<String>;

/// A map reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub map_fn: MapFn,
    pub reduce_fn: ReduceFn,
}

/////////////////////////////////////////////////////////////////////////////
// Partitioning
/////////////////////////////////////////////////////////////////////////////

/// The default partition function: djb2 (`hash = hash * 33 + byte`, seeded
/// with 5381) over the key's bytes, modulo `num_partitions`.
///
/// `num_partitions` must be non-zero.
pub fn default_hash_partition(key: &str, num_partitions: usize) -> usize {
    let hash = key.bytes().fold(5381u64, |hash, byte| {
        hash.wrapping_mul(33).wrapping_add(u64::from(byte))
    });
    (hash % num_partitions as u64) as usize
}

/// Hashes an intermediate key with FNV-1a keyed with zero, masked to 31 bits.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::with_key(0);
    hasher.write(key);
    (hasher.finish() & 0x7fff_ffff) as u32
}

/// Partition function built on [`ihash`]: `ihash(key) % num_partitions`.
pub fn fnv_hash_partition(key: &str, num_partitions: usize) -> usize {
    ihash(key.as_bytes()) as usize % num_partitions
}
