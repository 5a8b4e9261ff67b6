//! Intermediate key/value storage shared by the map and reduce phases.

pub mod partition;
pub mod values;

pub use partition::{EntryRef, PartitionStore};
pub use values::ValueSequence;
