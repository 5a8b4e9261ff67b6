use crate::runtime::Phase;
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors that end a run.
///
/// Every variant is fatal: a run either completes or returns the first of
/// these it encountered.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to allocate {what}: {source}")]
    Allocation {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("partitioner sent key `{key}` to partition {index}, but there are only {num_partitions}")]
    PartitionOutOfRange {
        key: String,
        index: usize,
        num_partitions: usize,
    },

    #[error("map failed for unit `{unit}`: {source}")]
    MapFailed {
        unit: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("reduce failed for key `{key}` in partition {partition}: {source}")]
    ReduceFailed {
        key: String,
        partition: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("{phase} callback panicked on `{item}`: {message}")]
    CallbackPanicked {
        phase: Phase,
        item: String,
        message: String,
    },

    #[error("{phase} worker {worker} panicked: {message}")]
    WorkerPanicked {
        phase: Phase,
        worker: usize,
        message: String,
    },

    #[error("failed to spawn {phase} worker {worker}: {source}")]
    Spawn {
        phase: Phase,
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Copies the variants raised by the runtime itself. Errors wrapping a
    /// callback's or the OS's error cannot be copied.
    pub(crate) fn try_clone(&self) -> Option<Error> {
        let copy = match self {
            Error::InvalidConfig(message) => Error::InvalidConfig(message.clone()),
            Error::Allocation { what, source } => Error::Allocation {
                what: *what,
                source: source.clone(),
            },
            Error::PartitionOutOfRange {
                key,
                index,
                num_partitions,
            } => Error::PartitionOutOfRange {
                key: key.clone(),
                index: *index,
                num_partitions: *num_partitions,
            },
            Error::CallbackPanicked {
                phase,
                item,
                message,
            } => Error::CallbackPanicked {
                phase: *phase,
                item: item.clone(),
                message: message.clone(),
            },
            Error::WorkerPanicked {
                phase,
                worker,
                message,
            } => Error::WorkerPanicked {
                phase: *phase,
                worker: *worker,
                message: message.clone(),
            },
            Error::MapFailed { .. }
            | Error::ReduceFailed { .. }
            | Error::Spawn { .. }
            | Error::Io(_)
            | Error::Serialization(_) => return None,
        };
        Some(copy)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
