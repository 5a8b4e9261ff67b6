use serde::Serialize;
use std::time::Duration;

/// What one mapper worker did before it exited.
#[derive(Default, Clone, Debug)]
pub struct MapperReport {
    pub worker: usize,
    pub units: usize,
    pub emits: u64,
}

/// What one reducer worker did before it exited.
#[derive(Default, Clone, Debug)]
pub struct ReducerReport {
    pub partition: usize,
    pub keys: usize,
    pub values: u64,
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct MapStats {
    pub workers: usize,
    pub units: usize,
    pub emits: u64,
    pub min_worker_units: usize,
    pub max_worker_units: usize,
    pub wall_ms: u64,
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct SortStats {
    pub partitions: usize,
    pub keys: usize,
    pub wall_ms: u64,
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct ReduceStats {
    pub workers: usize,
    pub keys_reduced: usize,
    pub values_delivered: u64,
    pub wall_ms: u64,
}

/// Summary of a completed run.
#[derive(Default, Clone, Debug, Serialize)]
pub struct RunStats {
    pub map: MapStats,
    pub sort: SortStats,
    pub reduce: ReduceStats,
    pub keys_per_partition: Vec<usize>,
}

impl RunStats {
    pub fn record_map(&mut self, per_worker: &[MapperReport], wall: Duration) {
        self.map = MapStats {
            workers: per_worker.len(),
            units: per_worker.iter().map(|r| r.units).sum(),
            emits: per_worker.iter().map(|r| r.emits).sum(),
            min_worker_units: per_worker.iter().map(|r| r.units).min().unwrap_or(0),
            max_worker_units: per_worker.iter().map(|r| r.units).max().unwrap_or(0),
            wall_ms: millis(wall),
        };
    }

    pub fn record_sort(&mut self, keys_per_partition: Vec<usize>, wall: Duration) {
        self.sort = SortStats {
            partitions: keys_per_partition.len(),
            keys: keys_per_partition.iter().sum(),
            wall_ms: millis(wall),
        };
        self.keys_per_partition = keys_per_partition;
    }

    pub fn record_reduce(&mut self, per_worker: &[ReducerReport], wall: Duration) {
        self.reduce = ReduceStats {
            workers: per_worker.len(),
            keys_reduced: per_worker.iter().map(|r| r.keys).sum(),
            values_delivered: per_worker.iter().map(|r| r.values).sum(),
            wall_ms: millis(wall),
        };
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
