//! Runs one job end to end: map, sort, reduce.
//!
//! A run moves through [`Phase::Idle`], [`Phase::Mapping`],
//! [`Phase::Sorting`], [`Phase::Reducing`] and [`Phase::Done`] in that
//! order. Each phase joins all of its threads before the next one starts,
//! so no reducer ever sees a partition that a mapper could still write to.

use crate::config::RunConfig;
use crate::context::{Emitter, Getter, RunContext};
use crate::error::{Error, Result};
use crate::mapper::MapperPool;
use crate::queue::TaskQueue;
use crate::reducer::ReducerPool;
use crate::stats::RunStats;
use crate::store::PartitionStore;
use crate::utils::panic_message;
use serde::Serialize;
use std::fmt;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Mapping,
    Sorting,
    Reducing,
    Done,
}

impl Phase {
    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Idle => Some(Phase::Mapping),
            Phase::Mapping => Some(Phase::Sorting),
            Phase::Sorting => Some(Phase::Reducing),
            Phase::Reducing => Some(Phase::Done),
            Phase::Done => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Mapping => "map",
            Phase::Sorting => "sort",
            Phase::Reducing => "reduce",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// The partitioner used when none is given.
pub type DefaultPartitioner = fn(&str, usize) -> usize;

/// A configured map/reduce job.
///
/// ```no_run
/// # fn main() -> mrlocal::error::Result<()> {
/// use mrlocal::MapReduce;
///
/// let stats = MapReduce::new(
///     |unit: &str, emit: &mrlocal::Emitter<'_>| -> anyhow::Result<()> {
///         for word in unit.split_whitespace() {
///             emit.emit(word, "1")?;
///         }
///         Ok(())
///     },
///     |key: &str, values: &mut mrlocal::Getter<'_>, _partition: usize| -> anyhow::Result<()> {
///         println!("{} {}", key, values.count());
///         Ok(())
///     },
/// )
/// .mappers(2)
/// .reducers(2)
/// .run(vec!["the quick fox".into(), "the lazy fox".into()])?;
/// # let _ = stats;
/// # Ok(())
/// # }
/// ```
pub struct MapReduce<M, R, P = DefaultPartitioner> {
    map_fn: M,
    reduce_fn: R,
    partitioner: P,
    config: RunConfig,
}

impl<M, R> MapReduce<M, R> {
    pub fn new(map_fn: M, reduce_fn: R) -> Self {
        Self {
            map_fn,
            reduce_fn,
            partitioner: crate::default_hash_partition,
            config: RunConfig::default(),
        }
    }
}

impl<M, R, P> MapReduce<M, R, P> {
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mappers(mut self, num_mappers: usize) -> Self {
        self.config.num_mappers = num_mappers;
        self
    }

    /// Sets the reducer count, which is also the partition count.
    pub fn reducers(mut self, num_reducers: usize) -> Self {
        self.config.num_reducers = num_reducers;
        self
    }

    pub fn parallel_sort(mut self, parallel_sort: bool) -> Self {
        self.config.parallel_sort = parallel_sort;
        self
    }

    /// Replaces the partition function. It must be deterministic and return
    /// an index below the partition count it is given.
    pub fn partitioner<Q>(self, partitioner: Q) -> MapReduce<M, R, Q> {
        MapReduce {
            map_fn: self.map_fn,
            reduce_fn: self.reduce_fn,
            partitioner,
            config: self.config,
        }
    }
}

impl<M, R, P> MapReduce<M, R, P>
where
    M: Fn(&str, &Emitter<'_>) -> anyhow::Result<()> + Sync,
    R: Fn(&str, &mut Getter<'_>, usize) -> anyhow::Result<()> + Sync,
    P: Fn(&str, usize) -> usize + Sync,
{
    /// Runs the job over `inputs` and blocks until it has finished.
    ///
    /// Each call works on its own stores and queue; nothing is shared
    /// between runs.
    pub fn run(&self, inputs: Vec<String>) -> Result<RunStats> {
        self.config.validate()?;
        let mut orchestrator = Orchestrator::new(&self.config);
        orchestrator.run(inputs, &self.map_fn, &self.reduce_fn, &self.partitioner)
    }
}

/// Runs a job with explicit worker counts and partition function.
///
/// `num_reducers` is also the number of partitions: reducer `i` reduces
/// every key for which `partition_fn(key, num_reducers) == i`.
pub fn run<M, R, P>(
    inputs: Vec<String>,
    map_fn: M,
    num_mappers: usize,
    reduce_fn: R,
    num_reducers: usize,
    partition_fn: P,
) -> Result<RunStats>
where
    M: Fn(&str, &Emitter<'_>) -> anyhow::Result<()> + Sync,
    R: Fn(&str, &mut Getter<'_>, usize) -> anyhow::Result<()> + Sync,
    P: Fn(&str, usize) -> usize + Sync,
{
    MapReduce::new(map_fn, reduce_fn)
        .partitioner(partition_fn)
        .mappers(num_mappers)
        .reducers(num_reducers)
        .parallel_sort(false)
        .run(inputs)
}

struct Orchestrator<'c> {
    config: &'c RunConfig,
    phase: Phase,
    stats: RunStats,
}

impl<'c> Orchestrator<'c> {
    fn new(config: &'c RunConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            stats: RunStats::default(),
        }
    }

    fn advance(&mut self, to: Phase) {
        debug_assert_eq!(self.phase.next(), Some(to), "phases must not be skipped");
        debug!(from = %self.phase, to = %to, "phase transition");
        self.phase = to;
    }

    fn fail(&self, error: Error) -> Error {
        error!(phase = %self.phase, %error, "run aborted");
        error
    }

    fn run<M, R, P>(
        &mut self,
        inputs: Vec<String>,
        map_fn: &M,
        reduce_fn: &R,
        partitioner: &P,
    ) -> Result<RunStats>
    where
        M: Fn(&str, &Emitter<'_>) -> anyhow::Result<()> + Sync,
        R: Fn(&str, &mut Getter<'_>, usize) -> anyhow::Result<()> + Sync,
        P: Fn(&str, usize) -> usize + Sync,
    {
        info!(
            units = inputs.len(),
            mappers = self.config.num_mappers,
            reducers = self.config.num_reducers,
            "starting run"
        );
        let ctx = RunContext::new(self.config.num_reducers, partitioner)?;
        let queue = TaskQueue::new(inputs);

        self.advance(Phase::Mapping);
        let started = Instant::now();
        let reports = MapperPool::new(&ctx, &queue, map_fn, self.config.num_mappers).run();
        self.stats.record_map(&reports, started.elapsed());
        if let Some(error) = ctx.take_failure() {
            return Err(self.fail(error));
        }
        drop(queue);
        info!(
            units = self.stats.map.units,
            emits = self.stats.map.emits,
            "map phase finished"
        );

        self.advance(Phase::Sorting);
        let started = Instant::now();
        let keys = sort_partitions(ctx.stores(), self.config.parallel_sort)
            .map_err(|error| self.fail(error))?;
        self.stats.record_sort(keys, started.elapsed());
        info!(keys = self.stats.sort.keys, "sort phase finished");

        self.advance(Phase::Reducing);
        let started = Instant::now();
        let reports = ReducerPool::new(&ctx, reduce_fn).run();
        self.stats.record_reduce(&reports, started.elapsed());
        if let Some(error) = ctx.take_failure() {
            return Err(self.fail(error));
        }
        info!(
            keys = self.stats.reduce.keys_reduced,
            values = self.stats.reduce.values_delivered,
            "reduce phase finished"
        );

        self.advance(Phase::Done);
        drop(ctx);
        Ok(std::mem::take(&mut self.stats))
    }
}

/// Sorts every store by key, returning the key count of each partition.
fn sort_partitions(stores: &[PartitionStore], parallel: bool) -> Result<Vec<usize>> {
    if !parallel {
        return stores.iter().map(PartitionStore::sort_by_key).collect();
    }

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(stores.len());
        for store in stores {
            let handle = thread::Builder::new()
                .name(format!("sorter-{}", store.index()))
                .spawn_scoped(s, move || store.sort_by_key())
                .map_err(|source| Error::Spawn {
                    phase: Phase::Sorting,
                    worker: store.index(),
                    source,
                })?;
            handles.push((store.index(), handle));
        }
        handles
            .into_iter()
            .map(|(worker, handle)| {
                handle.join().unwrap_or_else(|payload| {
                    Err(Error::WorkerPanicked {
                        phase: Phase::Sorting,
                        worker,
                        message: panic_message(payload.as_ref()),
                    })
                })
            })
            .collect::<Result<Vec<usize>>>()
    })
}
