//! The reduce phase worker pool.

use crate::context::{Getter, RunContext};
use crate::error::Error;
use crate::runtime::Phase;
use crate::stats::ReducerReport;
use crate::utils::panic_message;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::debug;

/// One reducer thread per partition. Partitions are disjoint, so the
/// workers never coordinate with each other.
pub struct ReducerPool<'r, R> {
    ctx: &'r RunContext<'r>,
    reduce_fn: &'r R,
}

impl<'r, R> ReducerPool<'r, R>
where
    R: Fn(&str, &mut Getter<'_>, usize) -> anyhow::Result<()> + Sync,
{
    pub fn new(ctx: &'r RunContext<'r>, reduce_fn: &'r R) -> Self {
        Self { ctx, reduce_fn }
    }

    /// Spawns one worker per partition and returns once all have exited.
    ///
    /// Every partition store must already be sorted.
    pub fn run(&self) -> Vec<ReducerReport> {
        let partitions = self.ctx.num_partitions();
        thread::scope(|s| {
            let mut handles = Vec::with_capacity(partitions);
            for partition in 0..partitions {
                // Each worker owns its own copy of the partition index.
                let spawned = thread::Builder::new()
                    .name(format!("reducer-{partition}"))
                    .spawn_scoped(s, move || self.work(partition));
                match spawned {
                    Ok(handle) => handles.push((partition, handle)),
                    Err(source) => {
                        self.ctx.abort(Error::Spawn {
                            phase: Phase::Reducing,
                            worker: partition,
                            source,
                        });
                        break;
                    }
                }
            }

            let mut reports = Vec::with_capacity(handles.len());
            for (partition, handle) in handles {
                match handle.join() {
                    Ok(report) => reports.push(report),
                    Err(payload) => self.ctx.abort(Error::WorkerPanicked {
                        phase: Phase::Reducing,
                        worker: partition,
                        message: panic_message(payload.as_ref()),
                    }),
                }
            }
            reports
        })
    }

    fn work(&self, partition: usize) -> ReducerReport {
        let mut report = ReducerReport {
            partition,
            ..Default::default()
        };
        let Some(store) = self.ctx.store(partition) else {
            return report;
        };
        debug_assert!(store.is_sorted(), "partition {partition} reduced before sorting");

        for key in store.sorted_keys().unwrap_or_default() {
            if self.ctx.is_aborted() {
                break;
            }
            if !store.lookup(key).is_some_and(|entry| !entry.is_empty()) {
                continue;
            }
            debug!(partition, key = key.as_str(), "reducing key");

            let mut getter = Getter::new(store, key);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                (self.reduce_fn)(key.as_str(), &mut getter, partition)
            }));
            report.keys += 1;
            report.values += getter.delivered();

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(source)) => {
                    self.ctx.abort(Error::ReduceFailed {
                        key: key.clone(),
                        partition,
                        source,
                    });
                    break;
                }
                Err(payload) => {
                    self.ctx.abort(Error::CallbackPanicked {
                        phase: Phase::Reducing,
                        item: key.clone(),
                        message: panic_message(payload.as_ref()),
                    });
                    break;
                }
            }
        }

        debug!(partition, keys = report.keys, values = report.values, "reducer exiting");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn round_robin(key: &str, n: usize) -> usize {
        key.len() % n
    }

    fn filled_context() -> RunContext<'static> {
        let ctx = RunContext::new(2, &round_robin).unwrap();
        for (key, value) in [("bb", "1"), ("a", "1"), ("cc", "2"), ("bb", "3"), ("dd", "4")] {
            ctx.emit(key, value.to_string()).unwrap();
        }
        for store in ctx.stores() {
            store.sort_by_key().unwrap();
        }
        ctx
    }

    #[test]
    fn each_partition_is_walked_by_its_own_worker_in_key_order() {
        let ctx = filled_context();
        let seen = Mutex::new(Vec::new());
        let reduce_fn = |key: &str, get: &mut Getter<'_>, partition: usize| -> anyhow::Result<()> {
            assert_eq!(get.partition_index(), partition);
            let values: Vec<String> = get.collect();
            seen.lock().unwrap().push((partition, key.to_string(), values));
            Ok(())
        };

        let reports = ReducerPool::new(&ctx, &reduce_fn).run();

        assert!(ctx.take_failure().is_none());
        assert_eq!(reports.iter().map(|r| r.keys).sum::<usize>(), 4);
        assert_eq!(reports.iter().map(|r| r.values).sum::<u64>(), 5);

        let seen = seen.into_inner().unwrap();
        let partition0: Vec<_> = seen.iter().filter(|(p, _, _)| *p == 0).collect();
        let keys0: Vec<&str> = partition0.iter().map(|(_, k, _)| k.as_str()).collect();
        assert_eq!(keys0, ["bb", "cc", "dd"]);
        assert_eq!(partition0[0].2, ["1", "3"]);

        let partition1: Vec<_> = seen.iter().filter(|(p, _, _)| *p == 1).collect();
        assert_eq!(partition1.len(), 1);
        assert_eq!(partition1[0].1, "a");
    }

    #[test]
    fn reduce_error_aborts_remaining_keys() {
        let ctx = RunContext::new(1, &round_robin).unwrap();
        for key in ["a", "b", "c"] {
            ctx.emit(key, "1".to_string()).unwrap();
        }
        ctx.stores()[0].sort_by_key().unwrap();

        let calls = Mutex::new(Vec::new());
        let reduce_fn = |key: &str, _: &mut Getter<'_>, _: usize| -> anyhow::Result<()> {
            calls.lock().unwrap().push(key.to_string());
            if key == "b" {
                anyhow::bail!("disk full");
            }
            Ok(())
        };

        ReducerPool::new(&ctx, &reduce_fn).run();

        assert_eq!(calls.into_inner().unwrap(), ["a", "b"]);
        assert!(matches!(
            ctx.take_failure(),
            Some(Error::ReduceFailed { key, partition: 0, .. }) if key == "b"
        ));
    }
}
