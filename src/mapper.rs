//! The map phase worker pool.

use crate::context::{Emitter, RunContext};
use crate::error::Error;
use crate::queue::TaskQueue;
use crate::runtime::Phase;
use crate::stats::MapperReport;
use crate::utils::panic_message;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::debug;

/// A fixed set of mapper threads draining one [`TaskQueue`].
pub struct MapperPool<'r, M> {
    ctx: &'r RunContext<'r>,
    queue: &'r TaskQueue,
    map_fn: &'r M,
    size: usize,
}

impl<'r, M> MapperPool<'r, M>
where
    M: Fn(&str, &Emitter<'_>) -> anyhow::Result<()> + Sync,
{
    pub fn new(ctx: &'r RunContext<'r>, queue: &'r TaskQueue, map_fn: &'r M, size: usize) -> Self {
        Self {
            ctx,
            queue,
            map_fn,
            size,
        }
    }

    /// Spawns the workers and returns once every one of them has exited.
    ///
    /// Failures are recorded in the run context rather than returned, so the
    /// caller checks [`RunContext::take_failure`] afterwards.
    pub fn run(&self) -> Vec<MapperReport> {
        thread::scope(|s| {
            let mut handles = Vec::with_capacity(self.size);
            for worker in 0..self.size {
                let spawned = thread::Builder::new()
                    .name(format!("mapper-{worker}"))
                    .spawn_scoped(s, move || self.work(worker));
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(source) => {
                        self.ctx.abort(Error::Spawn {
                            phase: Phase::Mapping,
                            worker,
                            source,
                        });
                        break;
                    }
                }
            }

            let mut reports = Vec::with_capacity(handles.len());
            for (worker, handle) in handles {
                match handle.join() {
                    Ok(report) => reports.push(report),
                    Err(payload) => self.ctx.abort(Error::WorkerPanicked {
                        phase: Phase::Mapping,
                        worker,
                        message: panic_message(payload.as_ref()),
                    }),
                }
            }
            reports
        })
    }

    fn work(&self, worker: usize) -> MapperReport {
        let mut report = MapperReport {
            worker,
            ..Default::default()
        };

        while !self.ctx.is_aborted() {
            let Some(unit) = self.queue.next() else {
                break;
            };
            debug!(worker, unit = unit.name, id = unit.id, "mapping unit");

            let emitter = Emitter::new(self.ctx);
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| (self.map_fn)(unit.name, &emitter)));
            report.units += 1;
            report.emits += emitter.emitted();

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(source)) => {
                    self.ctx.abort(Error::MapFailed {
                        unit: unit.name.to_string(),
                        source,
                    });
                    break;
                }
                Err(payload) => {
                    self.ctx.abort(Error::CallbackPanicked {
                        phase: Phase::Mapping,
                        item: unit.name.to_string(),
                        message: panic_message(payload.as_ref()),
                    });
                    break;
                }
            }
        }

        debug!(worker, units = report.units, emits = report.emits, "mapper exiting");
        report
    }
}
