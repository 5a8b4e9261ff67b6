use crate::standalone::Job;
use crate::stats::RunStats;
use crate::{Emitter, Getter, MapReduce, Workload};
use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Where reduce output goes.
pub enum OutputSink {
    /// Every partition writes to the same stream.
    Shared(Mutex<Box<dyn Write + Send>>),
    /// One `mr-out-<partition>` file per partition.
    PerPartition(Vec<Mutex<BufWriter<File>>>),
}

impl OutputSink {
    pub fn stdout() -> Self {
        OutputSink::Shared(Mutex::new(Box::new(io::stdout())))
    }

    pub fn directory(dir: &Path, partitions: usize) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        let files = (0..partitions)
            .map(|partition| {
                let out_pathspec = dir.join(format!("mr-out-{}", partition));
                let file = File::create(&out_pathspec)
                    .with_context(|| format!("failed to create {}", out_pathspec.display()))?;
                Ok(Mutex::new(BufWriter::new(file)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(OutputSink::PerPartition(files))
    }

    pub fn write(&self, partition: usize, bytes: &[u8]) -> Result<()> {
        match self {
            OutputSink::Shared(writer) => writer
                .lock()
                .map_err(|_| anyhow!("output writer poisoned"))?
                .write_all(bytes)?,
            OutputSink::PerPartition(files) => files
                .get(partition)
                .with_context(|| format!("no output file for partition {partition}"))?
                .lock()
                .map_err(|_| anyhow!("output file for partition {partition} poisoned"))?
                .write_all(bytes)?,
        }
        Ok(())
    }

    pub fn finish(&self) -> Result<()> {
        match self {
            OutputSink::Shared(writer) => writer
                .lock()
                .map_err(|_| anyhow!("output writer poisoned"))?
                .flush()?,
            OutputSink::PerPartition(files) => {
                for file in files {
                    file.lock()
                        .map_err(|_| anyhow!("output file poisoned"))?
                        .flush()?;
                }
            }
        }
        Ok(())
    }
}

/// Runs `job` with `engine`, writing reduce output to the job's output
/// directory, or to stdout when it has none.
pub fn perform_job(job: &Job, engine: &Workload) -> Result<RunStats> {
    let sink = match &job.output {
        Some(dir) => OutputSink::directory(dir, job.config.num_reducers)?,
        None => OutputSink::stdout(),
    };
    perform_job_into(job, engine, &sink)
}

/// Runs `job` with `engine`, writing reduce output to `sink`.
pub fn perform_job_into(job: &Job, engine: &Workload, sink: &OutputSink) -> Result<RunStats> {
    let aux = job.args.as_slice();
    let map = |unit: &str, emit: &Emitter<'_>| (engine.map_fn)(unit, emit, aux);
    let reduce = |key: &str, values: &mut Getter<'_>, partition: usize| -> Result<()> {
        let out = (engine.reduce_fn)(key, values, aux)?;
        sink.write(partition, out.as_bytes())
    };

    info!(workload = %job.workload, units = job.inputs.len(), "running job");
    let stats = MapReduce::new(map, reduce)
        .config(job.config.clone())
        .partitioner(job.partitioner.function())
        .run(job.inputs.clone())?;
    sink.finish()?;
    Ok(stats)
}
