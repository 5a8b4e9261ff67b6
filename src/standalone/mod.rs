use crate::RunConfig;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod engine;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Commands,

    /// Log more (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a job on this machine
    Run {
        /// Input files or glob patterns; every file is one map unit
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Name of the workload
        #[arg(short, long)]
        workload: String,

        /// Number of mapper threads
        #[arg(short, long)]
        mappers: Option<usize>,

        /// Number of reducer threads, which is also the number of partitions
        #[arg(short, long)]
        reducers: Option<usize>,

        /// JSON run configuration; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Partition function used to route keys to reducers
        #[arg(long, value_enum, default_value_t = PartitionerKind::Djb2)]
        partitioner: PartitionerKind,

        /// Sort partitions in parallel
        #[arg(long)]
        parallel_sort: bool,

        /// Output directory, one `mr-out-<partition>` file per reducer.
        /// Reduce output goes to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print run statistics as JSON to stderr
        #[arg(long)]
        stats: bool,

        /// Auxiliary arguments to pass to the MapReduce application.
        #[clap(value_parser, last = true)]
        args: Vec<String>,
    },
    /// List the available workloads
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartitionerKind {
    /// djb2 string hash
    Djb2,
    /// FNV-1a hash, masked to 31 bits
    Fnv,
}

impl PartitionerKind {
    pub fn function(self) -> fn(&str, usize) -> usize {
        match self {
            PartitionerKind::Djb2 => crate::default_hash_partition,
            PartitionerKind::Fnv => crate::fnv_hash_partition,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub inputs: Vec<String>,
    pub workload: String,
    pub output: Option<PathBuf>,
    pub partitioner: PartitionerKind,
    pub config: RunConfig,
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_command_parses_flags_and_aux_args() {
        let args = Args::try_parse_from([
            "standalone", "-v", "run", "a.txt", "b*.txt", "-w", "grep", "-m", "3", "-r", "2",
            "--partitioner", "fnv", "--stats", "--", "--term", "fox",
        ])
        .unwrap();

        assert_eq!(args.verbose, 1);
        match args.command {
            Commands::Run {
                inputs,
                workload,
                mappers,
                reducers,
                partitioner,
                stats,
                args,
                output,
                ..
            } => {
                assert_eq!(inputs, ["a.txt", "b*.txt"]);
                assert_eq!(workload, "grep");
                assert_eq!(mappers, Some(3));
                assert_eq!(reducers, Some(2));
                assert_eq!(partitioner, PartitionerKind::Fnv);
                assert!(stats);
                assert!(output.is_none());
                assert_eq!(args, ["--term", "fox"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_requires_inputs() {
        assert!(Args::try_parse_from(["standalone", "run", "-w", "wc"]).is_err());
    }
}
