use anyhow::{Context, Result};
use clap::Parser;
use mrlocal::standalone::{engine::perform_job, Args, Commands, Job};
use mrlocal::{utils, workload, RunConfig, Workload};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries reduce output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 1)
        .with_thread_names(verbose >= 1)
        .with_line_number(verbose >= 2)
        .init();

    debug!("standalone started with verbosity level: {}", verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

fn run_standalone_mr_job(job: Job, engine: Workload, print_stats: bool) -> Result<()> {
    let stats = perform_job(&job, &engine)?;
    if print_stats {
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::List => {
            for name in workload::NAMES {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Run {
            inputs,
            workload,
            mappers,
            reducers,
            config,
            partitioner,
            parallel_sort,
            output,
            stats,
            args,
        } => {
            let mut run_config = match config {
                Some(path) => RunConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => RunConfig::default(),
            };
            if let Some(n) = mappers {
                run_config.num_mappers = n;
            }
            if let Some(n) = reducers {
                run_config.num_reducers = n;
            }
            run_config.parallel_sort |= parallel_sort;

            let engine = workload::named(&workload)?;
            let job = Job {
                inputs: utils::expand_inputs(&inputs)?,
                workload,
                output,
                partitioner,
                config: run_config,
                args,
            };
            run_standalone_mr_job(job, engine, stats)
        }
    }
}
