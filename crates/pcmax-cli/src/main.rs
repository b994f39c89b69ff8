//! pcmax CLI - exact P|prec|Cmax solver
//!
//! Command-line interface for checking, solving and benchmarking
//! Patterson `.rcp` scheduling instances.

mod bench;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pcmax_core::{bbsearch_with, BoundMode, SearchError, SearchOptions};
use pcmax_parser::{parse_file, Instance};

/// Exit code when the search deadline expires; distinct from general
/// failures so CI can tell "too hard" from "broken input".
const EXIT_TIMEOUT: i32 = 2;

#[derive(Parser)]
#[command(name = "pcmax")]
#[command(author, version, about = "Exact precedence-constrained multiprocessor scheduling", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance to optimality
    Solve {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of identical machines
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        machines: u32,

        /// Wall-clock budget in whole seconds (unbounded if omitted)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Lower bound consulted before each descent
        #[arg(short, long, value_enum, default_value = "fernandez")]
        bound: BoundArg,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Parse an instance and print graph statistics without solving
    Check {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Time the solver on synthetic topologies
    Bench {
        /// Topology to generate
        #[arg(short = 'T', long, value_enum, default_value = "chain")]
        topology: bench::Topology,

        /// Number of tasks (keep modest: the problem is NP-hard)
        #[arg(short, long, default_value = "12")]
        count: usize,

        /// Number of identical machines
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..), default_value = "3")]
        machines: u32,

        /// Per-run budget in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Run a series of increasing sizes up to --count
        #[arg(short, long)]
        series: bool,
    },
}

/// CLI-facing bound selector, mapped onto the core's [`BoundMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BoundArg {
    /// Disable pruning
    None,
    /// Fernandez work-density bound (default, cheaper per node)
    Fernandez,
    /// Iterative Fujita machine-bound search
    Fujita,
}

impl From<BoundArg> for BoundMode {
    fn from(arg: BoundArg) -> Self {
        match arg {
            BoundArg::None => BoundMode::None,
            BoundArg::Fernandez => BoundMode::Fernandez,
            BoundArg::Fujita => BoundMode::FujitaIterative,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Solve {
            file,
            machines,
            timeout,
            bound,
            format,
        } => solve(&file, machines, timeout, bound, &format),
        Commands::Check { file, format } => check(&file, &format),
        Commands::Bench {
            topology,
            count,
            machines,
            timeout,
            series,
        } => {
            bench::run(topology, count, machines, Duration::from_secs(timeout), series);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load(file: &Path) -> Result<Instance> {
    let instance =
        parse_file(file).with_context(|| format!("failed to parse {}", file.display()))?;
    info!(
        jobs = instance.jobs(),
        critical_path = instance.graph.critical_path(),
        "parsed instance"
    );
    Ok(instance)
}

#[derive(Serialize)]
struct SolveReport {
    file: String,
    jobs: usize,
    machines: u32,
    bound: BoundMode,
    critical_path: u32,
    makespan: u32,
    elapsed_ms: u128,
}

fn solve(file: &Path, machines: u32, timeout: Option<u64>, bound: BoundArg, format: &str) -> Result<()> {
    let instance = load(file)?;
    let options = SearchOptions {
        machines,
        bound: bound.into(),
        timeout: timeout.map(Duration::from_secs),
    };
    let started = Instant::now();
    let makespan = match bbsearch_with(&instance.graph, &options) {
        Ok(makespan) => makespan,
        Err(SearchError::DeadlineExceeded) => {
            eprintln!(
                "pcmax: deadline exceeded after {:.1}s, no optimum proven",
                started.elapsed().as_secs_f64()
            );
            std::process::exit(EXIT_TIMEOUT);
        }
    };
    let report = SolveReport {
        file: file.display().to_string(),
        jobs: instance.jobs(),
        machines,
        bound: options.bound,
        critical_path: instance.graph.critical_path(),
        makespan,
        elapsed_ms: started.elapsed().as_millis(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => {
            println!("instance       {}", report.file);
            println!("jobs           {}", report.jobs);
            println!("machines       {}", report.machines);
            println!("critical path  {}", report.critical_path);
            println!("makespan       {}", report.makespan);
            println!("elapsed        {} ms", report.elapsed_ms);
        }
        other => bail!("unknown format: {other}"),
    }
    Ok(())
}

#[derive(Serialize)]
struct CheckReport {
    file: String,
    jobs: usize,
    edges: usize,
    critical_path: u32,
    capacities: Vec<u32>,
}

fn check(file: &Path, format: &str) -> Result<()> {
    let instance = load(file)?;
    let graph = &instance.graph;
    let edges = (0..graph.len()).map(|id| graph.succs(id).len()).sum();
    let report = CheckReport {
        file: file.display().to_string(),
        jobs: instance.jobs(),
        edges,
        critical_path: graph.critical_path(),
        capacities: instance.capacities,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => {
            println!("instance       {}", report.file);
            println!("jobs           {}", report.jobs);
            println!("edges          {}", report.edges);
            println!("critical path  {}", report.critical_path);
            println!("capacities     {:?}", report.capacities);
        }
        other => bail!("unknown format: {other}"),
    }
    Ok(())
}
