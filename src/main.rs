//! Edgeplace
//!
//! Batch planner placing content items onto edge cache servers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Edgeplace                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │  │   Topology   │───▶│  Placement   │───▶│    Result    │       │
//! │  │    Loader    │    │    Engine    │    │   Emitter    │       │
//! │  └──────────────┘    └──────────────┘    └──────────────┘       │
//! │              one isolated pipeline per input file               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use edgeplace::error::{Error, Result};
use edgeplace::metrics;
use edgeplace::placement::{PlacementConfig, PlacementStrategy, WeightGrouping};
use edgeplace::runner::{JobRunner, JobSpec, JoinPolicy, RunnerConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Edgeplace - Offline content placement for edge cache servers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input files; defaults to the four classic datasets in --data-dir
    inputs: Vec<PathBuf>,

    /// Directory holding the default datasets
    #[arg(long, env = "EDGEPLACE_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Directory for result files (default: next to each input)
    #[arg(long, env = "EDGEPLACE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Placement heuristic (best-weight-first, per-request)
    #[arg(long, env = "EDGEPLACE_STRATEGY", default_value = "best-weight-first")]
    strategy: PlacementStrategy,

    /// Grouping of equal-weight items (grouped, collapse)
    #[arg(long, env = "EDGEPLACE_WEIGHT_GROUPING", default_value = "grouped")]
    weight_grouping: WeightGrouping,

    /// Maximum jobs running at once (default: all)
    #[arg(long, env = "EDGEPLACE_MAX_CONCURRENT_JOBS")]
    max_concurrent_jobs: Option<usize>,

    /// Do not wait for jobs; unfinished jobs are dropped at exit
    #[arg(long, env = "EDGEPLACE_DETACH")]
    detach: bool,

    /// Print a JSON placement report per job
    #[arg(long)]
    report: bool,

    /// Print Prometheus metrics before exiting
    #[arg(long)]
    metrics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args)?;

    let jobs = if args.inputs.is_empty() {
        JobSpec::defaults(&args.data_dir, args.output_dir.as_deref())
    } else {
        args.inputs
            .iter()
            .map(|input| JobSpec::for_input(input, args.output_dir.as_deref()))
            .collect()
    };

    let config = RunnerConfig {
        placement: PlacementConfig {
            strategy: args.strategy,
            weight_grouping: args.weight_grouping,
        },
        join_policy: if args.detach {
            JoinPolicy::Detach
        } else {
            JoinPolicy::Join
        },
        max_concurrent_jobs: args.max_concurrent_jobs,
    };

    info!("Starting Edgeplace");
    info!("  Jobs: {}", jobs.len());
    info!("  Strategy: {}", config.placement.strategy);
    info!("  Weight grouping: {}", config.placement.weight_grouping);
    info!("  Join policy: {:?}", config.join_policy);

    let outcomes = JobRunner::new(config).run(jobs).await;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) if args.report => {
                let json = serde_json::to_string(report)
                    .map_err(|e| Error::Internal(format!("Failed to encode report: {}", e)))?;
                println!("{}", json);
            }
            Ok(_) => {}
            // Already logged by the job itself
            Err(_) => failed += 1,
        }
    }

    if args.metrics {
        print!("{}", metrics::gather_text()?);
    }

    if failed > 0 {
        return Err(Error::Internal(format!(
            "{} of {} jobs failed",
            failed,
            outcomes.len()
        )));
    }

    info!("Edgeplace finished");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive(
            "tokio=warn"
                .parse()
                .map_err(|e| Error::Config(format!("Invalid log directive: {}", e)))?,
        );

    // Logs go to stderr so --report and --metrics output stay parseable.
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
