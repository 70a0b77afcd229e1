//! Job Runner
//!
//! Runs one independent load → place → emit pipeline per input file.
//!
//! # Isolation
//!
//! 1. Every job builds its own `Topology` and owns it until it is dropped
//! 2. Jobs never exchange data; completion order does not matter
//! 3. An error or panic in one job is reported for that job only
//! 4. Within a job the three stages run strictly one after another

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn, Instrument};

use crate::adapters::{FileAssignmentSink, FileTopologySource};
use crate::domain::ports::{AssignmentSink, TopologySource};
use crate::error::{Error, Result};
use crate::metrics;
use crate::placement::{PlacementConfig, PlacementEngine, PlacementReport};

/// Dataset names processed when no input is given.
pub const DEFAULT_DATASETS: [&str; 4] = [
    "kittens",
    "me_at_the_zoo",
    "trending_today",
    "videos_worth_spreading",
];

// =============================================================================
// Configuration
// =============================================================================

/// What the runner does after spawning its jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinPolicy {
    /// Wait for every job and report each outcome
    #[default]
    Join,
    /// Spawn and return at once; jobs still running when the runtime shuts
    /// down are dropped without writing output
    Detach,
}

/// Configuration for the job runner
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Placement settings shared by every job
    pub placement: PlacementConfig,

    pub join_policy: JoinPolicy,

    /// Upper bound on jobs running at once (`None` = all of them)
    pub max_concurrent_jobs: Option<usize>,
}

// =============================================================================
// Jobs
// =============================================================================

/// One input file and where its result goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSpec {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl JobSpec {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Output next to the input, or in `output_dir`, with the `.out` extension.
    pub fn for_input(input: impl Into<PathBuf>, output_dir: Option<&Path>) -> Self {
        let input = input.into();
        let output = match (output_dir, input.file_name()) {
            (Some(dir), Some(name)) => dir.join(name).with_extension("out"),
            _ => input.with_extension("out"),
        };
        Self { input, output }
    }

    /// The four default datasets under `data_dir`.
    pub fn defaults(data_dir: &Path, output_dir: Option<&Path>) -> Vec<Self> {
        DEFAULT_DATASETS
            .iter()
            .map(|name| Self::for_input(data_dir.join(format!("{}.in", name)), output_dir))
            .collect()
    }
}

/// Result of one job
#[derive(Debug)]
pub struct JobOutcome {
    pub spec: JobSpec,
    pub result: Result<PlacementReport>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Load, place and emit through the given ports.
///
/// Placement runs on the blocking pool; the topology moves there and back
/// so exactly one stage touches it at a time.
pub async fn run_pipeline(
    source: &dyn TopologySource,
    sink: &dyn AssignmentSink,
    engine: PlacementEngine,
) -> Result<PlacementReport> {
    let topology = source.load().await?;

    let input = PathBuf::from(source.describe());
    let (topology, report) = on_blocking_pool(&input, move || {
        let mut topology = topology;
        let report = engine.place(&mut topology);
        (topology, report)
    })
    .await?;
    let report = report?;

    sink.emit(&topology).await?;
    Ok(report)
}

/// Run `work` on the blocking pool inside the current span.
///
/// A panic in `work` becomes [`Error::JobPanicked`] for `input`.
async fn on_blocking_pool<T, F>(input: &Path, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(work))
        .await
        .map_err(|e| {
            if e.is_panic() {
                Error::JobPanicked {
                    input: input.to_path_buf(),
                }
            } else {
                Error::Internal(format!("Placement task failed: {}", e))
            }
        })
}

/// Run one file-to-file job.
#[instrument(skip(engine), fields(input = %spec.input.display()))]
pub async fn run_job(spec: &JobSpec, engine: PlacementEngine) -> Result<PlacementReport> {
    let source = FileTopologySource::new(&spec.input);
    let sink = FileAssignmentSink::new(&spec.output);

    let result = run_pipeline(&source, &sink, engine).await;
    match &result {
        Ok(report) => {
            metrics::record_job("success");
            info!(
                "End of the file: {} ({} placements, score {})",
                spec.input.display(),
                report.placements,
                report.score.score
            );
        }
        Err(Error::JobPanicked { .. }) => {
            metrics::record_job("panicked");
            error!("Job for {} panicked", spec.input.display());
        }
        Err(e) => {
            metrics::record_job("failed");
            error!("Job for {} failed: {}", spec.input.display(), e);
        }
    }

    result.map_err(|e| match e {
        e @ (Error::JobFailed { .. } | Error::JobPanicked { .. }) => e,
        other => Error::JobFailed {
            input: spec.input.clone(),
            reason: other.to_string(),
        },
    })
}

// =============================================================================
// Runner
// =============================================================================

/// Runs independent jobs in parallel
#[derive(Debug, Clone, Default)]
pub struct JobRunner {
    config: RunnerConfig,
}

impl JobRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Spawn one task per job.
    ///
    /// With [`JoinPolicy::Join`] the outcomes come back in the order of
    /// `jobs`. With [`JoinPolicy::Detach`] the returned list is empty.
    pub async fn run(&self, jobs: Vec<JobSpec>) -> Vec<JobOutcome> {
        let permits = self
            .config
            .max_concurrent_jobs
            .unwrap_or(jobs.len())
            .max(1);
        let semaphore = Arc::new(Semaphore::new(permits));

        info!(
            "Starting {} jobs ({} at a time, {:?})",
            jobs.len(),
            permits,
            self.config.join_policy
        );

        let mut specs = Vec::with_capacity(jobs.len());
        let mut handles = Vec::with_capacity(jobs.len());

        for spec in jobs {
            let semaphore = semaphore.clone();
            let engine = PlacementEngine::new(self.config.placement);
            let task_spec = spec.clone();
            let span = tracing::info_span!("job", input = %spec.input.display());

            handles.push(tokio::spawn(
                async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| Error::Internal(format!("Job semaphore closed: {}", e)))?;
                    run_job(&task_spec, engine).await
                }
                .instrument(span),
            ));
            specs.push(spec);
        }

        if self.config.join_policy == JoinPolicy::Detach {
            warn!(
                "Detached {} jobs; unfinished jobs are dropped at shutdown",
                handles.len()
            );
            return Vec::new();
        }

        let joined = join_all(handles).await;

        specs
            .into_iter()
            .zip(joined)
            .map(|(spec, joined)| {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => {
                        metrics::record_job("panicked");
                        error!("Job for {} panicked", spec.input.display());
                        Err(Error::JobPanicked {
                            input: spec.input.clone(),
                        })
                    }
                    Err(e) => Err(Error::JobFailed {
                        input: spec.input.clone(),
                        reason: format!("task cancelled: {}", e),
                    }),
                };
                JobOutcome { spec, result }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryAssignmentSink, InMemoryTopologySource};
    use assert_matches::assert_matches;

    // =========================================================================
    // Configuration Tests
    // =========================================================================

    #[test]
    fn test_runner_config_default() {
        let config = RunnerConfig::default();
        assert_eq!(config.join_policy, JoinPolicy::Join);
        assert_eq!(config.max_concurrent_jobs, None);
        assert_eq!(config.placement, PlacementConfig::default());
    }

    // =========================================================================
    // JobSpec Tests
    // =========================================================================

    #[test]
    fn test_job_spec_output_next_to_input() {
        let spec = JobSpec::for_input("/data/kittens.in", None);
        assert_eq!(spec.output, PathBuf::from("/data/kittens.out"));
    }

    #[test]
    fn test_job_spec_output_dir() {
        let spec = JobSpec::for_input("/data/kittens.in", Some(Path::new("/results")));
        assert_eq!(spec.output, PathBuf::from("/results/kittens.out"));
    }

    #[test]
    fn test_default_datasets() {
        let specs = JobSpec::defaults(Path::new("/data"), None);
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[0].input, PathBuf::from("/data/kittens.in"));
        assert_eq!(
            specs[3].output,
            PathBuf::from("/data/videos_worth_spreading.out")
        );
    }

    // =========================================================================
    // Pipeline Tests
    // =========================================================================

    #[tokio::test]
    async fn test_pipeline_through_memory_ports() {
        let source =
            InMemoryTopologySource::new("tiny", "1 1 1 1 100\n100\n1000 1\n0 10\n0 0 1\n");
        let sink = InMemoryAssignmentSink::new();

        let report = run_pipeline(&source, &sink, PlacementEngine::default())
            .await
            .unwrap();

        assert_eq!(report.placements, 1);
        assert_eq!(sink.last().as_deref(), Some("1\n0 0\n"));
    }

    #[tokio::test]
    async fn test_pipeline_load_error_skips_emit() {
        let source = InMemoryTopologySource::new("bad", "1 1 0 1 100\n100\n1000 1\n5 10\n");
        let sink = InMemoryAssignmentSink::new();

        let result = run_pipeline(&source, &sink, PlacementEngine::default()).await;

        assert_matches!(result, Err(Error::MalformedReference { .. }));
        assert!(sink.outputs().is_empty());
    }

    #[tokio::test]
    async fn test_blocking_panic_is_job_panicked() {
        let input = Path::new("/data/kittens.in");
        let result: Result<()> = on_blocking_pool(input, || panic!("placement blew up")).await;

        assert_matches!(result, Err(Error::JobPanicked { input }) if input == Path::new("/data/kittens.in"));
    }

    #[tokio::test]
    async fn test_blocking_pool_returns_value() {
        let result = on_blocking_pool(Path::new("x.in"), || 41 + 1).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_run_job_wraps_errors() {
        let spec = JobSpec::new("/nonexistent/edgeplace.in", "/nonexistent/edgeplace.out");
        let result = run_job(&spec, PlacementEngine::default()).await;
        assert_matches!(result, Err(Error::JobFailed { .. }));
    }
}
