//! Runner module
//!
//! Runs isolated placement jobs, one per input file.

mod job;

pub use job::{
    run_job, run_pipeline, JobOutcome, JobRunner, JobSpec, JoinPolicy, RunnerConfig,
    DEFAULT_DATASETS,
};
