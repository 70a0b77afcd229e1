//! Runner Integration Tests
//!
//! Parallel jobs over real files in a temporary directory.

use std::path::Path;
use std::time::Duration;

use assert_matches::assert_matches;
use edgeplace::error::Error;
use edgeplace::runner::{JobRunner, JobSpec, JoinPolicy, RunnerConfig};

const GOOD: &str = "1 1 1 1 100\n100\n1000 1\n0 10\n0 0 1\n";
const TOO_BIG: &str = "1 1 1 1 100\n150\n1000 1\n0 10\n0 0 1\n";
const BAD_REFERENCE: &str = "1 1 1 1 100\n100\n1000 1\n4 10\n0 0 1\n";
const HUGE_CACHE_COUNT: &str = "1 1 1 100000000000000000 100\n100\n1000 1\n0 10\n0 0 1\n";

fn write_input(dir: &Path, name: &str, body: &str) -> JobSpec {
    let input = dir.join(name);
    std::fs::write(&input, body).unwrap();
    JobSpec::for_input(input, None)
}

#[tokio::test]
async fn test_jobs_produce_one_output_each() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = vec![
        write_input(dir.path(), "good.in", GOOD),
        write_input(dir.path(), "too_big.in", TOO_BIG),
    ];

    let outcomes = JobRunner::default().run(jobs.clone()).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert_eq!(outcomes[0].spec, jobs[0]);

    assert_eq!(std::fs::read_to_string(&jobs[0].output).unwrap(), "1\n0 0\n");
    assert_eq!(std::fs::read_to_string(&jobs[1].output).unwrap(), "0\n");
}

#[tokio::test]
async fn test_failing_job_does_not_affect_others() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = vec![
        write_input(dir.path(), "bad.in", BAD_REFERENCE),
        write_input(dir.path(), "good.in", GOOD),
    ];

    let outcomes = JobRunner::default().run(jobs.clone()).await;

    assert_matches!(&outcomes[0].result, Err(Error::JobFailed { reason, .. }) if reason.contains("no such cache server id 4"));
    assert!(!jobs[0].output.exists());

    assert!(outcomes[1].is_success());
    assert_eq!(std::fs::read_to_string(&jobs[1].output).unwrap(), "1\n0 0\n");
}

#[tokio::test]
async fn test_huge_header_fails_only_its_own_job() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = vec![
        write_input(dir.path(), "good.in", GOOD),
        write_input(dir.path(), "huge.in", HUGE_CACHE_COUNT),
    ];

    let outcomes = JobRunner::default().run(jobs.clone()).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_success());
    assert_eq!(std::fs::read_to_string(&jobs[0].output).unwrap(), "1\n0 0\n");

    assert_matches!(&outcomes[1].result, Err(Error::JobFailed { reason, .. }) if reason.contains("cache count"));
    assert!(!jobs[1].output.exists());
}

#[tokio::test]
async fn test_missing_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = vec![JobSpec::for_input(dir.path().join("absent.in"), None)];

    let outcomes = JobRunner::default().run(jobs).await;

    assert_eq!(outcomes.len(), 1);
    assert_matches!(outcomes[0].result, Err(Error::JobFailed { .. }));
}

#[tokio::test]
async fn test_bounded_concurrency_runs_every_job() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let jobs: Vec<JobSpec> = (0..5)
        .map(|i| {
            let input = dir.path().join(format!("job{}.in", i));
            std::fs::write(&input, GOOD).unwrap();
            JobSpec::for_input(input, Some(out_dir.path()))
        })
        .collect();

    let runner = JobRunner::new(RunnerConfig {
        max_concurrent_jobs: Some(2),
        ..Default::default()
    });
    let outcomes = runner.run(jobs.clone()).await;

    assert_eq!(outcomes.len(), 5);
    assert!(outcomes.iter().all(|o| o.is_success()));
    for job in &jobs {
        assert!(job.output.starts_with(out_dir.path()));
        assert!(job.output.exists());
    }
}

#[tokio::test]
async fn test_detached_job_still_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = vec![write_input(dir.path(), "good.in", GOOD)];

    let runner = JobRunner::new(RunnerConfig {
        join_policy: JoinPolicy::Detach,
        ..Default::default()
    });
    let outcomes = runner.run(jobs.clone()).await;

    assert!(outcomes.is_empty());

    // The detached job keeps running while the runtime is alive.
    let mut written = String::new();
    for _ in 0..200 {
        written = std::fs::read_to_string(&jobs[0].output).unwrap_or_default();
        if written == "1\n0 0\n" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(written, "1\n0 0\n");
}
