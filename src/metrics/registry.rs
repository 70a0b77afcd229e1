//! Placement Metrics
//!
//! Prometheus counters for jobs and placement decisions. The process-wide
//! set only observes; no job reads it back.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::warn;

use crate::error::{Error, Result};

/// Registry holding every Edgeplace metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Process-wide counters, registered with [`REGISTRY`] on first use.
pub static METRICS: Lazy<PlacementMetrics> = Lazy::new(|| {
    let metrics = PlacementMetrics::new().expect("valid metric definitions");
    if let Err(e) = metrics.register(&REGISTRY) {
        warn!("Failed to register metrics: {}", e);
    }
    metrics
});

/// Counters for jobs and placement decisions.
#[derive(Clone)]
pub struct PlacementMetrics {
    /// Jobs finished, labelled by `status` (`success`, `failed`, `panicked`)
    pub jobs_total: IntCounterVec,
    /// Items added to a cache server
    pub placements_total: IntCounter,
    /// (access point, item) evaluations that found no qualifying cache
    pub skipped_evaluations_total: IntCounter,
}

impl PlacementMetrics {
    pub fn new() -> Result<Self> {
        let jobs_total = IntCounterVec::new(
            Opts::new("edgeplace_jobs_total", "Total number of placement jobs"),
            &["status"],
        )
        .map_err(metric_error)?;
        let placements_total = IntCounter::new(
            "edgeplace_placements_total",
            "Total number of item placements",
        )
        .map_err(metric_error)?;
        let skipped_evaluations_total = IntCounter::new(
            "edgeplace_skipped_evaluations_total",
            "Total number of evaluations without a qualifying cache",
        )
        .map_err(metric_error)?;

        Ok(Self {
            jobs_total,
            placements_total,
            skipped_evaluations_total,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry
            .register(Box::new(self.jobs_total.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(self.placements_total.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(self.skipped_evaluations_total.clone()))
            .map_err(metric_error)?;
        Ok(())
    }

    pub fn record_job(&self, status: &str) {
        self.jobs_total.with_label_values(&[status]).inc();
    }

    pub fn record_placements(&self, placements: u64, skipped: u64) {
        self.placements_total.inc_by(placements);
        self.skipped_evaluations_total.inc_by(skipped);
    }
}

fn metric_error(e: prometheus::Error) -> Error {
    Error::Internal(format!("Metric error: {}", e))
}

pub fn record_job(status: &str) {
    METRICS.record_job(status);
}

pub fn record_placements(placements: u64, skipped: u64) {
    METRICS.record_placements(placements, skipped);
}

/// Render every registered metric in the Prometheus text format.
pub fn gather_text() -> Result<String> {
    // Touch the lazy so families appear even before the first increment.
    Lazy::force(&METRICS);
    encode(&REGISTRY)
}

fn encode(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| Error::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| Error::Internal(format!("Metrics are not valid UTF-8: {}", e)))
}
