//! Metrics module
//!
//! Provides Prometheus counters for placement jobs.

mod registry;

pub use registry::{
    gather_text, record_job, record_placements, PlacementMetrics, METRICS, REGISTRY,
};
