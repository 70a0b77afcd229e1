//! Edgeplace - Offline Content Placement for Edge Caches
//!
//! Decides which items to copy onto which capacity-bounded cache servers so
//! that access points can fetch popular content from a nearby cache instead
//! of the datacenter.
//!
//! # Architecture
//!
//! Each input file becomes one isolated job:
//!
//! ```text
//! Topology Loader → Placement Engine → Result Emitter
//!  (adapters)         (placement)        (adapters)
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - File and in-memory implementations of the domain ports
//! - [`domain`] - Entity model, ports and scoring
//! - [`error`] - Error types
//! - [`metrics`] - Prometheus counters
//! - [`placement`] - Greedy placement heuristics
//! - [`runner`] - Parallel, isolated job execution

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod placement;
pub mod runner;

// Re-export commonly used types
pub use domain::{Score, Topology};
pub use error::{Error, Result};
pub use placement::{PlacementConfig, PlacementEngine, PlacementReport};
pub use runner::{JobRunner, JobSpec, RunnerConfig};
