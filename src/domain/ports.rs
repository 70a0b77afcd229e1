//! Domain Ports (DDD Port/Adapter Pattern)
//!
//! The job pipeline depends only on these traits. Infrastructure adapters
//! (files on disk, in-memory buffers) implement them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │        TopologySource      │      AssignmentSink     │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                  Adapters (Impls)                    │    │
//! │  │  FileTopologySource │ FileAssignmentSink │ InMemory* │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use super::model::Topology;
use crate::error::Result;

// =============================================================================
// Topology Source Port
// =============================================================================

/// Port producing a freshly built topology for one job.
///
/// Every call must return an independent value; nothing is shared between
/// the topologies handed to different jobs.
///
/// # Example
///
/// ```ignore
/// let source = FileTopologySource::new("kittens.in");
/// let topology = source.load().await?;
/// ```
#[async_trait]
pub trait TopologySource: Send + Sync {
    /// Human readable name of the input, used in logs.
    fn describe(&self) -> String;

    /// Build the entity model.
    async fn load(&self) -> Result<Topology>;
}

// =============================================================================
// Assignment Sink Port
// =============================================================================

/// Port consuming the final cache contents of a job.
#[async_trait]
pub trait AssignmentSink: Send + Sync {
    fn describe(&self) -> String;

    /// Persist the cache → item assignment held in `topology`.
    async fn emit(&self, topology: &Topology) -> Result<()>;
}
