//! Domain Layer
//!
//! This module contains the entity model of a placement problem and the
//! ports the job pipeline talks to.
//!
//! # Architecture
//!
//! The domain layer is organized into:
//!
//! - **Model** (`model.rs`) - Items, cache servers, access points, demand records
//! - **Ports** (`ports.rs`) - Trait abstractions for loading and emitting
//! - **Score** (`score.rs`) - Latency savings of a finished assignment
//!
//! # Usage
//!
//! ```
//! use edgeplace::domain::{CacheId, Topology};
//!
//! let mut topology = Topology::new(1, 100);
//! let item = topology.add_item(100);
//! let ap = topology.add_access_point(1000);
//! topology.connect(ap, CacheId(0), 10)?;
//! topology.add_demand(item, ap, 1)?;
//!
//! assert!(topology.access_points()[0].has_demand(item));
//! # Ok::<(), edgeplace::Error>(())
//! ```

pub mod model;
pub mod ports;
pub mod score;

// Re-export commonly used types
pub use model::{
    AccessPoint, AccessPointId, CacheId, CacheServer, DemandRecord, Item, ItemId, Topology,
    TopologyHeader,
};
pub use ports::{AssignmentSink, TopologySource};
pub use score::Score;
