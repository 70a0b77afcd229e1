//! Placement module
//!
//! Decides which items go on which cache servers.
//!
//! # Usage
//!
//! ```
//! use edgeplace::domain::{CacheId, Topology};
//! use edgeplace::placement::PlacementEngine;
//!
//! let mut topology = Topology::new(1, 100);
//! let item = topology.add_item(100);
//! let ap = topology.add_access_point(1000);
//! topology.connect(ap, CacheId(0), 10)?;
//! topology.add_demand(item, ap, 1)?;
//!
//! let report = PlacementEngine::default().place(&mut topology)?;
//! assert_eq!(report.placements, 1);
//! assert_eq!(topology.caches()[0].items(), &[item]);
//! # Ok::<(), edgeplace::Error>(())
//! ```

mod engine;

#[cfg(test)]
mod proptest;

pub use engine::{
    aggregate_weights, rank_items, PlacementConfig, PlacementEngine, PlacementReport,
    PlacementStrategy, WeightGrouping,
};
