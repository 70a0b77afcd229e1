//! Infrastructure Adapters
//!
//! This module contains adapter implementations for the domain ports,
//! following the Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                    Ports (Traits)                           │ │
//! │  │          TopologySource        │       AssignmentSink       │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │ FileTopologySource │ FileAssignmentSink                    │ │
//! │  │ InMemoryTopologySource │ InMemoryAssignmentSink            │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use edgeplace::adapters::{FileAssignmentSink, FileTopologySource};
//! use edgeplace::domain::ports::{AssignmentSink, TopologySource};
//!
//! let mut topology = FileTopologySource::new("kittens.in").load().await?;
//! engine.place(&mut topology)?;
//! FileAssignmentSink::new("kittens.out").emit(&topology).await?;
//! ```

mod emitter;
mod loader;
mod memory;

pub use emitter::{render_assignment, FileAssignmentSink};
pub use loader::{parse_header, parse_topology, FileTopologySource};
pub use memory::{InMemoryAssignmentSink, InMemoryTopologySource};
