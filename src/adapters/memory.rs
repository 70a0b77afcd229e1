//! In-memory adapters.
//!
//! Used by tests and by callers that already hold the input text.

use async_trait::async_trait;
use tracing::debug;

use super::emitter::render_assignment;
use super::loader::parse_topology;
use crate::domain::model::Topology;
use crate::domain::ports::{AssignmentSink, TopologySource};
use crate::error::Result;

/// Parses a topology from text held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryTopologySource {
    name: String,
    text: String,
}

impl InMemoryTopologySource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl TopologySource for InMemoryTopologySource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn load(&self) -> Result<Topology> {
        parse_topology(&self.text)
    }
}

/// Collects rendered assignments for later inspection.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentSink {
    outputs: parking_lot::RwLock<Vec<String>>,
}

impl InMemoryAssignmentSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every assignment emitted so far, oldest first.
    pub fn outputs(&self) -> Vec<String> {
        self.outputs.read().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.outputs.read().last().cloned()
    }
}

#[async_trait]
impl AssignmentSink for InMemoryAssignmentSink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn emit(&self, topology: &Topology) -> Result<()> {
        let body = render_assignment(topology);
        debug!("Collected assignment of {} bytes", body.len());
        self.outputs.write().push(body);
        Ok(())
    }
}
