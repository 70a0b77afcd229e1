//! Result Emitter
//!
//! Writes the final assignment: the number of caches holding anything, then
//! one `cache_id item_id ...` line per such cache, items in placement order.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::domain::model::Topology;
use crate::domain::ports::AssignmentSink;
use crate::error::Result;

/// Render the assignment held in `topology`.
pub fn render_assignment(topology: &Topology) -> String {
    let used: Vec<_> = topology.caches_in_use().collect();

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", used.len());
    for cache in used {
        let _ = write!(out, "{}", cache.id());
        for item in cache.items() {
            let _ = write!(out, " {}", item);
        }
        out.push('\n');
    }
    out
}

/// Writes the assignment to a file, replacing any previous content.
#[derive(Debug, Clone)]
pub struct FileAssignmentSink {
    path: PathBuf,
}

impl FileAssignmentSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AssignmentSink for FileAssignmentSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self, topology), fields(output = %self.path.display()))]
    async fn emit(&self, topology: &Topology) -> Result<()> {
        let body = render_assignment(topology);
        tokio::fs::write(&self.path, body).await?;

        info!(
            "Wrote {} caches to {}",
            topology.caches_in_use().count(),
            self.path.display()
        );
        Ok(())
    }
}
