//! Topology Loader
//!
//! Reads the line-oriented integer format:
//!
//! ```text
//! V E R C X            counts and per-cache capacity
//! s0 s1 ... sV-1       item sizes
//! Ld K                 for each access point ...
//! c Lc                 ... K cache connections
//! Rv Re Rn             R demand records
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::domain::model::{AccessPointId, CacheId, ItemId, Topology, TopologyHeader};
use crate::domain::ports::TopologySource;
use crate::error::{Error, Result};

// =============================================================================
// Line Reader
// =============================================================================

/// Iterates non-blank lines, tracking 1-based line numbers for errors.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
        }
    }

    /// Next non-blank line parsed as integers.
    fn values(&mut self, expected: &str) -> Result<(usize, Vec<u64>)> {
        let (line_no, line) = loop {
            match self.inner.next() {
                Some((_, line)) if line.trim().is_empty() => continue,
                Some((index, line)) => break (index + 1, line),
                None => {
                    return Err(Error::UnexpectedEof {
                        expected: expected.to_string(),
                    })
                }
            }
        };

        let values = line
            .split_whitespace()
            .map(|token| {
                token.parse::<u64>().map_err(|e| Error::Parse {
                    line: line_no,
                    reason: format!("'{}' in {}: {}", token, expected, e),
                })
            })
            .collect::<Result<Vec<u64>>>()?;

        Ok((line_no, values))
    }

    /// Next line with exactly `count` integer fields.
    fn fields(&mut self, count: usize, expected: &str) -> Result<(usize, Vec<u64>)> {
        let (line_no, values) = self.values(expected)?;
        if values.len() != count {
            return Err(Error::Parse {
                line: line_no,
                reason: format!(
                    "{} needs {} values, found {}",
                    expected,
                    count,
                    values.len()
                ),
            });
        }
        Ok((line_no, values))
    }
}

fn to_count(value: u64, line: usize, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::Parse {
        line,
        reason: format!("{} {} does not fit in memory", what, value),
    })
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse the header line only.
pub fn parse_header(text: &str) -> Result<TopologyHeader> {
    let mut lines = Lines::new(text);
    read_header(&mut lines).map(|(_, header)| header)
}

fn read_header(lines: &mut Lines<'_>) -> Result<(usize, TopologyHeader)> {
    let (line, v) = lines.fields(5, "header 'V E R C X'")?;
    let header = TopologyHeader {
        items: to_count(v[0], line, "item count")?,
        access_points: to_count(v[1], line, "access point count")?,
        requests: to_count(v[2], line, "request count")?,
        caches: to_count(v[3], line, "cache count")?,
        capacity_mb: v[4],
    };
    Ok((line, header))
}

/// Build a topology from the full text of an input file.
pub fn parse_topology(text: &str) -> Result<Topology> {
    let mut lines = Lines::new(text);
    let (header_line, header) = read_header(&mut lines)?;
    let mut topology = Topology::with_header(&header).map_err(|e| Error::Parse {
        line: header_line,
        reason: format!("cache count {} is too large: {}", header.caches, e),
    })?;

    if header.items > 0 {
        let (line, sizes) = lines.values("item sizes")?;
        if sizes.len() != header.items {
            return Err(Error::CountMismatch {
                what: format!("item sizes on line {}", line),
                declared: header.items,
                found: sizes.len(),
            });
        }
        for size in sizes {
            topology.add_item(size);
        }
    }

    for _ in 0..header.access_points {
        let (line, ap_fields) = lines.fields(2, "access point 'Ld K'")?;
        let ap = topology.add_access_point(ap_fields[0]);
        let connections = to_count(ap_fields[1], line, "connection count")?;

        for _ in 0..connections {
            let (line, conn) = lines.fields(2, "connection 'c Lc'")?;
            let cache = to_count(conn[0], line, "cache id")?;
            topology.connect(ap, CacheId(cache), conn[1])?;
        }
    }

    for _ in 0..header.requests {
        let (line, req) = lines.fields(3, "request 'Rv Re Rn'")?;
        let item = to_count(req[0], line, "item id")?;
        let ap = to_count(req[1], line, "access point id")?;
        topology.add_demand(ItemId(item), AccessPointId(ap), req[2])?;
    }

    Ok(topology)
}

// =============================================================================
// File Source
// =============================================================================

/// Loads a topology from an input file on disk.
#[derive(Debug, Clone)]
pub struct FileTopologySource {
    path: PathBuf,
}

impl FileTopologySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TopologySource for FileTopologySource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self), fields(input = %self.path.display()))]
    async fn load(&self) -> Result<Topology> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let topology = parse_topology(&text)?;

        info!(
            "File {} -> V: {}, E: {}, R: {}, C: {}, X: {}",
            self.path.display(),
            topology.items().len(),
            topology.access_points().len(),
            topology.request_count(),
            topology.caches().len(),
            topology.capacity_mb()
        );

        Ok(topology)
    }
}
