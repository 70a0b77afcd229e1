//! Error types for Edgeplace

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of entity an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Item,
    CacheServer,
    AccessPoint,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Item => write!(f, "item"),
            EntityKind::CacheServer => write!(f, "cache server"),
            EntityKind::AccessPoint => write!(f, "access point"),
        }
    }
}

/// Errors that can occur while planning placements
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// A line could not be parsed into the expected integers
    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Input ended before all declared records were read
    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    /// A declared count disagrees with the row data
    #[error("Count mismatch for {what}: declared {declared}, found {found}")]
    CountMismatch {
        what: String,
        declared: usize,
        found: usize,
    },

    /// An identifier was referenced that was never declared
    #[error("no such {kind} id {id}")]
    MalformedReference { kind: EntityKind, id: usize },

    // =========================================================================
    // Job Errors
    // =========================================================================
    /// A job failed while loading, placing or emitting
    #[error("Job for {input} failed: {reason}")]
    JobFailed { input: PathBuf, reason: String },

    /// A job task panicked
    #[error("Job for {input} panicked")]
    JobPanicked { input: PathBuf },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a malformed reference error.
    pub fn no_such(kind: EntityKind, id: usize) -> Self {
        Error::MalformedReference { kind, id }
    }
}
