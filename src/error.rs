//! Error types for gridsweep.
//!
//! Run-level failures (`SweepError`) abort a region; per-point failures
//! (`LookupError`) are counted and skipped by the aggregator.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures that stop a pipeline run for a region.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Region not found in boundary dataset: {0}")]
    RegionNotFound(String),

    #[error("Unsupported geometry type '{kind}' for region {region}")]
    UnsupportedGeometry { region: String, kind: String },

    #[error("Every ring of region {0} is degenerate (fewer than 3 distinct points)")]
    DegenerateBoundary(String),

    #[error("Failed to parse boundary dataset {path}: {message}")]
    BoundaryParse { path: PathBuf, message: String },

    #[error("Spacing must be a positive, finite number of meters (got {0})")]
    InvalidSpacing(f64),

    #[error("Invalid request template: {0}")]
    Template(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to write results: {0}")]
    Sink(String),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SweepError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Failure of a single remote lookup. Never fatal for a run.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Lookup returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl LookupError {
    /// Check if this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MalformedPayload(_) => false,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Result type alias for run-level operations.
pub type Result<T> = std::result::Result<T, SweepError>;
