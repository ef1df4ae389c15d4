use crawlq_simhash::SimhashError;
use std::collections::TryReserveError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Fingerprint(#[from] SimhashError),

    #[error("Could not find the root page of {domain}")]
    RootNotFound { domain: String },

    #[error("No HTML page has a usable indegree, cannot pick a section head threshold")]
    EmptyIndegreeDistribution,

    #[error("Invalid record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("Out of memory: {0}")]
    ResourceExhausted(#[from] TryReserveError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the failure comes from running out of memory rather than
    /// from bad input.
    pub fn is_resource_exhaustion(&self) -> bool {
        match self {
            CoreError::ResourceExhausted(_) => true,
            CoreError::Io { source, .. } | CoreError::IoError(source) => {
                source.kind() == std::io::ErrorKind::OutOfMemory
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
