//! Error types for sysdelta.
//!
//! Only a handful of conditions are errors at all: most sources degrade to
//! zero or "unavailable" in place. [`CollectError::RequiredSource`] marks the
//! environment-fatal case where the aggregate CPU or memory counters cannot
//! be read.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by collection and its boundary calls.
#[derive(Error, Debug)]
pub enum CollectError {
    /// A counter source without which no rate can be computed.
    #[error("required source {path} unavailable: {source}")]
    RequiredSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CollectError {
    /// Build a required-source error for `path`.
    pub fn required(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CollectError::RequiredSource {
            path: path.into(),
            source,
        }
    }

    /// Whether this is the environment-fatal required-source failure.
    pub fn is_required_source(&self) -> bool {
        matches!(self, CollectError::RequiredSource { .. })
    }
}

/// Result type alias for sysdelta.
pub type Result<T> = std::result::Result<T, CollectError>;
