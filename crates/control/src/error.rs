//! Error types for the control crate.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of a remote torque request. Oracles recover from all of these
/// by falling back to gravity torque; they only surface from transports.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The request could not be sent or was rejected.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response stream broke off or carried unusable data.
    #[error("stream error: {0}")]
    Stream(String),

    /// No complete response arrived within the deadline.
    #[error("deadline of {0:?} exceeded")]
    Timeout(Duration),
}

impl OracleError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }

    /// Creates a stream error.
    #[must_use]
    pub fn stream(reason: impl Into<String>) -> Self {
        Self::Stream(reason.into())
    }
}

/// Errors raised while reading a recorded dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
