//! Error types for the arm-sim application.

use std::path::PathBuf;

use control::{DatasetError, OracleError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("API key file not found at {path}; create it with your API key")]
    MissingCredential { path: PathBuf },

    #[error("API key file {path} is empty")]
    EmptyCredential { path: PathBuf },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl AppError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
