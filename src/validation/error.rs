//! Error types for the localization viewer

use std::path::PathBuf;
use thiserror::Error;

use crate::utils::config::ConfigError;

/// Errors raised while loading, estimating or rendering a case
#[derive(Error, Debug)]
pub enum ViewerError {
    /// A file the case cannot be rendered without is absent
    #[error("Missing required file: {}", path.display())]
    MissingRequiredFile { path: PathBuf },

    #[error("Dataset root not found: {}", path.display())]
    DatasetNotFound { path: PathBuf },

    #[error("Unknown case '{case}'")]
    UnknownCase { case: String },

    #[error("No case selected")]
    NoCaseSelected,

    #[error("Invalid record {}: {reason}", path.display())]
    InvalidRecord { path: PathBuf, reason: String },

    #[error("Failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Render error: {0}")]
    Render(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ViewerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ViewerError::Io { path: path.into(), source }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        ViewerError::Json { path: path.into(), source }
    }

    pub fn invalid_record(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ViewerError::InvalidRecord { path: path.into(), reason: reason.into() }
    }

    /// True when the failure only affects the selected case and the
    /// session can carry on with another one
    pub fn is_case_local(&self) -> bool {
        matches!(
            self,
            ViewerError::MissingRequiredFile { .. }
                | ViewerError::UnknownCase { .. }
                | ViewerError::InvalidRecord { .. }
                | ViewerError::Json { .. }
                | ViewerError::Io { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
