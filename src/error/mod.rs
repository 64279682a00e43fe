//! Error handling for the EVE scraper.

pub mod util;

use std::io;
use std::path::{Path, PathBuf};

/// Specialized error type for the EVE scraper
#[derive(Debug, thiserror::Error)]
pub enum EveError {
    /// The feature item or table could not be located, or the service
    /// answered with an error payload
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// An HTTP request to the feature service failed
    #[error("Transport error while {context}: {message}")]
    Transport { context: String, message: String },

    /// A record is missing a required field or carries the wrong type
    #[error("Malformed record: field '{field}' {reason}")]
    MalformedRecord { field: String, reason: String },

    /// No populated period was found within the lookback window
    #[error("No data found for periods {lowest}..={start}")]
    PeriodsExhausted { start: i64, lowest: i64 },

    /// The fetch returned nothing to publish
    #[error("No records to publish")]
    EmptyDataset,

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error opening, reading or writing a file
    #[error("IO error{}: {source}", path_suffix(.path.as_deref()))]
    Io {
        source: io::Error,
        path: Option<PathBuf>,
    },

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parse failure
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV writing failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

fn path_suffix(path: Option<&Path>) -> String {
    path.map(|p| format!(" ({})", p.display()))
        .unwrap_or_default()
}

impl From<io::Error> for EveError {
    fn from(error: io::Error) -> Self {
        Self::Io {
            source: error,
            path: None,
        }
    }
}

impl EveError {
    /// Create a malformed-record error for a field
    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a transport error with a description of the failed call
    pub fn transport(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Attach a path to an IO error
    #[must_use]
    pub fn with_path(self, path: &Path) -> Self {
        match self {
            Self::Io { source, .. } => Self::Io {
                source,
                path: Some(path.to_path_buf()),
            },
            other => other,
        }
    }
}

/// Result type for EVE scraper operations
pub type Result<T> = std::result::Result<T, EveError>;
