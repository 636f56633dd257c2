//! Error taxonomy for reconciliation runs.
//!
//! Configuration, schema and duplicate-identifier failures are fatal and are
//! raised before anything is written. Report failures are logged by the
//! pipeline after the output exists. A [`RecordError`] never propagates: the
//! engine collects it in the sync summary and keeps going.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("{label}: duplicate IDs found in '{column}': {}", .values.join(", "))]
    DuplicateIds {
        label: String,
        column: String,
        values: Vec<String>,
    },

    #[error("Report generation failed for {path:?}: {message}")]
    Report { path: PathBuf, message: String },
}

impl SyncError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub fn report(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Report {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// A single SOT record that could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("SOT record {position} is missing unique ID '{column}', skipped")]
pub struct RecordError {
    /// 1-based position of the record within the SOT dataset.
    pub position: usize,
    pub column: String,
}
