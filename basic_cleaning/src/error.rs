//! Error types for the cleaning job.
//!
//! - [`DatasetError`] - CSV reading/writing and column access
//! - [`StoreError`] - artifact store resolution and registration
//! - [`ConfigError`] - environment configuration
//! - [`PipelineError`] - top-level errors, tagged with the failing [`Step`]
//!
//! Lower-level errors convert into [`PipelineError`] through
//! [`PipelineError::dataset`] and [`PipelineError::store`], which attach the
//! step that was running so the final message says where the job stopped.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Dataset Errors
// =============================================================================

/// Errors while reading, transforming or writing the tabular dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// An expected column is absent from the header row.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The header row names the same column twice.
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// A row with a different number of cells than the header.
    #[error("Line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A cell that should hold a number does not.
    #[error("Line {line}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        column: String,
        line: u64,
        value: String,
    },

    /// A cell that should hold a date/time does not.
    #[error("Line {line}, column '{column}': cannot parse '{value}' as a date/time")]
    InvalidTimestamp {
        column: String,
        line: u64,
        value: String,
    },
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from an artifact store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The artifact reference could not be parsed.
    #[error("Invalid artifact reference '{0}'")]
    InvalidReference(String),

    /// The store has no such artifact (or version).
    #[error("Artifact not found: {name}:{version}")]
    NotFound { name: String, version: String },

    /// The store answered with a manifest for a different artifact.
    #[error("Asked for artifact {requested}, store returned {returned}")]
    ManifestMismatch { requested: String, returned: String },

    /// The HTTP request itself failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The store answered with a non-success status.
    #[error("Store returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Local I/O failed (download cache, local store directory).
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A manifest could not be (de)serialized.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Http(e.to_string())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in the environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `ARTIFACT_STORE_URL` is not a usable base URL.
    #[error("Invalid ARTIFACT_STORE_URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// `LOG_FORMAT` is neither `text` nor `json`.
    #[error("Invalid LOG_FORMAT '{0}' (expected 'text' or 'json')")]
    InvalidLogFormat(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// The pipeline stage that was running when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Download,
    PriceFilter,
    DateConversion,
    GeoFilter,
    Persist,
    Register,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Download => "download",
            Step::PriceFilter => "price filter",
            Step::DateConversion => "date conversion",
            Step::GeoFilter => "geolocation filter",
            Step::Persist => "persist",
            Step::Register => "register",
        };
        f.write_str(name)
    }
}

/// Top-level error returned by [`crate::clean::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Dataset error raised while running `step`.
    #[error("{step} step failed: {source}")]
    Dataset {
        step: Step,
        #[source]
        source: DatasetError,
    },

    /// Store error raised while running `step`.
    #[error("{step} step failed: {source}")]
    Store {
        step: Step,
        #[source]
        source: StoreError,
    },
}

impl PipelineError {
    /// Wrap a dataset error with the step it came from.
    pub fn dataset(step: Step) -> impl FnOnce(DatasetError) -> Self {
        move |source| PipelineError::Dataset { step, source }
    }

    /// Wrap a store error with the step it came from.
    pub fn store(step: Step) -> impl FnOnce(StoreError) -> Self {
        move |source| PipelineError::Store { step, source }
    }

    /// The step that failed.
    pub fn step(&self) -> Step {
        match self {
            PipelineError::Dataset { step, .. } | PipelineError::Store { step, .. } => *step,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_names_step() {
        let err = DatasetError::MissingColumn("price".into());
        let pipeline_err = PipelineError::dataset(Step::PriceFilter)(err);
        let msg = pipeline_err.to_string();
        assert!(msg.starts_with("price filter step failed"));
        assert!(msg.contains("price"));
        assert_eq!(pipeline_err.step(), Step::PriceFilter);
    }

    #[test]
    fn test_store_error_wrapping() {
        let err = StoreError::NotFound {
            name: "sample.csv".into(),
            version: "latest".into(),
        };
        let pipeline_err = PipelineError::store(Step::Download)(err);
        assert_eq!(
            pipeline_err.to_string(),
            "download step failed: Artifact not found: sample.csv:latest"
        );
    }

    #[test]
    fn test_timestamp_error_format() {
        let err = DatasetError::InvalidTimestamp {
            column: "last_review".into(),
            line: 4,
            value: "yesterday".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 4"));
        assert!(msg.contains("last_review"));
        assert!(msg.contains("yesterday"));
    }
}
