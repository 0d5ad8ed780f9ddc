//! # basic_cleaning - dataset cleaning step
//!
//! Downloads a listings dataset artifact, removes price outliers and rows
//! outside New York City, converts `last_review` to a date, and registers the
//! result as a new artifact.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Artifact   │────▶│    Price    │────▶│ last_review │────▶│  NYC bbox   │
//! │  (resolve)  │     │   filter    │     │  to date    │     │   filter    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                                         ┌─────────────┐     ┌──────▼──────┐
//!                                         │  Artifact   │◀────│  CSV file   │
//!                                         │ (register)  │     │  (persist)  │
//!                                         └─────────────┘     └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Environment configuration
//! - [`logging`] - Log subscriber setup
//! - [`dataset`] - Table model, CSV reader and writer
//! - [`clean`] - Cleaning steps and the job pipeline
//! - [`store`] - Artifact store trait and backends

// Core modules
pub mod config;
pub mod error;
pub mod logging;

// Data
pub mod dataset;

// Job
pub mod clean;

// Artifact store
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{
    ConfigError, DatasetError, PipelineError, PipelineResult, Step, StoreError,
};

pub use config::{Config, LogFormat, StoreBackend, StoreConfig};

pub use dataset::{read_csv, read_csv_path, write_csv, write_csv_path, Dataset, Row, Value};

pub use clean::{
    clean, run, BoundingBox, CleaningOptions, CleaningReport, OutputSpec, PriceRange, RowCounts,
    NYC_BOUNDING_BOX,
};

pub use store::{
    ArtifactManifest, ArtifactRef, ArtifactStore, HttpStore, LocalStore, NewArtifact,
    ResolvedArtifact, RunInfo, Store, VersionSpec,
};
