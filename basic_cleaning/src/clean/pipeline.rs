//! The cleaning job: download, clean, persist, register.
//!
//! # Example
//!
//! ```rust,no_run
//! use basic_cleaning::clean::{run, CleaningOptions, OutputSpec, PriceRange};
//! use basic_cleaning::store::LocalStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = LocalStore::new(".artifacts");
//!     let options = CleaningOptions {
//!         input_artifact: "sample.csv:latest".parse()?,
//!         output: OutputSpec::new("clean_sample.csv", "clean_sample", "Data with outliers removed"),
//!         price_range: PriceRange::new(10.0, 350.0),
//!     };
//!     let report = run(&store, &options).await?;
//!     println!("{} of {} rows kept", report.rows_out, report.rows_in);
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::steps::{
    convert_last_review, filter_geolocation, filter_price, PriceRange, NYC_BOUNDING_BOX,
};
use crate::dataset::{read_csv_path, write_csv_path, Dataset};
use crate::error::{PipelineError, PipelineResult, Step};
use crate::store::{ArtifactManifest, ArtifactRef, ArtifactStore, NewArtifact, RunInfo};

/// Job type recorded on every artifact this job registers.
pub const JOB_TYPE: &str = "basic_cleaning";

/// Where and how to publish the cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSpec {
    /// Artifact name in the store.
    pub name: String,
    /// Artifact type tag.
    pub artifact_type: String,
    pub description: String,
    /// Local file the CSV is written to before registration.
    pub local_path: PathBuf,
}

impl OutputSpec {
    /// Output written to `./<name>`.
    pub fn new(
        name: impl Into<String>,
        artifact_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            local_path: PathBuf::from(&name),
            name,
            artifact_type: artifact_type.into(),
            description: description.into(),
        }
    }

    /// Write the local file to `path` instead.
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = path.into();
        self
    }
}

/// Parameters of one run.
#[derive(Debug, Clone)]
pub struct CleaningOptions {
    pub input_artifact: ArtifactRef,
    pub output: OutputSpec,
    pub price_range: PriceRange,
}

impl CleaningOptions {
    /// Parameters as recorded in the run record.
    pub fn run_config(&self) -> Map<String, Value> {
        let config = json!({
            "input_artifact": self.input_artifact.to_string(),
            "output_artifact": self.output.name,
            "output_type": self.output.artifact_type,
            "output_description": self.output.description,
            "output_path": self.output.local_path.display().to_string(),
            "min_price": self.price_range.min,
            "max_price": self.price_range.max,
        });
        match config {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Row counts after each filtering stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub input: usize,
    pub after_price_filter: usize,
    pub output: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningReport {
    /// Concrete input version that was cleaned.
    pub input: String,
    pub rows_in: usize,
    pub rows_after_price_filter: usize,
    pub rows_out: usize,
    pub local_path: PathBuf,
    pub output: ArtifactManifest,
}

/// Run the in-memory steps: price filter, date conversion, geolocation filter.
pub fn clean(dataset: &mut Dataset, price_range: PriceRange) -> PipelineResult<RowCounts> {
    let input = dataset.len();

    let after_price_filter =
        filter_price(dataset, price_range).map_err(PipelineError::dataset(Step::PriceFilter))?;

    convert_last_review(dataset).map_err(PipelineError::dataset(Step::DateConversion))?;

    let output = filter_geolocation(dataset, NYC_BOUNDING_BOX)
        .map_err(PipelineError::dataset(Step::GeoFilter))?;

    Ok(RowCounts {
        input,
        after_price_filter,
        output,
    })
}

/// Run the whole job against `store`.
///
/// Any failure aborts the run. A failure during registration leaves the
/// local output file in place.
pub async fn run<S: ArtifactStore>(
    store: &S,
    options: &CleaningOptions,
) -> PipelineResult<CleaningReport> {
    let run_info = RunInfo::start(JOB_TYPE, options.run_config());
    info!(run_id = %run_info.id, job_type = JOB_TYPE, "Starting run");

    // Step 0: download
    info!("Download input artifact: {}", options.input_artifact);
    let input = store
        .resolve(&options.input_artifact)
        .await
        .map_err(PipelineError::store(Step::Download))?;
    let input_ref = input.reference();
    let mut dataset =
        read_csv_path(&input.local_path).map_err(PipelineError::dataset(Step::Download))?;
    info!(
        artifact = %input_ref,
        rows = dataset.len(),
        columns = dataset.headers().len(),
        "Read {} rows",
        dataset.len()
    );

    // Steps 1-3
    let counts = clean(&mut dataset, options.price_range)?;

    // Step 4: persist and register
    let output = &options.output;
    info!("Store cleaned dataset in: {}", output.local_path.display());
    write_csv_path(&dataset, &output.local_path).map_err(PipelineError::dataset(Step::Persist))?;

    info!("Logging artifact: {}", output.name);
    let manifest = store
        .register(NewArtifact {
            path: output.local_path.clone(),
            name: output.name.clone(),
            artifact_type: output.artifact_type.clone(),
            description: output.description.clone(),
            parent: Some(input_ref.clone()),
            producer: Some(run_info),
        })
        .await
        .map_err(PipelineError::store(Step::Register))?;

    Ok(CleaningReport {
        input: input_ref.to_string(),
        rows_in: counts.input,
        rows_after_price_filter: counts.after_price_filter,
        rows_out: counts.output,
        local_path: output.local_path.clone(),
        output: manifest,
    })
}
