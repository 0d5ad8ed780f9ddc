//! Cleaning module.
//!
//! - Steps: price filter, `last_review` conversion, geolocation filter
//! - Pipeline: download, clean, persist, register

pub mod pipeline;
pub mod steps;

pub use pipeline::{
    clean, run, CleaningOptions, CleaningReport, OutputSpec, RowCounts, JOB_TYPE,
};
pub use steps::{
    convert_last_review, filter_geolocation, filter_price, parse_timestamp, BoundingBox,
    PriceRange, NYC_BOUNDING_BOX,
};
