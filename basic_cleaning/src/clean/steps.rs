//! The cleaning steps.
//!
//! Each step takes the dataset by mutable reference, logs what it is about to
//! do, and either finishes completely or returns an error. The steps never add
//! rows or columns.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, Value};
use crate::error::{DatasetError, DatasetResult};

pub const PRICE_COLUMN: &str = "price";
pub const LAST_REVIEW_COLUMN: &str = "last_review";
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const LATITUDE_COLUMN: &str = "latitude";

/// Closed price interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// Closed longitude/latitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

/// Approximate extent of New York City.
pub const NYC_BOUNDING_BOX: BoundingBox = BoundingBox {
    min_longitude: -74.25,
    max_longitude: -73.50,
    min_latitude: 40.5,
    max_latitude: 41.2,
};

impl BoundingBox {
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.min_longitude..=self.max_longitude).contains(&longitude)
            && (self.min_latitude..=self.max_latitude).contains(&latitude)
    }
}

/// Keep rows whose `price` lies in `range`. Rows with no price are dropped.
pub fn filter_price(dataset: &mut Dataset, range: PriceRange) -> DatasetResult<usize> {
    info!(
        min = range.min,
        max = range.max,
        "Remove price outliers by limiting to these thresholds: min={}, max={}",
        range.min,
        range.max
    );
    if range.is_empty() {
        warn!("min_price is greater than max_price; every row will be dropped");
    }

    let prices = dataset.numeric_column(PRICE_COLUMN)?;
    let keep: Vec<bool> = prices
        .iter()
        .map(|p| p.is_some_and(|p| range.contains(p)))
        .collect();
    Ok(retain(dataset, &keep))
}

/// Convert `last_review` from text to a date/time value.
///
/// Missing cells stay missing. The first malformed value aborts the step.
pub fn convert_last_review(dataset: &mut Dataset) -> DatasetResult<()> {
    info!("Convert variable \"{}\" from string to datetime type", LAST_REVIEW_COLUMN);

    dataset.convert_column(LAST_REVIEW_COLUMN, |raw, row| {
        parse_timestamp(raw)
            .map(Value::Timestamp)
            .ok_or_else(|| DatasetError::InvalidTimestamp {
                column: LAST_REVIEW_COLUMN.to_string(),
                line: row.line,
                value: raw.to_string(),
            })
    })
}

/// Keep rows whose coordinates lie inside `bbox`.
pub fn filter_geolocation(dataset: &mut Dataset, bbox: BoundingBox) -> DatasetResult<usize> {
    info!("Only keep rows that are in the proper geolocation of NYC");

    let longitudes = dataset.numeric_column(LONGITUDE_COLUMN)?;
    let latitudes = dataset.numeric_column(LATITUDE_COLUMN)?;
    let keep: Vec<bool> = longitudes
        .iter()
        .zip(&latitudes)
        .map(|pair| match pair {
            (Some(lon), Some(lat)) => bbox.contains(*lon, *lat),
            _ => false,
        })
        .collect();
    Ok(retain(dataset, &keep))
}

fn retain(dataset: &mut Dataset, keep: &[bool]) -> usize {
    let before = dataset.len();
    dataset.retain_mask(keep);
    let dropped = before - dataset.len();
    debug!(kept = dataset.len(), dropped, "rows filtered");
    dataset.len()
}

/// Parse a date or date/time string.
///
/// Offsets are normalized to UTC and then dropped.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
}
