//! CSV writer.
//!
//! Output is UTF-8, comma-separated, `\n`-terminated, quoted only where
//! needed, with no index column. Text cells are written back exactly as they
//! were read. A timestamp column is written date-only when all its values are
//! at midnight, otherwise with a time of day. Fractional seconds are kept,
//! with one precision (micro- or nanoseconds) for the whole column.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime, Timelike};

use super::{Dataset, Value};
use crate::error::DatasetResult;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATETIME_MICROS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const DATETIME_NANOS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Write `dataset` as CSV to any writer.
///
/// # Example
/// ```
/// use basic_cleaning::dataset::{read_csv, write_csv};
///
/// let ds = read_csv("id,name\n1,Loft\n".as_bytes()).unwrap();
/// let mut out = Vec::new();
/// write_csv(&ds, &mut out).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "id,name\n1,Loft\n");
/// ```
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> DatasetResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let formats = timestamp_formats(dataset);

    wtr.write_record(dataset.headers())?;
    for row in dataset.rows() {
        let fields = row.values.iter().zip(&formats).map(|(value, format)| match value {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Timestamp(ts) => ts.format(format).to_string(),
        });
        wtr.write_record(fields)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `dataset` as CSV to `path`, creating or truncating the file.
pub fn write_csv_path<P: AsRef<Path>>(dataset: &Dataset, path: P) -> DatasetResult<()> {
    let file = File::create(path.as_ref())?;
    let mut out = BufWriter::new(file);
    write_csv(dataset, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Pick the timestamp format of every column.
fn timestamp_formats(dataset: &Dataset) -> Vec<&'static str> {
    (0..dataset.headers().len())
        .map(|idx| {
            let mut timestamps = dataset
                .rows()
                .iter()
                .filter_map(|row| row.values[idx].as_timestamp());
            if timestamps.clone().all(is_midnight) {
                DATE_FORMAT
            } else if timestamps.clone().all(|ts| ts.nanosecond() == 0) {
                DATETIME_FORMAT
            } else if timestamps.all(|ts| ts.nanosecond() % 1_000 == 0) {
                DATETIME_MICROS_FORMAT
            } else {
                DATETIME_NANOS_FORMAT
            }
        })
        .collect()
}

fn is_midnight(ts: NaiveDateTime) -> bool {
    ts.time() == NaiveTime::MIN
}
