//! CSV reader.
//!
//! The first row is the header. Every record must have as many fields as the
//! header; empty fields become [`Value::Null`].

use std::io::Read;
use std::path::Path;

use super::{Dataset, Row, Value};
use crate::error::DatasetResult;

/// Read a comma-separated dataset from any reader.
///
/// # Example
/// ```
/// use basic_cleaning::dataset::read_csv;
///
/// let csv = "id,price\n1,50\n2,\n";
/// let ds = read_csv(csv.as_bytes()).unwrap();
///
/// assert_eq!(ds.headers(), ["id", "price"]);
/// assert_eq!(ds.len(), 2);
/// assert!(ds.rows()[1].values[1].is_null());
/// ```
pub fn read_csv<R: Read>(reader: R) -> DatasetResult<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let values = record.iter().map(Value::from_raw).collect();
        rows.push(Row { line, values });
    }

    Dataset::new(headers, rows)
}

/// Read a comma-separated dataset from a file.
pub fn read_csv_path<P: AsRef<Path>>(path: P) -> DatasetResult<Dataset> {
    let file = std::fs::File::open(path.as_ref())?;
    read_csv(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetError;

    #[test]
    fn test_simple_csv() {
        let csv = "name,price\nLoft,120\nRoom,45\n";
        let ds = read_csv(csv.as_bytes()).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[0].values[0].as_text(), Some("Loft"));
        assert_eq!(ds.rows()[1].values[1].as_text(), Some("45"));
    }

    #[test]
    fn test_line_numbers_start_after_header() {
        let csv = "a,b\n1,2\n3,4\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        let lines: Vec<u64> = ds.rows().iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn test_quoted_values_keep_commas() {
        let csv = "name,price\n\"Cozy, bright room\",80\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.rows()[0].values[0].as_text(), Some("Cozy, bright room"));
    }

    #[test]
    fn test_missing_values_are_null() {
        let csv = "a,b,c\n1,,3\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        assert!(ds.rows()[0].values[1].is_null());
        assert_eq!(ds.rows()[0].values[2].as_text(), Some("3"));
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let csv = "a,b\n1,2,3\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Csv(_)));
    }

    #[test]
    fn test_header_only() {
        let ds = read_csv("a,b\n".as_bytes()).unwrap();
        assert_eq!(ds.headers().len(), 2);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = read_csv_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }
}
