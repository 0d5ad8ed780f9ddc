//! In-memory tabular dataset.
//!
//! A [`Dataset`] is a header row plus an ordered list of [`Row`]s. Cells are
//! kept as read ([`Value::Text`]) until a step asks for a typed view:
//! [`Dataset::numeric_column`] parses numbers on demand and
//! [`Dataset::convert_column`] replaces text cells with parsed values.
//!
//! Empty cells are [`Value::Null`], mirroring a missing value in the source file.

pub mod reader;
pub mod writer;

use chrono::NaiveDateTime;

use crate::error::{DatasetError, DatasetResult};

pub use reader::{read_csv, read_csv_path};
pub use writer::{write_csv, write_csv_path};

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value (empty cell).
    Null,
    /// Raw cell text, written back verbatim.
    Text(String),
    /// Parsed date/time.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Build a cell from raw CSV text.
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() {
            Value::Null
        } else {
            Value::Text(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

/// A record together with the source line it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based line number in the source file (header is line 1).
    pub line: u64,
    /// One value per header, in header order.
    pub values: Vec<Value>,
}

/// An ordered table of rows sharing one header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Create a dataset, rejecting duplicate column names and rows whose
    /// width differs from the header.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> DatasetResult<Self> {
        for (i, header) in headers.iter().enumerate() {
            if headers[..i].contains(header) {
                return Err(DatasetError::DuplicateColumn(header.clone()));
            }
        }
        if let Some(row) = rows.iter().find(|r| r.values.len() != headers.len()) {
            return Err(DatasetError::RaggedRow {
                line: row.line,
                expected: headers.len(),
                found: row.values.len(),
            });
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header row.
    pub fn column_index(&self, name: &str) -> DatasetResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }

    /// Parse `name` as a numeric column, one entry per row.
    ///
    /// Missing cells yield `None`. Any other cell that does not parse as a
    /// float is an error.
    pub fn numeric_column(&self, name: &str) -> DatasetResult<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .map(|row| match &row.values[idx] {
                Value::Null => Ok(None),
                Value::Text(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                    DatasetError::InvalidNumber {
                        column: name.to_string(),
                        line: row.line,
                        value: raw.clone(),
                    }
                }),
                Value::Timestamp(ts) => Err(DatasetError::InvalidNumber {
                    column: name.to_string(),
                    line: row.line,
                    value: ts.to_string(),
                }),
            })
            .collect()
    }

    /// Replace every text cell of `name` with the result of `convert`.
    ///
    /// Stops at the first failure; on error the dataset is left untouched.
    pub fn convert_column<F>(&mut self, name: &str, mut convert: F) -> DatasetResult<()>
    where
        F: FnMut(&str, &Row) -> DatasetResult<Value>,
    {
        let idx = self.column_index(name)?;
        let mut converted = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let value = match &row.values[idx] {
                Value::Text(raw) => convert(raw, row)?,
                other => other.clone(),
            };
            converted.push(value);
        }
        for (row, value) in self.rows.iter_mut().zip(converted) {
            row.values[idx] = value;
        }
        Ok(())
    }

    /// Keep only the rows whose entry in `keep` is `true`.
    ///
    /// `keep` must have one entry per row.
    pub fn retain_mask(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.rows.len());
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let headers = vec!["id".to_string(), "price".to_string()];
        let rows = vec![
            Row { line: 2, values: vec![Value::from_raw("1"), Value::from_raw("50")] },
            Row { line: 3, values: vec![Value::from_raw("2"), Value::from_raw("")] },
            Row { line: 4, values: vec![Value::from_raw("3"), Value::from_raw(" 12.5 ")] },
        ];
        Dataset::new(headers, rows).unwrap()
    }

    #[test]
    fn test_numeric_column_with_missing_values() {
        let ds = sample();
        let prices = ds.numeric_column("price").unwrap();
        assert_eq!(prices, vec![Some(50.0), None, Some(12.5)]);
    }

    #[test]
    fn test_numeric_column_rejects_text() {
        let headers = vec!["price".to_string()];
        let rows = vec![Row { line: 2, values: vec![Value::from_raw("cheap")] }];
        let ds = Dataset::new(headers, rows).unwrap();

        match ds.numeric_column("price") {
            Err(DatasetError::InvalidNumber { line, value, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "cheap");
            }
            other => panic!("expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_column() {
        let ds = sample();
        let err = ds.numeric_column("latitude").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == "latitude"));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let headers = vec!["a".to_string(), "a".to_string()];
        let err = Dataset::new(headers, vec![]).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateColumn(_)));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let headers = vec!["id".to_string(), "price".to_string()];
        let short = vec![Row { line: 2, values: vec![Value::from_raw("1")] }];
        match Dataset::new(headers.clone(), short) {
            Err(DatasetError::RaggedRow { line, expected, found }) => {
                assert_eq!((line, expected, found), (2, 2, 1));
            }
            other => panic!("expected RaggedRow, got {:?}", other),
        }

        let long = vec![Row {
            line: 5,
            values: vec![Value::from_raw("1"), Value::from_raw("2"), Value::from_raw("3")],
        }];
        let err = Dataset::new(headers, long).unwrap_err();
        assert_eq!(err.to_string(), "Line 5: expected 2 fields, found 3");
    }

    #[test]
    fn test_retain_mask_keeps_order() {
        let mut ds = sample();
        ds.retain_mask(&[true, false, true]);
        let lines: Vec<u64> = ds.rows().iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_convert_column_is_all_or_nothing() {
        let mut ds = sample();
        let before = ds.clone();
        let result = ds.convert_column("price", |raw, row| {
            if row.line == 4 {
                Err(DatasetError::InvalidNumber {
                    column: "price".into(),
                    line: row.line,
                    value: raw.to_string(),
                })
            } else {
                Ok(Value::Text(format!("${}", raw)))
            }
        });
        assert!(result.is_err());
        assert_eq!(ds, before);
    }
}
