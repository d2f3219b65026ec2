use super::table::{locate_column, open_table, parse_number, Delimiter};
use crate::error::PredictorError;
use crate::signal::RoiBounds;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Location of a stimulus' first and last word in the bounds table.
///
/// Rows are 0-based data rows (the header is not counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiTableSpec {
    pub start_row: usize,
    pub end_row: usize,
    #[serde(default = "default_begin_column")]
    pub begin_column: String,
    #[serde(default = "default_end_column")]
    pub end_column: String,
    #[serde(default)]
    pub delimiter: Delimiter,
}

fn default_begin_column() -> String {
    "BEGIN".into()
}

fn default_end_column() -> String {
    "END".into()
}

impl RoiTableSpec {
    pub fn rows(start_row: usize, end_row: usize) -> Self {
        Self {
            start_row,
            end_row,
            begin_column: default_begin_column(),
            end_column: default_end_column(),
            delimiter: Delimiter::Auto,
        }
    }
}

/// `start = table[start_row].BEGIN`, `end = table[end_row].END`.
pub fn read_roi_bounds(path: &Path, spec: &RoiTableSpec) -> Result<RoiBounds> {
    let delimiter = spec.delimiter.resolve(path)?;
    let (mut reader, headers) = open_table(path, delimiter)?;
    let begin_idx = locate_column(&headers, &spec.begin_column, path)?;
    let end_idx = locate_column(&headers, &spec.end_column, path)?;
    let last = spec.start_row.max(spec.end_row);

    let mut start = None;
    let mut end = None;
    for (row, result) in reader.records().enumerate().take(last + 1) {
        let record =
            result.with_context(|| format!("reading row {} of {}", row + 1, path.display()))?;
        let cell = |idx: usize, column: &str| -> Result<f64, PredictorError> {
            let raw = record.get(idx).unwrap_or("");
            parse_number(raw, delimiter).ok_or_else(|| PredictorError::InvalidValue {
                path: path.to_path_buf(),
                row: row + 1,
                column: column.to_string(),
                value: raw.to_string(),
            })
        };
        if row == spec.start_row {
            start = Some(cell(begin_idx, &spec.begin_column)?);
        }
        if row == spec.end_row {
            end = Some(cell(end_idx, &spec.end_column)?);
        }
    }
    let missing = |row| PredictorError::MissingRow {
        row,
        path: path.to_path_buf(),
    };
    let start_raw = start.ok_or_else(|| missing(spec.start_row))?;
    let end_raw = end.ok_or_else(|| missing(spec.end_row))?;
    Ok(RoiBounds::new(start_raw, end_raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bounds_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .join("test_data/roi_bounds.csv")
    }

    #[test]
    fn reads_begin_of_first_and_end_of_last_word() {
        let bounds = read_roi_bounds(&bounds_path(), &RoiTableSpec::rows(0, 1)).unwrap();
        assert_eq!(bounds, RoiBounds::new(4410.0, 34000.0));
        let bounds = read_roi_bounds(&bounds_path(), &RoiTableSpec::rows(2, 3)).unwrap();
        assert_eq!(bounds, RoiBounds::new(2205.0, 20000.0));
    }

    #[test]
    fn missing_row_is_reported() {
        let err = read_roi_bounds(&bounds_path(), &RoiTableSpec::rows(0, 40)).unwrap_err();
        let typed = err.downcast_ref::<PredictorError>().expect("typed error");
        assert!(matches!(typed, PredictorError::MissingRow { row: 40, .. }));
    }

    #[test]
    fn custom_columns_are_checked() {
        let spec = RoiTableSpec {
            end_column: "OFFSET".into(),
            ..RoiTableSpec::rows(0, 1)
        };
        let err = read_roi_bounds(&bounds_path(), &spec).unwrap_err();
        assert!(err.to_string().contains("OFFSET"));
    }
}
