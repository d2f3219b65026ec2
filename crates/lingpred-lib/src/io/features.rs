use super::table::{locate_column, open_table, parse_number, Delimiter};
use crate::error::PredictorError;
use crate::signal::{Event, Events};
use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which columns of a per-stimulus feature table hold the events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTableSpec {
    /// Onset in source-rate samples.
    #[serde(default = "default_onset_column")]
    pub onset_column: String,
    /// Feature value; without one every event is a unit impulse.
    #[serde(default)]
    pub value_column: Option<String>,
    #[serde(default)]
    pub delimiter: Delimiter,
    /// Drop rows whose value cell is empty or NaN instead of failing.
    #[serde(default)]
    pub skip_missing: bool,
}

fn default_onset_column() -> String {
    "BEGIN".into()
}

impl Default for FeatureTableSpec {
    fn default() -> Self {
        Self {
            onset_column: default_onset_column(),
            value_column: None,
            delimiter: Delimiter::Auto,
            skip_missing: false,
        }
    }
}

impl FeatureTableSpec {
    pub fn with_value(column: impl Into<String>) -> Self {
        Self {
            value_column: Some(column.into()),
            ..Self::default()
        }
    }
}

pub fn read_feature_events(path: &Path, spec: &FeatureTableSpec) -> Result<Events> {
    let delimiter = spec.delimiter.resolve(path)?;
    let (mut reader, headers) = open_table(path, delimiter)?;
    let onset_idx = locate_column(&headers, &spec.onset_column, path)?;
    let value_idx = spec
        .value_column
        .as_deref()
        .map(|col| locate_column(&headers, col, path).map(|idx| (idx, col)))
        .transpose()?;

    let mut events = Vec::new();
    let mut skipped = 0usize;
    for (row, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("reading row {} of {}", row + 1, path.display()))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let cell = record.get(onset_idx).unwrap_or("");
        let onset = parse_number(cell, delimiter)
            .ok_or_else(|| invalid(path, row, &spec.onset_column, cell))?;
        let value = match value_idx {
            None => 1.0,
            Some((idx, col)) => {
                let cell = record.get(idx).unwrap_or("");
                match parse_number(cell, delimiter) {
                    Some(v) => v,
                    None if spec.skip_missing => {
                        skipped += 1;
                        continue;
                    }
                    None => return Err(invalid(path, row, col, cell).into()),
                }
            }
        };
        events.push(Event::new(onset, value));
    }
    if skipped > 0 {
        warn!(
            "{}: skipped {} row(s) with a missing value",
            path.display(),
            skipped
        );
    }
    Ok(Events::new(events))
}

/// Read several numeric columns at once; missing cells become NaN.
pub fn read_numeric_columns(
    path: &Path,
    columns: &[&str],
    delimiter: Delimiter,
) -> Result<Vec<Vec<f64>>> {
    let delimiter = delimiter.resolve(path)?;
    let (mut reader, headers) = open_table(path, delimiter)?;
    let indices = columns
        .iter()
        .map(|col| locate_column(&headers, col, path))
        .collect::<Result<Vec<_>, _>>()?;
    let mut out = vec![Vec::new(); columns.len()];
    for (row, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("reading row {} of {}", row + 1, path.display()))?;
        for (slot, &idx) in out.iter_mut().zip(&indices) {
            let cell = record.get(idx).unwrap_or("");
            slot.push(parse_number(cell, delimiter).unwrap_or(f64::NAN));
        }
    }
    Ok(out)
}

fn invalid(path: &Path, row: usize, column: &str, value: &str) -> PredictorError {
    PredictorError::InvalidValue {
        path: path.to_path_buf(),
        row: row + 1,
        column: column.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample(name: &str) -> PathBuf {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        manifest_dir
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .join("test_data")
            .join(name)
    }

    #[test]
    fn reads_comma_table_with_values() {
        let events = read_feature_events(
            &sample("surprisal_story_a.csv"),
            &FeatureTableSpec::with_value("surprisal"),
        )
        .unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(events.events[0], Event::new(4410.0, 2.5));
        assert_eq!(events.events[5].onset_raw, 30870.0);
    }

    #[test]
    fn reads_semicolon_table_with_decimal_comma() {
        let events = read_feature_events(
            &sample("zipf_story_a.csv"),
            &FeatureTableSpec {
                skip_missing: true,
                ..FeatureTableSpec::with_value("Zipf_freq")
            },
        )
        .unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events.events[0].value, 5.75);
    }

    #[test]
    fn missing_value_fails_by_default() {
        let err = read_feature_events(
            &sample("zipf_story_a.csv"),
            &FeatureTableSpec::with_value("Zipf_freq"),
        )
        .unwrap_err();
        let typed = err.downcast_ref::<PredictorError>().expect("typed error");
        assert!(matches!(typed, PredictorError::InvalidValue { row: 3, .. }));
    }

    #[test]
    fn onsets_only_are_unit_impulses() {
        let events =
            read_feature_events(&sample("surprisal_story_a.csv"), &FeatureTableSpec::default())
                .unwrap();
        assert!(events.iter().all(|e| e.value == 1.0));
    }

    #[test]
    fn missing_column_is_named() {
        let err = read_feature_events(
            &sample("surprisal_story_a.csv"),
            &FeatureTableSpec::with_value("entropy"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("entropy"));
    }

    #[test]
    fn reads_parallel_numeric_columns() {
        let cols = read_numeric_columns(
            &sample("zipf_story_a.csv"),
            &["BEGIN", "Zipf_freq"],
            Delimiter::Auto,
        )
        .unwrap();
        assert_eq!(cols[0].len(), 6);
        assert!(cols[1][2].is_nan());
    }
}
