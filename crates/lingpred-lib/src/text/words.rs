//! Subword-token to word reconstruction.
//!
//! Language-model features (surprisal, dissimilarity) arrive per subword token.
//! Words start at a SentencePiece `▁` or BPE `Ġ` marker; a bare apostrophe
//! token closes the current word so Italian elisions stay attached (`l'`).

use crate::error::PredictorError;
use crate::io::table::{locate_column, open_table, parse_number, Delimiter};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

const MARKERS: [char; 2] = ['\u{2581}', '\u{0120}'];
const APOSTROPHE_VARIANTS: [char; 4] = ['\u{2019}', '\u{2018}', '\u{02BC}', '\u{FF07}'];

/// How token values combine into one word value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Mean over non-NaN values; NaN when all are NaN.
    #[default]
    Mean,
    /// Sum over non-NaN values.
    Sum,
    /// Product with NaN treated as 1.
    Product,
}

impl Aggregation {
    pub fn apply(self, values: &[f64]) -> f64 {
        let finite = values.iter().copied().filter(|v| !v.is_nan());
        match self {
            Aggregation::Mean => {
                let (sum, n) = finite.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                if n == 0 {
                    f64::NAN
                } else {
                    sum / n as f64
                }
            }
            Aggregation::Sum => finite.sum(),
            Aggregation::Product => finite.product(),
        }
    }
}

impl FromStr for Aggregation {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "product" => Ok(Self::Product),
            other => Err(PredictorError::invalid_parameter(
                "agg",
                format!("unsupported aggregation {:?} (expected mean, sum or product)", other),
            )),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => f.write_str("mean"),
            Self::Sum => f.write_str("sum"),
            Self::Product => f.write_str("product"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordValue {
    pub word: String,
    pub value: f64,
}

/// NFC-normalize and fold apostrophe look-alikes to `'`.
pub fn normalize_text(text: &str) -> String {
    text.nfc()
        .map(|c| {
            if APOSTROPHE_VARIANTS.contains(&c) {
                '\''
            } else {
                c
            }
        })
        .collect()
}

/// Unicode general category P* (connector, dash, open, close, initial, final, other).
pub fn is_punctuation(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation
    )
}

fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| c != '\'' && is_punctuation(c))
}

#[derive(Default)]
struct Pending {
    pieces: Vec<String>,
    values: Vec<f64>,
}

impl Pending {
    fn flush(&mut self, agg: Aggregation, out: &mut Vec<WordValue>) {
        let joined: String = self.pieces.concat();
        let word = joined
            .replace(&MARKERS[..], " ")
            .trim()
            .to_string();
        if !word.is_empty() {
            out.push(WordValue {
                word,
                value: agg.apply(&self.values),
            });
        }
        self.pieces.clear();
        self.values.clear();
    }
}

pub fn reconstruct_words<S: AsRef<str>>(
    tokens: &[S],
    values: &[f64],
    agg: Aggregation,
) -> Result<Vec<WordValue>, PredictorError> {
    if tokens.len() != values.len() {
        return Err(PredictorError::invalid_parameter(
            "values",
            format!("{} tokens but {} values", tokens.len(), values.len()),
        ));
    }
    let mut words = Vec::new();
    let mut pending = Pending::default();
    for (raw, &value) in tokens.iter().zip(values) {
        let tok = normalize_text(raw.as_ref());
        if let Some(rest) = tok.strip_prefix(&MARKERS[..]) {
            pending.flush(agg, &mut words);
            if !rest.is_empty() {
                pending.pieces.push(rest.to_string());
                pending.values.push(value);
            }
        } else if tok == "'" {
            if let Some(last) = pending.pieces.last_mut() {
                last.push('\'');
                pending.values.push(value);
                pending.flush(agg, &mut words);
            } else {
                words.push(WordValue {
                    word: "'".into(),
                    value,
                });
            }
        } else {
            pending.pieces.push(tok);
            pending.values.push(value);
        }
    }
    pending.flush(agg, &mut words);

    Ok(words
        .into_iter()
        .filter_map(|w| {
            let cleaned = strip_punctuation(&w.word);
            (!cleaned.is_empty()).then(|| WordValue {
                word: cleaned.to_string(),
                value: w.value,
            })
        })
        .collect())
}

/// Read `(token, value)` pairs from a table; unparsable values become NaN.
pub fn read_token_values(
    path: &Path,
    token_column: &str,
    value_column: &str,
    delimiter: Delimiter,
) -> Result<(Vec<String>, Vec<f64>)> {
    let delimiter = delimiter.resolve(path)?;
    let (mut reader, headers) = open_table(path, delimiter)?;
    let token_idx = locate_column(&headers, token_column, path)?;
    let value_idx = locate_column(&headers, value_column, path)?;
    let mut tokens = Vec::new();
    let mut values = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("reading row {} of {}", row + 1, path.display()))?;
        tokens.push(record.get(token_idx).unwrap_or("").to_string());
        values.push(
            record
                .get(value_idx)
                .and_then(|cell| parse_number(cell, delimiter))
                .unwrap_or(f64::NAN),
        );
    }
    Ok((tokens, values))
}

pub fn write_word_values(path: &Path, words: &[WordValue], value_column: &str) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["word", value_column])?;
    for w in words {
        let value = w.value.to_string();
        writer.write_record([w.word.as_str(), value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
