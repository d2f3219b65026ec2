//! Shared helpers for the delimited tables exported by the annotation tools.
//!
//! Exports come from spreadsheets and pandas with either `,` or `;` as the
//! separator, sometimes a decimal comma, and sometimes a UTF-8 BOM.

use crate::error::PredictorError;
use anyhow::{Context, Result};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// Pick `;`, tab or `,` from the header line.
    #[default]
    Auto,
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    fn byte(self) -> Option<u8> {
        match self {
            Delimiter::Auto => None,
            Delimiter::Comma => Some(b','),
            Delimiter::Semicolon => Some(b';'),
            Delimiter::Tab => Some(b'\t'),
        }
    }

    /// Resolve `Auto` against the file's first line.
    pub fn resolve(self, path: &Path) -> Result<u8> {
        if let Some(b) = self.byte() {
            return Ok(b);
        }
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut header = String::new();
        BufReader::new(file)
            .read_line(&mut header)
            .with_context(|| format!("reading header of {}", path.display()))?;
        Ok(sniff_delimiter(&header))
    }
}

pub fn sniff_delimiter(header: &str) -> u8 {
    let count = |c: char| header.matches(c).count();
    let (semi, tab, comma) = (count(';'), count('\t'), count(','));
    if semi > 0 && semi >= comma && semi >= tab {
        b';'
    } else if tab > 0 && tab >= comma {
        b'\t'
    } else {
        b','
    }
}

/// Open a headed table and return the reader with its cleaned header row.
pub fn open_table(path: &Path, delimiter: u8) -> Result<(Reader<File>, StringRecord)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let raw = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?;
    let headers: StringRecord = raw
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();
    Ok((reader, headers))
}

pub fn locate_column(headers: &StringRecord, requested: &str, path: &Path) -> Result<usize, PredictorError> {
    headers
        .iter()
        .position(|name| name.eq_ignore_ascii_case(requested))
        .ok_or_else(|| PredictorError::MissingColumn {
            column: requested.to_string(),
            path: path.to_path_buf(),
        })
}

/// Parse a numeric cell. A decimal comma is accepted unless `,` is the delimiter.
/// Empty cells and `NaN` come back as `None`.
pub fn parse_number(cell: &str, delimiter: u8) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = if delimiter != b',' && trimmed.contains(',') {
        trimmed.replace(',', ".").parse::<f64>().ok()
    } else {
        trimmed.parse::<f64>().ok()
    };
    parsed.filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn sniffs_separator_from_header() {
        assert_eq!(sniff_delimiter("BEGIN;END;surprisal\n"), b';');
        assert_eq!(sniff_delimiter("BEGIN,END,surprisal\n"), b',');
        assert_eq!(sniff_delimiter("onset\tduration\n"), b'\t');
        assert_eq!(sniff_delimiter("BEGIN\n"), b',');
    }

    #[test]
    fn parses_decimal_comma_only_off_comma_tables() {
        assert_eq!(parse_number("3,25", b';'), Some(3.25));
        assert_eq!(parse_number(" 4410.5 ", b','), Some(4410.5));
        assert_eq!(parse_number("3,25", b','), None);
        assert_eq!(parse_number("", b';'), None);
        assert_eq!(parse_number("NaN", b','), None);
        assert_eq!(parse_number("abc", b','), None);
    }

    #[test]
    fn strips_bom_from_header() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "\u{feff}token_id;Zipf_freq\n1;4,5\n")?;
        let (_, headers) = open_table(file.path(), b';')?;
        assert_eq!(locate_column(&headers, "TOKEN_ID", file.path())?, 0);
        let err = locate_column(&headers, "surprisal", file.path()).unwrap_err();
        assert!(err.to_string().contains("surprisal"));
        Ok(())
    }
}
