use anyhow::{Context, Result};
use log::warn;
use std::fmt::Write as _;
use std::path::Path;

/// Parse a floating point series separated by newlines and/or commas,
/// ignoring blank and `#` comment lines. An empty series is allowed (a
/// predictor cropped to an empty ROI is written that way).
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        for field in trimmed.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            let val: f64 = field
                .parse()
                .with_context(|| format!("line {} is not f64: {}", idx + 1, field))?;
            out.push(val);
        }
    }
    Ok(out)
}

/// Read a newline-delimited floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let series = parse_f64_series(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    if series.is_empty() {
        warn!("{} holds no samples", path.display());
    }
    Ok(series)
}

/// One value per line, no header, shortest round-trip formatting.
pub fn format_f64_series(values: &[f64]) -> String {
    let mut out = String::with_capacity(values.len() * 8);
    for v in values {
        let _ = writeln!(out, "{}", v);
    }
    out
}

pub fn write_f64_series(path: &Path, values: &[f64]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, format_f64_series(values))
        .with_context(|| format!("failed to write {}", path.display()))
}
