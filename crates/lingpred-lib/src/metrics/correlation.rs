use serde::{Deserialize, Serialize};

/// Named feature column, e.g. surprisal values for all words of all stories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl FeatureColumn {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub x: String,
    pub y: String,
    /// Rows where both values were finite.
    pub n: usize,
    /// Pearson r; `None` when undefined (fewer than two rows or zero variance).
    pub r: Option<f64>,
}

/// `(v - min) / (max - min)`. NaNs stay NaN and do not affect min/max;
/// a constant column maps to zeros.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let range = max - min;
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                v
            } else if range > 0.0 {
                (v - min) / range
            } else {
                0.0
            }
        })
        .collect()
}

pub fn pearson(x: &[f64], y: &[f64]) -> (usize, Option<f64>) {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return (n, None);
    }
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return (n, None);
    }
    (n, Some(sxy / (sxx.sqrt() * syy.sqrt())))
}

/// Pearson r for every unordered pair of columns, in input order.
pub fn correlate_features(columns: &[FeatureColumn]) -> Vec<CorrelationPair> {
    let mut out = Vec::new();
    for (i, x) in columns.iter().enumerate() {
        for y in &columns[i + 1..] {
            let (n, r) = pearson(&x.values, &y.values);
            out.push(CorrelationPair {
                x: x.name.clone(),
                y: y.name.clone(),
                n,
                r,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{} vs {}", a, b);
    }

    #[test]
    fn min_max_keeps_nan_and_handles_constant() {
        let out = min_max_normalize(&[2.0, f64::NAN, 6.0, 4.0]);
        assert_eq!(out[0], 0.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 1.0);
        assert_eq!(out[3], 0.5);
        assert_eq!(min_max_normalize(&[3.0, 3.0]), vec![0.0, 0.0]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn pearson_skips_missing_rows() {
        let x = [1.0, 2.0, 3.0, f64::NAN, 4.0];
        let y = [2.0, 4.0, 6.0, 1.0, 8.0];
        let (n, r) = pearson(&x, &y);
        assert_eq!(n, 4);
        assert_close(r.unwrap(), 1.0, 1e-12);
        let (_, r) = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert_close(r.unwrap(), -1.0, 1e-12);
        assert_eq!(pearson(&[1.0, 1.0], &[2.0, 3.0]).1, None);
        assert_eq!(pearson(&[1.0], &[2.0]), (1, None));
    }

    #[test]
    fn correlates_every_pair_once() {
        let cols = vec![
            FeatureColumn::new("surprisal", vec![1.0, 2.0, 3.0, 4.0]),
            FeatureColumn::new("zipf", vec![4.0, 3.0, 2.0, 1.0]),
            FeatureColumn::new("dissimilarity", vec![1.0, 3.0, 2.0, 4.0]),
        ];
        let pairs = correlate_features(&cols);
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].x.as_str(), pairs[0].y.as_str()), ("surprisal", "zipf"));
        assert_eq!(pairs[2].x, "zipf");
        assert_close(pairs[0].r.unwrap(), -1.0, 1e-12);
        assert_close(pairs[1].r.unwrap(), 0.8, 1e-12);
    }
}
