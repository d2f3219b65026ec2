use crate::metrics::correlation::FeatureColumn;
use crate::signal::TimeSeries;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(PointSeries),
    Scatter(PointSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(s) | Series::Scatter(s) => &s.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over all points; unit box when empty.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut b = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for p in self.series.iter().flat_map(|s| s.points()) {
            b = (b.0.min(p[0]), b.1.max(p[0]), b.2.min(p[1]), b.3.max(p[1]));
        }
        if !b.0.is_finite() {
            return (0.0, 1.0, 0.0, 1.0);
        }
        let widen = |lo: f64, hi: f64| if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        let (x0, x1) = widen(b.0, b.1);
        let (y0, y1) = widen(b.2, b.3);
        (x0, x1, y0, y1)
    }
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

/// Predictor over time in seconds.
pub fn figure_from_timeseries(
    title: &str,
    series: &TimeSeries,
    max_points: usize,
    color: u32,
) -> Figure {
    let dt = 1.0 / series.fs.max(1.0);
    let points: Vec<[f64; 2]> = series
        .data
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64 * dt, *value])
        .collect();
    let mut fig = Figure::new(Some(title.into()));
    fig.x.label = Some("time (s)".into());
    fig.add_series(Series::Line(PointSeries {
        name: title.into(),
        points: decimate_points(&points, max_points),
        style: Style {
            width: 1.4,
            color: Color(color),
        },
    }));
    fig
}

/// Scatter of two feature columns over rows where both are finite.
pub fn figure_from_pair(x: &FeatureColumn, y: &FeatureColumn, color: u32) -> Figure {
    let points: Vec<[f64; 2]> = x
        .values
        .iter()
        .zip(&y.values)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| [*a, *b])
        .collect();
    let mut fig = Figure::new(Some(format!("{} vs {}", x.name, y.name)));
    fig.x.label = Some(x.name.clone());
    fig.y.label = Some(y.name.clone());
    fig.add_series(Series::Scatter(PointSeries {
        name: fig.title.clone().unwrap_or_default(),
        points,
        style: Style {
            width: 2.0,
            color: Color(color),
        },
    }));
    fig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_figure_skips_missing_rows() {
        let x = FeatureColumn::new("zipf", vec![0.1, f64::NAN, 0.5]);
        let y = FeatureColumn::new("surprisal", vec![0.9, 0.3, 0.2]);
        let fig = figure_from_pair(&x, &y, 0x8C6BB1);
        assert_eq!(fig.title.as_deref(), Some("zipf vs surprisal"));
        assert_eq!(fig.series[0].points(), &[[0.1, 0.9], [0.5, 0.2]]);
        assert_eq!(fig.bounds(), (0.1, 0.5, 0.2, 0.9));
    }

    #[test]
    fn timeseries_figure_is_decimated() {
        let ts = TimeSeries {
            fs: 100.0,
            data: vec![1.0; 5000],
        };
        let fig = figure_from_timeseries("onsets", &ts, 1000, 0xFF0077);
        assert_eq!(fig.series[0].points().len(), 1000);
        // flat series gets a non-degenerate y range
        let (_, _, y0, y1) = fig.bounds();
        assert!(y1 > y0);
        assert_eq!(Color(0xFF0077).rgb(), (0xFF, 0x00, 0x77));
    }
}
