use crate::error::{ensure_positive, PredictorError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelMode {
    Impulse,
    Gaussian,
}

impl FromStr for KernelMode {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "impulse" => Ok(Self::Impulse),
            "gaussian" | "gauss" => Ok(Self::Gaussian),
            other => Err(PredictorError::invalid_parameter(
                "kernel",
                format!("unsupported kernel mode {:?} (expected impulse or gaussian)", other),
            )),
        }
    }
}

impl fmt::Display for KernelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Impulse => f.write_str("impulse"),
            Self::Gaussian => f.write_str("gaussian"),
        }
    }
}

/// Kernel parameters as they appear in configuration. `radius` and `sigma`
/// are in target-rate bins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub mode: KernelMode,
    #[serde(default = "default_radius")]
    pub radius: usize,
    #[serde(default = "default_sigma")]
    pub sigma: f64,
}

fn default_radius() -> usize {
    3
}

fn default_sigma() -> f64 {
    1.0
}

impl Default for KernelSpec {
    /// ±3 bins, sigma 1 bin: ≈30 ms support with ≈10 ms width at 100 Hz.
    fn default() -> Self {
        Self {
            mode: KernelMode::Gaussian,
            radius: default_radius(),
            sigma: default_sigma(),
        }
    }
}

impl KernelSpec {
    pub fn impulse() -> Self {
        Self {
            mode: KernelMode::Impulse,
            ..Self::default()
        }
    }

    pub fn build(&self) -> Result<Kernel, PredictorError> {
        build_kernel(self.mode, self.radius, self.sigma)
    }
}

/// Symmetric discrete kernel as `(offset, weight)` pairs, ascending by offset.
/// Amplitude-normalized: the peak weight is exactly 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    taps: Vec<(i64, f64)>,
}

impl Kernel {
    pub fn impulse() -> Self {
        Self {
            taps: vec![(0, 1.0)],
        }
    }

    pub fn taps(&self) -> &[(i64, f64)] {
        &self.taps
    }

    pub fn width(&self) -> usize {
        self.taps.len()
    }

    pub fn weight(&self, offset: i64) -> Option<f64> {
        self.taps
            .iter()
            .find(|(o, _)| *o == offset)
            .map(|(_, w)| *w)
    }
}

pub fn build_kernel(mode: KernelMode, radius: usize, sigma: f64) -> Result<Kernel, PredictorError> {
    match mode {
        KernelMode::Impulse => Ok(Kernel::impulse()),
        KernelMode::Gaussian => gaussian(radius, sigma),
    }
}

fn gaussian(radius: usize, sigma: f64) -> Result<Kernel, PredictorError> {
    if radius == 0 {
        return Err(PredictorError::invalid_parameter(
            "radius",
            "gaussian kernel radius must be at least 1",
        ));
    }
    ensure_positive("sigma", sigma)?;
    let r = radius as i64;
    let denom = 2.0 * sigma * sigma;
    let raw: Vec<(i64, f64)> = (-r..=r)
        .map(|o| {
            let x = o as f64;
            (o, (-(x * x) / denom).exp())
        })
        .collect();
    let max = raw.iter().map(|(_, w)| *w).fold(f64::MIN, f64::max);
    let taps = raw.into_iter().map(|(o, w)| (o, w / max)).collect();
    Ok(Kernel { taps })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_has_single_unit_tap() {
        let k = build_kernel(KernelMode::Impulse, 3, 1.0).unwrap();
        assert_eq!(k.taps(), &[(0, 1.0)]);
    }

    #[test]
    fn gaussian_is_peak_normalized_and_symmetric() {
        for radius in 1..6 {
            for sigma in [0.3, 1.0, 2.5, 10.0] {
                let k = build_kernel(KernelMode::Gaussian, radius, sigma).unwrap();
                assert_eq!(k.width(), 2 * radius + 1);
                let max = k.taps().iter().map(|(_, w)| *w).fold(f64::MIN, f64::max);
                assert_eq!(max, 1.0);
                assert_eq!(k.weight(0), Some(1.0));
                for o in 1..=radius as i64 {
                    assert_eq!(k.weight(o), k.weight(-o));
                }
            }
        }
    }

    #[test]
    fn gaussian_weights_match_formula() {
        let k = build_kernel(KernelMode::Gaussian, 3, 1.0).unwrap();
        let expected = (-0.5f64).exp();
        assert!((k.weight(1).unwrap() - expected).abs() < 1e-15);
        assert!((k.weight(-3).unwrap() - (-4.5f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn rejects_bad_parameters() {
        let err = build_kernel(KernelMode::Gaussian, 0, 1.0).unwrap_err();
        assert!(err.to_string().contains("`radius`"));
        let err = build_kernel(KernelMode::Gaussian, 3, 0.0).unwrap_err();
        assert!(err.to_string().contains("`sigma`"));
        assert!(build_kernel(KernelMode::Gaussian, 3, f64::INFINITY).is_err());
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("Gaussian".parse::<KernelMode>().unwrap(), KernelMode::Gaussian);
        assert_eq!("impulse".parse::<KernelMode>().unwrap(), KernelMode::Impulse);
        let err = "boxcar".parse::<KernelMode>().unwrap_err();
        assert!(err.to_string().contains("boxcar"));
    }
}
