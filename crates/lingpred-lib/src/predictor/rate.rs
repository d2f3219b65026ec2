use crate::error::{ensure_positive, PredictorError};
use serde::{Deserialize, Serialize};

/// Map a source-rate timestamp to a sample index at `target_rate`.
///
/// Always floors. The result is not bounds-checked and may be negative or
/// past the end of any particular vector.
pub fn convert(onset_raw: f64, source_rate: f64, target_rate: f64) -> i64 {
    (onset_raw / source_rate * target_rate).floor() as i64
}

/// Same mapping rounded up; used for the end of a crop window.
pub fn convert_ceil(onset_raw: f64, source_rate: f64, target_rate: f64) -> i64 {
    (onset_raw / source_rate * target_rate).ceil() as i64
}

/// Source (annotation) and target (predictor) sampling rates in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRates {
    pub source: f64,
    pub target: f64,
}

impl Default for SampleRates {
    /// 44.1 kHz audio annotations resampled to 100 Hz predictors.
    fn default() -> Self {
        Self {
            source: 44_100.0,
            target: 100.0,
        }
    }
}

impl SampleRates {
    pub fn new(source: f64, target: f64) -> Result<Self, PredictorError> {
        let rates = Self { source, target };
        rates.validate()?;
        Ok(rates)
    }

    pub fn validate(&self) -> Result<(), PredictorError> {
        ensure_positive("source_rate", self.source)?;
        ensure_positive("target_rate", self.target)?;
        Ok(())
    }

    pub fn index(&self, onset_raw: f64) -> i64 {
        convert(onset_raw, self.source, self.target)
    }

    pub fn index_ceil(&self, onset_raw: f64) -> i64 {
        convert_ceil(onset_raw, self.source, self.target)
    }
}
