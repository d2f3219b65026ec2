use std::path::PathBuf;
use thiserror::Error;

/// Failures the predictor pipeline reports instead of producing NaN or empty output.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictorError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("missing column `{column}` in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },
    #[error("missing row {row} in {}", path.display())]
    MissingRow { row: usize, path: PathBuf },
    #[error("{}: row {row}, column `{column}`: cannot use value {value:?}", path.display())]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
}

impl PredictorError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Require a finite, strictly positive value for `name`.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64, PredictorError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PredictorError::invalid_parameter(
            name,
            format!("must be a finite positive number, got {}", value),
        ))
    }
}
