//! Fixed-rate predictors from word-level linguistic annotations.
//!
//! Sparse events (word onsets in audio samples, each with a feature value
//! such as surprisal) are resampled to a predictor rate, optionally smoothed
//! with a kernel, cropped to the story's first/last word and concatenated
//! across stories into fixed-length trials for encoding-model analyses.

pub mod config;
pub mod error;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod predictor;
pub mod signal;
pub mod subject;
pub mod text;

pub use config::SubjectConfig;
pub use error::PredictorError;
pub use predictor::{build_predictor, PredictorConfig};
pub use signal::*;
pub use subject::{run_subject, SubjectRun};
