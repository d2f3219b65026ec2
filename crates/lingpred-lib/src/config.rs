//! Subject pipeline configuration.
//!
//! One TOML file describes everything needed to turn a subject's ordered
//! stimulus list into a trial tensor. Relative paths are resolved against the
//! directory containing the config file.
//!
//! ```toml
//! duration_s = 223.0
//!
//! [rates]
//! source = 44100.0
//! target = 100.0
//!
//! [placement]
//! policy = "overwrite"
//! normalize = "min-max"
//!
//! [features]
//! value_column = "surprisal"
//!
//! [roi]
//! table = "first_and_last_words.csv"
//!
//! [trials]
//! trial_s = 60.0
//! num_trials = 15
//! trials_per_source = 3
//! output = "trials_subject19_surp.json"
//!
//! [[stimuli]]
//! name = "story2"
//! features = "Surprisal_St2.csv"
//! start_row = 0
//! end_row = 1
//! ```

use crate::error::PredictorError;
use crate::io::{Delimiter, FeatureTableSpec, RoiTableSpec};
use crate::predictor::{KernelSpec, Normalization, PlacementPolicy, PredictorConfig, SampleRates, TrialLayout};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubjectConfig {
    #[serde(default)]
    pub rates: SampleRates,
    #[serde(default = "default_duration_s")]
    pub duration_s: f64,
    #[serde(default)]
    pub placement: PlacementSection,
    #[serde(default)]
    pub features: FeatureTableSpec,
    pub roi: RoiSection,
    #[serde(default)]
    pub trials: TrialsSection,
    #[serde(default)]
    pub stimuli: Vec<StimulusSpec>,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_duration_s() -> f64 {
    3.0 * 60.0 + 43.0
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlacementSection {
    pub policy: PlacementPolicy,
    #[serde(default)]
    pub kernel: KernelSpec,
    #[serde(default)]
    pub normalize: Normalization,
}

impl Default for PlacementSection {
    fn default() -> Self {
        Self {
            policy: PlacementPolicy::Accumulate,
            kernel: KernelSpec::default(),
            normalize: Normalization::None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoiSection {
    pub table: PathBuf,
    #[serde(default = "default_begin")]
    pub begin_column: String,
    #[serde(default = "default_end")]
    pub end_column: String,
    #[serde(default)]
    pub delimiter: Delimiter,
}

fn default_begin() -> String {
    "BEGIN".into()
}

fn default_end() -> String {
    "END".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrialsSection {
    #[serde(default = "default_trial_s")]
    pub trial_s: f64,
    #[serde(default = "default_num_trials")]
    pub num_trials: usize,
    #[serde(default = "default_trials_per_source")]
    pub trials_per_source: usize,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_trial_s() -> f64 {
    60.0
}

fn default_num_trials() -> usize {
    15
}

fn default_trials_per_source() -> usize {
    3
}

impl Default for TrialsSection {
    fn default() -> Self {
        Self {
            trial_s: default_trial_s(),
            num_trials: default_num_trials(),
            trials_per_source: default_trials_per_source(),
            output: None,
        }
    }
}

/// One stimulus in presentation order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StimulusSpec {
    pub name: String,
    pub features: PathBuf,
    /// Bounds-table row of the first word.
    pub start_row: usize,
    /// Bounds-table row of the last word.
    pub end_row: usize,
    /// Overrides the subject-wide duration for this stimulus.
    #[serde(default)]
    pub duration_s: Option<f64>,
    /// Where to write this stimulus' cropped predictor, if anywhere.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl SubjectConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: SubjectConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PredictorError> {
        self.predictor_config(None).validate()?;
        self.layout()?;
        if self.stimuli.is_empty() {
            return Err(PredictorError::invalid_parameter(
                "stimuli",
                "at least one stimulus is required",
            ));
        }
        for stim in &self.stimuli {
            if let Some(d) = stim.duration_s {
                crate::error::ensure_positive("duration_s", d)?;
            }
        }
        Ok(())
    }

    /// Predictor parameters, with a per-stimulus duration override if given.
    pub fn predictor_config(&self, stimulus: Option<&StimulusSpec>) -> PredictorConfig {
        PredictorConfig {
            rates: self.rates,
            duration_s: stimulus
                .and_then(|s| s.duration_s)
                .unwrap_or(self.duration_s),
            policy: self.placement.policy,
            kernel: self.placement.kernel,
            normalize: self.placement.normalize,
        }
    }

    pub fn layout(&self) -> Result<TrialLayout, PredictorError> {
        TrialLayout::from_seconds(
            self.trials.trial_s,
            self.rates.target,
            self.trials.num_trials,
            self.trials.trials_per_source,
        )
    }

    pub fn roi_spec(&self, stimulus: &StimulusSpec) -> RoiTableSpec {
        RoiTableSpec {
            start_row: stimulus.start_row,
            end_row: stimulus.end_row,
            begin_column: self.roi.begin_column.clone(),
            end_column: self.roi.end_column.clone(),
            delimiter: self.roi.delimiter,
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
