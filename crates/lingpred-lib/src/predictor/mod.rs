//! Onset-to-timeseries predictor construction.
//!
//! ```text
//! events (source-rate onsets, values)
//!   ├─ normalize      optional min-max on values
//!   ├─ rate::convert  floor(onset / source_rate * target_rate)
//!   ├─ place          overwrite at index | accumulate kernel around index
//!   ├─ window::cut    crop to ROI, floor start / ceil end
//!   └─→ TimeSeries    one per stimulus
//!
//! [TimeSeries; n_stimuli] ─ trials::segment ─→ TrialTensor [n_trials, trial_len]
//! ```
//!
//! Every step is 0-based with half-open ranges.

pub mod kernel;
pub mod place;
pub mod rate;
pub mod trials;
pub mod window;

use crate::error::{ensure_positive, PredictorError};
use crate::metrics::correlation::min_max_normalize;
use crate::signal::{predictor_length, Events, RoiBounds, TimeSeries};
use log::debug;
use serde::{Deserialize, Serialize};

pub use kernel::{build_kernel, Kernel, KernelMode, KernelSpec};
pub use place::{place, place_with_stats, PlacementPolicy, PlacementStats};
pub use rate::{convert, SampleRates};
pub use trials::{segment, TrialLayout};
pub use window::{cut, cut_range};

/// Value rescaling applied before placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    #[default]
    None,
    /// `(v - min) / (max - min)` over the stimulus' own events.
    MinMax,
}

/// Configurable parameters for building one stimulus predictor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorConfig {
    pub rates: SampleRates,
    /// Full stimulus duration in seconds; fixes the pre-crop vector length.
    pub duration_s: f64,
    pub policy: PlacementPolicy,
    /// Only consulted by [`PlacementPolicy::Accumulate`].
    pub kernel: KernelSpec,
    pub normalize: Normalization,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            rates: SampleRates::default(),
            duration_s: 3.0 * 60.0 + 43.0,
            policy: PlacementPolicy::Accumulate,
            kernel: KernelSpec::default(),
            normalize: Normalization::None,
        }
    }
}

impl PredictorConfig {
    pub fn validate(&self) -> Result<(), PredictorError> {
        self.rates.validate()?;
        ensure_positive("duration_s", self.duration_s)?;
        if self.policy == PlacementPolicy::Accumulate {
            self.kernel.build()?;
        }
        Ok(())
    }

    /// Uncropped predictor length in target-rate samples.
    pub fn length(&self) -> usize {
        predictor_length(self.duration_s, self.rates.target)
    }

    fn kernel(&self) -> Result<Kernel, PredictorError> {
        match self.policy {
            PlacementPolicy::Overwrite => Ok(Kernel::impulse()),
            PlacementPolicy::Accumulate => self.kernel.build(),
        }
    }
}

/// Full predictor plus the ROI crop and placement bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorBuild {
    pub full: TimeSeries,
    pub cropped: TimeSeries,
    pub stats: PlacementStats,
}

/// Build the cropped predictor for one stimulus.
pub fn build_predictor(
    events: &Events,
    bounds: &RoiBounds,
    cfg: &PredictorConfig,
) -> Result<TimeSeries, PredictorError> {
    Ok(build_predictor_detailed(events, bounds, cfg)?.cropped)
}

pub fn build_predictor_detailed(
    events: &Events,
    bounds: &RoiBounds,
    cfg: &PredictorConfig,
) -> Result<PredictorBuild, PredictorError> {
    cfg.validate()?;
    let kernel = cfg.kernel()?;
    let normalized;
    let events = match cfg.normalize {
        Normalization::None => events,
        Normalization::MinMax => {
            normalized = events.with_values(&min_max_normalize(&events.values()));
            &normalized
        }
    };
    let length = cfg.length();
    let (full, stats) = place_with_stats(events, &kernel, length, cfg.policy, &cfg.rates);
    let cropped = cut(&full, bounds, &cfg.rates);
    debug!(
        "{} events → {} samples ({} after ROI crop), policy {}",
        events.len(),
        full.len(),
        cropped.len(),
        cfg.policy
    );
    Ok(PredictorBuild {
        full,
        cropped,
        stats,
    })
}
