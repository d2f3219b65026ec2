use crate::error::{ensure_positive, PredictorError};
use crate::signal::{TimeSeries, TrialTensor};
use serde::{Deserialize, Serialize};

/// Shape of a subject's trial tensor, in target-rate samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialLayout {
    pub trial_len: usize,
    pub num_trials: usize,
    /// Samples kept from each source before concatenation.
    pub per_source_len: usize,
}

impl TrialLayout {
    /// Layout from durations: `trial_len = round(trial_s × fs)`, and each
    /// source keeps `trials_per_source` whole trials.
    pub fn from_seconds(
        trial_s: f64,
        fs: f64,
        num_trials: usize,
        trials_per_source: usize,
    ) -> Result<Self, PredictorError> {
        ensure_positive("trial_s", trial_s)?;
        ensure_positive("target_rate", fs)?;
        let trial_len = (trial_s * fs).round() as usize;
        if trial_len == 0 {
            return Err(PredictorError::invalid_parameter(
                "trial_s",
                format!("{} s at {} Hz is shorter than one sample", trial_s, fs),
            ));
        }
        Ok(Self {
            trial_len,
            num_trials,
            per_source_len: trials_per_source * trial_len,
        })
    }

    pub fn total_len(&self) -> usize {
        self.num_trials * self.trial_len
    }
}

/// Truncate each source, concatenate in order, then cut into fixed trials.
///
/// Shortfall is zero-padded at the end and excess is dropped. An empty source
/// list yields an all-zero tensor.
pub fn segment(vectors: &[TimeSeries], layout: &TrialLayout, fs: f64) -> TrialTensor {
    let total = layout.total_len();
    let mut flat: Vec<f64> = Vec::with_capacity(total);
    for series in vectors {
        let keep = series.len().min(layout.per_source_len);
        flat.extend_from_slice(&series.data[..keep]);
    }
    let mut tensor = TrialTensor::zeros(fs, layout.num_trials, layout.trial_len);
    let n = flat.len().min(total);
    tensor.data[..n].copy_from_slice(&flat[..n]);
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries {
            fs: 100.0,
            data: values,
        }
    }

    #[test]
    fn layout_from_dataset_defaults() {
        let layout = TrialLayout::from_seconds(60.0, 100.0, 15, 3).unwrap();
        assert_eq!(layout.trial_len, 6000);
        assert_eq!(layout.per_source_len, 18000);
        assert_eq!(layout.total_len(), 90000);
        assert!(TrialLayout::from_seconds(0.0, 100.0, 15, 3).is_err());
    }

    #[test]
    fn sub_sample_trial_is_rejected() {
        let err = TrialLayout::from_seconds(0.004, 100.0, 15, 3).unwrap_err();
        assert!(matches!(err, PredictorError::InvalidParameter { name: "trial_s", .. }));
        assert_eq!(TrialLayout::from_seconds(0.005, 100.0, 1, 1).unwrap().trial_len, 1);
    }

    #[test]
    fn pads_final_trial_with_zeros() {
        let layout = TrialLayout {
            trial_len: 6000,
            num_trials: 15,
            per_source_len: usize::MAX,
        };
        let flat = series(vec![1.0; 6000 * 15 - 37]);
        let tensor = segment(&[flat], &layout, 100.0);
        assert_eq!(tensor.shape(), (15, 6000));
        let last = tensor.row(14);
        assert!(last[6000 - 37..].iter().all(|v| *v == 0.0));
        assert_eq!(last[6000 - 38], 1.0);
        assert!(tensor.row(0).iter().all(|v| *v == 1.0));
    }

    #[test]
    fn truncates_excess_without_error() {
        let layout = TrialLayout {
            trial_len: 6000,
            num_trials: 15,
            per_source_len: usize::MAX,
        };
        let values: Vec<f64> = (0..95_000).map(|i| i as f64).collect();
        let tensor = segment(&[series(values.clone())], &layout, 100.0);
        assert_eq!(tensor.data, values[..90_000].to_vec());
        assert_eq!(tensor.row(1)[0], 6000.0);
    }

    #[test]
    fn truncates_each_source_before_concatenating() {
        let layout = TrialLayout {
            trial_len: 2,
            num_trials: 3,
            per_source_len: 2,
        };
        let a = series(vec![1.0, 2.0, 3.0]);
        let b = series(vec![4.0]);
        let c = series(vec![5.0, 6.0, 7.0]);
        let tensor = segment(&[a, b, c], &layout, 100.0);
        assert_eq!(tensor.to_nested(), vec![vec![1.0, 2.0], vec![4.0, 5.0], vec![6.0, 0.0]]);
    }

    #[test]
    fn no_sources_gives_zero_tensor() {
        let layout = TrialLayout {
            trial_len: 4,
            num_trials: 2,
            per_source_len: 8,
        };
        let tensor = segment(&[], &layout, 100.0);
        assert_eq!(tensor.shape(), (2, 4));
        assert!(tensor.data.iter().all(|v| *v == 0.0));
    }
}
