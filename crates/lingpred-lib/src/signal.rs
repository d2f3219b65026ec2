use serde::{Deserialize, Serialize};

/// Basic typed time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    /// Zero-filled series of `len` samples.
    pub fn zeros(fs: f64, len: usize) -> Self {
        Self {
            fs,
            data: vec![0.0; len],
        }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// A linguistic event: onset in source-rate samples plus a scalar feature value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub onset_raw: f64,
    pub value: f64,
}

impl Event {
    pub fn new(onset_raw: f64, value: f64) -> Self {
        Self { onset_raw, value }
    }

    /// Unit impulse at `onset_raw`, as used by word-onset predictors.
    pub fn onset(onset_raw: f64) -> Self {
        Self::new(onset_raw, 1.0)
    }
}

/// Events of one stimulus, kept in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Events {
    pub events: Vec<Event>,
}

impl Events {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn from_onsets(onsets: &[f64]) -> Self {
        Self::new(onsets.iter().copied().map(Event::onset).collect())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn values(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.value).collect()
    }

    /// Same onsets with the values replaced, in order.
    pub fn with_values(&self, values: &[f64]) -> Self {
        Self::new(
            self.events
                .iter()
                .zip(values)
                .map(|(e, v)| Event::new(e.onset_raw, *v))
                .collect(),
        )
    }
}

/// First/last meaningful event of a stimulus, in source-rate samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiBounds {
    pub start_raw: f64,
    pub end_raw: f64,
}

impl RoiBounds {
    pub fn new(start_raw: f64, end_raw: f64) -> Self {
        Self { start_raw, end_raw }
    }
}

/// Fixed-shape `[n_trials, trial_len]` array stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialTensor {
    pub fs: f64,
    pub n_trials: usize,
    pub trial_len: usize,
    pub data: Vec<f64>,
}

impl TrialTensor {
    pub fn zeros(fs: f64, n_trials: usize, trial_len: usize) -> Self {
        Self {
            fs,
            n_trials,
            trial_len,
            data: vec![0.0; n_trials * trial_len],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_trials, self.trial_len)
    }

    pub fn row(&self, trial: usize) -> &[f64] {
        let start = trial * self.trial_len;
        &self.data[start..start + self.trial_len]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_trials).map(move |i| self.row(i))
    }

    pub fn to_nested(&self) -> Vec<Vec<f64>> {
        self.rows().map(|r| r.to_vec()).collect()
    }
}

/// Number of samples covering `duration_s` at `fs`, rounded to nearest.
pub fn predictor_length(duration_s: f64, fs: f64) -> usize {
    (duration_s * fs).round().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_length_at_100_hz() {
        assert_eq!(predictor_length(3.0 * 60.0 + 43.0, 100.0), 22300);
        assert_eq!(predictor_length(0.126, 100.0), 13);
    }

    #[test]
    fn tensor_rows_are_row_major() {
        let tensor = TrialTensor {
            fs: 100.0,
            n_trials: 2,
            trial_len: 3,
            data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        };
        assert_eq!(tensor.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(tensor.to_nested()[0], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn events_keep_input_order() {
        let events = Events::from_onsets(&[300.0, 100.0]);
        let replaced = events.with_values(&[0.5, 0.25]);
        assert_eq!(replaced.events[0], Event::new(300.0, 0.5));
        assert_eq!(replaced.events[1], Event::new(100.0, 0.25));
    }
}
