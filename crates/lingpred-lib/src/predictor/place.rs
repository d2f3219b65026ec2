use super::kernel::Kernel;
use super::rate::SampleRates;
use crate::error::PredictorError;
use crate::signal::{Events, TimeSeries};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How event values are written into the dense predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementPolicy {
    /// `vector[center] = value`; the kernel is ignored and the later event wins a shared bin.
    Overwrite,
    /// `vector[center + offset] += weight` for every kernel tap; event values are ignored.
    Accumulate,
}

impl FromStr for PlacementPolicy {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "accumulate" => Ok(Self::Accumulate),
            other => Err(PredictorError::invalid_parameter(
                "policy",
                format!(
                    "unsupported placement policy {:?} (expected overwrite or accumulate)",
                    other
                ),
            )),
        }
    }
}

impl fmt::Display for PlacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => f.write_str("overwrite"),
            Self::Accumulate => f.write_str("accumulate"),
        }
    }
}

/// Bookkeeping from one placement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementStats {
    /// Contributions written into the vector.
    pub placed: usize,
    /// Contributions that fell outside `[0, length)` and were dropped.
    pub dropped: usize,
    /// Overwrite-only: events that replaced an earlier event's value in the same bin.
    pub collisions: usize,
}

/// Place `events` into a zero vector of `length` samples at `rates.target`.
pub fn place(
    events: &Events,
    kernel: &Kernel,
    length: usize,
    policy: PlacementPolicy,
    rates: &SampleRates,
) -> TimeSeries {
    place_with_stats(events, kernel, length, policy, rates).0
}

pub fn place_with_stats(
    events: &Events,
    kernel: &Kernel,
    length: usize,
    policy: PlacementPolicy,
    rates: &SampleRates,
) -> (TimeSeries, PlacementStats) {
    let mut out = TimeSeries::zeros(rates.target, length);
    let mut stats = PlacementStats::default();
    match policy {
        PlacementPolicy::Overwrite => {
            let mut written = vec![false; length];
            for event in events.iter() {
                let Some(idx) = in_bounds(rates.index(event.onset_raw), length) else {
                    stats.dropped += 1;
                    continue;
                };
                if written[idx] {
                    stats.collisions += 1;
                }
                written[idx] = true;
                out.data[idx] = event.value;
                stats.placed += 1;
            }
        }
        PlacementPolicy::Accumulate => {
            for event in events.iter() {
                let center = rates.index(event.onset_raw);
                for &(offset, weight) in kernel.taps() {
                    match center.checked_add(offset).and_then(|pos| in_bounds(pos, length)) {
                        Some(pos) => {
                            out.data[pos] += weight;
                            stats.placed += 1;
                        }
                        None => stats.dropped += 1,
                    }
                }
            }
        }
    }
    if stats.collisions > 0 {
        warn!(
            "{} event(s) shared a {} Hz bin with an earlier event; the later value was kept",
            stats.collisions, rates.target
        );
    }
    if stats.dropped > 0 {
        debug!(
            "dropped {} contribution(s) outside [0, {})",
            stats.dropped, length
        );
    }
    (out, stats)
}

fn in_bounds(idx: i64, length: usize) -> Option<usize> {
    usize::try_from(idx).ok().filter(|&i| i < length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::kernel::{build_kernel, KernelMode};
    use crate::signal::Event;

    /// Rates where one source sample maps to exactly one target bin.
    fn unit_rates() -> SampleRates {
        SampleRates::new(100.0, 100.0).unwrap()
    }

    fn three_tap() -> Kernel {
        // -1: 0.5, 0: 1.0, 1: 0.5
        let k = build_kernel(KernelMode::Gaussian, 1, (1.0 / (2.0 * 2f64.ln())).sqrt()).unwrap();
        assert!((k.weight(1).unwrap() - 0.5).abs() < 1e-12);
        k
    }

    #[test]
    fn overwrite_drops_event_past_end() {
        let events = Events::new(vec![Event::new(4410.0, 0.5)]);
        let rates = SampleRates::new(44100.0, 100.0).unwrap();
        let (out, stats) =
            place_with_stats(&events, &Kernel::impulse(), 10, PlacementPolicy::Overwrite, &rates);
        assert_eq!(out.data, vec![0.0; 10]);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.placed, 0);
    }

    #[test]
    fn overwrite_places_values_at_floored_index() {
        let events = Events::new(vec![Event::new(4409.0, 0.5), Event::new(13230.0, 2.0)]);
        let rates = SampleRates::new(44100.0, 100.0).unwrap();
        let out = place(&events, &Kernel::impulse(), 40, PlacementPolicy::Overwrite, &rates);
        assert_eq!(out.data[9], 0.5);
        assert_eq!(out.data[30], 2.0);
        assert_eq!(out.data.iter().filter(|v| **v != 0.0).count(), 2);
        assert_eq!(out.fs, 100.0);
    }

    #[test]
    fn overwrite_last_write_wins() {
        let events = Events::new(vec![
            Event::new(3.2, 1.0),
            Event::new(3.7, 7.0),
            Event::new(-2.0, 9.0),
        ]);
        let (out, stats) = place_with_stats(
            &events,
            &three_tap(),
            5,
            PlacementPolicy::Overwrite,
            &unit_rates(),
        );
        assert_eq!(out.data, vec![0.0, 0.0, 0.0, 7.0, 0.0]);
        assert_eq!(stats.collisions, 1);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn accumulate_spreads_kernel_around_center() {
        let events = Events::from_onsets(&[5.0]);
        let out = place(&events, &three_tap(), 10, PlacementPolicy::Accumulate, &unit_rates());
        let mut expected = vec![0.0; 10];
        expected[4] = 0.5;
        expected[5] = 1.0;
        expected[6] = 0.5;
        for (a, b) in out.data.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn accumulate_sums_overlaps_and_clips_edges() {
        let events = Events::new(vec![Event::new(0.0, 42.0), Event::new(1.0, 42.0)]);
        let (out, stats) = place_with_stats(
            &events,
            &three_tap(),
            3,
            PlacementPolicy::Accumulate,
            &unit_rates(),
        );
        // values are ignored; only kernel weights add up
        assert!((out.data[0] - 1.5).abs() < 1e-12);
        assert!((out.data[1] - 1.5).abs() < 1e-12);
        assert!((out.data[2] - 0.5).abs() < 1e-12);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.placed, 5);
    }

    #[test]
    fn saturated_onsets_are_dropped() {
        let kernel = build_kernel(KernelMode::Gaussian, 3, 1.0).unwrap();
        let events = Events::new(vec![
            Event::new(1.0e30, 1.0),
            Event::new(f64::NEG_INFINITY, 1.0),
            Event::new(f64::INFINITY, 1.0),
        ]);
        for policy in [PlacementPolicy::Accumulate, PlacementPolicy::Overwrite] {
            let (out, stats) = place_with_stats(&events, &kernel, 10, policy, &unit_rates());
            assert!(out.data.iter().all(|v| *v == 0.0));
            assert_eq!(stats.placed, 0);
        }
        let (_, stats) =
            place_with_stats(&events, &kernel, 10, PlacementPolicy::Accumulate, &unit_rates());
        assert_eq!(stats.dropped, 3 * 7);
    }

    #[test]
    fn empty_events_give_zero_vector_of_fixed_length() {
        let out = place(
            &Events::default(),
            &Kernel::impulse(),
            22300,
            PlacementPolicy::Accumulate,
            &SampleRates::default(),
        );
        assert_eq!(out.len(), 22300);
        assert!(out.data.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(
            "Overwrite".parse::<PlacementPolicy>().unwrap(),
            PlacementPolicy::Overwrite
        );
        let err = "mean".parse::<PlacementPolicy>().unwrap_err();
        assert!(err.to_string().contains("`policy`"));
    }
}
