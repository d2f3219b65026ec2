use super::rate::SampleRates;
use crate::signal::{RoiBounds, TimeSeries};
use std::ops::Range;

/// Target-rate index range covering `bounds`, clamped to `[0, length)`.
///
/// The start is floored and the end is ceiled so the crop never clips the ROI.
/// Returns an empty range (`start == end`) when the bounds invert or fall
/// entirely outside the vector.
pub fn cut_range(bounds: &RoiBounds, length: usize, rates: &SampleRates) -> Range<usize> {
    let begin = rates.index(bounds.start_raw).max(0);
    let end = rates.index_ceil(bounds.end_raw).min(length as i64);
    let begin = begin as usize;
    if end <= begin as i64 {
        let pinned = begin.min(length);
        return pinned..pinned;
    }
    begin..end as usize
}

/// Crop `series` to the ROI.
pub fn cut(series: &TimeSeries, bounds: &RoiBounds, rates: &SampleRates) -> TimeSeries {
    let range = cut_range(bounds, series.len(), rates);
    TimeSeries {
        fs: series.fs,
        data: series.data[range].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn ramp(len: usize) -> TimeSeries {
        TimeSeries {
            fs: 100.0,
            data: (0..len).map(|i| i as f64).collect(),
        }
    }

    #[test]
    fn floors_start_and_ceils_end() {
        let rates = SampleRates::default();
        // 0.0512 s → 5.12 bins, 0.0973 s → 9.73 bins
        let bounds = RoiBounds::new(0.0512 * 44100.0, 0.0973 * 44100.0);
        assert_eq!(cut_range(&bounds, 100, &rates), 5..10);
        let out = cut(&ramp(100), &bounds, &rates);
        assert_eq!(out.data, vec![5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(out.fs, 100.0);
    }

    #[test]
    fn clamps_to_vector() {
        let rates = SampleRates::new(100.0, 100.0).unwrap();
        assert_eq!(cut_range(&RoiBounds::new(-20.0, 500.0), 50, &rates), 0..50);
        assert_eq!(cut(&ramp(50), &RoiBounds::new(-20.0, 500.0), &rates).len(), 50);
    }

    #[test]
    fn inverted_or_outside_bounds_yield_empty() {
        let rates = SampleRates::new(100.0, 100.0).unwrap();
        assert!(cut(&ramp(50), &RoiBounds::new(30.0, 10.0), &rates).is_empty());
        assert!(cut(&ramp(50), &RoiBounds::new(80.0, 90.0), &rates).is_empty());
        assert!(cut(&ramp(50), &RoiBounds::new(-90.0, -80.0), &rates).is_empty());
        assert!(cut(&ramp(0), &RoiBounds::new(0.0, 10.0), &rates).is_empty());
    }

    #[test]
    fn window_contains_every_interior_event_index() {
        let rates = SampleRates::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let start = rng.gen_range(0.0..5.0e6);
            let end = start + rng.gen_range(0.0..5.0e6);
            let range = cut_range(&RoiBounds::new(start, end), usize::MAX >> 1, &rates);
            for _ in 0..20 {
                let t = rng.gen_range(start..=end);
                let idx = rates.index(t) as usize;
                // An end landing exactly on a bin edge belongs to the next bin.
                let scaled_end = end / rates.source * rates.target;
                if scaled_end.fract() == 0.0 && idx == scaled_end as usize {
                    continue;
                }
                assert!(range.contains(&idx), "{} not in {:?}", idx, range);
            }
        }
    }
}
