// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Waveform conditioning: gap interpolation and waveform merging
//!
//! Conditioning turns a channel segment's list of acquisition runs into fewer,
//! longer runs so that windowed detectors can operate across short dropouts:
//!
//! 1. [`GapInterpolator`] fills short gaps between runs of (nearly) equal sample
//!    rate with samples linearly interpolated between the last sample before
//!    the gap and the first sample after it.
//! 2. [`WaveformMerger`] concatenates runs separated by less than one sample
//!    period, absorbing sub-sample timing jitter. No resampling happens.
//!
//! Both stages work on copies; the input waveforms are never modified.

use log::{debug, warn};

use crate::error::{QcError, Result};
use crate::model::{ChannelSegment, Waveform};

/// Trait for a stage that rewrites an ordered waveform list
pub trait WaveformConditioner: Send + Sync {
    /// Apply the stage and return the new ordered list
    fn apply(&self, waveforms: &[Waveform]) -> Vec<Waveform>;
}

/// Numeric settings for [`condition`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditioningParameters {
    /// Maximum absolute sample-rate difference (Hz, exclusive) for two runs to be interpolated across
    pub interpolate_gaps_sample_rate_tolerance: f64,
    /// Maximum absolute sample-rate difference (Hz, exclusive) for two runs to be merged
    pub merge_waveforms_sample_rate_tolerance: f64,
    /// Gaps must be strictly shorter than this many samples to be interpolated
    pub max_interpolated_gap_samples: f64,
}

impl Default for ConditioningParameters {
    fn default() -> Self {
        Self {
            interpolate_gaps_sample_rate_tolerance: 0.5,
            merge_waveforms_sample_rate_tolerance: 0.5,
            max_interpolated_gap_samples: 10.0,
        }
    }
}

impl ConditioningParameters {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (
                "interpolate_gaps_sample_rate_tolerance",
                self.interpolate_gaps_sample_rate_tolerance,
            ),
            (
                "merge_waveforms_sample_rate_tolerance",
                self.merge_waveforms_sample_rate_tolerance,
            ),
            ("max_interpolated_gap_samples", self.max_interpolated_gap_samples),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(QcError::invalid_argument(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Fills short gaps between runs with linearly interpolated samples
#[derive(Debug, Clone, Copy)]
pub struct GapInterpolator {
    sample_rate_tolerance: f64,
    max_gap_samples: f64,
}

impl GapInterpolator {
    pub fn new(sample_rate_tolerance: f64, max_gap_samples: f64) -> Self {
        Self {
            sample_rate_tolerance,
            max_gap_samples,
        }
    }

    /// Join `before` and `after` across an interpolated gap, if the pair qualifies
    fn bridge(&self, before: &Waveform, after: &Waveform) -> Option<Waveform> {
        if (before.sample_rate() - after.sample_rate()).abs() >= self.sample_rate_tolerance {
            return None;
        }
        let missing = before.missing_samples_before(after);
        if missing < 1.0 || missing >= self.max_gap_samples {
            return None;
        }

        let fill_count = missing.round() as usize;
        let first = *before.values().last()?;
        let last = *after.values().first()?;
        let step = (last - first) / (fill_count + 1) as f64;

        let mut values = Vec::with_capacity(before.sample_count() + fill_count + after.sample_count());
        values.extend_from_slice(before.values());
        values.extend((1..=fill_count).map(|k| first + step * k as f64));
        values.extend_from_slice(after.values());

        debug!(
            "Interpolated {} samples between {} and {}",
            fill_count,
            before.end_time(),
            after.start_time()
        );
        Waveform::new(before.start_time(), before.sample_rate(), values).ok()
    }
}

impl WaveformConditioner for GapInterpolator {
    fn apply(&self, waveforms: &[Waveform]) -> Vec<Waveform> {
        join_adjacent(waveforms, |before, after| self.bridge(before, after))
    }
}

/// Concatenates runs separated by less than one sample period
#[derive(Debug, Clone, Copy)]
pub struct WaveformMerger {
    sample_rate_tolerance: f64,
}

impl WaveformMerger {
    pub fn new(sample_rate_tolerance: f64) -> Self {
        Self {
            sample_rate_tolerance,
        }
    }

    fn concatenate(&self, before: &Waveform, after: &Waveform) -> Option<Waveform> {
        if (before.sample_rate() - after.sample_rate()).abs() >= self.sample_rate_tolerance {
            return None;
        }
        let missing = before.missing_samples_before(after);
        if missing <= -1.0 || missing >= 1.0 {
            return None;
        }
        let mut values = Vec::with_capacity(before.sample_count() + after.sample_count());
        values.extend_from_slice(before.values());
        values.extend_from_slice(after.values());
        Waveform::new(before.start_time(), before.sample_rate(), values).ok()
    }
}

impl WaveformConditioner for WaveformMerger {
    fn apply(&self, waveforms: &[Waveform]) -> Vec<Waveform> {
        join_adjacent(waveforms, |before, after| self.concatenate(before, after))
    }
}

/// Fold adjacent pairs left to right, replacing a pair with `join`'s result when it returns one.
///
/// A joined run is re-timed at the earlier run's rate; a join whose last
/// sample would reach the start of the following run is refused.
fn join_adjacent<F>(waveforms: &[Waveform], join: F) -> Vec<Waveform>
where
    F: Fn(&Waveform, &Waveform) -> Option<Waveform>,
{
    let mut joined = Vec::with_capacity(waveforms.len());
    let mut iter = waveforms.iter().peekable();
    let mut current = match iter.next() {
        Some(first) => first.clone(),
        None => return joined,
    };
    while let Some(next) = iter.next() {
        let combined = join(&current, next).filter(|combined| match iter.peek() {
            Some(following) if combined.end_time() >= following.start_time() => {
                debug!(
                    "Not joining runs at {} and {}: the result would overlap the run at {}",
                    current.start_time(),
                    next.start_time(),
                    following.start_time()
                );
                false
            }
            _ => true,
        });
        match combined {
            Some(combined) => current = combined,
            None => {
                joined.push(current);
                current = next.clone();
            }
        }
    }
    joined.push(current);
    joined
}

/// Interpolate short gaps, then merge jittered runs, returning a new segment.
///
/// The returned segment keeps the id and channel of `segment`. If the
/// conditioned list would violate the segment's ordering rules (possible when
/// runs of slightly different rates are joined), the input is returned as is.
///
/// # Errors
///
/// [`QcError::InvalidArgument`] for negative or non-finite parameters.
pub fn condition(segment: &ChannelSegment, parameters: &ConditioningParameters) -> Result<ChannelSegment> {
    parameters.validate()?;

    let mut waveforms = segment.waveforms().to_vec();
    for stage in super::create_conditioner_chain(parameters) {
        waveforms = stage.apply(&waveforms);
    }

    debug!(
        "Conditioned channel '{}': {} waveform(s) -> {}",
        segment.channel_id(),
        segment.waveforms().len(),
        waveforms.len()
    );

    match segment.with_waveforms(waveforms) {
        Ok(conditioned) => Ok(conditioned),
        Err(err) => {
            warn!(
                "Conditioning of channel '{}' produced an invalid waveform list ({}); passing it through unchanged",
                segment.channel_id(),
                err
            );
            Ok(segment.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    fn segment(waveforms: Vec<Waveform>) -> ChannelSegment {
        ChannelSegment::create("STA.BHZ", "conditioning", waveforms).unwrap()
    }

    fn parameters(max_gap: f64) -> ConditioningParameters {
        ConditioningParameters {
            interpolate_gaps_sample_rate_tolerance: 0.1,
            merge_waveforms_sample_rate_tolerance: 0.1,
            max_interpolated_gap_samples: max_gap,
        }
    }

    #[test]
    fn test_three_sample_gap_is_filled_linearly() {
        let first = Waveform::new(epoch(), 1.0, vec![0.0, 1.0, 2.0]).unwrap();
        // first ends at t=2; samples at t=3,4,5 are missing
        let second = Waveform::new(epoch() + Duration::seconds(6), 1.0, vec![10.0, 11.0]).unwrap();
        let input = segment(vec![first, second]);

        let conditioned = condition(&input, &parameters(5.0)).unwrap();
        assert_eq!(conditioned.waveforms().len(), 1);
        let merged = &conditioned.waveforms()[0];
        assert_eq!(merged.values(), &[0.0, 1.0, 2.0, 4.0, 6.0, 8.0, 10.0, 11.0]);
        assert_eq!(merged.start_time(), epoch());
        assert_eq!(merged.end_time(), epoch() + Duration::seconds(7));
        assert_eq!(conditioned.id(), input.id());
        // the input is untouched
        assert_eq!(input.waveforms().len(), 2);
    }

    #[test]
    fn test_gap_at_limit_is_left_unfilled() {
        let first = Waveform::new(epoch(), 1.0, vec![0.0; 3]).unwrap();
        // five samples missing, limit five: not filled
        let second = Waveform::new(epoch() + Duration::seconds(8), 1.0, vec![0.0; 3]).unwrap();
        let conditioned = condition(&segment(vec![first.clone(), second.clone()]), &parameters(5.0)).unwrap();
        assert_eq!(conditioned.waveforms().len(), 2);

        // four samples missing, limit five: filled
        let closer = Waveform::new(epoch() + Duration::seconds(7), 1.0, vec![0.0; 3]).unwrap();
        let conditioned = condition(&segment(vec![first, closer]), &parameters(5.0)).unwrap();
        assert_eq!(conditioned.waveforms().len(), 1);
        assert_eq!(conditioned.waveforms()[0].sample_count(), 10);
    }

    #[test]
    fn test_mismatched_rates_are_not_joined() {
        let first = Waveform::new(epoch(), 1.0, vec![0.0; 3]).unwrap();
        let second = Waveform::new(epoch() + Duration::seconds(5), 2.0, vec![0.0; 3]).unwrap();
        let conditioned = condition(&segment(vec![first, second]), &parameters(5.0)).unwrap();
        assert_eq!(conditioned.waveforms().len(), 2);
    }

    #[test]
    fn test_jitter_is_merged_without_new_samples() {
        let first = Waveform::new(epoch(), 10.0, vec![1.0; 10]).unwrap();
        // 40 ms late relative to the ideal next sample at t=1.0 s
        let second = Waveform::new(epoch() + Duration::milliseconds(1_040), 10.0, vec![2.0; 5]).unwrap();
        let conditioned = condition(&segment(vec![first, second]), &parameters(0.0)).unwrap();
        assert_eq!(conditioned.waveforms().len(), 1);
        assert_eq!(conditioned.waveforms()[0].sample_count(), 15);
    }

    #[test]
    fn test_zero_tolerance_disables_joining() {
        let first = Waveform::new(epoch(), 1.0, vec![0.0; 3]).unwrap();
        let second = Waveform::new(epoch() + Duration::seconds(5), 1.0, vec![0.0; 3]).unwrap();
        let params = ConditioningParameters {
            interpolate_gaps_sample_rate_tolerance: 0.0,
            merge_waveforms_sample_rate_tolerance: 0.0,
            max_interpolated_gap_samples: 10.0,
        };
        let conditioned = condition(&segment(vec![first, second]), &params).unwrap();
        assert_eq!(conditioned.waveforms().len(), 2);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let input = segment(vec![Waveform::new(epoch(), 1.0, vec![0.0]).unwrap()]);
        let mut params = parameters(5.0);
        params.merge_waveforms_sample_rate_tolerance = -1.0;
        assert!(matches!(condition(&input, &params), Err(QcError::InvalidArgument(_))));
        params.merge_waveforms_sample_rate_tolerance = 0.1;
        params.max_interpolated_gap_samples = f64::NAN;
        assert!(condition(&input, &params).is_err());
    }

    #[test]
    fn test_chain_of_short_gaps_becomes_one_run() {
        let runs = vec![
            Waveform::new(epoch(), 1.0, vec![0.0; 4]).unwrap(),
            Waveform::new(epoch() + Duration::seconds(6), 1.0, vec![0.0; 4]).unwrap(),
            Waveform::new(epoch() + Duration::seconds(11), 1.0, vec![0.0; 4]).unwrap(),
        ];
        let conditioned = condition(&segment(runs), &parameters(5.0)).unwrap();
        assert_eq!(conditioned.waveforms().len(), 1);
        assert_eq!(conditioned.waveforms()[0].sample_count(), 15);
    }
    #[test]
    fn test_merger_refuses_overlapping_runs() {
        let before = Waveform::new(epoch(), 1.0, vec![0.0; 10]).unwrap();
        // starts at t=5, well inside `before`
        let after = Waveform::new(epoch() + Duration::seconds(5), 1.0, vec![1.0; 3]).unwrap();
        let merged = WaveformMerger::new(0.5).apply(&[before, after]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_join_that_would_overrun_next_run_is_refused() {
        let params = ConditioningParameters {
            interpolate_gaps_sample_rate_tolerance: 0.5,
            merge_waveforms_sample_rate_tolerance: 0.5,
            max_interpolated_gap_samples: 10.0,
        };
        // re-timed at 1 Hz, the 100 samples at 1.2 Hz would run to t=105, past t=97
        let runs = vec![
            Waveform::new(epoch(), 1.0, vec![0.0; 5]).unwrap(),
            Waveform::new(epoch() + Duration::seconds(6), 1.2, vec![1.0; 100]).unwrap(),
            Waveform::new(epoch() + Duration::seconds(97), 1.2, vec![2.0; 10]).unwrap(),
        ];
        let input = segment(runs);

        let conditioned = condition(&input, &params).unwrap();
        assert_eq!(conditioned.waveforms(), input.waveforms());
    }
}
