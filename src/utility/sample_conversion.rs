// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Duration / sample rate conversion
//!
//! Every component of the QC core expresses window lengths and tolerances as
//! time durations, while the algorithms themselves walk sample indices. These
//! helpers convert between the two representations.
//!
//! The conversion is split into the seconds and sub-second nanoseconds of the
//! duration so that integral-second durations convert exactly:
//!
//! ```text
//! samples = sample_rate * seconds + sample_rate * nanos / 1e9
//! ```
//!
//! Negative durations are legal and produce negative sample counts; callers
//! validate the sign where it matters.
//!
//! ## Examples
//!
//! ```rust
//! use chrono::Duration;
//! use rust_seismic_qc::utility::sample_conversion::{fractional_samples, samples};
//!
//! assert_eq!(fractional_samples(40.0, Duration::seconds(2)), 80.0);
//! assert_eq!(samples(40.0, Duration::milliseconds(1012)), 40);
//! ```

use chrono::Duration;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Sample counts closer than this to an integer are treated as that integer.
///
/// Time stamps are stored with nanosecond resolution, so a sample period such
/// as 1/3 s cannot be represented exactly and gap lengths computed from them
/// land a hair off the integer they describe.
pub const SAMPLE_COUNT_TOLERANCE: f64 = 1e-6;

/// Number of (possibly fractional) samples spanned by `duration` at `sample_rate`.
pub fn fractional_samples(sample_rate: f64, duration: Duration) -> f64 {
    let seconds = duration.num_seconds() as f64;
    let nanos = duration.subsec_nanos() as f64;
    sample_rate * seconds + sample_rate * nanos / NANOS_PER_SECOND
}

/// Number of whole samples spanned by `duration` at `sample_rate`, rounded to nearest.
pub fn samples(sample_rate: f64, duration: Duration) -> i64 {
    fractional_samples(sample_rate, duration).round() as i64
}

/// Duration spanned by `sample_count` sample periods at `sample_rate`.
///
/// The result is rounded to the nearest nanosecond.
pub fn duration_of_samples(sample_rate: f64, sample_count: f64) -> Duration {
    duration_from_seconds(sample_count / sample_rate)
}

/// Convert a floating-point number of seconds to a [`Duration`], rounded to the nearest nanosecond.
pub fn duration_from_seconds(seconds: f64) -> Duration {
    Duration::nanoseconds((seconds * NANOS_PER_SECOND).round() as i64)
}

/// Snap a fractional sample count onto the nearest integer when it is within
/// [`SAMPLE_COUNT_TOLERANCE`] of it.
pub fn snap_sample_count(count: f64) -> f64 {
    let rounded = count.round();
    if (count - rounded).abs() < SAMPLE_COUNT_TOLERANCE {
        rounded
    } else {
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integral_seconds_are_exact() {
        assert_eq!(fractional_samples(20.0, Duration::seconds(3)), 60.0);
        assert_eq!(samples(20.0, Duration::seconds(3)), 60);
    }

    #[test]
    fn test_sub_second_durations() {
        assert_relative_eq!(
            fractional_samples(40.0, Duration::milliseconds(1_012)),
            40.48,
            epsilon = 1e-9
        );
        assert_eq!(samples(40.0, Duration::milliseconds(1_012)), 40);
        assert_eq!(samples(40.0, Duration::milliseconds(1_013)), 41);
    }

    #[test]
    fn test_negative_durations_give_negative_counts() {
        assert_relative_eq!(
            fractional_samples(10.0, Duration::milliseconds(-1_500)),
            -15.0,
            epsilon = 1e-9
        );
        assert_eq!(samples(10.0, Duration::milliseconds(-1_500)), -15);
    }

    #[test]
    fn test_duration_round_trip_through_samples() {
        let duration = duration_of_samples(3.0, 2.0);
        assert_eq!(duration, Duration::nanoseconds(666_666_667));
        assert_eq!(snap_sample_count(fractional_samples(3.0, duration)), 2.0);
    }

    #[test]
    fn test_snap_leaves_genuine_fractions_alone() {
        assert_eq!(snap_sample_count(2.4), 2.4);
        assert_eq!(snap_sample_count(4.999_999_9), 5.0);
    }
}
