// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Evenly sampled waveform runs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};
use crate::utility::sample_conversion::{duration_of_samples, fractional_samples, snap_sample_count};

/// A contiguous, evenly sampled run of amplitude samples.
///
/// Immutable once constructed: the sample count is the length of `values` and
/// the end time is the time of the last sample,
/// `start_time + (sample_count - 1) / sample_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WaveformRecord")]
pub struct Waveform {
    start_time: DateTime<Utc>,
    sample_rate: f64,
    values: Vec<f64>,
}

/// Unvalidated serialized form of a [`Waveform`]
#[derive(Deserialize)]
struct WaveformRecord {
    start_time: DateTime<Utc>,
    sample_rate: f64,
    values: Vec<f64>,
}

impl TryFrom<WaveformRecord> for Waveform {
    type Error = QcError;

    fn try_from(record: WaveformRecord) -> Result<Self> {
        Waveform::new(record.start_time, record.sample_rate, record.values)
    }
}

impl Waveform {
    /// Create a waveform from its first sample time, sample rate (Hz) and samples.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidData`] if the sample rate is not a positive finite number
    /// or if `values` is empty.
    pub fn new(start_time: DateTime<Utc>, sample_rate: f64, values: Vec<f64>) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(QcError::invalid_data(format!(
                "waveform sample rate must be positive, got {}",
                sample_rate
            )));
        }
        if values.is_empty() {
            return Err(QcError::invalid_data("waveform must contain at least one sample"));
        }
        Ok(Self {
            start_time,
            sample_rate,
            values,
        })
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Time of the last sample
    pub fn end_time(&self) -> DateTime<Utc> {
        self.time_of_sample(self.values.len() - 1)
    }

    pub fn sample_period(&self) -> Duration {
        duration_of_samples(self.sample_rate, 1.0)
    }

    /// Time of the sample at `index`, which may lie past the end of the buffer.
    pub fn time_of_sample(&self, index: usize) -> DateTime<Utc> {
        self.start_time + duration_of_samples(self.sample_rate, index as f64)
    }

    /// Number of samples missing between the end of `self` and the start of `next`,
    /// measured at `self`'s sample rate.
    ///
    /// Zero means `next` starts exactly one sample period after `self` ends;
    /// values below one are sub-sample timing jitter; negative values mean the
    /// runs overlap by more than a period.
    pub fn missing_samples_before(&self, next: &Waveform) -> f64 {
        let elapsed = next.start_time - self.end_time();
        snap_sample_count(fractional_samples(self.sample_rate, elapsed) - 1.0)
    }
}
