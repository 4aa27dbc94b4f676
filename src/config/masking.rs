// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mask generator and SOH configuration

use serde::{Deserialize, Serialize};

use crate::qc::SpikeMaskParameters;

/// Gap mask settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapMaskConfig {
    /// Gaps of at least this many missing samples are `LONG_GAP`, shorter ones `REPAIRABLE_GAP`.
    pub min_long_gap_length_samples: f64,
}

impl Default for GapMaskConfig {
    fn default() -> Self {
        Self {
            min_long_gap_length_samples: 10.0,
        }
    }
}

/// Spike mask settings, see [`SpikeMaskParameters`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeMaskConfig {
    pub min_consecutive_sample_difference_spike_threshold: f64,
    pub rms_amplitude_ratio_threshold: f64,
    pub rms_lead_sample_differences: usize,
    pub rms_lag_sample_differences: usize,
}

impl Default for SpikeMaskConfig {
    fn default() -> Self {
        let defaults = SpikeMaskParameters::default();
        Self {
            min_consecutive_sample_difference_spike_threshold: defaults
                .min_consecutive_sample_difference_spike_threshold,
            rms_amplitude_ratio_threshold: defaults.rms_amplitude_ratio_threshold,
            rms_lead_sample_differences: defaults.rms_lead_sample_differences,
            rms_lag_sample_differences: defaults.rms_lag_sample_differences,
        }
    }
}

impl SpikeMaskConfig {
    pub fn to_parameters(&self) -> SpikeMaskParameters {
        SpikeMaskParameters {
            min_consecutive_sample_difference_spike_threshold: self
                .min_consecutive_sample_difference_spike_threshold,
            rms_amplitude_ratio_threshold: self.rms_amplitude_ratio_threshold,
            rms_lead_sample_differences: self.rms_lead_sample_differences,
            rms_lag_sample_differences: self.rms_lag_sample_differences,
        }
    }
}

/// State-of-health segmentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SohConfig {
    /// Holes between consecutive readings up to this long (seconds) are not acquisition gaps.
    pub adjacent_threshold_seconds: f64,
}

impl Default for SohConfig {
    fn default() -> Self {
        Self {
            adjacent_threshold_seconds: 1.0,
        }
    }
}
