// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Conditioning and trigger detection configuration
//!
//! Durations are written in seconds in the configuration file and converted to
//! [`chrono::Duration`] when the typed parameters are built.

use serde::{Deserialize, Serialize};

use crate::preprocessing::ConditioningParameters;
use crate::signal_detection::{StaLtaAlgorithmType, StaLtaParameters, WaveformTransformation};
use crate::utility::duration_from_seconds;

/// Sample-rate tolerances used when conditioning waveforms before detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditioningConfig {
    /// Largest sample-rate difference (Hz, exclusive) across which a gap may be interpolated.
    pub interpolate_gaps_sample_rate_tolerance: f64,

    /// Largest sample-rate difference (Hz, exclusive) for two runs to be merged.
    pub merge_waveforms_sample_rate_tolerance: f64,
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        let defaults = ConditioningParameters::default();
        Self {
            interpolate_gaps_sample_rate_tolerance: defaults.interpolate_gaps_sample_rate_tolerance,
            merge_waveforms_sample_rate_tolerance: defaults.merge_waveforms_sample_rate_tolerance,
        }
    }
}

/// STA/LTA detector settings.
///
/// # Fields
///
/// * `algorithm_type` - `standard` (window means) or `recursive` (exponential averages)
/// * `waveform_transformation` - `rectified` or `squared`
/// * `sta_lead_seconds` / `lta_lead_seconds` - offset of each window's end before
///   the evaluated sample; negative values look ahead
/// * `sta_length_seconds` / `lta_length_seconds` - window lengths, positive
/// * `trigger_threshold` / `detrigger_threshold` - hysteresis thresholds on the ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaLtaConfig {
    pub algorithm_type: StaLtaAlgorithmType,
    pub waveform_transformation: WaveformTransformation,
    pub sta_lead_seconds: f64,
    pub sta_length_seconds: f64,
    pub lta_lead_seconds: f64,
    pub lta_length_seconds: f64,
    pub trigger_threshold: f64,
    pub detrigger_threshold: f64,
}

impl Default for StaLtaConfig {
    fn default() -> Self {
        Self {
            algorithm_type: StaLtaAlgorithmType::Standard,
            waveform_transformation: WaveformTransformation::Rectified,
            sta_lead_seconds: 0.0,
            sta_length_seconds: 1.0,
            lta_lead_seconds: 1.0,
            lta_length_seconds: 10.0,
            trigger_threshold: 4.0,
            detrigger_threshold: 2.0,
        }
    }
}

impl StaLtaConfig {
    /// Build detector parameters, taking the tolerances from the conditioning section
    pub fn to_parameters(&self, conditioning: &ConditioningConfig) -> StaLtaParameters {
        StaLtaParameters {
            algorithm_type: self.algorithm_type,
            waveform_transformation: self.waveform_transformation,
            sta_lead: duration_from_seconds(self.sta_lead_seconds),
            sta_length: duration_from_seconds(self.sta_length_seconds),
            lta_lead: duration_from_seconds(self.lta_lead_seconds),
            lta_length: duration_from_seconds(self.lta_length_seconds),
            trigger_threshold: self.trigger_threshold,
            detrigger_threshold: self.detrigger_threshold,
            interpolate_gaps_sample_rate_tolerance: conditioning
                .interpolate_gaps_sample_rate_tolerance,
            merge_waveforms_sample_rate_tolerance: conditioning.merge_waveforms_sample_rate_tolerance,
        }
    }
}
