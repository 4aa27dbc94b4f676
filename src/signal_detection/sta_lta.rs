// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! STA/LTA onset trigger detection
//!
//! The detector compares the short-term average (STA) of a transformed
//! waveform against its long-term average (LTA). For sample `i`, the windows
//! are the half-open index ranges
//!
//! ```text
//! STA: [i - sta_lead - sta_length, i - sta_lead)
//! LTA: [i - lta_lead - lta_length, i - lta_lead)
//! ```
//!
//! and `i` is only evaluated when both windows lie inside the waveform. Leads
//! may be negative, which moves a window past the evaluated sample.
//!
//! A two-state hysteresis machine turns the ratio series into triggers: the
//! detector arms (and emits a trigger) when the ratio reaches
//! `trigger_threshold`, and must fall to `detrigger_threshold` before it can
//! trigger again.
//!
//! # Algorithms
//!
//! - [`StaLtaAlgorithmType::Standard`]: arithmetic means over the windows
//! - [`StaLtaAlgorithmType::Recursive`]: exponentially weighted averages with
//!   time constants equal to the window lengths, sampled at the last index of
//!   each window, warm-started at the mean of the leading LTA window

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

use crate::error::{QcError, Result};
use crate::model::{ChannelSegment, Waveform};
use crate::preprocessing::{condition, ConditioningParameters};
use crate::utility::sample_conversion::samples;

/// How STA and LTA are computed from the transformed samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaLtaAlgorithmType {
    Standard,
    Recursive,
}

/// Sample-wise transformation applied before windowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformTransformation {
    /// Absolute value
    Rectified,
    /// Square (energy)
    Squared,
}

impl WaveformTransformation {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            WaveformTransformation::Rectified => value.abs(),
            WaveformTransformation::Squared => value * value,
        }
    }
}

/// Parameters of an STA/LTA run
#[derive(Debug, Clone, PartialEq)]
pub struct StaLtaParameters {
    pub algorithm_type: StaLtaAlgorithmType,
    pub waveform_transformation: WaveformTransformation,
    pub sta_lead: Duration,
    pub sta_length: Duration,
    pub lta_lead: Duration,
    pub lta_length: Duration,
    pub trigger_threshold: f64,
    pub detrigger_threshold: f64,
    /// Sample-rate tolerance used when interpolating gaps before detection
    pub interpolate_gaps_sample_rate_tolerance: f64,
    /// Sample-rate tolerance used when merging runs before detection
    pub merge_waveforms_sample_rate_tolerance: f64,
}

impl Default for StaLtaParameters {
    fn default() -> Self {
        Self {
            algorithm_type: StaLtaAlgorithmType::Standard,
            waveform_transformation: WaveformTransformation::Rectified,
            sta_lead: Duration::zero(),
            sta_length: Duration::seconds(1),
            lta_lead: Duration::seconds(1),
            lta_length: Duration::seconds(10),
            trigger_threshold: 4.0,
            detrigger_threshold: 2.0,
            interpolate_gaps_sample_rate_tolerance: 0.5,
            merge_waveforms_sample_rate_tolerance: 0.5,
        }
    }
}

impl StaLtaParameters {
    pub fn validate(&self) -> Result<()> {
        if self.sta_length <= Duration::zero() {
            return Err(QcError::invalid_argument(format!(
                "STA length must be positive, got {}",
                self.sta_length
            )));
        }
        if self.lta_length <= Duration::zero() {
            return Err(QcError::invalid_argument(format!(
                "LTA length must be positive, got {}",
                self.lta_length
            )));
        }
        for (name, value) in [
            ("trigger_threshold", self.trigger_threshold),
            ("detrigger_threshold", self.detrigger_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(QcError::invalid_argument(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.detrigger_threshold > self.trigger_threshold {
            return Err(QcError::invalid_argument(format!(
                "detrigger threshold {} exceeds trigger threshold {}",
                self.detrigger_threshold, self.trigger_threshold
            )));
        }
        self.conditioning(1.0).validate()
    }

    /// Conditioning settings for a segment at `sample_rate`.
    ///
    /// Gaps shorter than the LTA window are interpolated.
    pub fn conditioning(&self, sample_rate: f64) -> ConditioningParameters {
        ConditioningParameters {
            interpolate_gaps_sample_rate_tolerance: self.interpolate_gaps_sample_rate_tolerance,
            merge_waveforms_sample_rate_tolerance: self.merge_waveforms_sample_rate_tolerance,
            max_interpolated_gap_samples: samples(sample_rate, self.lta_length).max(0) as f64,
        }
    }
}

/// Window geometry in samples for one sample rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowPlacement {
    sta_lead: i64,
    sta_length: i64,
    lta_lead: i64,
    lta_length: i64,
}

impl WindowPlacement {
    fn new(parameters: &StaLtaParameters, sample_rate: f64) -> Self {
        // a positive duration always covers at least one sample
        Self {
            sta_lead: samples(sample_rate, parameters.sta_lead),
            sta_length: samples(sample_rate, parameters.sta_length).max(1),
            lta_lead: samples(sample_rate, parameters.lta_lead),
            lta_length: samples(sample_rate, parameters.lta_length).max(1),
        }
    }

    /// Inclusive range of evaluable indices for a waveform of `sample_count` samples
    fn evaluable(&self, sample_count: usize) -> Option<(usize, usize)> {
        let n = sample_count as i64;
        let first = 0
            .max(self.sta_lead + self.sta_length)
            .max(self.lta_lead + self.lta_length);
        let last = (n - 1).min(n + self.sta_lead).min(n + self.lta_lead);
        (first <= last).then(|| (first as usize, last as usize))
    }

    /// Smallest waveform that admits at least one evaluable index
    fn required_samples(&self) -> usize {
        let first = 0
            .max(self.sta_lead + self.sta_length)
            .max(self.lta_lead + self.lta_length);
        let lead = self.sta_lead.min(self.lta_lead);
        (first + 1).max(first - lead).max(1) as usize
    }
}

/// Hysteresis state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Below,
    Armed,
}

/// Two-threshold trigger state machine.
///
/// Starts [`TriggerState::Below`]. Feeding a ratio at or above the trigger
/// threshold while below arms the machine and reports a trigger; feeding a
/// ratio at or below the detrigger threshold while armed disarms it. NaN
/// ratios never cause a transition.
#[derive(Debug, Clone)]
pub struct HysteresisTrigger {
    trigger_threshold: f64,
    detrigger_threshold: f64,
    state: TriggerState,
}

impl HysteresisTrigger {
    pub fn new(trigger_threshold: f64, detrigger_threshold: f64) -> Self {
        Self {
            trigger_threshold,
            detrigger_threshold,
            state: TriggerState::Below,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Advance by one ratio; returns true when this ratio fires a trigger
    pub fn update(&mut self, ratio: f64) -> bool {
        match self.state {
            TriggerState::Below if ratio >= self.trigger_threshold => {
                self.state = TriggerState::Armed;
                true
            }
            TriggerState::Armed if ratio <= self.detrigger_threshold => {
                self.state = TriggerState::Below;
                false
            }
            _ => false,
        }
    }
}

/// Result of running the detector over one waveform
#[derive(Debug, Clone, PartialEq)]
pub enum WaveformOutcome {
    /// Trigger instants, possibly none
    Triggers(Vec<DateTime<Utc>>),
    /// The waveform cannot hold both analysis windows
    InsufficientData { required: usize, available: usize },
}

/// Triggers found over a channel segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerReport {
    pub triggers: BTreeSet<DateTime<Utc>>,
    pub waveforms_analyzed: usize,
    pub waveforms_with_insufficient_data: usize,
}

/// STA/LTA detector bound to a validated parameter set
#[derive(Debug, Clone)]
pub struct StaLtaDetector {
    parameters: StaLtaParameters,
}

impl StaLtaDetector {
    /// # Errors
    ///
    /// [`QcError::InvalidArgument`] for non-positive window lengths or
    /// thresholds, or a detrigger threshold above the trigger threshold.
    pub fn new(parameters: StaLtaParameters) -> Result<Self> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &StaLtaParameters {
        &self.parameters
    }

    /// STA/LTA ratio for every evaluable index of `values` sampled at `sample_rate`.
    ///
    /// Returns `None` when no index can hold both windows.
    pub fn ratios(&self, values: &[f64], sample_rate: f64) -> Option<Vec<(usize, f64)>> {
        let placement = WindowPlacement::new(&self.parameters, sample_rate);
        let (first, last) = placement.evaluable(values.len())?;
        let transformed: Vec<f64> = values
            .iter()
            .map(|v| self.parameters.waveform_transformation.apply(*v))
            .collect();

        let ratios = match self.parameters.algorithm_type {
            StaLtaAlgorithmType::Standard => standard_ratios(&transformed, &placement, first, last),
            StaLtaAlgorithmType::Recursive => recursive_ratios(&transformed, &placement, first, last),
        };
        Some(ratios)
    }

    /// Run the detector over a single waveform
    pub fn detect_waveform(&self, waveform: &Waveform) -> WaveformOutcome {
        let Some(ratios) = self.ratios(waveform.values(), waveform.sample_rate()) else {
            let placement = WindowPlacement::new(&self.parameters, waveform.sample_rate());
            return WaveformOutcome::InsufficientData {
                required: placement.required_samples(),
                available: waveform.sample_count(),
            };
        };

        let mut machine = HysteresisTrigger::new(
            self.parameters.trigger_threshold,
            self.parameters.detrigger_threshold,
        );
        let triggers = ratios
            .into_iter()
            .filter(|(_, ratio)| machine.update(*ratio))
            .map(|(index, _)| waveform.time_of_sample(index))
            .collect();
        WaveformOutcome::Triggers(triggers)
    }

    /// Condition `segment` and run the detector over each resulting waveform
    pub fn detect(&self, segment: &ChannelSegment) -> Result<TriggerReport> {
        let conditioned = condition(
            segment,
            &self.parameters.conditioning(segment.nominal_sample_rate()),
        )?;

        let mut report = TriggerReport::default();
        for waveform in conditioned.waveforms() {
            report.waveforms_analyzed += 1;
            match self.detect_waveform(waveform) {
                WaveformOutcome::Triggers(instants) => {
                    for instant in instants {
                        debug!("STA/LTA trigger on '{}' at {}", segment.channel_id(), instant);
                        report.triggers.insert(instant);
                    }
                }
                WaveformOutcome::InsufficientData {
                    required,
                    available,
                } => {
                    debug!(
                        "Insufficient data on '{}': waveform at {} has {} samples, STA/LTA needs {}",
                        segment.channel_id(),
                        waveform.start_time(),
                        available,
                        required
                    );
                    report.waveforms_with_insufficient_data += 1;
                }
            }
        }

        info!(
            "STA/LTA on '{}': {} trigger(s) over {} waveform(s), {} too short",
            segment.channel_id(),
            report.triggers.len(),
            report.waveforms_analyzed,
            report.waveforms_with_insufficient_data
        );
        Ok(report)
    }
}

fn standard_ratios(
    transformed: &[f64],
    placement: &WindowPlacement,
    first: usize,
    last: usize,
) -> Vec<(usize, f64)> {
    let mut prefix = Vec::with_capacity(transformed.len() + 1);
    prefix.push(0.0);
    let mut running = 0.0;
    for value in transformed {
        running += value;
        prefix.push(running);
    }
    let window_mean = |end: i64, length: i64| {
        let end = end as usize;
        let start = end - length as usize;
        (prefix[end] - prefix[start]) / length as f64
    };

    (first..=last)
        .map(|i| {
            let i_signed = i as i64;
            let sta = window_mean(i_signed - placement.sta_lead, placement.sta_length);
            let lta = window_mean(i_signed - placement.lta_lead, placement.lta_length);
            (i, sta / lta)
        })
        .collect()
}

fn recursive_ratios(
    transformed: &[f64],
    placement: &WindowPlacement,
    first: usize,
    last: usize,
) -> Vec<(usize, f64)> {
    let warm_up = (placement.lta_length as usize).min(transformed.len());
    let seed = transformed[..warm_up].iter().sum::<f64>() / warm_up as f64;

    let smooth = |length: i64| -> Vec<f64> {
        let weight = 1.0 / length as f64;
        let mut level = seed;
        transformed
            .iter()
            .map(|value| {
                level += (value - level) * weight;
                level
            })
            .collect()
    };
    let sta = smooth(placement.sta_length);
    let lta = smooth(placement.lta_length);

    (first..=last)
        .map(|i| {
            let i_signed = i as i64;
            let sta_end = (i_signed - placement.sta_lead - 1) as usize;
            let lta_end = (i_signed - placement.lta_lead - 1) as usize;
            (i, sta[sta_end] / lta[lta_end])
        })
        .collect()
}

/// Detect STA/LTA trigger instants over a whole channel segment
pub fn detect_triggers(
    segment: &ChannelSegment,
    parameters: &StaLtaParameters,
) -> Result<BTreeSet<DateTime<Utc>>> {
    let detector = StaLtaDetector::new(parameters.clone())?;
    Ok(detector.detect(segment)?.triggers)
}
