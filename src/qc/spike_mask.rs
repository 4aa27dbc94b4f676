// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Three-point spike detection
//!
//! With `D[k] = |x[k+1] - x[k]|`, sample `i` is a candidate when the two
//! differences around it are strongly asymmetric:
//!
//! ```text
//! min(D[i-1], D[i]) / max(D[i-1], D[i]) < min_consecutive_sample_difference_spike_threshold
//! ```
//!
//! A candidate is confirmed when `max(D[i-1], D[i])` exceeds
//! `rms_amplitude_ratio_threshold` times the RMS of the `lead` differences
//! ending before `D[i-1]` and the `lag` differences starting after `D[i]`.
//! A confirmed spike covers `[t(i-1), t(i+1)]`; overlapping windows of the
//! same waveform merge into one mask.

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::{QcError, Result};
use crate::model::{ChannelSegment, MaskContent, QcMask, QcMaskCategory, QcMaskType, VersionLineage, Waveform};

/// Tuning of the spike detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeMaskParameters {
    /// Exclusive upper bound on `min(d1, d2) / max(d1, d2)`, in `(0, 1)`
    pub min_consecutive_sample_difference_spike_threshold: f64,
    /// Ratio of the jump to the local RMS that confirms a spike, `> 1`
    pub rms_amplitude_ratio_threshold: f64,
    pub rms_lead_sample_differences: usize,
    pub rms_lag_sample_differences: usize,
}

impl Default for SpikeMaskParameters {
    fn default() -> Self {
        Self {
            min_consecutive_sample_difference_spike_threshold: 0.5,
            rms_amplitude_ratio_threshold: 2.0,
            rms_lead_sample_differences: 9,
            rms_lag_sample_differences: 9,
        }
    }
}

impl SpikeMaskParameters {
    pub fn validate(&self) -> Result<()> {
        let threshold = self.min_consecutive_sample_difference_spike_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(QcError::invalid_argument(format!(
                "min_consecutive_sample_difference_spike_threshold must be in (0, 1), got {}",
                threshold
            )));
        }
        let ratio = self.rms_amplitude_ratio_threshold;
        if !ratio.is_finite() || ratio <= 1.0 {
            return Err(QcError::invalid_argument(format!(
                "rms_amplitude_ratio_threshold must be greater than 1, got {}",
                ratio
            )));
        }
        let window = self
            .rms_lead_sample_differences
            .checked_add(self.rms_lag_sample_differences)
            .ok_or_else(|| {
                QcError::invalid_argument(format!(
                    "RMS window of lead {} and lag {} sample differences is too large",
                    self.rms_lead_sample_differences, self.rms_lag_sample_differences
                ))
            })?;
        if window < 2 {
            return Err(QcError::invalid_argument(format!(
                "RMS needs at least two sample differences, got lead {} and lag {}",
                self.rms_lead_sample_differences, self.rms_lag_sample_differences
            )));
        }
        Ok(())
    }
}

/// Indices of the confirmed spike samples of `values`, ascending
pub fn find_spikes(values: &[f64], parameters: &SpikeMaskParameters) -> Vec<usize> {
    let lead = parameters.rms_lead_sample_differences;
    let lag = parameters.rms_lag_sample_differences;
    if values.len() < lead.saturating_add(lag).saturating_add(3) {
        return Vec::new();
    }
    let differences: Vec<f64> = values.windows(2).map(|pair| (pair[1] - pair[0]).abs()).collect();

    (lead + 1..=values.len() - 2 - lag)
        .filter(|&i| {
            let (before, after) = (differences[i - 1], differences[i]);
            let largest = before.max(after);
            if largest == 0.0 {
                return false;
            }
            if before.min(after) / largest >= parameters.min_consecutive_sample_difference_spike_threshold {
                return false;
            }

            let surrounding = differences[i - 1 - lead..i - 1]
                .iter()
                .chain(&differences[i + 1..i + 1 + lag]);
            let mean_square = surrounding.map(|d| d * d).sum::<f64>() / (lead + lag) as f64;
            // a flat neighbourhood makes any jump an outlier
            largest / mean_square.sqrt() > parameters.rms_amplitude_ratio_threshold
        })
        .collect()
}

/// Spike windows of one waveform, overlapping windows merged
fn spike_windows(waveform: &Waveform, parameters: &SpikeMaskParameters) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut windows: Vec<(usize, usize)> = Vec::new();
    for index in find_spikes(waveform.values(), parameters) {
        let (start, end) = (index - 1, index + 1);
        match windows.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => windows.push((start, end)),
        }
    }
    windows
        .into_iter()
        .map(|(start, end)| (waveform.time_of_sample(start), waveform.time_of_sample(end)))
        .collect()
}

/// Detect spikes in every waveform of `segment` and create masks for the new ones.
///
/// A spike whose interval exactly equals that of a stored, non-rejected
/// `SPIKE` mask is skipped, so repeated runs over the same data add nothing.
///
/// # Errors
///
/// [`QcError::InvalidArgument`] for out-of-range parameters or a stored mask
/// from another channel.
pub fn generate_spike_masks(
    segment: &ChannelSegment,
    existing_masks: &[QcMask],
    parameters: &SpikeMaskParameters,
) -> Result<Vec<QcMask>> {
    parameters.validate()?;
    if let Some(foreign) = existing_masks
        .iter()
        .find(|mask| mask.channel_id() != segment.channel_id())
    {
        return Err(QcError::invalid_argument(format!(
            "mask {} belongs to channel '{}', not '{}'",
            foreign.id(),
            foreign.channel_id(),
            segment.channel_id()
        )));
    }

    let known: Vec<(DateTime<Utc>, DateTime<Utc>)> = existing_masks
        .iter()
        .map(QcMask::current_version)
        .filter(|version| version.mask_type() == Some(QcMaskType::Spike))
        .filter_map(|version| version.interval())
        .collect();

    let mut masks = Vec::new();
    for waveform in segment.waveforms() {
        for (start, end) in spike_windows(waveform, parameters) {
            if known.contains(&(start, end)) {
                debug!(
                    "Spike [{}, {}] on '{}' already masked",
                    start,
                    end,
                    segment.channel_id()
                );
                continue;
            }
            let mask = QcMask::create(
                segment.channel_id(),
                MaskContent::new(
                    QcMaskCategory::WaveformQuality,
                    QcMaskType::Spike,
                    format!("spike detected in channel segment '{}'", segment.name()),
                    start,
                    end,
                ),
                VersionLineage::from_segment(segment.id()),
            )?;
            debug!(
                "Spike mask {} on '{}' over [{}, {}]",
                mask.id(),
                segment.channel_id(),
                start,
                end
            );
            masks.push(mask);
        }
    }
    Ok(masks)
}
