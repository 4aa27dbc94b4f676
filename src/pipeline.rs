// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Per-channel orchestration
//!
//! For one channel the pipeline condenses the SOH readings into status
//! segments, runs the configured trigger algorithms over the segment and
//! runs every configured mask generator against the stored masks. Channels
//! are independent, so [`process_batch`] fans them out over a thread pool and
//! keeps one result per channel.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use log::{error, info};
use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{QcError, Result};
use crate::model::{AcquiredChannelSohBoolean, ChannelSegment, ChannelSohStatusSegment, QcMask};
use crate::qc::{QcMaskAlgorithm, TriggerAlgorithm};
use crate::soh::segment_all;

/// Everything known about one channel for one run
#[derive(Debug, Clone)]
pub struct ChannelInput {
    pub segment: ChannelSegment,
    pub existing_masks: Vec<QcMask>,
    pub soh_samples: Vec<AcquiredChannelSohBoolean>,
}

impl ChannelInput {
    pub fn new(segment: ChannelSegment) -> Self {
        Self {
            segment,
            existing_masks: Vec::new(),
            soh_samples: Vec::new(),
        }
    }
}

/// Algorithms and settings shared by every channel of a run
#[derive(Debug, Clone)]
pub struct ProcessingPlan {
    pub triggers: Vec<TriggerAlgorithm>,
    pub masks: Vec<QcMaskAlgorithm>,
    /// Largest hole between SOH readings that does not count as missing data
    pub soh_adjacent_threshold: Duration,
}

/// Outcome of processing one channel
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel_id: String,
    pub channel_segment_id: Uuid,
    pub triggers: BTreeSet<DateTime<Utc>>,
    pub waveforms_with_insufficient_data: usize,
    pub status_segments: Vec<ChannelSohStatusSegment>,
    /// New masks and stored masks that received a version
    pub masks: Vec<QcMask>,
}

/// Process a single channel.
///
/// # Errors
///
/// [`QcError::InvalidArgument`] when the SOH readings or stored masks belong
/// to another channel, and any error raised by a configured algorithm.
pub fn process_channel(input: &ChannelInput, plan: &ProcessingPlan) -> Result<ChannelReport> {
    let channel_id = input.segment.channel_id();
    if let Some(foreign) = input
        .soh_samples
        .iter()
        .find(|sample| sample.channel_id != channel_id)
    {
        return Err(QcError::invalid_argument(format!(
            "SOH sample {} belongs to channel '{}', not '{}'",
            foreign.id, foreign.channel_id, channel_id
        )));
    }

    let mut status_segments = Vec::new();
    if !input.soh_samples.is_empty() {
        for (_, status) in segment_all(&input.soh_samples, plan.soh_adjacent_threshold) {
            status_segments.push(status?);
        }
    }

    let mut triggers = BTreeSet::new();
    let mut waveforms_with_insufficient_data = 0;
    for algorithm in &plan.triggers {
        let report = algorithm.detect(&input.segment)?;
        triggers.extend(report.triggers);
        waveforms_with_insufficient_data += report.waveforms_with_insufficient_data;
    }

    let mut masks = Vec::new();
    for algorithm in &plan.masks {
        masks.extend(algorithm.generate(&input.segment, &status_segments, &input.existing_masks)?);
    }

    info!(
        "Channel '{}': {} trigger(s), {} status segment set(s), {} mask(s)",
        channel_id,
        triggers.len(),
        status_segments.len(),
        masks.len()
    );

    Ok(ChannelReport {
        channel_id: channel_id.to_string(),
        channel_segment_id: input.segment.id(),
        triggers,
        waveforms_with_insufficient_data,
        status_segments,
        masks,
    })
}

/// Process independent channels in parallel.
///
/// Results keep the order of `inputs`. A failing channel is logged and
/// reported in its slot without affecting the others.
pub fn process_batch(
    inputs: &[ChannelInput],
    plan: &ProcessingPlan,
) -> Vec<(String, Result<ChannelReport>)> {
    inputs
        .par_iter()
        .map(|input| {
            let channel_id = input.segment.channel_id().to_string();
            let result = process_channel(input, plan);
            if let Err(e) = &result {
                error!("Processing failed for channel '{}': {}", channel_id, e);
            }
            (channel_id, result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AcquiredChannelSohType, Waveform};
    use crate::qc::SpikeMaskParameters;
    use crate::signal_detection::StaLtaParameters;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    fn plan() -> ProcessingPlan {
        ProcessingPlan {
            triggers: vec![TriggerAlgorithm::sta_lta(StaLtaParameters::default()).unwrap()],
            masks: vec![
                QcMaskAlgorithm::Gap {
                    min_long_gap_samples: 5.0,
                },
                QcMaskAlgorithm::Spike(SpikeMaskParameters::default()),
                QcMaskAlgorithm::ChannelSoh,
            ],
            soh_adjacent_threshold: Duration::seconds(1),
        }
    }

    #[test]
    fn test_channel_with_gap_and_soh() {
        let segment = ChannelSegment::create(
            "STA.BHZ",
            "pipeline",
            vec![
                Waveform::new(at(0), 1.0, vec![0.0; 10]).unwrap(),
                Waveform::new(at(30), 1.0, vec![0.0; 10]).unwrap(),
            ],
        )
        .unwrap();
        let mut input = ChannelInput::new(segment);
        input.soh_samples = vec![
            AcquiredChannelSohBoolean::new("STA.BHZ", AcquiredChannelSohType::Clipped, at(0), at(5), false)
                .unwrap(),
            AcquiredChannelSohBoolean::new("STA.BHZ", AcquiredChannelSohType::Clipped, at(5), at(10), true)
                .unwrap(),
        ];

        let report = process_channel(&input, &plan()).unwrap();
        assert!(report.triggers.is_empty());
        // both runs are too short for the 11 s STA/LTA span
        assert_eq!(report.waveforms_with_insufficient_data, 2);
        assert_eq!(report.status_segments.len(), 1);
        assert_eq!(report.masks.len(), 2);
    }

    #[test]
    fn test_batch_isolates_failures() {
        let good = ChannelInput::new(
            ChannelSegment::create("GOOD.BHZ", "ok", vec![Waveform::new(at(0), 1.0, vec![0.0; 5]).unwrap()])
                .unwrap(),
        );
        let mut bad = ChannelInput::new(
            ChannelSegment::create("BAD.BHZ", "ko", vec![Waveform::new(at(0), 1.0, vec![0.0; 5]).unwrap()])
                .unwrap(),
        );
        bad.soh_samples = vec![AcquiredChannelSohBoolean::new(
            "OTHER.BHZ",
            AcquiredChannelSohType::Clipped,
            at(0),
            at(1),
            true,
        )
        .unwrap()];

        let results = process_batch(&[good, bad], &plan());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "GOOD.BHZ");
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, "BAD.BHZ");
        assert!(matches!(results[1].1, Err(QcError::InvalidArgument(_))));
    }
}
