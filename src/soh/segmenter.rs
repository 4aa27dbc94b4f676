// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Condensing boolean SOH readings into status-change segments
//!
//! The segmenter sweeps the readings of one channel/indicator pair in start
//! time order and keeps a current run:
//!
//! - a reading that starts more than `adjacent_threshold` after the run ends
//!   closes the run and inserts a `MISSING` segment over the acquisition gap;
//! - a reading with a different value closes the run where the reading starts;
//! - a reading with the same value extends the run.
//!
//! Small holes (up to the threshold) are absorbed into the neighbouring runs,
//! so the result covers the whole input span without overlap.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::error::{QcError, Result};
use crate::model::{
    AcquiredChannelSohBoolean, AcquiredChannelSohType, ChannelSohStatusSegment, SohStatusSegment,
    StatusBit,
};

/// Builds the output list, dropping empty intervals and fusing equal neighbours
#[derive(Default)]
struct SegmentAccumulator {
    segments: Vec<SohStatusSegment>,
}

impl SegmentAccumulator {
    fn push(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, status: StatusBit) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        if let Some(last) = self.segments.last_mut() {
            if last.end_time() == start && last.status() == status {
                *last = SohStatusSegment::new(last.start_time(), end, status)?;
                return Ok(());
            }
        }
        self.segments.push(SohStatusSegment::new(start, end, status)?);
        Ok(())
    }
}

struct Run {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    status: bool,
}

impl Run {
    fn seed(sample: &AcquiredChannelSohBoolean) -> Self {
        Self {
            start: sample.start_time,
            end: sample.end_time,
            status: sample.status,
        }
    }
}

/// Condense the readings of one channel and SOH indicator into status segments.
///
/// # Errors
///
/// [`QcError::InvalidArgument`] when `samples` is empty, mixes channels or
/// indicator types, holds an inverted reading or spans no time, or when
/// `adjacent_threshold` is negative.
pub fn segment_status(
    samples: &[AcquiredChannelSohBoolean],
    adjacent_threshold: Duration,
) -> Result<ChannelSohStatusSegment> {
    let first = samples
        .first()
        .ok_or_else(|| QcError::invalid_argument("cannot segment an empty list of SOH samples"))?;
    if adjacent_threshold < Duration::zero() {
        return Err(QcError::invalid_argument(format!(
            "adjacent threshold must not be negative, got {}",
            adjacent_threshold
        )));
    }
    if let Some(stray) = samples
        .iter()
        .find(|s| s.channel_id != first.channel_id || s.soh_type != first.soh_type)
    {
        return Err(QcError::invalid_argument(format!(
            "SOH samples mix '{}'/{} with '{}'/{}",
            first.channel_id, first.soh_type, stray.channel_id, stray.soh_type
        )));
    }

    if let Some(inverted) = samples.iter().find(|s| s.end_time < s.start_time) {
        return Err(QcError::invalid_argument(format!(
            "SOH sample {} on '{}' ends ({}) before it starts ({})",
            inverted.id, inverted.channel_id, inverted.end_time, inverted.start_time
        )));
    }
    // instantaneous readings only mark status flips; at least one must span time
    let span_start = samples.iter().map(|s| s.start_time).min().unwrap_or(first.start_time);
    let span_end = samples.iter().map(|s| s.end_time).max().unwrap_or(first.end_time);
    if span_end <= span_start {
        return Err(QcError::invalid_argument(format!(
            "SOH samples for '{}' ({}) cover no time: every reading is instantaneous at {}",
            first.channel_id, first.soh_type, span_start
        )));
    }

    let mut ordered: Vec<&AcquiredChannelSohBoolean> = samples.iter().collect();
    ordered.sort_by_key(|s| (s.start_time, s.end_time));

    let mut output = SegmentAccumulator::default();
    let mut run = Run::seed(ordered[0]);

    for next in &ordered[1..] {
        if next.start_time > run.end + adjacent_threshold {
            debug!(
                "SOH gap on '{}' ({}) from {} to {}",
                first.channel_id, first.soh_type, run.end, next.start_time
            );
            output.push(run.start, run.end, run.status.into())?;
            output.push(run.end, next.start_time, StatusBit::Missing)?;
            run = Run::seed(next);
        } else if next.status != run.status {
            output.push(run.start, next.start_time, run.status.into())?;
            run = Run::seed(next);
        } else if next.end_time > run.end {
            run.end = next.end_time;
        }
    }
    output.push(run.start, run.end, run.status.into())?;

    ChannelSohStatusSegment::new(first.channel_id.clone(), first.soh_type, output.segments)
}

/// Group mixed readings by channel and indicator type, then segment each group.
///
/// Groups come back in channel then indicator order; each group carries its own result.
pub fn segment_all(
    samples: &[AcquiredChannelSohBoolean],
    adjacent_threshold: Duration,
) -> Vec<((String, AcquiredChannelSohType), Result<ChannelSohStatusSegment>)> {
    let mut groups: BTreeMap<(String, AcquiredChannelSohType), Vec<AcquiredChannelSohBoolean>> =
        BTreeMap::new();
    for sample in samples {
        groups
            .entry((sample.channel_id.clone(), sample.soh_type))
            .or_default()
            .push(sample.clone());
    }
    groups
        .into_iter()
        .map(|(key, group)| {
            let result = segment_status(&group, adjacent_threshold);
            (key, result)
        })
        .collect()
}
