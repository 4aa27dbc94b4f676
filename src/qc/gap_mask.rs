// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Gap detection and reconciliation against stored gap masks
//!
//! Gaps come from [`ChannelSegment::gaps`]. Each stored, non-rejected gap
//! mask of the channel that overlaps the segment span is reduced to what is
//! still missing: the gaps it overlaps, plus any part lying before the first
//! or after the last acquired sample (not yet observed, so it keeps its type).
//!
//! | remaining pieces      | action                                           |
//! |-----------------------|--------------------------------------------------|
//! | none                  | reject: the data has been filled                 |
//! | one, identical        | untouched                                        |
//! | one, different        | new version with the piece's interval/type       |
//! | several               | narrowed version + one new mask per extra piece  |
//!
//! Masks that do not overlap the segment span are untouched.
//!
//! A gap overlapped by more than one stored mask is a
//! [`QcError::ReconciliationConflict`]. Gaps overlapped by no mask become new
//! masks.

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::{QcError, Result};
use crate::model::{
    ChannelSegment, MaskContent, QcMask, QcMaskCategory, QcMaskType, VersionLineage, WaveformGap,
};

/// Classify a gap by its length in missing samples
pub fn classify_gap(missing_samples: f64, min_long_gap_samples: f64) -> QcMaskType {
    if missing_samples >= min_long_gap_samples {
        QcMaskType::LongGap
    } else {
        QcMaskType::RepairableGap
    }
}

fn overlaps(a: (DateTime<Utc>, DateTime<Utc>), b: (DateTime<Utc>, DateTime<Utc>)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

fn gap_content(gap: &WaveformGap, mask_type: QcMaskType, segment: &ChannelSegment) -> MaskContent {
    MaskContent::new(
        QcMaskCategory::WaveformQuality,
        mask_type,
        format!(
            "{:.0} missing sample(s) at {} Hz in channel segment '{}'",
            gap.missing_samples,
            gap.sample_rate,
            segment.name()
        ),
        gap.start_time,
        gap.end_time,
    )
}

/// Part of a stored mask lying outside the segment, where no data has been seen yet
fn unobserved_content(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    mask_type: QcMaskType,
    segment: &ChannelSegment,
) -> MaskContent {
    MaskContent::new(
        QcMaskCategory::WaveformQuality,
        mask_type,
        format!(
            "not yet reacquired, outside channel segment '{}'",
            segment.name()
        ),
        start_time,
        end_time,
    )
}

/// Detect the gaps of `segment` and reconcile them with the stored masks.
///
/// `existing_masks` may hold masks of any type; only non-rejected gap masks
/// take part. Returns the masks that were created or received a new
/// version, updated masks first (in input order), then new masks in time
/// order.
///
/// # Errors
///
/// - [`QcError::InvalidArgument`] when `min_long_gap_samples` is not a
///   positive number or a stored mask belongs to another channel.
/// - [`QcError::ReconciliationConflict`] when one gap overlaps several stored
///   gap masks.
pub fn generate_gap_masks(
    segment: &ChannelSegment,
    existing_masks: &[QcMask],
    min_long_gap_samples: f64,
) -> Result<Vec<QcMask>> {
    if !min_long_gap_samples.is_finite() || min_long_gap_samples <= 0.0 {
        return Err(QcError::invalid_argument(format!(
            "min_long_gap_samples must be positive, got {}",
            min_long_gap_samples
        )));
    }
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

    let gaps = segment.gaps();
    let candidates: Vec<(&QcMask, (DateTime<Utc>, DateTime<Utc>), QcMaskType)> = existing_masks
        .iter()
        .filter_map(|mask| {
            let version = mask.current_version();
            match (version.mask_type(), version.interval()) {
                (Some(mask_type), Some(interval)) if mask_type.is_gap() => {
                    Some((mask, interval, mask_type))
                }
                _ => None,
            }
        })
        .collect();

    // gap index -> index into `candidates` of its only overlapping mask
    let mut owner: Vec<Option<usize>> = vec![None; gaps.len()];
    for (gap_index, gap) in gaps.iter().enumerate() {
        let gap_interval = (gap.start_time, gap.end_time);
        let overlapping: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, (_, interval, _))| overlaps(*interval, gap_interval))
            .map(|(index, _)| index)
            .collect();
        match overlapping.as_slice() {
            [] => {}
            [only] => owner[gap_index] = Some(*only),
            [first, second, ..] => {
                return Err(QcError::ReconciliationConflict {
                    channel_id: segment.channel_id().to_string(),
                    detail: format!(
                        "gap [{}, {}] overlaps masks {} and {}",
                        gap.start_time,
                        gap.end_time,
                        candidates[*first].0.id(),
                        candidates[*second].0.id()
                    ),
                });
            }
        }
    }

    let span = (segment.start_time(), segment.end_time());
    let lineage = VersionLineage::from_segment(segment.id());
    let mut updated = Vec::new();
    let mut created = Vec::new();

    for (candidate_index, (mask, interval, stored_type)) in candidates.iter().enumerate() {
        if !overlaps(*interval, span) {
            continue;
        }

        // what is still missing of the mask: unobserved edges plus the gaps it owns
        let mut remainders = Vec::new();
        if interval.0 < span.0 {
            remainders.push(unobserved_content(interval.0, span.0, *stored_type, segment));
        }
        remainders.extend(
            gaps.iter()
                .zip(&owner)
                .filter(|(_, gap_owner)| **gap_owner == Some(candidate_index))
                .map(|(gap, _)| {
                    gap_content(gap, classify_gap(gap.missing_samples, min_long_gap_samples), segment)
                }),
        );
        if interval.1 > span.1 {
            remainders.push(unobserved_content(span.1, interval.1, *stored_type, segment));
        }

        match remainders.split_first() {
            None => {
                let mut rejected = (*mask).clone();
                rejected.reject(
                    format!(
                        "gap [{}, {}] filled by acquired data in channel segment '{}'",
                        interval.0,
                        interval.1,
                        segment.name()
                    ),
                    lineage.clone(),
                )?;
                debug!("Rejected gap mask {} on '{}'", mask.id(), mask.channel_id());
                updated.push(rejected);
            }
            Some((first, rest)) => {
                let unchanged = rest.is_empty()
                    && (first.start_time, first.end_time) == *interval
                    && first.mask_type == *stored_type;
                if unchanged {
                    continue;
                }

                let mut narrowed = (*mask).clone();
                narrowed.add_version(first.clone(), lineage.clone())?;
                debug!(
                    "Gap mask {} on '{}' now spans [{}, {}] ({})",
                    mask.id(),
                    mask.channel_id(),
                    first.start_time,
                    first.end_time,
                    first.mask_type
                );

                let parent = narrowed.current_descriptor();
                for content in rest {
                    let split = QcMask::create(
                        segment.channel_id(),
                        content.clone(),
                        lineage.clone().with_parent(parent),
                    )?;
                    debug!(
                        "Split gap mask {} off {} on '{}' over [{}, {}]",
                        split.id(),
                        mask.id(),
                        mask.channel_id(),
                        content.start_time,
                        content.end_time
                    );
                    created.push(split);
                }
                updated.push(narrowed);
            }
        }
    }

    for (gap, gap_owner) in gaps.iter().zip(&owner) {
        if gap_owner.is_some() {
            continue;
        }
        let mask_type = classify_gap(gap.missing_samples, min_long_gap_samples);
        let mask = QcMask::create(
            segment.channel_id(),
            gap_content(gap, mask_type, segment),
            lineage.clone(),
        )?;
        debug!(
            "New {} mask {} on '{}' over [{}, {}]",
            mask_type,
            mask.id(),
            mask.channel_id(),
            gap.start_time,
            gap.end_time
        );
        created.push(mask);
    }

    created.sort_by_key(|mask| mask.current_version().start_time());
    updated.extend(created);
    Ok(updated)
}
