// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use rust_seismic_qc::model::{MaskContent, QcMaskVersionDescriptor, VersionLineage};
use rust_seismic_qc::{
    generate_gap_masks, ChannelSegment, QcError, QcMask, QcMaskCategory, QcMaskType, Waveform,
};
use std::sync::Once;

static INIT: Once = Once::new();

// Setup logger for tests
fn setup() {
    INIT.call_once(|| {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

const CHANNEL: &str = "STA.BHZ";
const MIN_LONG_GAP: f64 = 10.0;

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

/// One-sample-per-second runs given as (first sample second, sample count)
fn segment(name: &str, runs: &[(i64, usize)]) -> Result<ChannelSegment> {
    let waveforms = runs
        .iter()
        .map(|(start, count)| Waveform::new(at(*start), 1.0, vec![0.5; *count]))
        .collect::<rust_seismic_qc::Result<Vec<_>>>()?;
    Ok(ChannelSegment::create(CHANNEL, name, waveforms)?)
}

fn span(mask: &QcMask) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    mask.current_version().interval()
}

#[test]
fn test_refill_rejects_and_keeps_remaining_gap() -> Result<()> {
    setup();
    // samples 10..=14 missing (repairable), 20..=39 missing (long)
    let first_run = segment("first", &[(0, 10), (15, 5), (40, 10)])?;
    let created = generate_gap_masks(&first_run, &[], MIN_LONG_GAP)?;
    assert_eq!(created.len(), 2);
    assert_eq!(span(&created[0]), Some((at(9), at(15))));
    assert_eq!(created[0].current_version().mask_type(), Some(QcMaskType::RepairableGap));
    assert_eq!(span(&created[1]), Some((at(19), at(40))));
    assert_eq!(created[1].current_version().mask_type(), Some(QcMaskType::LongGap));
    assert!(created
        .iter()
        .all(|mask| mask.current_version().category() == QcMaskCategory::WaveformQuality));

    // late data fills the repairable gap
    let refilled = segment("refilled", &[(0, 20), (40, 10)])?;
    let updates = generate_gap_masks(&refilled, &created, MIN_LONG_GAP)?;
    assert_eq!(updates.len(), 1);
    let rejected = &updates[0];
    assert_eq!(rejected.id(), created[0].id());
    assert!(rejected.is_rejected());
    assert_eq!(rejected.current_version().version(), 1);
    assert_eq!(rejected.current_version().channel_segment_ids(), &[refilled.id()]);
    Ok(())
}

#[test]
fn test_mask_ids_are_stable_across_runs() -> Result<()> {
    setup();
    let one = generate_gap_masks(&segment("a", &[(0, 10), (30, 10)])?, &[], MIN_LONG_GAP)?;
    let two = generate_gap_masks(&segment("b", &[(0, 10), (30, 10)])?, &[], MIN_LONG_GAP)?;
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].id(), two[0].id());
    Ok(())
}

#[test]
fn test_split_gap_records_lineage() -> Result<()> {
    setup();
    let stored = QcMask::create(
        CHANNEL,
        MaskContent::new(
            QcMaskCategory::WaveformQuality,
            QcMaskType::LongGap,
            "earlier outage",
            at(9),
            at(30),
        ),
        VersionLineage::default(),
    )?;
    // data arrived for 15..=19, leaving 10..=14 and 20..=29 missing
    let partial = segment("partial", &[(0, 10), (15, 5), (30, 10)])?;

    let updates = generate_gap_masks(&partial, std::slice::from_ref(&stored), MIN_LONG_GAP)?;
    assert_eq!(updates.len(), 2);

    let narrowed = &updates[0];
    assert_eq!(narrowed.id(), stored.id());
    assert_eq!(narrowed.versions().len(), 2);
    assert_eq!(span(narrowed), Some((at(9), at(15))));
    assert_eq!(narrowed.current_version().mask_type(), Some(QcMaskType::RepairableGap));

    let split = &updates[1];
    assert_ne!(split.id(), stored.id());
    assert_eq!(span(split), Some((at(19), at(30))));
    assert_eq!(split.current_version().mask_type(), Some(QcMaskType::LongGap));
    assert_eq!(
        split.current_version().parent_qc_masks(),
        &[QcMaskVersionDescriptor {
            qc_mask_id: stored.id(),
            version: 1
        }]
    );
    Ok(())
}

#[test]
fn test_overlapping_stored_masks_conflict() -> Result<()> {
    setup();
    let content = |start, end| {
        MaskContent::new(
            QcMaskCategory::WaveformQuality,
            QcMaskType::LongGap,
            "",
            at(start),
            at(end),
        )
    };
    let stored = vec![
        QcMask::create(CHANNEL, content(9, 20), VersionLineage::default())?,
        QcMask::create(CHANNEL, content(18, 30), VersionLineage::default())?,
    ];
    let result = generate_gap_masks(&segment("c", &[(0, 10), (30, 5)])?, &stored, MIN_LONG_GAP);
    assert!(matches!(
        result,
        Err(QcError::ReconciliationConflict { ref channel_id, .. }) if channel_id == CHANNEL
    ));
    Ok(())
}
