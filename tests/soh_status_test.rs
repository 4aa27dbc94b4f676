// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_seismic_qc::{
    generate_soh_masks, segment_status, AcquiredChannelSohBoolean, AcquiredChannelSohType,
    QcMaskCategory, QcMaskType, StatusBit,
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

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

/// Ten-second readings, one per status value
fn readings(soh_type: AcquiredChannelSohType, statuses: &[bool]) -> Vec<AcquiredChannelSohBoolean> {
    statuses
        .iter()
        .enumerate()
        .map(|(index, status)| {
            let start = index as i64 * 10;
            AcquiredChannelSohBoolean::new(CHANNEL, soh_type, at(start), at(start + 10), *status)
                .unwrap()
        })
        .collect()
}

#[test]
fn test_dead_sensor_readings_become_sensor_masks() -> Result<()> {
    setup();
    let samples = readings(
        AcquiredChannelSohType::DeadSensorChannel,
        &[false, false, true, true, false, true],
    );
    let status = segment_status(&samples, Duration::seconds(1))?;
    let summary: Vec<_> = status
        .status_segments()
        .iter()
        .map(|s| (s.start_time(), s.end_time(), s.status()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (at(0), at(20), StatusBit::Unset),
            (at(20), at(40), StatusBit::Set),
            (at(40), at(50), StatusBit::Unset),
            (at(50), at(60), StatusBit::Set),
        ]
    );

    let masks = generate_soh_masks(&status, &[])?;
    assert_eq!(masks.len(), 2);
    for mask in &masks {
        assert_eq!(mask.current_version().category(), QcMaskCategory::StationSoh);
        assert_eq!(mask.current_version().mask_type(), Some(QcMaskType::SensorProblem));
    }
    assert_eq!(masks[0].current_version().interval(), Some((at(20), at(40))));
    assert_eq!(masks[1].current_version().interval(), Some((at(50), at(60))));

    // a second pass over the same status adds nothing
    assert!(generate_soh_masks(&status, &masks)?.is_empty());
    Ok(())
}

#[test]
fn test_unlocked_clock_becomes_timing_mask() -> Result<()> {
    setup();
    let samples = readings(AcquiredChannelSohType::ClockLocked, &[true, false, true]);
    let status = segment_status(&samples, Duration::seconds(1))?;

    let masks = generate_soh_masks(&status, &[])?;
    assert_eq!(masks.len(), 1);
    assert_eq!(masks[0].current_version().mask_type(), Some(QcMaskType::Timing));
    assert_eq!(masks[0].current_version().interval(), Some((at(10), at(20))));
    Ok(())
}

#[test]
fn test_missing_readings_do_not_raise_masks() -> Result<()> {
    setup();
    let mut samples = readings(AcquiredChannelSohType::VaultDoorOpened, &[false]);
    samples.push(AcquiredChannelSohBoolean::new(
        CHANNEL,
        AcquiredChannelSohType::VaultDoorOpened,
        at(100),
        at(110),
        false,
    )?);
    let status = segment_status(&samples, Duration::seconds(5))?;
    assert_eq!(status.status_segments().len(), 3);
    assert_eq!(status.status_segments()[1].status(), StatusBit::Missing);
    assert!(generate_soh_masks(&status, &[])?.is_empty());
    Ok(())
}
