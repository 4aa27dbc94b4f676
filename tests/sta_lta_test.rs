// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_seismic_qc::signal_detection::{
    detect_triggers, StaLtaAlgorithmType, StaLtaDetector, StaLtaParameters,
};
use rust_seismic_qc::utility::SignalGenerator;
use rust_seismic_qc::{ChannelSegment, QcError, Waveform};
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

const SAMPLE_RATE: f64 = 20.0;

fn at_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::milliseconds(millis)
}

/// 60 s of low noise with an impulsive onset at 40 s
fn noisy_onset(seed: u32) -> Vec<f64> {
    let mut generator = SignalGenerator::new(seed);
    let mut values = generator.gaussian_noise(1200, 0.05);
    SignalGenerator::add_onset(&mut values, 800, SAMPLE_RATE, 5.0, 2.0, 2.0);
    values
}

#[test]
fn test_onset_in_noise_triggers_once() -> Result<()> {
    setup();
    let waveform = Waveform::new(at_millis(0), SAMPLE_RATE, noisy_onset(42))?;
    let segment = ChannelSegment::create("STA.BHZ", "onset", vec![waveform])?;

    let triggers = detect_triggers(&segment, &StaLtaParameters::default())?;
    assert_eq!(triggers.len(), 1, "triggers: {:?}", triggers);
    let trigger = *triggers.iter().next().unwrap();
    assert!(trigger >= at_millis(40_000) && trigger <= at_millis(41_000));
    Ok(())
}

#[test]
fn test_recursive_detector_finds_same_onset() -> Result<()> {
    setup();
    let waveform = Waveform::new(at_millis(0), SAMPLE_RATE, noisy_onset(7))?;
    let segment = ChannelSegment::create("STA.BHZ", "onset", vec![waveform])?;
    let parameters = StaLtaParameters {
        algorithm_type: StaLtaAlgorithmType::Recursive,
        ..StaLtaParameters::default()
    };

    let triggers = detect_triggers(&segment, &parameters)?;
    assert_eq!(triggers.len(), 1, "triggers: {:?}", triggers);
    let trigger = *triggers.iter().next().unwrap();
    assert!(trigger >= at_millis(40_000) && trigger <= at_millis(41_000));
    Ok(())
}

#[test]
fn test_short_gap_is_conditioned_before_detection() -> Result<()> {
    setup();
    let values = noisy_onset(42);
    // drop samples 400..403 (20.00 s to 20.10 s)
    let segment = ChannelSegment::create(
        "STA.BHZ",
        "gappy",
        vec![
            Waveform::new(at_millis(0), SAMPLE_RATE, values[..400].to_vec())?,
            Waveform::new(at_millis(20_150), SAMPLE_RATE, values[403..].to_vec())?,
        ],
    )?;

    let detector = StaLtaDetector::new(StaLtaParameters::default())?;
    let report = detector.detect(&segment)?;
    assert_eq!(report.waveforms_analyzed, 1);
    assert_eq!(report.waveforms_with_insufficient_data, 0);
    assert_eq!(report.triggers.len(), 1);
    Ok(())
}

#[test]
fn test_background_noise_does_not_trigger() -> Result<()> {
    setup();
    let mut generator = SignalGenerator::new(1234);
    let waveform = Waveform::new(at_millis(0), SAMPLE_RATE, generator.gaussian_noise(1200, 0.05))?;
    let segment = ChannelSegment::create("STA.BHZ", "quiet", vec![waveform])?;

    assert!(detect_triggers(&segment, &StaLtaParameters::default())?.is_empty());
    Ok(())
}

#[test]
fn test_too_short_segment_yields_no_triggers() -> Result<()> {
    setup();
    // 5 s of data cannot hold the 11 s LTA span
    let waveform = Waveform::new(at_millis(0), SAMPLE_RATE, noisy_onset(3)[790..890].to_vec())?;
    let segment = ChannelSegment::create("STA.BHZ", "short", vec![waveform])?;

    let report = StaLtaDetector::new(StaLtaParameters::default())?.detect(&segment)?;
    assert!(report.triggers.is_empty());
    assert_eq!(report.waveforms_with_insufficient_data, 1);
    Ok(())
}

#[test]
fn test_invalid_thresholds_are_rejected() {
    let parameters = StaLtaParameters {
        trigger_threshold: 2.0,
        detrigger_threshold: 3.0,
        ..StaLtaParameters::default()
    };
    let waveform = Waveform::new(at_millis(0), SAMPLE_RATE, vec![0.0; 10]).unwrap();
    let segment = ChannelSegment::create("STA.BHZ", "bad", vec![waveform]).unwrap();
    assert!(matches!(
        detect_triggers(&segment, &parameters),
        Err(QcError::InvalidArgument(_))
    ));
}
