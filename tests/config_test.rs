// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_seismic_qc::config::Config;
use rust_seismic_qc::signal_detection::StaLtaAlgorithmType;
use std::fs;
use std::sync::Once;
use tempfile::tempdir;

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

#[test]
fn test_missing_config_creates_default() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let config = Config::from_file(&config_path)?;
    assert!(config_path.exists(), "Default config file was not written");
    assert_eq!(config, Config::default());

    // The written file loads back to the same configuration
    assert_eq!(Config::from_file(&config_path)?, config);
    Ok(())
}

#[test]
fn test_partial_config_keeps_defaults() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        r#"
sta_lta:
  algorithm_type: recursive
  trigger_threshold: 6.0
gap_mask:
  min_long_gap_length_samples: 25
"#,
    )?;

    let config = Config::from_file(&config_path)?;
    assert_eq!(config.sta_lta.algorithm_type, StaLtaAlgorithmType::Recursive);
    assert_eq!(config.sta_lta.trigger_threshold, 6.0);
    assert_eq!(config.sta_lta.detrigger_threshold, 2.0);
    assert_eq!(config.gap_mask.min_long_gap_length_samples, 25.0);
    assert_eq!(config.algorithms.len(), 4);

    let plan = config.processing_plan()?;
    assert_eq!(plan.triggers.len(), 1);
    assert_eq!(plan.masks.len(), 3);
    Ok(())
}

#[test]
fn test_schema_violation_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        r#"
spike_mask:
  min_consecutive_sample_difference_spike_threshold: 1.5
"#,
    )?;

    let result = Config::from_file(&config_path);
    assert!(result.is_err(), "Config loading should have failed");

    let sample_path = config_path.with_extension("sample.yaml");
    assert!(sample_path.exists(), "Sample config file was not created");
    assert_eq!(Config::from_file(&sample_path)?, Config::default());
    Ok(())
}

#[test]
fn test_unknown_field_is_rejected() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        r#"
sta_lta:
  trigger_treshold: 3.0
"#,
    )?;

    assert!(Config::from_file(&config_path).is_err());
    Ok(())
}

#[test]
fn test_cross_field_rule_violation_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        r#"
sta_lta:
  trigger_threshold: 3.0
  detrigger_threshold: 4.0
"#,
    )?;

    let error = Config::from_file(&config_path).unwrap_err();
    assert!(error.to_string().contains("detrigger_threshold"));
    assert!(config_path.with_extension("sample.yaml").exists());
    Ok(())
}

#[test]
fn test_unregistered_algorithm_version_is_rejected() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        r#"
algorithms:
  - name: gap_mask
    version: "2.0.0"
"#,
    )?;

    let error = Config::from_file(&config_path).unwrap_err();
    assert!(format!("{:#}", error).contains("no version"));
    Ok(())
}

#[test]
fn test_save_and_reload() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("saved.yaml");

    let mut config = Config::default();
    config.apply_args(Some(5.5), Some(1.5), Some(40.0), Some(2.0));
    config.save_to_file(&config_path)?;

    let reloaded = Config::from_file(&config_path)?;
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.soh.adjacent_threshold_seconds, 2.0);
    Ok(())
}
