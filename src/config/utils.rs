// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use std::collections::HashSet;

use anyhow::{Context, Result};
use log::debug;

use super::Config;

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_seismic_qc --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema_str = include_str!("../../resources/config.schema.json");
    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;
    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;
    println!("{}", formatted_schema);
    Ok(())
}

/// Validates the configuration against rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Hysteresis**: the detrigger threshold may not exceed the trigger threshold
/// - **Spike RMS window**: lead + lag must cover at least two sample differences
/// - **Algorithms**: each algorithm is listed at most once and resolves in the registry
/// - **Typed parameters**: every configured algorithm accepts its parameters
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.sta_lta.detrigger_threshold > config.sta_lta.trigger_threshold {
        anyhow::bail!(
            "sta_lta.detrigger_threshold ({}) exceeds sta_lta.trigger_threshold ({})",
            config.sta_lta.detrigger_threshold,
            config.sta_lta.trigger_threshold
        );
    }

    let rms_window = config
        .spike_mask
        .rms_lead_sample_differences
        .saturating_add(config.spike_mask.rms_lag_sample_differences);
    if rms_window < 2 {
        anyhow::bail!(
            "spike_mask RMS window covers {} sample difference(s), at least 2 are required",
            rms_window
        );
    }

    let mut seen = HashSet::new();
    for algorithm in &config.algorithms {
        if !seen.insert(algorithm.name.as_str()) {
            anyhow::bail!("Algorithm '{}' is listed more than once", algorithm.name);
        }
    }

    config.processing_plan()?;
    Ok(())
}
