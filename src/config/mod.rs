// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the seismic QC application
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema before it is deserialized.
//!
//! ## Configuration Structure
//!
//! - `algorithms`: the registered algorithms to run, by name and version
//! - `conditioning`: sample-rate tolerances used before STA/LTA detection
//! - `sta_lta`: STA/LTA window geometry and hysteresis thresholds
//! - `gap_mask`: gap classification
//! - `spike_mask`: spike detection thresholds
//! - `soh`: state-of-health segmentation
//!
//! ## Usage
//!
//! ```no_run
//! use rust_seismic_qc::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some(3.5), // Trigger threshold
//!     None,      // Detrigger threshold
//!     Some(20.0), // Minimum long gap length in samples
//!     None,      // SOH adjacent threshold in seconds
//! );
//!
//! let plan = config.processing_plan().unwrap();
//! println!("{} mask generator(s)", plan.masks.len());
//! ```

pub mod detection;
pub mod masking;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::pipeline::ProcessingPlan;
use crate::qc::{AlgorithmKind, AlgorithmRegistry, QcMaskAlgorithm, TriggerAlgorithm};
use crate::utility::duration_from_seconds;

// Re-export all types for public API
pub use detection::{ConditioningConfig, StaLtaConfig};
pub use masking::{GapMaskConfig, SohConfig, SpikeMaskConfig};
pub use utils::{output_config_schema, validate_specific_rules};

/// Reference to a registered algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmRef {
    pub name: String,
    pub version: String,
}

fn default_algorithms() -> Vec<AlgorithmRef> {
    AlgorithmRegistry::entries()
        .map(|(name, version)| AlgorithmRef {
            name: name.to_string(),
            version: version.to_string(),
        })
        .collect()
}

/// Root configuration structure.
///
/// Every section falls back to its defaults when absent from the file, so a
/// minimal configuration only lists what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Algorithms to run, in order. Defaults to every registered algorithm.
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<AlgorithmRef>,

    #[serde(default)]
    pub conditioning: ConditioningConfig,

    #[serde(default)]
    pub sta_lta: StaLtaConfig,

    #[serde(default)]
    pub gap_mask: GapMaskConfig,

    #[serde(default)]
    pub spike_mask: SpikeMaskConfig,

    #[serde(default)]
    pub soh: SohConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithms: default_algorithms(),
            conditioning: ConditioningConfig::default(),
            sta_lta: StaLtaConfig::default(),
            gap_mask: GapMaskConfig::default(),
            spike_mask: SpikeMaskConfig::default(),
            soh: SohConfig::default(),
        }
    }
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // YAML to a generic value, then JSON for schema validation
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;
        let json_value = serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })?;

        let schema_str = include_str!("../../resources/config.schema.json");
        let schema: serde_json::Value =
            serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only provided values override the loaded configuration.
    ///
    /// # Parameters
    ///
    /// * `trigger_threshold` - STA/LTA trigger threshold
    /// * `detrigger_threshold` - STA/LTA detrigger threshold
    /// * `min_long_gap_length_samples` - Gap length separating repairable from long gaps
    /// * `soh_adjacent_threshold_seconds` - Largest SOH reading hole that is not missing data
    pub fn apply_args(
        &mut self,
        trigger_threshold: Option<f64>,
        detrigger_threshold: Option<f64>,
        min_long_gap_length_samples: Option<f64>,
        soh_adjacent_threshold_seconds: Option<f64>,
    ) {
        if let Some(threshold) = trigger_threshold {
            debug!("Overriding trigger threshold from command line: {}", threshold);
            self.sta_lta.trigger_threshold = threshold;
        }
        if let Some(threshold) = detrigger_threshold {
            debug!("Overriding detrigger threshold from command line: {}", threshold);
            self.sta_lta.detrigger_threshold = threshold;
        }
        if let Some(samples) = min_long_gap_length_samples {
            debug!("Overriding minimum long gap length from command line: {}", samples);
            self.gap_mask.min_long_gap_length_samples = samples;
        }
        if let Some(seconds) = soh_adjacent_threshold_seconds {
            debug!("Overriding SOH adjacent threshold from command line: {}", seconds);
            self.soh.adjacent_threshold_seconds = seconds;
        }
    }

    /// Resolve the configured algorithms and build the typed processing plan.
    ///
    /// # Errors
    ///
    /// Unknown algorithms, or parameters rejected by an algorithm.
    pub fn processing_plan(&self) -> Result<ProcessingPlan> {
        let mut plan = ProcessingPlan {
            triggers: Vec::new(),
            masks: Vec::new(),
            soh_adjacent_threshold: duration_from_seconds(self.soh.adjacent_threshold_seconds),
        };

        for algorithm in &self.algorithms {
            let kind = AlgorithmRegistry::lookup(&algorithm.name, &algorithm.version)?;
            debug!("Configuring {}", kind);
            match kind {
                AlgorithmKind::StaLta => plan.triggers.push(
                    TriggerAlgorithm::sta_lta(self.sta_lta.to_parameters(&self.conditioning))
                        .context("Invalid sta_lta configuration")?,
                ),
                AlgorithmKind::GapMask => plan.masks.push(QcMaskAlgorithm::Gap {
                    min_long_gap_samples: self.gap_mask.min_long_gap_length_samples,
                }),
                AlgorithmKind::SpikeMask => {
                    let parameters = self.spike_mask.to_parameters();
                    parameters
                        .validate()
                        .context("Invalid spike_mask configuration")?;
                    plan.masks.push(QcMaskAlgorithm::Spike(parameters));
                }
                AlgorithmKind::ChannelSohMask => plan.masks.push(QcMaskAlgorithm::ChannelSoh),
            }
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_runs_every_algorithm() {
        let plan = Config::default().processing_plan().unwrap();
        assert_eq!(plan.triggers.len(), 1);
        assert_eq!(plan.masks.len(), 3);
        assert_eq!(plan.soh_adjacent_threshold, chrono::Duration::seconds(1));
    }

    #[test]
    fn test_unknown_algorithm_fails_plan() {
        let mut config = Config::default();
        config.algorithms.push(AlgorithmRef {
            name: "sta_lta".to_string(),
            version: "9.9.9".to_string(),
        });
        assert!(config.processing_plan().is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args(Some(6.0), Some(3.0), None, Some(0.25));
        assert_eq!(config.sta_lta.trigger_threshold, 6.0);
        assert_eq!(config.sta_lta.detrigger_threshold, 3.0);
        assert_eq!(config.gap_mask.min_long_gap_length_samples, 10.0);
        assert_eq!(config.soh.adjacent_threshold_seconds, 0.25);
    }
}
