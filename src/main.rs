// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the seismic QC pipeline
use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use log::{error, info};
use serde::Serialize;

use rust_seismic_qc::acquisition::{
    get_segment_source_from_file, load_masks, load_soh_samples, write_json,
};
use rust_seismic_qc::config::{self, Config};
use rust_seismic_qc::{process_batch, ChannelInput, ChannelReport};

/// Waveform conditioning, STA/LTA detection and QC masking for seismic channels
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Channel segment inputs: JSON documents or mono WAV files
    #[arg(short, long = "input", value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Channel id for WAV inputs (default: the file stem)
    #[arg(long)]
    wav_channel_id: Option<String>,

    /// Time of the first sample of WAV inputs (RFC 3339)
    #[arg(long)]
    wav_start_time: Option<DateTime<Utc>>,

    /// Stored masks (JSON array), for any channel
    #[arg(long)]
    masks: Option<PathBuf>,

    /// Boolean SOH readings (JSON array), for any channel
    #[arg(long)]
    soh: Option<PathBuf>,

    /// Output file for channel reports (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// STA/LTA trigger threshold
    #[arg(long)]
    trigger_threshold: Option<f64>,

    /// STA/LTA detrigger threshold
    #[arg(long)]
    detrigger_threshold: Option<f64>,

    /// Gap length in samples from which a gap is LONG_GAP
    #[arg(long)]
    min_long_gap_samples: Option<f64>,

    /// Largest hole between SOH readings (seconds) that is not missing data
    #[arg(long)]
    soh_adjacent_threshold: Option<f64>,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

/// One entry of the output document
#[derive(Debug, Serialize)]
struct ChannelOutcome {
    channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ChannelReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = &args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }
        Config::from_file(validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;
    config.apply_args(
        args.trigger_threshold,
        args.detrigger_threshold,
        args.min_long_gap_samples,
        args.soh_adjacent_threshold,
    );
    config::validate_specific_rules(&config)?;
    let plan = config.processing_plan()?;

    if args.inputs.is_empty() {
        anyhow::bail!("No input given, use --input FILE");
    }

    let mut masks_by_channel: HashMap<String, Vec<_>> = HashMap::new();
    if let Some(path) = &args.masks {
        for mask in load_masks(path)? {
            masks_by_channel
                .entry(mask.channel_id().to_string())
                .or_default()
                .push(mask);
        }
    }
    let mut soh_by_channel: HashMap<String, Vec<_>> = HashMap::new();
    if let Some(path) = &args.soh {
        for sample in load_soh_samples(path)? {
            soh_by_channel
                .entry(sample.channel_id.clone())
                .or_default()
                .push(sample);
        }
    }

    let mut inputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string);
        let channel_id = args.wav_channel_id.clone().or(stem);
        let source =
            get_segment_source_from_file(path, channel_id.as_deref(), args.wav_start_time)?;
        let segment = source
            .load()
            .with_context(|| format!("Failed to load {}", source.describe()))?;

        let mut input = ChannelInput::new(segment);
        let channel_id = input.segment.channel_id().to_string();
        input.existing_masks = masks_by_channel.get(&channel_id).cloned().unwrap_or_default();
        input.soh_samples = soh_by_channel.get(&channel_id).cloned().unwrap_or_default();
        inputs.push(input);
    }

    info!("Processing {} channel(s)", inputs.len());
    let outcomes: Vec<ChannelOutcome> = process_batch(&inputs, &plan)
        .into_iter()
        .map(|(channel_id, result)| match result {
            Ok(report) => ChannelOutcome {
                channel_id,
                report: Some(report),
                error: None,
            },
            Err(e) => ChannelOutcome {
                channel_id,
                report: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    if let Some(output_path) = &args.output {
        info!("Saving results to: {}", output_path.display());
        write_json(&outcomes, output_path)?;
    } else {
        for outcome in &outcomes {
            match (&outcome.report, &outcome.error) {
                (Some(report), _) => println!(
                    "{}: {} trigger(s), {} mask(s)",
                    outcome.channel_id,
                    report.triggers.len(),
                    report.masks.len()
                ),
                (None, Some(e)) => println!("{}: failed: {}", outcome.channel_id, e),
                (None, None) => {}
            }
        }
    }

    let failures = outcomes.iter().filter(|o| o.error.is_some()).count();
    if failures > 0 {
        error!("{} of {} channel(s) failed", failures, outcomes.len());
        anyhow::bail!("{} channel(s) failed", failures);
    }
    Ok(())
}
