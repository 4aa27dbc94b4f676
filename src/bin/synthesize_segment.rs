// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Synthetic channel segment generator for testing the QC pipeline
// Writes Gaussian background noise with optional onset, spikes and gaps

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

use rust_seismic_qc::acquisition::{wav::write_wav, write_json};
use rust_seismic_qc::utility::sample_conversion::duration_of_samples;
use rust_seismic_qc::utility::SignalGenerator;
use rust_seismic_qc::{ChannelSegment, Waveform};

/// Synthetic channel segment generator
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output file path (.json for a channel segment, .wav for a single run)
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Channel id of the segment
    #[arg(short, long, default_value = "SYN.BHZ")]
    channel_id: String,

    /// Time of the first sample (RFC 3339)
    #[arg(long, default_value = "2025-01-01T00:00:00Z")]
    start_time: DateTime<Utc>,

    /// Duration in seconds
    #[arg(short, long, default_value_t = 120.0)]
    duration: f64,

    /// Sample rate in Hz
    #[arg(short, long, default_value_t = 40.0)]
    sample_rate: f64,

    /// Standard deviation of the background noise
    #[arg(short = 'n', long, default_value_t = 0.1)]
    noise: f64,

    /// Seed of the noise generator (default: system time)
    #[arg(long)]
    seed: Option<u32>,

    /// Onset time in seconds from the start
    #[arg(long)]
    onset_at: Option<f64>,

    /// Peak amplitude of the onset
    #[arg(long, default_value_t = 5.0)]
    onset_amplitude: f64,

    /// Dominant frequency of the onset in Hz
    #[arg(long, default_value_t = 2.0)]
    onset_frequency: f64,

    /// Spike times in seconds from the start (repeatable)
    #[arg(long = "spike-at")]
    spikes: Vec<f64>,

    /// Offset added to the two spike samples
    #[arg(long, default_value_t = 20.0)]
    spike_offset: f64,

    /// Gaps as START:LENGTH in seconds from the start (repeatable)
    #[arg(long = "gap", value_parser = parse_gap)]
    gaps: Vec<(f64, f64)>,
}

fn parse_gap(value: &str) -> std::result::Result<(f64, f64), String> {
    let (start, length) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:LENGTH, got '{}'", value))?;
    let start: f64 = start.trim().parse().map_err(|e| format!("bad gap start: {}", e))?;
    let length: f64 = length.trim().parse().map_err(|e| format!("bad gap length: {}", e))?;
    if start < 0.0 || length <= 0.0 {
        return Err(format!("gap '{}' must start at or after 0 and have a positive length", value));
    }
    Ok((start, length))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.sample_rate <= 0.0 || args.duration <= 0.0 {
        return Err(anyhow!("Sample rate and duration must be positive"));
    }

    let sample_count = (args.duration * args.sample_rate).round() as usize;
    let to_index = |seconds: f64| (seconds * args.sample_rate).round() as usize;

    let mut generator = match args.seed {
        Some(seed) => SignalGenerator::new(seed),
        None => SignalGenerator::new_from_system_time(),
    };
    let mut values = generator.gaussian_noise(sample_count, args.noise);

    if let Some(onset) = args.onset_at {
        SignalGenerator::add_onset(
            &mut values,
            to_index(onset),
            args.sample_rate,
            args.onset_amplitude,
            args.onset_frequency,
            2.0,
        );
    }
    for spike in &args.spikes {
        SignalGenerator::add_step_spike(&mut values, to_index(*spike), 2, args.spike_offset);
    }

    // keep[i] is false for samples dropped by a gap
    let mut keep = vec![true; sample_count];
    for (start, length) in &args.gaps {
        let first = to_index(*start).min(sample_count);
        let last = to_index(start + length).min(sample_count);
        keep[first..last].iter_mut().for_each(|k| *k = false);
    }

    let mut waveforms = Vec::new();
    let mut index = 0;
    while index < sample_count {
        if !keep[index] {
            index += 1;
            continue;
        }
        let run_start = index;
        while index < sample_count && keep[index] {
            index += 1;
        }
        waveforms.push(Waveform::new(
            args.start_time + duration_of_samples(args.sample_rate, run_start as f64),
            args.sample_rate,
            values[run_start..index].to_vec(),
        )?);
    }

    let segment = ChannelSegment::create(args.channel_id.clone(), "synthetic", waveforms)?;
    println!(
        "Generated {} waveform(s) for {} at {} Hz",
        segment.waveforms().len(),
        segment.channel_id(),
        args.sample_rate
    );

    let is_wav = args
        .output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if is_wav {
        match segment.waveforms() {
            [single] => write_wav(single, &args.output)?,
            _ => return Err(anyhow!("WAV output cannot hold gaps, use a .json output")),
        }
    } else {
        write_json(&segment, &args.output)?;
    }

    println!("Channel segment saved to: {}", args.output.display());
    Ok(())
}
