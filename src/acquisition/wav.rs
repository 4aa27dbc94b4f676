// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mono WAV recordings as single-waveform channel segments
//!
//! Integer samples are kept as raw counts; float samples are taken as is.
//! WAV headers carry no absolute time, so the first sample time is supplied
//! by the caller.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::info;
use std::path::{Path, PathBuf};

use super::ChannelSegmentSource;
use crate::model::{ChannelSegment, Waveform};

/// Channel segment backed by a mono WAV file
pub struct WavSegmentSource {
    path: PathBuf,
    channel_id: String,
    start_time: DateTime<Utc>,
}

impl WavSegmentSource {
    pub fn new<P: AsRef<Path>>(path: P, channel_id: &str, start_time: DateTime<Utc>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            channel_id: channel_id.to_string(),
            start_time,
        }
    }
}

impl ChannelSegmentSource for WavSegmentSource {
    fn load(&self) -> Result<ChannelSegment> {
        let reader = WavReader::open(&self.path)
            .with_context(|| format!("Failed to open WAV file: {}", self.path.display()))?;
        let spec = reader.spec();
        if spec.channels != 1 {
            return Err(anyhow!(
                "WAV file must be mono (1 channel), got {} channels",
                spec.channels
            ));
        }

        let values: Vec<f64> = match spec.sample_format {
            SampleFormat::Int => reader
                .into_samples::<i32>()
                .map(|sample| sample.map(f64::from))
                .collect::<std::result::Result<_, _>>(),
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|sample| sample.map(f64::from))
                .collect::<std::result::Result<_, _>>(),
        }
        .with_context(|| format!("Failed to read samples from {}", self.path.display()))?;

        info!("Opened WAV file: {}", self.path.display());
        info!("  Sample rate: {} Hz", spec.sample_rate);
        info!("  Bits per sample: {}", spec.bits_per_sample);
        info!("  Sample format: {:?}", spec.sample_format);
        info!("  Samples: {}", values.len());

        let waveform = Waveform::new(self.start_time, f64::from(spec.sample_rate), values)?;
        let name = self
            .path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("wav");
        Ok(ChannelSegment::create(
            self.channel_id.clone(),
            name,
            vec![waveform],
        )?)
    }

    fn describe(&self) -> String {
        format!("WAV {} as '{}'", self.path.display(), self.channel_id)
    }
}

/// Write a waveform as a 32-bit float mono WAV file.
///
/// The sample rate is rounded to whole hertz, the only rate WAV can express.
pub fn write_wav<P: AsRef<Path>>(waveform: &Waveform, path: P) -> Result<()> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate().round() as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for value in waveform.values() {
        writer.write_sample(*value as f32)?;
    }
    writer.finalize()?;
    Ok(())
}
