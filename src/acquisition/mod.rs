// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Data acquisition module
//!
//! This module loads channel segments, SOH readings and stored masks from
//! files. Channel segments come either from JSON documents or from mono WAV
//! recordings; SOH readings and masks are JSON arrays.

pub mod wav;

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::model::{AcquiredChannelSohBoolean, ChannelSegment, QcMask};

pub use wav::WavSegmentSource;

/// A source of channel segments
pub trait ChannelSegmentSource: Send {
    /// Load the channel segment held by this source
    fn load(&self) -> Result<ChannelSegment>;

    /// Human readable origin, used in log and error messages
    fn describe(&self) -> String;
}

/// Channel segment stored as a JSON document
pub struct JsonSegmentSource {
    path: PathBuf,
}

impl JsonSegmentSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ChannelSegmentSource for JsonSegmentSource {
    fn load(&self) -> Result<ChannelSegment> {
        let segment: ChannelSegment = read_json(&self.path)?;
        info!(
            "Loaded channel segment '{}' for '{}' ({} waveform(s)) from {}",
            segment.name(),
            segment.channel_id(),
            segment.waveforms().len(),
            self.path.display()
        );
        Ok(segment)
    }

    fn describe(&self) -> String {
        format!("JSON segment {}", self.path.display())
    }
}

/// Pick a source from the file extension: `.wav` files need a channel id and a start time
pub fn get_segment_source_from_file<P: AsRef<Path>>(
    path: P,
    wav_channel_id: Option<&str>,
    wav_start_time: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<Box<dyn ChannelSegmentSource>> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if !is_wav {
        return Ok(Box::new(JsonSegmentSource::new(path)));
    }

    let channel_id = wav_channel_id
        .ok_or_else(|| anyhow!("WAV input {} needs a channel id", path.display()))?;
    let start_time = wav_start_time
        .ok_or_else(|| anyhow!("WAV input {} needs a start time", path.display()))?;
    Ok(Box::new(WavSegmentSource::new(path, channel_id, start_time)))
}

/// Load boolean SOH readings from a JSON array
pub fn load_soh_samples<P: AsRef<Path>>(path: P) -> Result<Vec<AcquiredChannelSohBoolean>> {
    let path = path.as_ref();
    let samples: Vec<AcquiredChannelSohBoolean> = read_json(path)?;
    if let Some(bad) = samples.iter().find(|s| s.end_time < s.start_time) {
        return Err(anyhow!(
            "SOH sample {} in {} ends before it starts",
            bad.id,
            path.display()
        ));
    }
    debug!("Loaded {} SOH sample(s) from {}", samples.len(), path.display());
    Ok(samples)
}

/// Load stored masks from a JSON array
pub fn load_masks<P: AsRef<Path>>(path: P) -> Result<Vec<QcMask>> {
    let path = path.as_ref();
    let masks: Vec<QcMask> = read_json(path)?;
    debug!("Loaded {} mask(s) from {}", masks.len(), path.display());
    Ok(masks)
}

/// Write any serializable value as pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open input file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))
}
