// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Time-ordered waveform runs for a single channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::waveform::Waveform;
use crate::error::{QcError, Result};

/// A temporal gap between two consecutive waveforms of a segment.
///
/// The gap runs from the last sample of the earlier waveform to the first
/// sample of the later one; `missing_samples` is measured at the earlier
/// waveform's sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformGap {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub missing_samples: f64,
    pub sample_rate: f64,
}

/// An ordered sequence of waveforms acquired on one channel.
///
/// Waveforms are sorted by start time and never overlap; gaps between them
/// are allowed. A segment always holds at least one waveform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChannelSegmentRecord")]
pub struct ChannelSegment {
    id: Uuid,
    channel_id: String,
    name: String,
    waveforms: Vec<Waveform>,
}

#[derive(Deserialize)]
struct ChannelSegmentRecord {
    id: Uuid,
    channel_id: String,
    #[serde(default)]
    name: String,
    waveforms: Vec<Waveform>,
}

impl TryFrom<ChannelSegmentRecord> for ChannelSegment {
    type Error = QcError;

    fn try_from(record: ChannelSegmentRecord) -> Result<Self> {
        ChannelSegment::new(record.id, record.channel_id, record.name, record.waveforms)
    }
}

impl ChannelSegment {
    /// Create a channel segment, checking ordering and overlap of its waveforms.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidData`] when `waveforms` is empty, unsorted, or contains
    /// overlapping runs, or when `channel_id` is blank.
    pub fn new(
        id: Uuid,
        channel_id: impl Into<String>,
        name: impl Into<String>,
        waveforms: Vec<Waveform>,
    ) -> Result<Self> {
        let channel_id = channel_id.into();
        if channel_id.trim().is_empty() {
            return Err(QcError::invalid_data("channel segment requires a channel id"));
        }
        if waveforms.is_empty() {
            return Err(QcError::invalid_data(format!(
                "channel segment for '{}' contains no waveforms",
                channel_id
            )));
        }
        for pair in waveforms.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if next.start_time() <= previous.end_time() {
                return Err(QcError::invalid_data(format!(
                    "waveforms of channel '{}' overlap or are unsorted: {} starts before {} ends",
                    channel_id,
                    next.start_time(),
                    previous.end_time()
                )));
            }
        }
        Ok(Self {
            id,
            channel_id,
            name: name.into(),
            waveforms,
        })
    }

    /// Create a segment with a freshly generated id
    pub fn create(
        channel_id: impl Into<String>,
        name: impl Into<String>,
        waveforms: Vec<Waveform>,
    ) -> Result<Self> {
        Self::new(Uuid::new_v4(), channel_id, name, waveforms)
    }

    /// Same segment identity with a different waveform list
    pub fn with_waveforms(&self, waveforms: Vec<Waveform>) -> Result<Self> {
        Self::new(self.id, self.channel_id.clone(), self.name.clone(), waveforms)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waveforms(&self) -> &[Waveform] {
        &self.waveforms
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.waveforms[0].start_time()
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.waveforms[self.waveforms.len() - 1].end_time()
    }

    /// Sample rate of the first waveform, used where one rate stands for the whole segment
    pub fn nominal_sample_rate(&self) -> f64 {
        self.waveforms[0].sample_rate()
    }

    /// Gaps of at least one missing sample between consecutive waveforms.
    ///
    /// Sub-sample timing jitter between acquisition runs is not a gap.
    pub fn gaps(&self) -> Vec<WaveformGap> {
        self.waveforms
            .windows(2)
            .filter_map(|pair| {
                let missing_samples = pair[0].missing_samples_before(&pair[1]);
                (missing_samples >= 1.0).then(|| WaveformGap {
                    start_time: pair[0].end_time(),
                    end_time: pair[1].start_time(),
                    missing_samples,
                    sample_rate: pair[0].sample_rate(),
                })
            })
            .collect()
    }
}
