// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Data model shared by the conditioning, detection and masking algorithms
//!
//! - [`Waveform`]: one evenly sampled run of samples
//! - [`ChannelSegment`]: the ordered waveforms of one channel over a time span
//! - [`AcquiredChannelSohBoolean`] / [`ChannelSohStatusSegment`]: raw and condensed state of health
//! - [`QcMask`]: versioned data-quality annotations

pub mod channel_segment;
pub mod qc_mask;
pub mod soh;
pub mod waveform;

pub use channel_segment::{ChannelSegment, WaveformGap};
pub use qc_mask::{
    MaskContent, QcMask, QcMaskCategory, QcMaskType, QcMaskVersion, QcMaskVersionDescriptor,
    VersionLineage,
};
pub use soh::{
    AcquiredChannelSohBoolean, AcquiredChannelSohType, ChannelSohStatusSegment, SohStatusSegment,
    StatusBit,
};
pub use waveform::Waveform;
