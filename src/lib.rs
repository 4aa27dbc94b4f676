// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust seismic QC library
//!
//! This library conditions continuous waveform data, detects onsets with an
//! STA/LTA trigger and maintains versioned data-quality masks for gaps,
//! spikes and state-of-health problems.
//!
//! ## Modules
//!
//! - [`model`]: waveforms, channel segments, SOH readings and QC masks
//! - [`preprocessing`]: gap interpolation and waveform merging
//! - [`soh`]: condensing boolean SOH readings into status segments
//! - [`signal_detection`]: STA/LTA trigger detection
//! - [`qc`]: gap, spike and SOH mask generators and the algorithm registry
//! - [`pipeline`]: per-channel orchestration and parallel batches
//! - [`acquisition`]: JSON and WAV file sources
//! - [`config`]: YAML configuration with schema validation
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use rust_seismic_qc::{generate_spike_masks, ChannelSegment, SpikeMaskParameters, Waveform};
//!
//! let values = vec![1., 1., 1., 1., 1., 1., 1., 1., 5., 5., -5., -5., 1., 1., 1., 1.];
//! let waveform = Waveform::new(Utc.timestamp_opt(0, 0).unwrap(), 2.0, values).unwrap();
//! let segment = ChannelSegment::create("STA.BHZ", "example", vec![waveform]).unwrap();
//!
//! let parameters = SpikeMaskParameters {
//!     min_consecutive_sample_difference_spike_threshold: 0.5,
//!     rms_amplitude_ratio_threshold: 2.0,
//!     rms_lead_sample_differences: 2,
//!     rms_lag_sample_differences: 2,
//! };
//! let masks = generate_spike_masks(&segment, &[], &parameters).unwrap();
//! assert_eq!(masks.len(), 1);
//! ```

pub mod acquisition;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod preprocessing;
pub mod qc;
pub mod signal_detection;
pub mod soh;
pub mod utility;

pub use error::{QcError, Result};
pub use model::{
    AcquiredChannelSohBoolean, AcquiredChannelSohType, ChannelSegment, ChannelSohStatusSegment,
    QcMask, QcMaskCategory, QcMaskType, QcMaskVersion, StatusBit, Waveform,
};
pub use pipeline::{process_batch, process_channel, ChannelInput, ChannelReport, ProcessingPlan};
pub use preprocessing::{condition, ConditioningParameters};
pub use qc::{generate_gap_masks, generate_soh_masks, generate_spike_masks, SpikeMaskParameters};
pub use signal_detection::{detect_triggers, StaLtaParameters};
pub use soh::segment_status;
