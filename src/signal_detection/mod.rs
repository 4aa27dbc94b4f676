// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Onset detection over conditioned channel segments

pub mod sta_lta;

pub use sta_lta::{
    detect_triggers, HysteresisTrigger, StaLtaAlgorithmType, StaLtaDetector, StaLtaParameters,
    TriggerReport, TriggerState, WaveformOutcome, WaveformTransformation,
};
