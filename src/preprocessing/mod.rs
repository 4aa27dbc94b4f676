// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).
//! Signal preprocessing module
//!
//! This module conditions acquired waveforms before detection,
//! interpolating short gaps and merging jittered acquisition runs.

pub mod conditioning;

pub use conditioning::{
    condition, ConditioningParameters, GapInterpolator, WaveformConditioner, WaveformMerger,
};

/// Create the default two-stage conditioner chain: gap interpolation, then merging
pub fn create_conditioner_chain(
    parameters: &ConditioningParameters,
) -> Vec<Box<dyn WaveformConditioner>> {
    vec![
        Box::new(GapInterpolator::new(
            parameters.interpolate_gaps_sample_rate_tolerance,
            parameters.max_interpolated_gap_samples,
        )),
        Box::new(WaveformMerger::new(
            parameters.merge_waveforms_sample_rate_tolerance,
        )),
    ]
}
