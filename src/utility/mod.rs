// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Utility module for common utilities used throughout the project

pub mod sample_conversion;
pub mod signal_generator;

// Re-exports for use in other modules
pub use sample_conversion::{duration_from_seconds, fractional_samples, samples};
pub use signal_generator::SignalGenerator;
