// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Data-quality mask generators
//!
//! All generators are pure: they read the stored masks they are given and
//! return only the masks they created or appended a version to. Persisting
//! the result is up to the caller.

pub mod gap_mask;
pub mod registry;
pub mod soh_mask;
pub mod spike_mask;

pub use gap_mask::{classify_gap, generate_gap_masks};
pub use registry::{AlgorithmKind, AlgorithmRegistry, QcMaskAlgorithm, TriggerAlgorithm};
pub use soh_mask::{generate_soh_masks, problem_status, soh_mask_type};
pub use spike_mask::{find_spikes, generate_spike_masks, SpikeMaskParameters};
