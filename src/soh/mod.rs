// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! State-of-health status segmentation

pub mod segmenter;

pub use segmenter::{segment_all, segment_status};
