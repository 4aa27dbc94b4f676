// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error types shared by the conditioning, detection and masking algorithms.
//!
//! Running out of samples for an analysis window is not an error here: the
//! detector reports it as [`crate::signal_detection::WaveformOutcome::InsufficientData`]
//! and carries on with the next waveform.

use thiserror::Error;

/// Errors raised by the QC core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QcError {
    /// Malformed or out-of-range configuration, or inputs that should agree but don't.
    /// Always raised before any algorithm runs.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A value violated a model invariant at construction time
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Stored masks overlap a new detection in a way reconciliation does not define
    #[error("Reconciliation conflict on channel '{channel_id}': {detail}")]
    ReconciliationConflict { channel_id: String, detail: String },
}

impl QcError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        QcError::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_data(msg: impl Into<String>) -> Self {
        QcError::InvalidData(msg.into())
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, QcError>;
