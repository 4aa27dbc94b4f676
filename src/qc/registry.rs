// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Closed registry of the detection and masking algorithms
//!
//! Algorithms are addressed by `(name, version)` pairs in configuration. The
//! set is fixed at compile time: [`AlgorithmRegistry::lookup`] resolves a pair
//! to an [`AlgorithmKind`], and the configured parameters turn that kind into
//! a runnable [`TriggerAlgorithm`] or [`QcMaskAlgorithm`].

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{QcError, Result};
use crate::model::{ChannelSegment, ChannelSohStatusSegment, QcMask};
use crate::qc::gap_mask::generate_gap_masks;
use crate::qc::soh_mask::generate_soh_masks;
use crate::qc::spike_mask::{generate_spike_masks, SpikeMaskParameters};
use crate::signal_detection::{StaLtaDetector, StaLtaParameters, TriggerReport};

/// Every algorithm the registry knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlgorithmKind {
    StaLta,
    GapMask,
    SpikeMask,
    ChannelSohMask,
}

impl AlgorithmKind {
    pub fn is_trigger(&self) -> bool {
        matches!(self, AlgorithmKind::StaLta)
    }
}

/// Registered `(name, version, kind)` entries
const ENTRIES: &[(&str, &str, AlgorithmKind)] = &[
    ("sta_lta", "1.0.0", AlgorithmKind::StaLta),
    ("gap_mask", "1.0.0", AlgorithmKind::GapMask),
    ("spike_mask", "1.0.0", AlgorithmKind::SpikeMask),
    ("channel_soh_mask", "1.0.0", AlgorithmKind::ChannelSohMask),
];

/// Static name/version lookup
pub struct AlgorithmRegistry;

impl AlgorithmRegistry {
    /// Resolve a configured algorithm.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidArgument`] for an unknown name, or a known name with
    /// an unregistered version.
    pub fn lookup(name: &str, version: &str) -> Result<AlgorithmKind> {
        let mut versions = ENTRIES.iter().filter(|(entry, _, _)| *entry == name).peekable();
        if versions.peek().is_none() {
            return Err(QcError::invalid_argument(format!(
                "unknown algorithm '{}'",
                name
            )));
        }
        versions
            .find(|(_, entry_version, _)| *entry_version == version)
            .map(|(_, _, kind)| *kind)
            .ok_or_else(|| {
                QcError::invalid_argument(format!(
                    "algorithm '{}' has no version '{}'",
                    name, version
                ))
            })
    }

    /// `(name, version)` of every registered algorithm
    pub fn entries() -> impl Iterator<Item = (&'static str, &'static str)> {
        ENTRIES.iter().map(|(name, version, _)| (*name, *version))
    }

    /// Registered `(name, version)` of `kind`
    pub fn name_of(kind: AlgorithmKind) -> (&'static str, &'static str) {
        ENTRIES
            .iter()
            .find(|(_, _, entry)| *entry == kind)
            .map(|(name, version, _)| (*name, *version))
            .unwrap_or(("unregistered", "0.0.0"))
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, version) = AlgorithmRegistry::name_of(*self);
        write!(f, "{} v{}", name, version)
    }
}

/// A configured onset detector
#[derive(Debug, Clone)]
pub enum TriggerAlgorithm {
    StaLta(StaLtaDetector),
}

impl TriggerAlgorithm {
    pub fn sta_lta(parameters: StaLtaParameters) -> Result<Self> {
        Ok(TriggerAlgorithm::StaLta(StaLtaDetector::new(parameters)?))
    }

    pub fn kind(&self) -> AlgorithmKind {
        match self {
            TriggerAlgorithm::StaLta(_) => AlgorithmKind::StaLta,
        }
    }

    pub fn detect(&self, segment: &ChannelSegment) -> Result<TriggerReport> {
        match self {
            TriggerAlgorithm::StaLta(detector) => detector.detect(segment),
        }
    }

    pub fn triggers(&self, segment: &ChannelSegment) -> Result<BTreeSet<DateTime<Utc>>> {
        Ok(self.detect(segment)?.triggers)
    }
}

/// A configured mask generator
#[derive(Debug, Clone, PartialEq)]
pub enum QcMaskAlgorithm {
    Gap { min_long_gap_samples: f64 },
    Spike(SpikeMaskParameters),
    ChannelSoh,
}

impl QcMaskAlgorithm {
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            QcMaskAlgorithm::Gap { .. } => AlgorithmKind::GapMask,
            QcMaskAlgorithm::Spike(_) => AlgorithmKind::SpikeMask,
            QcMaskAlgorithm::ChannelSoh => AlgorithmKind::ChannelSohMask,
        }
    }

    /// Run the generator; the SOH generator ignores `segment` and the others ignore `status`.
    pub fn generate(
        &self,
        segment: &ChannelSegment,
        status: &[ChannelSohStatusSegment],
        existing_masks: &[QcMask],
    ) -> Result<Vec<QcMask>> {
        match self {
            QcMaskAlgorithm::Gap {
                min_long_gap_samples,
            } => generate_gap_masks(segment, existing_masks, *min_long_gap_samples),
            QcMaskAlgorithm::Spike(parameters) => {
                generate_spike_masks(segment, existing_masks, parameters)
            }
            QcMaskAlgorithm::ChannelSoh => {
                let mut masks = Vec::new();
                for indicator in status {
                    masks.extend(generate_soh_masks(indicator, existing_masks)?);
                }
                Ok(masks)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_algorithms() {
        assert_eq!(
            AlgorithmRegistry::lookup("sta_lta", "1.0.0"),
            Ok(AlgorithmKind::StaLta)
        );
        assert_eq!(
            AlgorithmRegistry::lookup("spike_mask", "1.0.0"),
            Ok(AlgorithmKind::SpikeMask)
        );
        assert_eq!(AlgorithmRegistry::entries().count(), 4);
    }

    #[test]
    fn test_lookup_unknown_name_or_version() {
        assert!(matches!(
            AlgorithmRegistry::lookup("beamformer", "1.0.0"),
            Err(QcError::InvalidArgument(msg)) if msg.contains("unknown algorithm")
        ));
        assert!(matches!(
            AlgorithmRegistry::lookup("gap_mask", "2.0.0"),
            Err(QcError::InvalidArgument(msg)) if msg.contains("no version")
        ));
    }

    #[test]
    fn test_kind_display_and_roles() {
        assert_eq!(AlgorithmKind::GapMask.to_string(), "gap_mask v1.0.0");
        assert!(AlgorithmKind::StaLta.is_trigger());
        assert!(!AlgorithmKind::ChannelSohMask.is_trigger());
        assert_eq!(
            QcMaskAlgorithm::Spike(SpikeMaskParameters::default()).kind(),
            AlgorithmKind::SpikeMask
        );
    }
}
