// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Versioned data-quality masks
//!
//! A [`QcMask`] owns an append-only history of [`QcMaskVersion`] records. The
//! history is an arena addressed by version number: version `n` lives at index
//! `n`, versions are only ever pushed, and nothing hands out mutable access to
//! a stored version. Corrections, including rejection, are new versions.
//!
//! Mask ids are name-based UUIDs derived from the channel, type and interval
//! of the first version, so running the generators twice over the same data
//! yields the same ids.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{QcError, Result};

/// Namespace for deterministic mask ids
const QC_MASK_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_43d5_4b0f_9a7e_5d2c_c0de_a11a);

/// Broad category of a mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcMaskCategory {
    AnalystDefined,
    ChannelProcessing,
    DataAuthentication,
    Rejected,
    StationSoh,
    WaveformQuality,
}

/// Specific data-quality condition a mask describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcMaskType {
    RepairableGap,
    LongGap,
    Spike,
    SensorProblem,
    StationProblem,
    Calibration,
    StationSecurity,
    Timing,
}

impl QcMaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QcMaskType::RepairableGap => "REPAIRABLE_GAP",
            QcMaskType::LongGap => "LONG_GAP",
            QcMaskType::Spike => "SPIKE",
            QcMaskType::SensorProblem => "SENSOR_PROBLEM",
            QcMaskType::StationProblem => "STATION_PROBLEM",
            QcMaskType::Calibration => "CALIBRATION",
            QcMaskType::StationSecurity => "STATION_SECURITY",
            QcMaskType::Timing => "TIMING",
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, QcMaskType::RepairableGap | QcMaskType::LongGap)
    }

    /// Whether a mask of this type may be filed under `category`
    pub fn allowed_in(&self, category: QcMaskCategory) -> bool {
        match category {
            QcMaskCategory::WaveformQuality => matches!(
                self,
                QcMaskType::RepairableGap | QcMaskType::LongGap | QcMaskType::Spike
            ),
            QcMaskCategory::StationSoh => matches!(
                self,
                QcMaskType::SensorProblem
                    | QcMaskType::StationProblem
                    | QcMaskType::Calibration
                    | QcMaskType::StationSecurity
                    | QcMaskType::Timing
            ),
            QcMaskCategory::AnalystDefined
            | QcMaskCategory::ChannelProcessing
            | QcMaskCategory::DataAuthentication => true,
            QcMaskCategory::Rejected => false,
        }
    }
}

impl fmt::Display for QcMaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one version of one mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QcMaskVersionDescriptor {
    pub qc_mask_id: Uuid,
    pub version: u64,
}

/// The interval and classification carried by a non-rejected version
#[derive(Debug, Clone, PartialEq)]
pub struct MaskContent {
    pub category: QcMaskCategory,
    pub mask_type: QcMaskType,
    pub rationale: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl MaskContent {
    pub fn new(
        category: QcMaskCategory,
        mask_type: QcMaskType,
        rationale: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            mask_type,
            rationale: rationale.into(),
            start_time,
            end_time,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.start_time > self.end_time {
            return Err(QcError::invalid_data(format!(
                "mask start {} is after its end {}",
                self.start_time, self.end_time
            )));
        }
        if !self.mask_type.allowed_in(self.category) {
            return Err(QcError::invalid_data(format!(
                "mask type {} is not allowed in category {:?}",
                self.mask_type, self.category
            )));
        }
        Ok(())
    }
}

/// Optional lineage attached to a new version
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionLineage {
    /// Versions (of this or other masks) the new version supersedes
    pub parents: Vec<QcMaskVersionDescriptor>,
    /// Channel segments the version was derived from
    pub channel_segment_ids: Vec<Uuid>,
}

impl VersionLineage {
    pub fn from_segment(channel_segment_id: Uuid) -> Self {
        Self {
            parents: Vec::new(),
            channel_segment_ids: vec![channel_segment_id],
        }
    }

    pub fn with_parent(mut self, parent: QcMaskVersionDescriptor) -> Self {
        self.parents.push(parent);
        self
    }
}

/// One immutable entry of a mask's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcMaskVersion {
    version: u64,
    parent_qc_masks: Vec<QcMaskVersionDescriptor>,
    channel_segment_ids: Vec<Uuid>,
    category: QcMaskCategory,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    mask_type: Option<QcMaskType>,
    rationale: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    end_time: Option<DateTime<Utc>>,
}

impl QcMaskVersion {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn parent_qc_masks(&self) -> &[QcMaskVersionDescriptor] {
        &self.parent_qc_masks
    }

    pub fn channel_segment_ids(&self) -> &[Uuid] {
        &self.channel_segment_ids
    }

    pub fn category(&self) -> QcMaskCategory {
        self.category
    }

    pub fn mask_type(&self) -> Option<QcMaskType> {
        self.mask_type
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn is_rejected(&self) -> bool {
        self.category == QcMaskCategory::Rejected
    }

    /// `[start, end]` of a non-rejected version
    pub fn interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if !self.is_rejected() => Some((start, end)),
            _ => None,
        }
    }

    fn consistency_check(&self) -> Result<()> {
        if self.is_rejected() {
            if self.mask_type.is_some() || self.start_time.is_some() || self.end_time.is_some() {
                return Err(QcError::invalid_data(
                    "rejected mask versions carry no type or interval",
                ));
            }
            return Ok(());
        }
        match (self.mask_type, self.start_time, self.end_time) {
            (Some(mask_type), Some(start_time), Some(end_time)) => MaskContent {
                category: self.category,
                mask_type,
                rationale: String::new(),
                start_time,
                end_time,
            }
            .validate(),
            _ => Err(QcError::invalid_data(format!(
                "mask version {} needs a type, start and end",
                self.version
            ))),
        }
    }
}

/// A versioned annotation over a time range of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QcMaskRecord")]
pub struct QcMask {
    id: Uuid,
    channel_id: String,
    versions: Vec<QcMaskVersion>,
}

#[derive(Deserialize)]
struct QcMaskRecord {
    id: Uuid,
    channel_id: String,
    versions: Vec<QcMaskVersion>,
}

impl TryFrom<QcMaskRecord> for QcMask {
    type Error = QcError;

    fn try_from(record: QcMaskRecord) -> Result<Self> {
        if record.versions.is_empty() {
            return Err(QcError::invalid_data(format!(
                "mask {} has no versions",
                record.id
            )));
        }
        for (index, version) in record.versions.iter().enumerate() {
            if version.version != index as u64 {
                return Err(QcError::invalid_data(format!(
                    "mask {} stores version {} at position {}",
                    record.id, version.version, index
                )));
            }
            version.consistency_check()?;
        }
        Ok(Self {
            id: record.id,
            channel_id: record.channel_id,
            versions: record.versions,
        })
    }
}

impl QcMask {
    /// Create a mask with a single initial version
    pub fn create(
        channel_id: impl Into<String>,
        content: MaskContent,
        lineage: VersionLineage,
    ) -> Result<Self> {
        content.validate()?;
        let channel_id = channel_id.into();
        let id = Uuid::new_v5(
            &QC_MASK_NAMESPACE,
            format!(
                "{}|{}|{}|{}",
                channel_id,
                content.mask_type,
                content.start_time.to_rfc3339(),
                content.end_time.to_rfc3339()
            )
            .as_bytes(),
        );
        let mut mask = Self {
            id,
            channel_id,
            versions: Vec::new(),
        };
        mask.push_content(content, lineage);
        Ok(mask)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn versions(&self) -> &[QcMaskVersion] {
        &self.versions
    }

    pub fn version(&self, version: u64) -> Option<&QcMaskVersion> {
        self.versions.get(version as usize)
    }

    /// The latest version
    pub fn current_version(&self) -> &QcMaskVersion {
        // a mask is never built without its first version
        &self.versions[self.versions.len() - 1]
    }

    pub fn current_descriptor(&self) -> QcMaskVersionDescriptor {
        QcMaskVersionDescriptor {
            qc_mask_id: self.id,
            version: self.current_version().version,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.current_version().is_rejected()
    }

    /// Append a version with a new interval or classification
    pub fn add_version(
        &mut self,
        content: MaskContent,
        lineage: VersionLineage,
    ) -> Result<&QcMaskVersion> {
        content.validate()?;
        self.push_content(content, lineage);
        Ok(self.current_version())
    }

    /// Append a terminal rejected version
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidArgument`] if the mask is already rejected.
    pub fn reject(
        &mut self,
        rationale: impl Into<String>,
        lineage: VersionLineage,
    ) -> Result<&QcMaskVersion> {
        if self.is_rejected() {
            return Err(QcError::invalid_argument(format!(
                "mask {} is already rejected",
                self.id
            )));
        }
        let version = QcMaskVersion {
            version: self.versions.len() as u64,
            parent_qc_masks: lineage.parents,
            channel_segment_ids: lineage.channel_segment_ids,
            category: QcMaskCategory::Rejected,
            mask_type: None,
            rationale: rationale.into(),
            start_time: None,
            end_time: None,
        };
        self.versions.push(version);
        Ok(self.current_version())
    }

    fn push_content(&mut self, content: MaskContent, lineage: VersionLineage) {
        let version = QcMaskVersion {
            version: self.versions.len() as u64,
            parent_qc_masks: lineage.parents,
            channel_segment_ids: lineage.channel_segment_ids,
            category: content.category,
            mask_type: Some(content.mask_type),
            rationale: content.rationale,
            start_time: Some(content.start_time),
            end_time: Some(content.end_time),
        };
        self.versions.push(version);
    }
}
