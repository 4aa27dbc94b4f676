// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! State-of-health (SOH) samples and condensed status segments

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{QcError, Result};

/// Boolean state-of-health indicators reported by acquisition equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcquiredChannelSohType {
    AuthenticationSealBroken,
    BackupPowerUnstable,
    CalibrationUnderway,
    Clipped,
    ClockDifferentialTooLarge,
    ClockLocked,
    DeadSensorChannel,
    DigitizerAnalogInputShorted,
    DigitizerCalibrationLoopBack,
    DigitizingEquipmentOpen,
    EquipmentHousingOpen,
    EquipmentMoved,
    GpsReceiverOff,
    GpsReceiverUnlocked,
    MainPowerFailure,
    VaultDoorOpened,
    ZeroedData,
}

impl AcquiredChannelSohType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationSealBroken => "AUTHENTICATION_SEAL_BROKEN",
            Self::BackupPowerUnstable => "BACKUP_POWER_UNSTABLE",
            Self::CalibrationUnderway => "CALIBRATION_UNDERWAY",
            Self::Clipped => "CLIPPED",
            Self::ClockDifferentialTooLarge => "CLOCK_DIFFERENTIAL_TOO_LARGE",
            Self::ClockLocked => "CLOCK_LOCKED",
            Self::DeadSensorChannel => "DEAD_SENSOR_CHANNEL",
            Self::DigitizerAnalogInputShorted => "DIGITIZER_ANALOG_INPUT_SHORTED",
            Self::DigitizerCalibrationLoopBack => "DIGITIZER_CALIBRATION_LOOP_BACK",
            Self::DigitizingEquipmentOpen => "DIGITIZING_EQUIPMENT_OPEN",
            Self::EquipmentHousingOpen => "EQUIPMENT_HOUSING_OPEN",
            Self::EquipmentMoved => "EQUIPMENT_MOVED",
            Self::GpsReceiverOff => "GPS_RECEIVER_OFF",
            Self::GpsReceiverUnlocked => "GPS_RECEIVER_UNLOCKED",
            Self::MainPowerFailure => "MAIN_POWER_FAILURE",
            Self::VaultDoorOpened => "VAULT_DOOR_OPENED",
            Self::ZeroedData => "ZEROED_DATA",
        }
    }
}

impl fmt::Display for AcquiredChannelSohType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped boolean health reading for a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquiredChannelSohBoolean {
    pub id: Uuid,
    pub channel_id: String,
    pub soh_type: AcquiredChannelSohType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: bool,
}

impl AcquiredChannelSohBoolean {
    pub fn new(
        channel_id: impl Into<String>,
        soh_type: AcquiredChannelSohType,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        status: bool,
    ) -> Result<Self> {
        if end_time < start_time {
            return Err(QcError::invalid_data(format!(
                "SOH sample ends ({}) before it starts ({})",
                end_time, start_time
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            channel_id: channel_id.into(),
            soh_type,
            start_time,
            end_time,
            status,
        })
    }
}

/// Tri-state status of a condensed SOH segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusBit {
    Set,
    Unset,
    /// No SOH reading covers the interval
    Missing,
}

impl From<bool> for StatusBit {
    fn from(status: bool) -> Self {
        if status {
            StatusBit::Set
        } else {
            StatusBit::Unset
        }
    }
}

/// A half-open `[start_time, end_time)` interval with a single status
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SohStatusSegment {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: StatusBit,
}

impl SohStatusSegment {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>, status: StatusBit) -> Result<Self> {
        if start_time >= end_time {
            return Err(QcError::invalid_data(format!(
                "status segment start {} must precede end {}",
                start_time, end_time
            )));
        }
        Ok(Self {
            start_time,
            end_time,
            status,
        })
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn status(&self) -> StatusBit {
        self.status
    }
}

/// Condensed status history of one SOH indicator on one channel.
///
/// Invariants checked at construction: at least one segment, segments sorted
/// and non-overlapping, and no two time-adjacent segments with the same status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSohStatusSegment {
    channel_id: String,
    soh_type: AcquiredChannelSohType,
    status_segments: Vec<SohStatusSegment>,
}

impl ChannelSohStatusSegment {
    pub fn new(
        channel_id: impl Into<String>,
        soh_type: AcquiredChannelSohType,
        status_segments: Vec<SohStatusSegment>,
    ) -> Result<Self> {
        let channel_id = channel_id.into();
        if status_segments.is_empty() {
            return Err(QcError::invalid_data(format!(
                "status for channel '{}' ({}) needs at least one segment",
                channel_id, soh_type
            )));
        }
        for pair in status_segments.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if next.start_time < previous.end_time {
                return Err(QcError::invalid_data(format!(
                    "status segments overlap at {} on channel '{}'",
                    next.start_time, channel_id
                )));
            }
            if next.start_time == previous.end_time && next.status == previous.status {
                return Err(QcError::invalid_data(format!(
                    "adjacent status segments share status {:?} at {} on channel '{}'",
                    next.status, next.start_time, channel_id
                )));
            }
        }
        Ok(Self {
            channel_id,
            soh_type,
            status_segments,
        })
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn soh_type(&self) -> AcquiredChannelSohType {
        self.soh_type
    }

    pub fn status_segments(&self) -> &[SohStatusSegment] {
        &self.status_segments
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.status_segments[0].start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.status_segments[self.status_segments.len() - 1].end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    #[test]
    fn test_status_segment_requires_positive_length() {
        assert!(SohStatusSegment::new(at(0), at(1), StatusBit::Set).is_ok());
        assert!(SohStatusSegment::new(at(1), at(1), StatusBit::Set).is_err());
        assert!(SohStatusSegment::new(at(2), at(1), StatusBit::Set).is_err());
    }

    #[test]
    fn test_channel_status_invariants() {
        let set = SohStatusSegment::new(at(0), at(10), StatusBit::Set).unwrap();
        let unset = SohStatusSegment::new(at(10), at(20), StatusBit::Unset).unwrap();
        let set_again = SohStatusSegment::new(at(10), at(20), StatusBit::Set).unwrap();
        let overlapping = SohStatusSegment::new(at(5), at(20), StatusBit::Unset).unwrap();
        let soh_type = AcquiredChannelSohType::DeadSensorChannel;

        assert!(ChannelSohStatusSegment::new("STA.BHZ", soh_type, vec![set, unset]).is_ok());
        assert!(ChannelSohStatusSegment::new("STA.BHZ", soh_type, vec![]).is_err());
        assert!(ChannelSohStatusSegment::new("STA.BHZ", soh_type, vec![set, set_again]).is_err());
        assert!(ChannelSohStatusSegment::new("STA.BHZ", soh_type, vec![set, overlapping]).is_err());
    }

    #[test]
    fn test_soh_type_display_uses_wire_name() {
        assert_eq!(
            AcquiredChannelSohType::GpsReceiverUnlocked.to_string(),
            "GPS_RECEIVER_UNLOCKED"
        );
    }
}
