// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Station state-of-health masks
//!
//! Every status segment in which an indicator reports a problem becomes a
//! `STATION_SOH` mask over the segment's interval. Most indicators report a
//! problem when set; `CLOCK_LOCKED` reports one when unset.

use log::debug;

use crate::error::{QcError, Result};
use crate::model::{
    AcquiredChannelSohType, ChannelSohStatusSegment, MaskContent, QcMask, QcMaskCategory,
    QcMaskType, StatusBit, VersionLineage,
};

/// Mask type raised by a problem on `soh_type`
pub fn soh_mask_type(soh_type: AcquiredChannelSohType) -> QcMaskType {
    use AcquiredChannelSohType::*;
    match soh_type {
        AuthenticationSealBroken | DigitizingEquipmentOpen | EquipmentHousingOpen
        | EquipmentMoved | VaultDoorOpened => QcMaskType::StationSecurity,
        BackupPowerUnstable | MainPowerFailure => QcMaskType::StationProblem,
        CalibrationUnderway | DigitizerCalibrationLoopBack => QcMaskType::Calibration,
        Clipped | DeadSensorChannel | DigitizerAnalogInputShorted | ZeroedData => {
            QcMaskType::SensorProblem
        }
        ClockDifferentialTooLarge | ClockLocked | GpsReceiverOff | GpsReceiverUnlocked => {
            QcMaskType::Timing
        }
    }
}

/// Status value that signals a problem for `soh_type`
pub fn problem_status(soh_type: AcquiredChannelSohType) -> StatusBit {
    match soh_type {
        AcquiredChannelSohType::ClockLocked => StatusBit::Unset,
        _ => StatusBit::Set,
    }
}

/// Create masks for the problem intervals of `status`.
///
/// Intervals already covered by a stored, non-rejected mask of the same type
/// and interval are skipped.
///
/// # Errors
///
/// [`QcError::InvalidArgument`] when a stored mask belongs to another channel.
pub fn generate_soh_masks(
    status: &ChannelSohStatusSegment,
    existing_masks: &[QcMask],
) -> Result<Vec<QcMask>> {
    if let Some(foreign) = existing_masks
        .iter()
        .find(|mask| mask.channel_id() != status.channel_id())
    {
        return Err(QcError::invalid_argument(format!(
            "mask {} belongs to channel '{}', not '{}'",
            foreign.id(),
            foreign.channel_id(),
            status.channel_id()
        )));
    }

    let mask_type = soh_mask_type(status.soh_type());
    let problem = problem_status(status.soh_type());
    let mut masks = Vec::new();

    for segment in status
        .status_segments()
        .iter()
        .filter(|segment| segment.status() == problem)
    {
        let interval = (segment.start_time(), segment.end_time());
        let known = existing_masks.iter().any(|mask| {
            let version = mask.current_version();
            version.mask_type() == Some(mask_type) && version.interval() == Some(interval)
        });
        if known {
            continue;
        }

        let mask = QcMask::create(
            status.channel_id(),
            MaskContent::new(
                QcMaskCategory::StationSoh,
                mask_type,
                format!("{} reported {:?}", status.soh_type(), segment.status()),
                interval.0,
                interval.1,
            ),
            VersionLineage::default(),
        )?;
        debug!(
            "{} mask {} on '{}' from {} over [{}, {})",
            mask_type,
            mask.id(),
            status.channel_id(),
            status.soh_type(),
            interval.0,
            interval.1
        );
        masks.push(mask);
    }
    Ok(masks)
}
