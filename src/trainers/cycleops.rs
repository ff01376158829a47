use bytes::Buf;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// CycleOps trainer service UUID
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0xC0F4_013A_A837_4165_BAB9_654E_F707_47C6);

/// CycleOps control point characteristic UUID
pub const CONTROL_POINT_UUID: Uuid = Uuid::from_u128(0xCA31_A533_A858_4DC7_A650_FDEB_6DAD_4C14);

/// Minimum interval between manual-power target writes
///
/// The brake takes 4-5 seconds to track toward a target; writes inside this
/// window are deferred by a [`crate::control::ErgWriteLimiter`].
pub const MANUAL_POWER_WRITE_INTERVAL: Duration = Duration::from_secs(3);

const COMMAND_ID: u16 = 0x1000;

/// Trainer control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ControlMode {
    Headless = 0x00,
    ManualPower = 0x01,
    ManualSlope = 0x02,
    PowerRange = 0x03,
    WarmUp = 0x04,
    RollDown = 0x05,
}

impl ControlMode {
    /// Convert from the wire byte
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Headless),
            0x01 => Some(Self::ManualPower),
            0x02 => Some(Self::ManualSlope),
            0x03 => Some(Self::PowerRange),
            0x04 => Some(Self::WarmUp),
            0x05 => Some(Self::RollDown),
            _ => None,
        }
    }
}

/// Speed guidance and roll-down progress reported with each response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ControlStatus {
    SpeedOkay = 0x00,
    SpeedUp = 0x01,
    SpeedDown = 0x02,
    RollDownInitializing = 0x03,
    RollDownInProcess = 0x04,
    RollDownPassed = 0x05,
    RollDownFailed = 0x06,
}

impl ControlStatus {
    /// Convert from the wire byte
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::SpeedOkay),
            0x01 => Some(Self::SpeedUp),
            0x02 => Some(Self::SpeedDown),
            0x03 => Some(Self::RollDownInitializing),
            0x04 => Some(Self::RollDownInProcess),
            0x05 => Some(Self::RollDownPassed),
            0x06 => Some(Self::RollDownFailed),
            _ => None,
        }
    }
}

/// Build the 10-byte control-mode frame
///
/// Parameter meaning depends on the mode: manual power takes target watts in
/// `parameter1`; manual slope takes rider weight (kg x 100) and grade
/// (% x 10); power range takes lower and upper watts.
#[must_use]
pub fn set_control_mode(mode: ControlMode, parameter1: i16, parameter2: i16) -> Vec<u8> {
    let mut command = vec![0x00, 0x10, mode as u8];
    command.extend_from_slice(&parameter1.to_le_bytes());
    command.extend_from_slice(&parameter2.to_le_bytes());
    command.extend_from_slice(&[0x00, 0x00, 0x00]);
    command
}

/// Release the brake entirely
#[must_use]
pub fn set_headless_mode() -> Vec<u8> {
    set_control_mode(ControlMode::Headless, 0, 0)
}

/// Target a constant power output
#[must_use]
pub fn set_manual_power(watts: i16) -> Vec<u8> {
    set_control_mode(ControlMode::ManualPower, watts, 0)
}

/// Simulate a slope for a rider weight (kg x 100) and grade (% x 10)
#[must_use]
pub fn set_manual_slope(rider_weight: i16, grade_tenths_percent: i16) -> Vec<u8> {
    set_control_mode(ControlMode::ManualSlope, rider_weight, grade_tenths_percent)
}

/// Keep power inside a band
#[must_use]
pub fn set_power_range(lower_watts: i16, upper_watts: i16) -> Vec<u8> {
    set_control_mode(ControlMode::PowerRange, lower_watts, upper_watts)
}

/// Start the warm-up program
#[must_use]
pub fn set_warm_up() -> Vec<u8> {
    set_control_mode(ControlMode::WarmUp, 0, 0)
}

/// Start the roll-down calibration procedure
#[must_use]
pub fn set_roll_down() -> Vec<u8> {
    set_control_mode(ControlMode::RollDown, 0, 0)
}

/// Decoded control point response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleOpsResponse {
    /// Mode the trainer is in
    pub mode: ControlMode,
    /// Speed/roll-down status
    pub status: ControlStatus,
    /// First mode parameter, echoed
    pub parameter1: i16,
    /// Second mode parameter, echoed
    pub parameter2: i16,
}

/// Decode a control point response
///
/// Returns `None` for short buffers, a command id other than the control
/// command, or unrecognized mode/status bytes.
#[must_use]
pub fn read_response(data: &[u8]) -> Option<CycleOpsResponse> {
    let mut buf = data;
    if buf.remaining() < 10 {
        return None;
    }
    let _response_code = buf.get_u16_le();
    if buf.get_u16_le() != COMMAND_ID {
        return None;
    }
    let mode = ControlMode::from_raw(buf.get_u8())?;
    let parameter1 = buf.get_i16_le();
    let parameter2 = buf.get_i16_le();
    let status = ControlStatus::from_raw(buf.get_u8())?;
    Some(CycleOpsResponse {
        mode,
        status,
        parameter1,
        parameter2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_mode_frame() {
        let command = set_manual_power(220);
        assert_eq!(command.len(), 10);
        assert_eq!(&command[..2], &[0x00, 0x10]);
        assert_eq!(command[2], ControlMode::ManualPower as u8);
        assert_eq!(&command[3..5], &220i16.to_le_bytes());
        assert_eq!(&command[5..7], &0i16.to_le_bytes());
        assert_eq!(&command[7..], &[0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_manual_slope_parameters() {
        let command = set_manual_slope(7500, 25);
        assert_eq!(&command[3..5], &7500i16.to_le_bytes());
        assert_eq!(&command[5..7], &25i16.to_le_bytes());
    }

    #[test]
    fn test_read_response_round_trip_shape() {
        let mut data = Vec::new();
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&COMMAND_ID.to_le_bytes());
        data.push(ControlMode::ManualPower as u8);
        data.extend_from_slice(&220i16.to_le_bytes());
        data.extend_from_slice(&0i16.to_le_bytes());
        data.push(ControlStatus::SpeedUp as u8);

        let response = read_response(&data).unwrap();
        assert_eq!(response.mode, ControlMode::ManualPower);
        assert_eq!(response.status, ControlStatus::SpeedUp);
        assert_eq!(response.parameter1, 220);
    }

    #[test]
    fn test_read_response_rejections() {
        assert!(read_response(&[0x00; 9]).is_none());

        // Wrong command id
        let mut data = vec![0x00, 0x00, 0x01, 0x20];
        data.extend_from_slice(&[0x00; 6]);
        assert!(read_response(&data).is_none());

        // Unknown mode byte
        let mut data = Vec::new();
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&COMMAND_ID.to_le_bytes());
        data.push(0x7F);
        data.extend_from_slice(&[0x00; 5]);
        assert!(read_response(&data).is_none());
    }
}
