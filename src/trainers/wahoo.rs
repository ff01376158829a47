use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Result, VelolinkError};

/// Wahoo trainer control characteristic UUID, hosted on the Cycling Power
/// service
pub const CONTROL_UUID: Uuid = Uuid::from_u128(0xA026_E005_0A7D_4AB3_97FA_F150_0F9F_EB8B);

/// Settle time the brake needs between ERG target writes
///
/// Policy for a [`crate::control::ErgWriteLimiter`] wrapping
/// [`set_erg_mode`].
pub const ERG_WRITE_INTERVAL: Duration = Duration::from_secs(2);

/// Wahoo trainer operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum OperationCode {
    Unlock = 32,
    SetResistanceMode = 64,
    SetStandardMode = 65,
    SetErgMode = 66,
    SetSimMode = 67,
    SetSimCrr = 68,
    SetSimWindResistance = 69,
    SetSimGrade = 70,
    SetSimWindSpeed = 71,
    SetWheelCircumference = 72,
}

impl OperationCode {
    /// Convert from the wire byte
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            32 => Some(Self::Unlock),
            64 => Some(Self::SetResistanceMode),
            65 => Some(Self::SetStandardMode),
            66 => Some(Self::SetErgMode),
            67 => Some(Self::SetSimMode),
            68 => Some(Self::SetSimCrr),
            69 => Some(Self::SetSimWindResistance),
            70 => Some(Self::SetSimGrade),
            71 => Some(Self::SetSimWindSpeed),
            72 => Some(Self::SetWheelCircumference),
            _ => None,
        }
    }
}

fn u16_field(value: f64) -> u16 {
    value.round().clamp(0.0, f64::from(u16::MAX)) as u16
}

/// The unlock command the trainer requires before honoring anything else
#[must_use]
pub fn unlock() -> Vec<u8> {
    vec![OperationCode::Unlock as u8, 0xEE, 0xFC]
}

/// Put the trainer in resistance mode at a fraction `0.0..=1.0` of full brake
#[must_use]
pub fn set_resistance_mode(resistance: f64) -> Vec<u8> {
    let norm = u16_field((1.0 - resistance.clamp(0.0, 1.0)) * 16383.0);
    let mut command = vec![OperationCode::SetResistanceMode as u8];
    command.extend_from_slice(&norm.to_le_bytes());
    command
}

/// Put the trainer in standard (level) mode
#[must_use]
pub fn set_standard_mode(level: u8) -> Vec<u8> {
    vec![OperationCode::SetStandardMode as u8, level]
}

/// Put the trainer in ERG mode targeting `watts`
///
/// Writes inside [`ERG_WRITE_INTERVAL`] of each other are the caller's
/// problem; see [`crate::control::ErgWriteLimiter`].
#[must_use]
pub fn set_erg_mode(watts: u16) -> Vec<u8> {
    let mut command = vec![OperationCode::SetErgMode as u8];
    command.extend_from_slice(&watts.to_le_bytes());
    command
}

/// Put the trainer in simulation mode
///
/// `weight_kg` at 0.01 kg resolution, the coefficients at 0.001 resolution.
#[must_use]
pub fn set_sim_mode(weight_kg: f64, crr: f64, wind_resistance: f64) -> Vec<u8> {
    let weight = u16_field(weight_kg * 100.0);
    let crr_n = u16_field(crr * 1000.0);
    let wrc_n = u16_field(wind_resistance * 1000.0);
    let mut command = vec![OperationCode::SetSimMode as u8];
    command.extend_from_slice(&weight.to_le_bytes());
    command.extend_from_slice(&crr_n.to_le_bytes());
    command.extend_from_slice(&wrc_n.to_le_bytes());
    command
}

/// Update the rolling resistance coefficient in simulation mode
#[must_use]
pub fn set_sim_crr(crr: f64) -> Vec<u8> {
    let crr_n = u16_field(crr * 1000.0);
    let mut command = vec![OperationCode::SetSimCrr as u8];
    command.extend_from_slice(&crr_n.to_le_bytes());
    command
}

/// Update the wind resistance coefficient in simulation mode
#[must_use]
pub fn set_sim_wind_resistance(wind_resistance: f64) -> Vec<u8> {
    let wrc_n = u16_field(wind_resistance * 1000.0);
    let mut command = vec![OperationCode::SetSimWindResistance as u8];
    command.extend_from_slice(&wrc_n.to_le_bytes());
    command
}

/// Update the simulated grade, a fraction in `-1.0..=1.0`
#[must_use]
pub fn set_sim_grade(grade: f64) -> Vec<u8> {
    let norm = u16_field((grade.clamp(-1.0, 1.0) + 1.0) * 65536.0 / 2.0);
    let mut command = vec![OperationCode::SetSimGrade as u8];
    command.extend_from_slice(&norm.to_le_bytes());
    command
}

/// Update the simulated head/tail wind speed in meters per second
#[must_use]
pub fn set_sim_wind_speed(meters_per_second: f64) -> Vec<u8> {
    let norm = u16_field((meters_per_second.clamp(-32.768, 32.768) + 32.768) * 1000.0);
    let mut command = vec![OperationCode::SetSimWindSpeed as u8];
    command.extend_from_slice(&norm.to_le_bytes());
    command
}

/// Configure the wheel circumference in millimeters (0.1 mm resolution)
#[must_use]
pub fn set_wheel_circumference(millimeters: f64) -> Vec<u8> {
    let norm = u16_field(millimeters.max(0.0) * 10.0);
    let mut command = vec![OperationCode::SetWheelCircumference as u8];
    command.extend_from_slice(&norm.to_le_bytes());
    command
}

/// Acknowledgment notified after a command write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WahooResponse {
    /// Operation being acknowledged
    pub operation: OperationCode,
    /// Whether the trainer reported success (result byte 0x01)
    pub success: bool,
}

/// Decode a trainer acknowledgment
///
/// # Errors
///
/// Returns [`VelolinkError::Truncated`] for a buffer without result and
/// opcode bytes, or [`VelolinkError::UnhandledOpCode`] when the echoed
/// opcode is unrecognized.
pub fn read_response(data: &[u8]) -> Result<WahooResponse> {
    if data.len() < 2 {
        return Err(VelolinkError::Truncated {
            characteristic: CONTROL_UUID,
        });
    }
    let operation = OperationCode::from_raw(data[1])
        .ok_or(VelolinkError::UnhandledOpCode { opcode: data[1] })?;
    Ok(WahooResponse {
        operation,
        success: data[0] == 0x01,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_bytes() {
        assert_eq!(unlock(), vec![32, 0xEE, 0xFC]);
    }

    #[test]
    fn test_resistance_mode_inverted_scale() {
        // Full brake is 0, no brake is 16383
        assert_eq!(set_resistance_mode(1.0), vec![64, 0x00, 0x00]);
        assert_eq!(set_resistance_mode(0.0), vec![64, 0xFF, 0x3F]);
        // Out-of-range input clamps instead of wrapping
        assert_eq!(set_resistance_mode(2.0), vec![64, 0x00, 0x00]);
    }

    #[test]
    fn test_erg_mode() {
        assert_eq!(set_erg_mode(300), vec![66, 0x2C, 0x01]);
    }

    #[test]
    fn test_sim_mode_scaling() {
        let command = set_sim_mode(75.0, 0.004, 0.6);
        assert_eq!(command[0], 67);
        assert_eq!(&command[1..3], &7500u16.to_le_bytes());
        assert_eq!(&command[3..5], &4u16.to_le_bytes());
        assert_eq!(&command[5..7], &600u16.to_le_bytes());
    }

    #[test]
    fn test_sim_grade_offset_binary() {
        assert_eq!(set_sim_grade(0.0), vec![70, 0x00, 0x80]);
        // +100% grade saturates the u16 rather than overflowing
        assert_eq!(set_sim_grade(1.0), vec![70, 0xFF, 0xFF]);
        assert_eq!(set_sim_grade(-1.0), vec![70, 0x00, 0x00]);
    }

    #[test]
    fn test_wind_speed_clamped() {
        assert_eq!(set_sim_wind_speed(0.0), vec![71, 0x00, 0x80]);
        let gale = set_sim_wind_speed(100.0);
        assert_eq!(&gale[1..3], &u16::MAX.to_le_bytes());
    }

    #[test]
    fn test_read_response() {
        let response = read_response(&[0x01, 66, 0x01, 0x00]).unwrap();
        assert_eq!(response.operation, OperationCode::SetErgMode);
        assert!(response.success);

        assert!(read_response(&[0x01])
            .unwrap_err()
            .is_recoverable());
        assert!(matches!(
            read_response(&[0x01, 99]),
            Err(VelolinkError::UnhandledOpCode { opcode: 99 })
        ));
    }
}
