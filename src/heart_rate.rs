use bytes::Buf;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Heart Rate service UUID (0x180D)
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180d_0000_1000_8000_0080_5f9b_34fb);

/// Heart Rate Measurement characteristic UUID (0x2A37)
pub const MEASUREMENT_UUID: Uuid = Uuid::from_u128(0x0000_2a37_0000_1000_8000_0080_5f9b_34fb);

/// Body Sensor Location characteristic UUID (0x2A38)
pub const BODY_SENSOR_LOCATION_UUID: Uuid =
    Uuid::from_u128(0x0000_2a38_0000_1000_8000_0080_5f9b_34fb);

/// Heart Rate Control Point characteristic UUID (0x2A39)
pub const CONTROL_POINT_UUID: Uuid = Uuid::from_u128(0x0000_2a39_0000_1000_8000_0080_5f9b_34fb);

/// Skin contact state reported by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContactStatus {
    /// The sensor does not support contact detection
    #[default]
    NotSupported,
    /// Contact detection supported, no skin contact
    NotDetected,
    /// Skin contact detected
    Detected,
}

/// Decoded Heart Rate Measurement
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeartRateMeasurement {
    /// Heart rate in beats per minute (0 when the value byte was truncated)
    pub heart_rate: u16,
    /// Skin contact state
    pub contact_status: ContactStatus,
    /// Accumulated energy expended in kilojoules
    pub energy_expended: Option<u16>,
    /// RR interval in 1/1024 s units
    pub rr_interval: Option<u16>,
}

/// Body location of a heart rate sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum BodySensorLocation {
    Other = 0,
    Chest = 1,
    Wrist = 2,
    Finger = 3,
    Hand = 4,
    EarLobe = 5,
    Foot = 6,
}

impl BodySensorLocation {
    /// Convert from the wire byte
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Other),
            1 => Some(Self::Chest),
            2 => Some(Self::Wrist),
            3 => Some(Self::Finger),
            4 => Some(Self::Hand),
            5 => Some(Self::EarLobe),
            6 => Some(Self::Foot),
            _ => None,
        }
    }
}

/// Decode a Heart Rate Measurement notification
///
/// Bit 0 of the flags selects the 8 vs 16-bit value format; bits 1-2 carry
/// the contact status; bit 3 gates energy expended and bit 4 an RR interval.
/// Returns `None` only when even the flags byte is missing; a flags-only
/// buffer yields a record with `heart_rate == 0`.
#[must_use]
pub fn read_measurement(data: &[u8]) -> Option<HeartRateMeasurement> {
    let mut buf = data;
    if buf.remaining() < 1 {
        return None;
    }

    let flags = buf.get_u8();
    let mut measurement = HeartRateMeasurement::default();

    if flags & 0x01 == 0 {
        if buf.remaining() >= 1 {
            measurement.heart_rate = u16::from(buf.get_u8());
        }
    } else if buf.remaining() >= 2 {
        measurement.heart_rate = buf.get_u16_le();
    }

    measurement.contact_status = match (flags & 0x06) >> 1 {
        2 => ContactStatus::NotDetected,
        3 => ContactStatus::Detected,
        _ => ContactStatus::NotSupported,
    };

    if flags & 0x08 == 0x08 && buf.remaining() >= 2 {
        measurement.energy_expended = Some(buf.get_u16_le());
    }

    if flags & 0x10 == 0x10 && buf.remaining() >= 2 {
        measurement.rr_interval = Some(buf.get_u16_le());
    }

    Some(measurement)
}

/// Read a Body Sensor Location value, `None` on empty input or an
/// unrecognized value
#[must_use]
pub fn read_sensor_location(data: &[u8]) -> Option<BodySensorLocation> {
    BodySensorLocation::from_raw(*data.first()?)
}

/// Build the control-point command that resets the energy expended counter
#[must_use]
pub fn reset_energy_expended() -> Vec<u8> {
    vec![0x01]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_bit_heart_rate() {
        let measurement = read_measurement(&[0x00, 0x91]).unwrap();
        assert_eq!(measurement.heart_rate, 145);
        assert_eq!(measurement.contact_status, ContactStatus::NotSupported);
    }

    #[test]
    fn test_sixteen_bit_heart_rate() {
        let measurement = read_measurement(&[0x01, 0x40, 0x01]).unwrap();
        assert_eq!(measurement.heart_rate, 320);
    }

    #[test]
    fn test_contact_status_bits() {
        assert_eq!(
            read_measurement(&[0x04, 0x50]).unwrap().contact_status,
            ContactStatus::NotDetected
        );
        assert_eq!(
            read_measurement(&[0x06, 0x50]).unwrap().contact_status,
            ContactStatus::Detected
        );
        assert_eq!(
            read_measurement(&[0x00, 0x50]).unwrap().contact_status,
            ContactStatus::NotSupported
        );
    }

    #[test]
    fn test_energy_and_rr_interval() {
        let measurement = read_measurement(&[0x18, 0x50, 0x10, 0x27, 0x00, 0x04]).unwrap();
        assert_eq!(measurement.heart_rate, 80);
        assert_eq!(measurement.energy_expended, Some(10000));
        assert_eq!(measurement.rr_interval, Some(1024));
    }

    #[test]
    fn test_flags_only_buffer() {
        let measurement = read_measurement(&[0x00]).unwrap();
        assert_eq!(measurement.heart_rate, 0);
        assert!(measurement.energy_expended.is_none());
        assert!(measurement.rr_interval.is_none());
    }

    #[test]
    fn test_empty_buffer() {
        assert!(read_measurement(&[]).is_none());
    }

    #[test]
    fn test_sensor_location() {
        assert_eq!(
            read_sensor_location(&[1]),
            Some(BodySensorLocation::Chest)
        );
        assert_eq!(read_sensor_location(&[9]), None);
        assert_eq!(read_sensor_location(&[]), None);
    }

    #[test]
    fn test_reset_energy_expended() {
        assert_eq!(reset_energy_expended(), vec![0x01]);
    }
}
