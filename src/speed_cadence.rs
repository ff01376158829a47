use bitflags::bitflags;
use bytes::Buf;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::cycling::CyclingMeasurement;

/// Cycling Speed and Cadence service UUID (0x1816)
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1816_0000_1000_8000_0080_5f9b_34fb);

/// CSC Measurement characteristic UUID (0x2A5B)
pub const MEASUREMENT_UUID: Uuid = Uuid::from_u128(0x0000_2a5b_0000_1000_8000_0080_5f9b_34fb);

/// CSC Feature characteristic UUID (0x2A5C)
pub const FEATURE_UUID: Uuid = Uuid::from_u128(0x0000_2a5c_0000_1000_8000_0080_5f9b_34fb);

bitflags! {
    /// Capabilities advertised by the CSC Feature characteristic
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u16 {
        /// Wheel revolution data supported
        const WHEEL_REVOLUTION_DATA = 1 << 0;
        /// Crank revolution data supported
        const CRANK_REVOLUTION_DATA = 1 << 1;
        /// Multiple sensor locations supported
        const MULTIPLE_SENSOR_LOCATIONS = 1 << 2;
    }
}

bitflags! {
    /// Presence flags leading a CSC Measurement
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MeasurementFlags: u8 {
        /// Wheel revolution data present
        const WHEEL_REVOLUTION_DATA_PRESENT = 1 << 0;
        /// Crank revolution data present
        const CRANK_REVOLUTION_DATA_PRESENT = 1 << 1;
    }
}

/// Decoded CSC Measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CscMeasurement {
    /// Capture time, attached at decode
    pub timestamp: SystemTime,
    /// Cumulative wheel revolutions
    pub cumulative_wheel_revolutions: Option<u32>,
    /// Last wheel event time in 1/1024 s ticks
    pub last_wheel_event_time: Option<u16>,
    /// Cumulative crank revolutions
    pub cumulative_crank_revolutions: Option<u16>,
    /// Last crank event time in 1/1024 s ticks
    pub last_crank_event_time: Option<u16>,
}

impl CyclingMeasurement for CscMeasurement {
    fn cumulative_wheel_revolutions(&self) -> Option<u32> {
        self.cumulative_wheel_revolutions
    }
    fn last_wheel_event_time(&self) -> Option<u16> {
        self.last_wheel_event_time
    }
    fn cumulative_crank_revolutions(&self) -> Option<u16> {
        self.cumulative_crank_revolutions
    }
    fn last_crank_event_time(&self) -> Option<u16> {
        self.last_crank_event_time
    }
}

/// Read the CSC Feature value, zero-padding short buffers
#[must_use]
pub fn read_features(data: &[u8]) -> Features {
    let mut raw = [0u8; 2];
    let len = data.len().min(2);
    raw[..len].copy_from_slice(&data[..len]);
    Features::from_bits_retain(u16::from_le_bytes(raw))
}

/// Decode a CSC Measurement notification
///
/// Returns `None` when the single-byte flag lead is missing; flag-gated
/// groups are consumed only while enough bytes remain.
#[must_use]
pub fn read_measurement(data: &[u8]) -> Option<CscMeasurement> {
    let mut buf = data;
    if buf.remaining() < 1 {
        return None;
    }

    let flags = MeasurementFlags::from_bits_retain(buf.get_u8());
    let mut measurement = CscMeasurement {
        timestamp: SystemTime::now(),
        cumulative_wheel_revolutions: None,
        last_wheel_event_time: None,
        cumulative_crank_revolutions: None,
        last_crank_event_time: None,
    };

    if flags.contains(MeasurementFlags::WHEEL_REVOLUTION_DATA_PRESENT) && buf.remaining() >= 6 {
        measurement.cumulative_wheel_revolutions = Some(buf.get_u32_le());
        measurement.last_wheel_event_time = Some(buf.get_u16_le());
    }

    if flags.contains(MeasurementFlags::CRANK_REVOLUTION_DATA_PRESENT) && buf.remaining() >= 4 {
        measurement.cumulative_crank_revolutions = Some(buf.get_u16_le());
        measurement.last_crank_event_time = Some(buf.get_u16_le());
    }

    Some(measurement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycling::{wheel_kph, WheelConfig};

    fn wheel_packet(revolutions: u32, event_time: u16) -> Vec<u8> {
        let mut data = vec![0x01];
        data.extend_from_slice(&revolutions.to_le_bytes());
        data.extend_from_slice(&event_time.to_le_bytes());
        data
    }

    #[test]
    fn test_wheel_and_crank_groups() {
        let mut data = vec![0x03];
        data.extend_from_slice(&4000u32.to_le_bytes());
        data.extend_from_slice(&1024u16.to_le_bytes());
        data.extend_from_slice(&200u16.to_le_bytes());
        data.extend_from_slice(&512u16.to_le_bytes());

        let measurement = read_measurement(&data).unwrap();
        assert_eq!(measurement.cumulative_wheel_revolutions, Some(4000));
        assert_eq!(measurement.last_wheel_event_time, Some(1024));
        assert_eq!(measurement.cumulative_crank_revolutions, Some(200));
        assert_eq!(measurement.last_crank_event_time, Some(512));
    }

    #[test]
    fn test_truncated_wheel_group_left_absent() {
        let data = [0x01, 0xAA, 0xBB, 0xCC];
        let measurement = read_measurement(&data).unwrap();
        assert!(measurement.cumulative_wheel_revolutions.is_none());
        assert!(measurement.last_wheel_event_time.is_none());
    }

    #[test]
    fn test_empty_buffer() {
        assert!(read_measurement(&[]).is_none());
    }

    #[test]
    fn test_features() {
        let features = read_features(&[0x03, 0x00]);
        assert!(features.contains(Features::WHEEL_REVOLUTION_DATA));
        assert!(features.contains(Features::CRANK_REVOLUTION_DATA));
        assert!(!features.contains(Features::MULTIPLE_SENSOR_LOCATIONS));
    }

    #[test]
    fn test_two_samples_through_wheel_kph() {
        // 3 revolutions and 1024 ticks (one second) apart
        let previous = read_measurement(&wheel_packet(500, 0)).unwrap();
        let current = read_measurement(&wheel_packet(503, 1024)).unwrap();

        let config = WheelConfig::new(213.3, 1024);
        let kph = wheel_kph(&current, &previous, &config).unwrap();
        let expected = (3.0 / (1024.0 / 1024.0 / 60.0)) * 213.3 * 0.00001 * 60.0;
        assert!((kph - expected).abs() < 1e-9);
    }
}
