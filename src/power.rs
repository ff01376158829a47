use bitflags::bitflags;
use bytes::Buf;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::cycling::CyclingMeasurement;

/// Cycling Power service UUID (0x1818)
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1818_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Power Measurement characteristic UUID (0x2A63)
pub const MEASUREMENT_UUID: Uuid = Uuid::from_u128(0x0000_2a63_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Power Vector characteristic UUID (0x2A64)
pub const VECTOR_UUID: Uuid = Uuid::from_u128(0x0000_2a64_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Power Feature characteristic UUID (0x2A65)
pub const FEATURE_UUID: Uuid = Uuid::from_u128(0x0000_2a65_0000_1000_8000_0080_5f9b_34fb);

/// Sensor Location characteristic UUID (0x2A5D)
pub const SENSOR_LOCATION_UUID: Uuid = Uuid::from_u128(0x0000_2a5d_0000_1000_8000_0080_5f9b_34fb);

bitflags! {
    /// Capabilities advertised by the Cycling Power Feature characteristic
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        /// Pedal power balance supported
        const PEDAL_POWER_BALANCE = 1 << 0;
        /// Accumulated torque supported
        const ACCUMULATED_TORQUE = 1 << 1;
        /// Wheel revolution data supported
        const WHEEL_REVOLUTION_DATA = 1 << 2;
        /// Crank revolution data supported
        const CRANK_REVOLUTION_DATA = 1 << 3;
        /// Extreme magnitudes supported
        const EXTREME_MAGNITUDES = 1 << 4;
        /// Extreme angles supported
        const EXTREME_ANGLES = 1 << 5;
        /// Top and bottom dead spot angles supported
        const DEAD_SPOT_ANGLES = 1 << 6;
        /// Accumulated energy supported
        const ACCUMULATED_ENERGY = 1 << 7;
        /// Offset compensation indicator supported
        const OFFSET_COMPENSATION_INDICATOR = 1 << 8;
        /// Offset compensation supported
        const OFFSET_COMPENSATION = 1 << 9;
        /// Measurement content masking supported
        const CONTENT_MASKING = 1 << 10;
        /// Multiple sensor locations supported
        const MULTIPLE_SENSOR_LOCATIONS = 1 << 11;
        /// Crank length adjustment supported
        const CRANK_LENGTH_ADJUSTMENT = 1 << 12;
        /// Chain length adjustment supported
        const CHAIN_LENGTH_ADJUSTMENT = 1 << 13;
        /// Chain weight adjustment supported
        const CHAIN_WEIGHT_ADJUSTMENT = 1 << 14;
        /// Span length adjustment supported
        const SPAN_LENGTH_ADJUSTMENT = 1 << 15;
        /// Sensor measurement context (force vs torque)
        const SENSOR_MEASUREMENT_CONTEXT = 1 << 16;
        /// Instantaneous measurement direction supported
        const INSTANTANEOUS_MEASUREMENT_DIRECTION = 1 << 17;
        /// Factory calibration date supported
        const FACTORY_CALIBRATION_DATE = 1 << 18;
    }
}

bitflags! {
    /// Presence flags leading a Cycling Power Measurement
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MeasurementFlags: u16 {
        /// Pedal power balance present
        const PEDAL_POWER_BALANCE_PRESENT = 1 << 0;
        /// Pedal power balance is referenced to the left pedal
        const PEDAL_POWER_BALANCE_REFERENCE = 1 << 1;
        /// Accumulated torque present
        const ACCUMULATED_TORQUE_PRESENT = 1 << 2;
        /// Accumulated torque is crank based
        const ACCUMULATED_TORQUE_SOURCE = 1 << 3;
        /// Wheel revolution data present
        const WHEEL_REVOLUTION_DATA_PRESENT = 1 << 4;
        /// Crank revolution data present
        const CRANK_REVOLUTION_DATA_PRESENT = 1 << 5;
        /// Extreme force magnitudes present
        const EXTREME_FORCE_MAGNITUDES_PRESENT = 1 << 6;
        /// Extreme torque magnitudes present
        const EXTREME_TORQUE_MAGNITUDES_PRESENT = 1 << 7;
        /// Extreme angles present
        const EXTREME_ANGLES_PRESENT = 1 << 8;
        /// Top dead spot angle present
        const TOP_DEAD_SPOT_ANGLE_PRESENT = 1 << 9;
        /// Bottom dead spot angle present
        const BOTTOM_DEAD_SPOT_ANGLE_PRESENT = 1 << 10;
        /// Accumulated energy present
        const ACCUMULATED_ENERGY_PRESENT = 1 << 11;
        /// Offset compensation indicator
        const OFFSET_COMPENSATION_INDICATOR = 1 << 12;
    }
}

/// Decoded Cycling Power Measurement
///
/// Optional fields mirror the wire: a field is `None` when its presence flag
/// was clear or the notification was truncated before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerMeasurement {
    /// Capture time, attached at decode
    pub timestamp: SystemTime,
    /// Instantaneous power in watts
    pub instantaneous_power: i16,
    /// Pedal power balance in half-percent units
    pub pedal_power_balance: Option<u8>,
    /// Whether the balance is referenced to the left pedal
    pub pedal_power_balance_reference: Option<bool>,
    /// Accumulated torque in 1/32 Nm units
    pub accumulated_torque: Option<u16>,
    /// Cumulative wheel revolutions
    pub cumulative_wheel_revolutions: Option<u32>,
    /// Last wheel event time in 1/2048 s ticks
    pub last_wheel_event_time: Option<u16>,
    /// Cumulative crank revolutions
    pub cumulative_crank_revolutions: Option<u16>,
    /// Last crank event time in 1/1024 s ticks
    pub last_crank_event_time: Option<u16>,
    /// Maximum force magnitude in newtons
    pub maximum_force_magnitude: Option<i16>,
    /// Minimum force magnitude in newtons
    pub minimum_force_magnitude: Option<i16>,
    /// Maximum torque magnitude in 1/32 Nm units
    pub maximum_torque_magnitude: Option<i16>,
    /// Minimum torque magnitude in 1/32 Nm units
    pub minimum_torque_magnitude: Option<i16>,
    /// Crank angle of the maximum force/torque, in degrees
    pub maximum_angle: Option<u16>,
    /// Crank angle of the minimum force/torque, in degrees
    pub minimum_angle: Option<u16>,
    /// Top dead spot angle in degrees
    pub top_dead_spot_angle: Option<u16>,
    /// Bottom dead spot angle in degrees
    pub bottom_dead_spot_angle: Option<u16>,
    /// Accumulated energy in kilojoules
    pub accumulated_energy: Option<u16>,
}

impl PowerMeasurement {
    fn new(instantaneous_power: i16) -> Self {
        Self {
            timestamp: SystemTime::now(),
            instantaneous_power,
            pedal_power_balance: None,
            pedal_power_balance_reference: None,
            accumulated_torque: None,
            cumulative_wheel_revolutions: None,
            last_wheel_event_time: None,
            cumulative_crank_revolutions: None,
            last_crank_event_time: None,
            maximum_force_magnitude: None,
            minimum_force_magnitude: None,
            maximum_torque_magnitude: None,
            minimum_torque_magnitude: None,
            maximum_angle: None,
            minimum_angle: None,
            top_dead_spot_angle: None,
            bottom_dead_spot_angle: None,
            accumulated_energy: None,
        }
    }
}

impl CyclingMeasurement for PowerMeasurement {
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

/// Read the Cycling Power Feature value
///
/// Short buffers are treated as zero-filled; unknown bits are preserved.
#[must_use]
pub fn read_features(data: &[u8]) -> Features {
    let mut raw = [0u8; 4];
    let len = data.len().min(4);
    raw[..len].copy_from_slice(&data[..len]);
    Features::from_bits_retain(u32::from_le_bytes(raw))
}

/// Decode a Cycling Power Measurement notification
///
/// Optional groups are consumed in wire order, each only while enough bytes
/// remain; a truncated tail leaves the remaining fields `None`. Returns
/// `None` only when the buffer is shorter than the mandatory flags + power
/// lead.
#[must_use]
pub fn read_measurement(data: &[u8]) -> Option<PowerMeasurement> {
    let mut buf = data;
    if buf.remaining() < 4 {
        return None;
    }

    let flags = MeasurementFlags::from_bits_retain(buf.get_u16_le());
    let mut measurement = PowerMeasurement::new(buf.get_i16_le());

    if flags.contains(MeasurementFlags::PEDAL_POWER_BALANCE_PRESENT) && buf.remaining() >= 1 {
        measurement.pedal_power_balance = Some(buf.get_u8());
        measurement.pedal_power_balance_reference =
            Some(flags.contains(MeasurementFlags::PEDAL_POWER_BALANCE_REFERENCE));
    }

    if flags.contains(MeasurementFlags::ACCUMULATED_TORQUE_PRESENT) && buf.remaining() >= 2 {
        measurement.accumulated_torque = Some(buf.get_u16_le());
    }

    if flags.contains(MeasurementFlags::WHEEL_REVOLUTION_DATA_PRESENT) && buf.remaining() >= 6 {
        measurement.cumulative_wheel_revolutions = Some(buf.get_u32_le());
        measurement.last_wheel_event_time = Some(buf.get_u16_le());
    }

    if flags.contains(MeasurementFlags::CRANK_REVOLUTION_DATA_PRESENT) && buf.remaining() >= 4 {
        measurement.cumulative_crank_revolutions = Some(buf.get_u16_le());
        measurement.last_crank_event_time = Some(buf.get_u16_le());
    }

    if flags.contains(MeasurementFlags::EXTREME_FORCE_MAGNITUDES_PRESENT) && buf.remaining() >= 4 {
        measurement.maximum_force_magnitude = Some(buf.get_i16_le());
        measurement.minimum_force_magnitude = Some(buf.get_i16_le());
    }

    if flags.contains(MeasurementFlags::EXTREME_TORQUE_MAGNITUDES_PRESENT) && buf.remaining() >= 4 {
        measurement.maximum_torque_magnitude = Some(buf.get_i16_le());
        measurement.minimum_torque_magnitude = Some(buf.get_i16_le());
    }

    if flags.contains(MeasurementFlags::EXTREME_ANGLES_PRESENT) && buf.remaining() >= 3 {
        // Two 12-bit angles packed into three bytes, minimum first
        let b0 = buf.get_u8();
        let b1 = buf.get_u8();
        let b2 = buf.get_u8();
        measurement.minimum_angle = Some(u16::from(b0) | (u16::from(b1 & 0x0F) << 8));
        measurement.maximum_angle = Some(u16::from(b1 >> 4) | (u16::from(b2) << 4));
    }

    if flags.contains(MeasurementFlags::TOP_DEAD_SPOT_ANGLE_PRESENT) && buf.remaining() >= 2 {
        measurement.top_dead_spot_angle = Some(buf.get_u16_le());
    }

    if flags.contains(MeasurementFlags::BOTTOM_DEAD_SPOT_ANGLE_PRESENT) && buf.remaining() >= 2 {
        measurement.bottom_dead_spot_angle = Some(buf.get_u16_le());
    }

    if flags.contains(MeasurementFlags::ACCUMULATED_ENERGY_PRESENT) && buf.remaining() >= 2 {
        measurement.accumulated_energy = Some(buf.get_u16_le());
    }

    Some(measurement)
}

bitflags! {
    /// Presence flags leading a Cycling Power Vector notification
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VectorFlags: u8 {
        /// Crank revolution data present
        const CRANK_REVOLUTION_DATA_PRESENT = 1 << 0;
        /// First crank measurement angle present
        const FIRST_CRANK_ANGLE_PRESENT = 1 << 1;
        /// Instantaneous force array present
        const INSTANTANEOUS_FORCES_PRESENT = 1 << 2;
        /// Instantaneous torque array present
        const INSTANTANEOUS_TORQUES_PRESENT = 1 << 3;
    }
}

/// Direction of the instantaneous force/torque measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeasurementDirection {
    /// Direction not reported
    #[default]
    Unknown,
    /// Tangential component
    Tangential,
    /// Radial component
    Radial,
    /// Lateral component
    Lateral,
}

impl From<u8> for MeasurementDirection {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Tangential,
            2 => Self::Radial,
            3 => Self::Lateral,
            _ => Self::Unknown,
        }
    }
}

/// Decoded Cycling Power Vector notification
///
/// The force and torque arrays are mutually exclusive on the wire. Sensors
/// seen in the field notify one torque sample at a time, so a single scalar
/// is decoded; the force branch carries no data this crate decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorData {
    /// Direction of the instantaneous measurement (bits 4-5 of the flags)
    pub instantaneous_measurement_direction: MeasurementDirection,
    /// Cumulative crank revolutions
    pub cumulative_crank_revolutions: Option<u16>,
    /// Last crank event time in 1/1024 s ticks
    pub last_crank_event_time: Option<u16>,
    /// Angle of the first measurement in the array, in degrees
    pub first_crank_angle: Option<u16>,
    /// Instantaneous torque sample in newton-meters
    pub instantaneous_torque: Option<f64>,
}

/// Decode a Cycling Power Vector notification
///
/// Returns `None` on an empty buffer.
#[must_use]
pub fn read_vector(data: &[u8]) -> Option<VectorData> {
    let mut buf = data;
    if buf.remaining() < 1 {
        return None;
    }

    let raw_flags = buf.get_u8();
    let flags = VectorFlags::from_bits_retain(raw_flags);

    let mut vector = VectorData {
        instantaneous_measurement_direction: MeasurementDirection::from((raw_flags & 0x30) >> 4),
        cumulative_crank_revolutions: None,
        last_crank_event_time: None,
        first_crank_angle: None,
        instantaneous_torque: None,
    };

    if flags.contains(VectorFlags::CRANK_REVOLUTION_DATA_PRESENT) && buf.remaining() >= 4 {
        vector.cumulative_crank_revolutions = Some(buf.get_u16_le());
        vector.last_crank_event_time = Some(buf.get_u16_le());
    }

    if flags.contains(VectorFlags::FIRST_CRANK_ANGLE_PRESENT) && buf.remaining() >= 2 {
        vector.first_crank_angle = Some(buf.get_u16_le());
    }

    if flags.contains(VectorFlags::INSTANTANEOUS_FORCES_PRESENT) {
        // Force array layout is sensor specific and not decoded
    } else if flags.contains(VectorFlags::INSTANTANEOUS_TORQUES_PRESENT) && buf.remaining() >= 2 {
        vector.instantaneous_torque = Some(f64::from(buf.get_i16_le()) / 32.0);
    }

    Some(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_features_zero_padded() {
        assert_eq!(read_features(&[]), Features::empty());
        let features = read_features(&[0x05]);
        assert!(features.contains(Features::PEDAL_POWER_BALANCE));
        assert!(features.contains(Features::WHEEL_REVOLUTION_DATA));
        assert!(!features.contains(Features::ACCUMULATED_TORQUE));
    }

    #[test]
    fn test_read_features_preserves_unknown_bits() {
        let features = read_features(&[0x00, 0x00, 0x00, 0x80]);
        assert_eq!(features.bits(), 0x8000_0000);
    }

    #[test]
    fn test_power_only_measurement() {
        let data = [0x00, 0x00, 0xC8, 0x00];
        let measurement = read_measurement(&data).unwrap();
        assert_eq!(measurement.instantaneous_power, 200);
        assert!(measurement.pedal_power_balance.is_none());
        assert!(measurement.cumulative_wheel_revolutions.is_none());
    }

    #[test]
    fn test_wheel_group_only() {
        // Flags with only bit 4 set, power, then u32 revolutions + u16 event time
        let mut data = vec![0x10, 0x00, 0x2C, 0x01];
        data.extend_from_slice(&1000u32.to_le_bytes());
        data.extend_from_slice(&2048u16.to_le_bytes());

        let measurement = read_measurement(&data).unwrap();
        assert_eq!(measurement.instantaneous_power, 300);
        assert_eq!(measurement.cumulative_wheel_revolutions, Some(1000));
        assert_eq!(measurement.last_wheel_event_time, Some(2048));
        assert!(measurement.pedal_power_balance.is_none());
        assert!(measurement.cumulative_crank_revolutions.is_none());
        assert!(measurement.accumulated_torque.is_none());
        assert!(measurement.accumulated_energy.is_none());
    }

    #[test]
    fn test_truncated_tail_leaves_fields_absent() {
        // Wheel and crank flags set but only the wheel group fits
        let mut data = vec![0x30, 0x00, 0x2C, 0x01];
        data.extend_from_slice(&1000u32.to_le_bytes());
        data.extend_from_slice(&2048u16.to_le_bytes());
        data.push(0x07); // one stray byte, not enough for the crank group

        let measurement = read_measurement(&data).unwrap();
        assert_eq!(measurement.cumulative_wheel_revolutions, Some(1000));
        assert!(measurement.cumulative_crank_revolutions.is_none());
        assert!(measurement.last_crank_event_time.is_none());
    }

    #[test]
    fn test_mandatory_lead_required() {
        assert!(read_measurement(&[0x00, 0x00, 0xC8]).is_none());
        assert!(read_measurement(&[]).is_none());
    }

    #[test]
    fn test_extreme_angles_packed_pair() {
        // min = 0x123, max = 0x456 packed little-endian into 3 bytes
        let data = [0x00, 0x01, 0x00, 0x00, 0x23, 0x61, 0x45];
        let measurement = read_measurement(&data).unwrap();
        assert_eq!(measurement.minimum_angle, Some(0x123));
        assert_eq!(measurement.maximum_angle, Some(0x456));
    }

    #[test]
    fn test_pedal_balance_reference_from_flags() {
        let data = [0x03, 0x00, 0x64, 0x00, 0x32];
        let measurement = read_measurement(&data).unwrap();
        assert_eq!(measurement.pedal_power_balance, Some(0x32));
        assert_eq!(measurement.pedal_power_balance_reference, Some(true));
    }

    #[test]
    fn test_read_vector_torque_scalar() {
        // Crank data + torque array flags, direction = radial (bits 4-5 = 2)
        let mut data = vec![0x09 | 0x20];
        data.extend_from_slice(&100u16.to_le_bytes());
        data.extend_from_slice(&512u16.to_le_bytes());
        data.extend_from_slice(&64i16.to_le_bytes());

        let vector = read_vector(&data).unwrap();
        assert_eq!(
            vector.instantaneous_measurement_direction,
            MeasurementDirection::Radial
        );
        assert_eq!(vector.cumulative_crank_revolutions, Some(100));
        assert_eq!(vector.last_crank_event_time, Some(512));
        assert_eq!(vector.instantaneous_torque, Some(2.0));
    }

    #[test]
    fn test_read_vector_force_branch_undecoded() {
        let data = [0x04, 0x01, 0x02, 0x03, 0x04];
        let vector = read_vector(&data).unwrap();
        assert!(vector.instantaneous_torque.is_none());
    }

    #[test]
    fn test_read_vector_empty() {
        assert!(read_vector(&[]).is_none());
    }
}
