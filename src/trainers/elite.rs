use uuid::Uuid;

/// Elite trainer service UUID
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x347B_0001_7635_408B_8918_8FF3_949C_E592);

/// Elite control point characteristic UUID
pub const CONTROL_POINT_UUID: Uuid = Uuid::from_u128(0x347B_0010_7635_408B_8918_8FF3_949C_E592);

/// Elite out-of-range characteristic UUID
pub const OUT_OF_RANGE_UUID: Uuid = Uuid::from_u128(0x347B_0011_7635_408B_8918_8FF3_949C_E592);

/// Maximum target power the brake accepts, in watts
pub const MAX_TARGET_POWER: u16 = 4000;

/// Build a target power command (opcode 0x00), clamped to
/// [`MAX_TARGET_POWER`]
#[must_use]
pub fn set_target_power(watts: u16) -> Vec<u8> {
    let clamped = watts.min(MAX_TARGET_POWER);
    let mut command = vec![0x00];
    command.extend_from_slice(&clamped.to_le_bytes());
    command
}

/// Build a brake level command (opcode 0x01) from a fraction `0.0..=1.0`
#[must_use]
pub fn set_brake_level(level: f64) -> Vec<u8> {
    let normalized = (level.clamp(0.0, 1.0) * 200.0).round() as u8;
    vec![0x01, normalized]
}

/// Read the out-of-range notification: `Some(true)` when the rider's power
/// target can no longer be matched at the current speed
#[must_use]
pub fn read_out_of_range(data: &[u8]) -> Option<bool> {
    data.first().map(|&byte| byte as i8 == -1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_power_clamped() {
        assert_eq!(set_target_power(250), vec![0x00, 0xFA, 0x00]);
        assert_eq!(set_target_power(9000), vec![0x00, 0xA0, 0x0F]);
    }

    #[test]
    fn test_brake_level() {
        assert_eq!(set_brake_level(0.0), vec![0x01, 0]);
        assert_eq!(set_brake_level(0.5), vec![0x01, 100]);
        assert_eq!(set_brake_level(1.5), vec![0x01, 200]);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(read_out_of_range(&[0xFF]), Some(true));
        assert_eq!(read_out_of_range(&[0x00]), Some(false));
        assert_eq!(read_out_of_range(&[]), None);
    }
}
