use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tacx FE-C bridge service UUID
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x6E40_FEC1_B5A3_F393_E0A9_E50E_24DC_CA9E);

/// FE-C read characteristic UUID (trainer to app)
pub const FEC_READ_UUID: Uuid = Uuid::from_u128(0x6E40_FEC2_B5A3_F393_E0A9_E50E_24DC_CA9E);

/// FE-C write characteristic UUID (app to trainer)
pub const FEC_WRITE_UUID: Uuid = Uuid::from_u128(0x6E40_FEC3_B5A3_F393_E0A9_E50E_24DC_CA9E);

/// ANT frame sync byte
pub const SYNC_BYTE: u8 = 0xA4;

/// ANT acknowledged-data message type used for outbound commands
pub const MSG_ACKNOWLEDGED_DATA: u8 = 0x4F;

/// Channel the bridge runs the trainer on
pub const DEFAULT_CHANNEL: u8 = 0x05;

/// ANT+ FE-C data page numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum FecPageType {
    CalibrationCommand = 1,
    CalibrationStatus = 2,
    GeneralFe = 16,
    GeneralSettings = 17,
    TrainerData = 25,
    BasicResistance = 48,
    TargetPower = 49,
    WindResistance = 50,
    TrackResistance = 51,
    FeCapabilities = 54,
    UserConfiguration = 55,
    RequestData = 70,
    CommandStatus = 71,
    ManufacturerData = 80,
    ProductInformation = 81,
}

impl FecPageType {
    /// Convert from the wire byte
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::CalibrationCommand),
            2 => Some(Self::CalibrationStatus),
            16 => Some(Self::GeneralFe),
            17 => Some(Self::GeneralSettings),
            25 => Some(Self::TrainerData),
            48 => Some(Self::BasicResistance),
            49 => Some(Self::TargetPower),
            50 => Some(Self::WindResistance),
            51 => Some(Self::TrackResistance),
            54 => Some(Self::FeCapabilities),
            55 => Some(Self::UserConfiguration),
            70 => Some(Self::RequestData),
            71 => Some(Self::CommandStatus),
            80 => Some(Self::ManufacturerData),
            81 => Some(Self::ProductInformation),
            _ => None,
        }
    }
}

/// A validated FE-C frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FecPacket {
    /// Data page carried by the frame
    pub page: FecPageType,
    /// ANT channel number
    pub channel: u8,
    /// Page payload (the bytes after the page number)
    pub payload: Vec<u8>,
}

fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |checksum, &byte| checksum ^ byte)
}

/// Validate and slice a frame from the FE-C read characteristic
///
/// Accepts only a frame with the sync byte, a declared length that fits the
/// buffer, a recognized page number and a matching XOR checksum over every
/// byte before the trailing checksum; anything else is `None`.
#[must_use]
pub fn identify_packet(data: &[u8]) -> Option<FecPacket> {
    if data.len() < 5 || data[0] != SYNC_BYTE {
        return None;
    }

    let message_length = usize::from(data[1]);
    let frame_length = message_length + 4;
    if message_length < 2 || data.len() < frame_length {
        return None;
    }

    let checksum = data[frame_length - 1];
    if xor_checksum(&data[..frame_length - 1]) != checksum {
        return None;
    }

    let page = FecPageType::from_raw(data[4])?;
    Some(FecPacket {
        page,
        channel: data[3],
        payload: data[5..frame_length - 1].to_vec(),
    })
}

/// Frame a page for the FE-C write characteristic
///
/// Prepends the `[sync, length, message type]` header and appends the XOR
/// checksum over all preceding bytes, so
/// [`identify_packet`]`(`[`build_command`]`(..))` recovers the inputs.
#[must_use]
pub fn build_command(page: FecPageType, channel: u8, payload: &[u8]) -> Vec<u8> {
    let message_length = (payload.len() + 2) as u8;
    let mut packet = vec![SYNC_BYTE, message_length, MSG_ACKNOWLEDGED_DATA, channel, page as u8];
    packet.extend_from_slice(payload);
    packet.push(xor_checksum(&packet));
    packet
}

/// Spindown/zero-offset result from a calibration response page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Whether the spindown calibration completed successfully
    pub spindown_success: bool,
}

/// Read a calibration response page payload
#[must_use]
pub fn read_calibration_response(payload: &[u8]) -> Option<CalibrationResult> {
    Some(CalibrationResult {
        spindown_success: payload.first()? & 0x01 == 0x01,
    })
}

fn u8_field(value: f64) -> u8 {
    value.round().clamp(0.0, f64::from(u8::MAX)) as u8
}

/// Start a calibration procedure (page 1)
#[must_use]
pub fn start_calibration(spindown: bool, zero_offset: bool) -> Vec<u8> {
    let mode = (u8::from(spindown) << 7) | (u8::from(zero_offset) << 6);
    let payload = [mode, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
    build_command(FecPageType::CalibrationCommand, DEFAULT_CHANNEL, &payload)
}

/// Set basic resistance (page 48) from a fraction `0.0..=1.0` of full scale
#[must_use]
pub fn basic_resistance(percent: f64) -> Vec<u8> {
    let resistance = u8_field(percent * 50.0);
    let payload = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, resistance];
    build_command(FecPageType::BasicResistance, DEFAULT_CHANNEL, &payload)
}

/// Set a target power (page 49), encoded in 0.25 W units
#[must_use]
pub fn target_power(watts: i16) -> Vec<u8> {
    let target = watts.saturating_mul(4);
    let bytes = target.to_le_bytes();
    let payload = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, bytes[0], bytes[1]];
    build_command(FecPageType::TargetPower, DEFAULT_CHANNEL, &payload)
}

/// Set wind resistance (page 50)
///
/// `cwr_kg_m` at 0.01 kg/m resolution, wind speed offset by +127 km/h,
/// drafting factor at 0.01 resolution.
#[must_use]
pub fn wind_resistance(cwr_kg_m: f64, wind_speed_kph: f64, drafting_factor: f64) -> Vec<u8> {
    let cwr = u8_field(cwr_kg_m / 0.01);
    let wind = u8_field(wind_speed_kph + 127.0);
    let drafting = u8_field(drafting_factor / 0.01);
    let payload = [0xFF, 0xFF, 0xFF, 0xFF, cwr, wind, drafting];
    build_command(FecPageType::WindResistance, DEFAULT_CHANNEL, &payload)
}

/// Set track resistance (page 51)
///
/// Grade is offset binary (+200 %) at 0.01 % resolution, rolling resistance
/// coefficient at 5e-5 resolution.
#[must_use]
pub fn track_resistance(grade_percent: f64, crr: f64) -> Vec<u8> {
    let grade = ((grade_percent.clamp(-200.0, 200.0) + 200.0) * 100.0).round() as u16;
    let crr_n = u8_field(crr / 5e-5);
    let grade_bytes = grade.to_le_bytes();
    let payload = [0xFF, 0xFF, 0xFF, 0xFF, grade_bytes[0], grade_bytes[1], crr_n];
    build_command(FecPageType::TrackResistance, DEFAULT_CHANNEL, &payload)
}

/// Request a specific data page (page 70)
#[must_use]
pub fn page_request(page: u8) -> Vec<u8> {
    let payload = [0xFF, 0xFF, 0xFF, 0xFF, page, 0x01];
    build_command(FecPageType::RequestData, DEFAULT_CHANNEL, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip() {
        let payload = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let frame = build_command(FecPageType::TrainerData, 0x02, &payload);

        let packet = identify_packet(&frame).unwrap();
        assert_eq!(packet.page, FecPageType::TrainerData);
        assert_eq!(packet.channel, 0x02);
        assert_eq!(packet.payload, payload);
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let mut frame = target_power(200);
        let last = frame.len() - 2;
        frame[last] ^= 0x40;
        assert!(identify_packet(&frame).is_none());
    }

    #[test]
    fn test_truncated_and_malformed_frames_rejected() {
        let frame = target_power(200);
        // Truncated below the declared length
        assert!(identify_packet(&frame[..frame.len() - 2]).is_none());
        // Wrong sync byte
        let mut desynced = frame.clone();
        desynced[0] = 0xA5;
        assert!(identify_packet(&desynced).is_none());
        // Too short to hold a header at all
        assert!(identify_packet(&[0xA4, 0x02, 0x4F]).is_none());
    }

    #[test]
    fn test_unknown_page_rejected() {
        let mut frame = build_command(FecPageType::GeneralFe, DEFAULT_CHANNEL, &[0x00; 7]);
        frame[4] = 0x63;
        let length = frame.len();
        frame[length - 1] = super::xor_checksum(&frame[..length - 1]);
        assert!(identify_packet(&frame).is_none());
    }

    #[test]
    fn test_target_power_quarter_watt_units() {
        let frame = target_power(250);
        assert_eq!(frame[0], SYNC_BYTE);
        assert_eq!(frame[1], 9);
        assert_eq!(frame[2], MSG_ACKNOWLEDGED_DATA);
        assert_eq!(frame[3], DEFAULT_CHANNEL);
        assert_eq!(frame[4], FecPageType::TargetPower as u8);
        assert_eq!(&frame[10..12], &1000i16.to_le_bytes());
    }

    #[test]
    fn test_track_resistance_offset_binary_grade() {
        let frame = track_resistance(1.5, 0.004);
        // (1.5 + 200) * 100 = 20150
        assert_eq!(&frame[9..11], &20150u16.to_le_bytes());
        assert_eq!(frame[11], 80); // 0.004 / 5e-5
    }

    #[test]
    fn test_start_calibration_mode_bits() {
        let spindown = start_calibration(true, false);
        assert_eq!(spindown[5], 0x80);
        let both = start_calibration(true, true);
        assert_eq!(both[5], 0xC0);
    }

    #[test]
    fn test_calibration_response() {
        assert_eq!(
            read_calibration_response(&[0x01]),
            Some(CalibrationResult {
                spindown_success: true
            })
        );
        assert_eq!(
            read_calibration_response(&[0x00]),
            Some(CalibrationResult {
                spindown_success: false
            })
        );
        assert_eq!(read_calibration_response(&[]), None);
    }
}
