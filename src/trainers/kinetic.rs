use bytes::Buf;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinetic Smart Control service UUID
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0xE941_0300_B434_446B_B5CC_3659_2FC4_C724);

/// Configuration characteristic UUID
pub const CONFIG_UUID: Uuid = Uuid::from_u128(0xE941_0301_B434_446B_B5CC_3659_2FC4_C724);

/// Control point characteristic UUID
pub const CONTROL_POINT_UUID: Uuid = Uuid::from_u128(0xE941_0302_B434_446B_B5CC_3659_2FC4_C724);

/// Debug data characteristic UUID
pub const DEBUG_UUID: Uuid = Uuid::from_u128(0xE941_0303_B434_446B_B5CC_3659_2FC4_C724);

/// System weight characteristic UUID
pub const SYSTEM_WEIGHT_UUID: Uuid = Uuid::from_u128(0xE941_0304_B434_446B_B5CC_3659_2FC4_C724);

/// Sensor configuration snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KineticConfig {
    /// System status word
    pub system_status: u16,
    /// Calibration state byte
    pub calibration_state: u8,
    /// Last spindown duration in milliseconds
    pub spindown_time: u16,
    /// Firmware update state byte
    pub firmware_update_state: u8,
    /// BLE firmware revision
    pub ble_revision: u8,
    /// Anti-rattle ramp setting
    pub antirattle_ramp: u8,
}

/// Decode the configuration characteristic, `None` if shorter than 8 bytes
#[must_use]
pub fn read_config(data: &[u8]) -> Option<KineticConfig> {
    let mut buf = data;
    if buf.remaining() < 8 {
        return None;
    }
    Some(KineticConfig {
        system_status: buf.get_u16_le(),
        calibration_state: buf.get_u8(),
        spindown_time: buf.get_u16_le(),
        firmware_update_state: buf.get_u8(),
        ble_revision: buf.get_u8(),
        antirattle_ramp: buf.get_u8(),
    })
}

/// Control point acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KineticControlResponse {
    /// Echoed request code
    pub request_code: u8,
    /// Result byte
    pub result: u8,
}

/// Decode a control point response, `None` if shorter than 3 bytes
#[must_use]
pub fn read_control_point_response(data: &[u8]) -> Option<KineticControlResponse> {
    if data.len() < 3 {
        return None;
    }
    Some(KineticControlResponse {
        request_code: data[1],
        result: data[2],
    })
}

/// Resistance mode the brake is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum KineticMode {
    #[default]
    Erg = 0,
    Position = 1,
    Simulation = 2,
}

impl KineticMode {
    /// Convert from the wire byte, falling back to ERG like the sensor does
    #[must_use]
    pub const fn from_raw(value: u8) -> Self {
        match value {
            1 => Self::Position,
            2 => Self::Simulation,
            _ => Self::Erg,
        }
    }
}

/// Debug channel snapshot of the brake's internal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KineticDebugData {
    /// Resistance mode
    pub mode: KineticMode,
    /// Commanded resistance
    pub target_resistance: u16,
    /// Measured resistance
    pub actual_resistance: u16,
    /// Commanded magnet position
    pub target_position: u16,
    /// Measured magnet position
    pub actual_position: u16,
    /// Raw temperature sensor reading
    pub temp_sensor_val: i16,
    /// Die temperature reading
    pub temp_die_val: i16,
    /// Calculated temperature
    pub temp_calculated: u16,
    /// Homing accuracy
    pub home_accuracy: i16,
    /// BLE firmware build number
    pub ble_build: u8,
}

/// Decode the debug characteristic, `None` if shorter than 18 bytes
#[must_use]
pub fn read_debug_data(data: &[u8]) -> Option<KineticDebugData> {
    let mut buf = data;
    if buf.remaining() < 18 {
        return None;
    }
    Some(KineticDebugData {
        mode: KineticMode::from_raw(buf.get_u8()),
        target_resistance: buf.get_u16_le(),
        actual_resistance: buf.get_u16_le(),
        target_position: buf.get_u16_le(),
        actual_position: buf.get_u16_le(),
        temp_sensor_val: buf.get_i16_le(),
        temp_die_val: buf.get_i16_le(),
        temp_calculated: buf.get_u16_le(),
        home_accuracy: buf.get_i16_le(),
        ble_build: buf.get_u8(),
    })
}

/// Read the system weight characteristic (kilograms)
#[must_use]
pub fn read_system_weight(data: &[u8]) -> Option<u8> {
    data.first().copied()
}

/// Build the control point command that renames the sensor
#[must_use]
pub fn set_device_name(name: &str) -> Vec<u8> {
    let mut command = vec![0x09];
    command.extend_from_slice(name.as_bytes());
    command
}

// USB control/debug channel framing

/// Frame delimiter on the USB serial channel
pub const USB_DELIMITER: u8 = 0xE5;
/// Escape byte; the following byte is XORed with [`USB_ESCAPE_XOR`]
pub const USB_ESCAPE: u8 = 0xE6;
/// XOR mask applied to escaped bytes
pub const USB_ESCAPE_XOR: u8 = 0x80;

/// Longest de-escaped frame accepted before the scanner resynchronizes
pub const USB_MAX_FRAME: usize = 24;

/// A de-escaped, CRC-verified USB frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbPacket {
    /// Endpoint identifier
    pub id: u16,
    /// Request type bits (bit 0 read, bit 1 write)
    pub type_flags: u8,
    /// Frame payload
    pub payload: Vec<u8>,
}

impl UsbPacket {
    /// Whether the read bit is set
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.type_flags & 0x01 != 0
    }

    /// Whether the write bit is set
    #[must_use]
    pub const fn is_write(&self) -> bool {
        self.type_flags & 0x02 != 0
    }
}

const CRC8_TABLE: [u8; 256] = [
    0x00, 0x91, 0xe3, 0x72, 0x07, 0x96, 0xe4, 0x75, 0x0e, 0x9f, 0xed, 0x7c, 0x09, 0x98, 0xea,
    0x7b, 0x1c, 0x8d, 0xff, 0x6e, 0x1b, 0x8a, 0xf8, 0x69, 0x12, 0x83, 0xf1, 0x60, 0x15, 0x84,
    0xf6, 0x67, 0x38, 0xa9, 0xdb, 0x4a, 0x3f, 0xae, 0xdc, 0x4d, 0x36, 0xa7, 0xd5, 0x44, 0x31,
    0xa0, 0xd2, 0x43, 0x24, 0xb5, 0xc7, 0x56, 0x23, 0xb2, 0xc0, 0x51, 0x2a, 0xbb, 0xc9, 0x58,
    0x2d, 0xbc, 0xce, 0x5f, 0x70, 0xe1, 0x93, 0x02, 0x77, 0xe6, 0x94, 0x05, 0x7e, 0xef, 0x9d,
    0x0c, 0x79, 0xe8, 0x9a, 0x0b, 0x6c, 0xfd, 0x8f, 0x1e, 0x6b, 0xfa, 0x88, 0x19, 0x62, 0xf3,
    0x81, 0x10, 0x65, 0xf4, 0x86, 0x17, 0x48, 0xd9, 0xab, 0x3a, 0x4f, 0xde, 0xac, 0x3d, 0x46,
    0xd7, 0xa5, 0x34, 0x41, 0xd0, 0xa2, 0x33, 0x54, 0xc5, 0xb7, 0x26, 0x53, 0xc2, 0xb0, 0x21,
    0x5a, 0xcb, 0xb9, 0x28, 0x5d, 0xcc, 0xbe, 0x2f, 0xe0, 0x71, 0x03, 0x92, 0xe7, 0x76, 0x04,
    0x95, 0xee, 0x7f, 0x0d, 0x9c, 0xe9, 0x78, 0x0a, 0x9b, 0xfc, 0x6d, 0x1f, 0x8e, 0xfb, 0x6a,
    0x18, 0x89, 0xf2, 0x63, 0x11, 0x80, 0xf5, 0x64, 0x16, 0x87, 0xd8, 0x49, 0x3b, 0xaa, 0xdf,
    0x4e, 0x3c, 0xad, 0xd6, 0x47, 0x35, 0xa4, 0xd1, 0x40, 0x32, 0xa3, 0xc4, 0x55, 0x27, 0xb6,
    0xc3, 0x52, 0x20, 0xb1, 0xca, 0x5b, 0x29, 0xb8, 0xcd, 0x5c, 0x2e, 0xbf, 0x90, 0x01, 0x73,
    0xe2, 0x97, 0x06, 0x74, 0xe5, 0x9e, 0x0f, 0x7d, 0xec, 0x99, 0x08, 0x7a, 0xeb, 0x8c, 0x1d,
    0x6f, 0xfe, 0x8b, 0x1a, 0x68, 0xf9, 0x82, 0x13, 0x61, 0xf0, 0x85, 0x14, 0x66, 0xf7, 0xa8,
    0x39, 0x4b, 0xda, 0xaf, 0x3e, 0x4c, 0xdd, 0xa6, 0x37, 0x45, 0xd4, 0xa1, 0x30, 0x42, 0xd3,
    0xb4, 0x25, 0x57, 0xc6, 0xb3, 0x22, 0x50, 0xc1, 0xba, 0x2b, 0x59, 0xc8, 0xbd, 0x2c, 0x5e,
    0xcf,
];

fn hash8_with_seed(seed: u8, buffer: &[u8]) -> u8 {
    let mut hash = seed;
    for &byte in buffer {
        hash = CRC8_TABLE[usize::from(hash ^ byte)];
    }
    hash
}

fn crc8_with_seed(crc: u8, buffer: &[u8]) -> u8 {
    hash8_with_seed(crc ^ 0xFF, buffer) ^ 0xFF
}

/// Build an escaped, delimited USB request frame
///
/// Layout before escaping: identifier (LE u16), type byte (bit 0 read,
/// bit 1 write), payload, CRC-8 over everything preceding it.
#[must_use]
pub fn encode_frame(id: u16, read: bool, write: bool, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.extend_from_slice(&id.to_le_bytes());
    let mut type_byte = 0x00;
    if read {
        type_byte |= 0x01;
    }
    if write {
        type_byte |= 0x02;
    }
    frame.push(type_byte);
    frame.extend_from_slice(payload);
    frame.push(crc8_with_seed(0, &frame));

    let mut escaped = Vec::with_capacity(frame.len() + 2);
    escaped.push(USB_DELIMITER);
    for byte in frame {
        if byte == USB_DELIMITER || byte == USB_ESCAPE {
            escaped.push(USB_ESCAPE);
            escaped.push(byte ^ USB_ESCAPE_XOR);
        } else {
            escaped.push(byte);
        }
    }
    escaped.push(USB_DELIMITER);
    escaped
}

/// Scan a byte stream for delimiter-bounded, CRC-valid frames
///
/// Corrupt or truncated runs are dropped silently; a run that grows past
/// [`USB_MAX_FRAME`] without a delimiter causes the scanner to skip forward
/// to the next delimiter.
#[must_use]
pub fn decode_stream(data: &[u8]) -> Vec<UsbPacket> {
    let mut packets = Vec::new();
    let mut frame: Vec<u8> = Vec::new();
    let mut escaped = false;

    let mut index = 0;
    while index < data.len() {
        if frame.len() > USB_MAX_FRAME {
            frame.clear();
            escaped = false;
            while index < data.len() && data[index] != USB_DELIMITER {
                index += 1;
            }
            continue;
        }

        let byte = data[index];
        if escaped {
            frame.push(byte ^ USB_ESCAPE_XOR);
            escaped = false;
        } else {
            match byte {
                USB_DELIMITER => {
                    if frame.len() >= 4 {
                        let (body, crc) = frame.split_at(frame.len() - 1);
                        if crc8_with_seed(0, body) == crc[0] {
                            packets.push(UsbPacket {
                                id: u16::from_le_bytes([body[0], body[1]]),
                                type_flags: body[2],
                                payload: body[3..].to_vec(),
                            });
                        }
                    }
                    frame.clear();
                }
                USB_ESCAPE => escaped = true,
                _ => frame.push(byte),
            }
        }
        index += 1;
    }
    packets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_config() {
        let data = [0x01, 0x00, 0x02, 0x10, 0x27, 0x00, 0x05, 0x03];
        let config = read_config(&data).unwrap();
        assert_eq!(config.system_status, 1);
        assert_eq!(config.calibration_state, 2);
        assert_eq!(config.spindown_time, 10000);
        assert_eq!(config.ble_revision, 5);
        assert_eq!(config.antirattle_ramp, 3);

        assert!(read_config(&data[..7]).is_none());
    }

    #[test]
    fn test_read_control_point_response() {
        let response = read_control_point_response(&[0x00, 0x04, 0x01]).unwrap();
        assert_eq!(response.request_code, 0x04);
        assert_eq!(response.result, 0x01);
        assert!(read_control_point_response(&[0x00, 0x04]).is_none());
    }

    #[test]
    fn test_read_debug_data() {
        let mut data = vec![0x02];
        for value in [100u16, 98, 500, 498, 300, 310, 28] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&(-2i16).to_le_bytes());
        data.push(42);

        let debug = read_debug_data(&data).unwrap();
        assert_eq!(debug.mode, KineticMode::Simulation);
        assert_eq!(debug.target_resistance, 100);
        assert_eq!(debug.actual_position, 498);
        assert_eq!(debug.home_accuracy, -2);
        assert_eq!(debug.ble_build, 42);
    }

    #[test]
    fn test_set_device_name() {
        assert_eq!(set_device_name("KK"), vec![0x09, b'K', b'K']);
    }

    #[test]
    fn test_usb_frame_round_trip() {
        let encoded = encode_frame(0x0102, true, false, &[0x10, 0x20, 0x30]);
        assert_eq!(encoded[0], USB_DELIMITER);
        assert_eq!(*encoded.last().unwrap(), USB_DELIMITER);

        let packets = decode_stream(&encoded);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id, 0x0102);
        assert!(packets[0].is_read());
        assert!(!packets[0].is_write());
        assert_eq!(packets[0].payload, vec![0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_usb_escaping_of_reserved_bytes() {
        // Identifier bytes collide with the delimiter and escape values
        let encoded = encode_frame(0xE6E5, false, true, &[0xE5]);
        // Interior bytes must never contain a bare delimiter
        assert!(!encoded[1..encoded.len() - 1].contains(&USB_DELIMITER));

        let packets = decode_stream(&encoded);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id, 0xE6E5);
        assert!(packets[0].is_write());
        assert_eq!(packets[0].payload, vec![0xE5]);
    }

    #[test]
    fn test_single_bit_corruption_never_accepted() {
        let original = UsbPacket {
            id: 0x0102,
            type_flags: 0x01,
            payload: vec![0x10, 0x20, 0x30, 0x40],
        };
        let encoded = encode_frame(0x0102, true, false, &[0x10, 0x20, 0x30, 0x40]);

        for index in 1..encoded.len() - 1 {
            for bit in 0..8 {
                let mut corrupted = encoded.clone();
                corrupted[index] ^= 1 << bit;
                let packets = decode_stream(&corrupted);
                assert!(
                    !packets.contains(&original),
                    "corrupted frame decoded as the original (byte {index}, bit {bit})"
                );
            }
        }
    }

    #[test]
    fn test_corrupted_payload_yields_no_packets() {
        let mut encoded = encode_frame(0x0102, true, false, &[0x10, 0x20, 0x30, 0x40]);
        // Corrupt a payload byte without creating a delimiter or escape
        encoded[5] ^= 0x01;
        assert!(decode_stream(&encoded).is_empty());
    }

    #[test]
    fn test_stream_resynchronization() {
        // A long delimiter-free run of garbage, then a valid frame
        let mut stream = vec![0xAA; 40];
        stream.extend_from_slice(&encode_frame(0x0304, false, true, &[0x01, 0x02, 0x03, 0x04]));

        let packets = decode_stream(&stream);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id, 0x0304);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut stream = encode_frame(0x0001, true, false, &[0x11, 0x22, 0x33, 0x44]);
        stream.extend_from_slice(&encode_frame(0x0002, false, true, &[0x55, 0x66, 0x77, 0x88]));

        let packets = decode_stream(&stream);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].id, 0x0001);
        assert_eq!(packets[1].id, 0x0002);
    }
}
