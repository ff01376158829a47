use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JetBlack trainer service UUID
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0xC463_0001_003F_4CEC_8994_E489_B04D_857E);

/// Slow-change page characteristic UUID (trainer configuration state)
pub const SLOW_CHANGE_UUID: Uuid = Uuid::from_u128(0xC463_2B01_003F_4CEC_8994_E489_B04D_857E);

/// Fast-change page characteristic UUID (live ride data)
pub const FAST_CHANGE_UUID: Uuid = Uuid::from_u128(0xC463_2B02_003F_4CEC_8994_E489_B04D_857E);

/// Page length: JetBlack moves ANT+ FE-C style pages over GATT, 0xFF padded
pub const PAGE_SIZE: usize = 20;

/// Live ride data from the fast-change page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FastChangeData {
    /// Speed in 0.001 m/s units
    pub speed: Option<u16>,
    /// Cadence in rpm
    pub cadence: Option<u8>,
    /// Instantaneous power in watts
    pub power: Option<u16>,
}

/// Configuration state from the slow-change page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlowChangeData {
    /// Target power in watts
    pub target_power: Option<u16>,
    /// Configured rider weight in 0.01 kg units
    pub user_weight: Option<u16>,
}

fn page_with(fields: &[(usize, u16)]) -> Vec<u8> {
    let mut page = vec![0xFF; PAGE_SIZE];
    for &(offset, value) in fields {
        page[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }
    page
}

/// Build the target power page
#[must_use]
pub fn set_target_power(watts: u16) -> Vec<u8> {
    page_with(&[(2, watts)])
}

/// Build the rider weight page (0.01 kg units)
#[must_use]
pub fn set_rider_weight(weight: u16) -> Vec<u8> {
    page_with(&[(5, weight)])
}

/// Decode a fast-change page; fields past the end of a short notification
/// stay `None`
#[must_use]
pub fn read_fast_change(data: &[u8]) -> FastChangeData {
    let mut fast = FastChangeData::default();
    if data.len() >= 4 {
        fast.speed = Some(u16::from_le_bytes([data[2], data[3]]));
    }
    if data.len() >= 5 {
        fast.cadence = Some(data[4]);
    }
    if data.len() >= 7 {
        fast.power = Some(u16::from_le_bytes([data[5], data[6]]));
    }
    fast
}

/// Decode a slow-change page
#[must_use]
pub fn read_slow_change(data: &[u8]) -> SlowChangeData {
    let mut slow = SlowChangeData::default();
    if data.len() >= 4 {
        slow.target_power = Some(u16::from_le_bytes([data[2], data[3]]));
    }
    if data.len() >= 7 {
        slow.user_weight = Some(u16::from_le_bytes([data[5], data[6]]));
    }
    slow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_power_page() {
        let page = set_target_power(250);
        assert_eq!(page.len(), PAGE_SIZE);
        assert_eq!(&page[2..4], &250u16.to_le_bytes());
        assert!(page[4..].iter().all(|&byte| byte == 0xFF));
        assert_eq!(&page[..2], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_rider_weight_page() {
        let page = set_rider_weight(7500);
        assert_eq!(&page[5..7], &7500u16.to_le_bytes());
    }

    #[test]
    fn test_fast_change_offsets() {
        let mut data = vec![0x00; PAGE_SIZE];
        data[2..4].copy_from_slice(&5556u16.to_le_bytes());
        data[4] = 92;
        data[5..7].copy_from_slice(&245u16.to_le_bytes());

        let fast = read_fast_change(&data);
        assert_eq!(fast.speed, Some(5556));
        assert_eq!(fast.cadence, Some(92));
        assert_eq!(fast.power, Some(245));
    }

    #[test]
    fn test_truncated_pages() {
        let fast = read_fast_change(&[0x00, 0x00, 0x10, 0x00, 0x5A]);
        assert_eq!(fast.cadence, Some(0x5A));
        assert!(fast.power.is_none());

        let slow = read_slow_change(&[]);
        assert!(slow.target_power.is_none());
        assert!(slow.user_weight.is_none());
    }
}
