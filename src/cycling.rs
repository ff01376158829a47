use serde::{Deserialize, Serialize};

/// Wheel event time resolution for Cycling Speed/Cadence sensors (ticks per second)
pub const CSC_WHEEL_TIME_RESOLUTION: u32 = 1024;

/// Wheel event time resolution for Cycling Power sensors (ticks per second)
pub const POWER_WHEEL_TIME_RESOLUTION: u32 = 2048;

/// Crank event time resolution shared by both sensor families (ticks per second)
pub const CRANK_TIME_RESOLUTION: u32 = 1024;

/// Access to the rolling wheel/crank counters shared by cycling measurement records
///
/// Cycling Power and Cycling Speed/Cadence measurements both carry the same
/// cumulative-revolutions / last-event-time counter pairs; the derived-metric
/// functions only need these four accessors.
pub trait CyclingMeasurement {
    /// Cumulative wheel revolutions (wraps at `u32::MAX`)
    fn cumulative_wheel_revolutions(&self) -> Option<u32>;
    /// Last wheel event time in sensor ticks (wraps at `u16::MAX`)
    fn last_wheel_event_time(&self) -> Option<u16>;
    /// Cumulative crank revolutions (wraps at `u16::MAX`)
    fn cumulative_crank_revolutions(&self) -> Option<u16>;
    /// Last crank event time in 1/1024 s ticks (wraps at `u16::MAX`)
    fn last_crank_event_time(&self) -> Option<u16>;
}

/// Mounting location reported by a cycling sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum SensorLocation {
    Other = 0,
    TopOfShoe = 1,
    InShoe = 2,
    Hip = 3,
    FrontWheel = 4,
    LeftCrank = 5,
    RightCrank = 6,
    LeftPedal = 7,
    RightPedal = 8,
    FrontHub = 9,
    RearDropout = 10,
    Chainstay = 11,
    RearWheel = 12,
    RearHub = 13,
    Chest = 14,
    Spider = 15,
    ChainRing = 16,
}

impl SensorLocation {
    /// Convert from the wire byte
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Other),
            1 => Some(Self::TopOfShoe),
            2 => Some(Self::InShoe),
            3 => Some(Self::Hip),
            4 => Some(Self::FrontWheel),
            5 => Some(Self::LeftCrank),
            6 => Some(Self::RightCrank),
            7 => Some(Self::LeftPedal),
            8 => Some(Self::RightPedal),
            9 => Some(Self::FrontHub),
            10 => Some(Self::RearDropout),
            11 => Some(Self::Chainstay),
            12 => Some(Self::RearWheel),
            13 => Some(Self::RearHub),
            14 => Some(Self::Chest),
            15 => Some(Self::Spider),
            16 => Some(Self::ChainRing),
            _ => None,
        }
    }
}

/// Read a sensor-location byte, `None` on empty input or an unrecognized value
#[must_use]
pub fn read_sensor_location(data: &[u8]) -> Option<SensorLocation> {
    SensorLocation::from_raw(*data.first()?)
}

/// Wheel parameters needed to turn revolution counters into speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Wheel circumference in centimeters
    pub circumference_cm: f64,
    /// Event-time resolution of the sensor in ticks per second
    pub time_resolution: u32,
}

impl WheelConfig {
    /// Create a wheel config
    #[must_use]
    pub const fn new(circumference_cm: f64, time_resolution: u32) -> Self {
        Self {
            circumference_cm,
            time_resolution,
        }
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        // 700x23c road wheel
        Self {
            circumference_cm: 209.6,
            time_resolution: CSC_WHEEL_TIME_RESOLUTION,
        }
    }
}

/// Speed and cadence derived from two successive measurement records
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Wheel speed in km/h, when both samples carry wheel data
    pub speed_kph: Option<f64>,
    /// Crank cadence in rpm, when both samples carry crank data
    pub cadence_rpm: Option<f64>,
}

/// Elapsed amount between two readings of a wrapping counter
///
/// `max` is the counter's own maximum value; the caller must order the
/// arguments by capture time. Reversed arguments are indistinguishable from
/// a wrap and produce a wraparound-sized delta.
#[must_use]
pub fn delta_with_rollover<T>(new: T, old: T, max: T) -> T
where
    T: Copy + PartialOrd + std::ops::Add<Output = T> + std::ops::Sub<Output = T>,
{
    if old > new {
        max - old + new
    } else {
        new - old
    }
}

/// Wheel speed in km/h from two successive samples
///
/// Returns `None` unless both samples carry the wheel counter pair.
/// Zero elapsed time yields `Some(0.0)`, never a division by zero.
#[must_use]
pub fn wheel_kph<M: CyclingMeasurement>(
    current: &M,
    previous: &M,
    config: &WheelConfig,
) -> Option<f64> {
    let cwr_now = current.cumulative_wheel_revolutions()?;
    let cwr_then = previous.cumulative_wheel_revolutions()?;
    let lwet_now = current.last_wheel_event_time()?;
    let lwet_then = previous.last_wheel_event_time()?;

    let revs_delta = delta_with_rollover(cwr_now, cwr_then, u32::MAX);
    let ticks_delta = delta_with_rollover(lwet_now, lwet_then, u16::MAX);

    let wheel_time_seconds = f64::from(ticks_delta) / f64::from(config.time_resolution);
    if wheel_time_seconds > 0.0 {
        let wheel_rpm = f64::from(revs_delta) / (wheel_time_seconds / 60.0);
        let km_per_cm = 0.00001;
        let mins_per_hour = 60.0;
        Some(wheel_rpm * config.circumference_cm * km_per_cm * mins_per_hour)
    } else {
        Some(0.0)
    }
}

/// Crank cadence in rpm from two successive samples
///
/// Returns `None` unless both samples carry the crank counter pair.
/// Zero elapsed time yields `Some(0.0)`.
#[must_use]
pub fn crank_rpm<M: CyclingMeasurement>(current: &M, previous: &M) -> Option<f64> {
    let ccr_now = current.cumulative_crank_revolutions()?;
    let ccr_then = previous.cumulative_crank_revolutions()?;
    let lcet_now = current.last_crank_event_time()?;
    let lcet_then = previous.last_crank_event_time()?;

    let revs_delta = delta_with_rollover(ccr_now, ccr_then, u16::MAX);
    let ticks_delta = delta_with_rollover(lcet_now, lcet_then, u16::MAX);

    let crank_time_seconds = f64::from(ticks_delta) / f64::from(CRANK_TIME_RESOLUTION);
    if crank_time_seconds > 0.0 {
        Some(f64::from(revs_delta) / (crank_time_seconds / 60.0))
    } else {
        Some(0.0)
    }
}

/// Derive speed and cadence from two successive samples of the same sensor
///
/// The caller owns sample retention and must pass `(current, previous)` in
/// capture order.
#[must_use]
pub fn derive<M: CyclingMeasurement>(
    current: &M,
    previous: &M,
    config: &WheelConfig,
) -> DerivedMetrics {
    DerivedMetrics {
        speed_kph: wheel_kph(current, previous, config),
        cadence_rpm: crank_rpm(current, previous),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        wheel: Option<(u32, u16)>,
        crank: Option<(u16, u16)>,
    }

    impl CyclingMeasurement for Sample {
        fn cumulative_wheel_revolutions(&self) -> Option<u32> {
            self.wheel.map(|(revs, _)| revs)
        }
        fn last_wheel_event_time(&self) -> Option<u16> {
            self.wheel.map(|(_, time)| time)
        }
        fn cumulative_crank_revolutions(&self) -> Option<u16> {
            self.crank.map(|(revs, _)| revs)
        }
        fn last_crank_event_time(&self) -> Option<u16> {
            self.crank.map(|(_, time)| time)
        }
    }

    #[test]
    fn test_delta_with_rollover() {
        assert_eq!(delta_with_rollover(5u16, 65530, u16::MAX), 10);
        assert_eq!(delta_with_rollover(100u16, 50, u16::MAX), 50);
        assert_eq!(delta_with_rollover(2u32, u32::MAX - 1, u32::MAX), 3);
    }

    #[test]
    fn test_wheel_kph_against_formula() {
        // 3 revolutions over exactly one second at 1024 ticks/s
        let previous = Sample {
            wheel: Some((100, 0)),
            crank: None,
        };
        let current = Sample {
            wheel: Some((103, 1024)),
            crank: None,
        };
        let config = WheelConfig::new(213.3, 1024);

        let kph = wheel_kph(&current, &previous, &config).unwrap();
        let expected = (3.0 / (1024.0 / 1024.0 / 60.0)) * 213.3 * 0.00001 * 60.0;
        assert!((kph - expected).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_kph_missing_counters() {
        let previous = Sample {
            wheel: None,
            crank: None,
        };
        let current = Sample {
            wheel: Some((103, 1024)),
            crank: None,
        };
        assert!(wheel_kph(&current, &previous, &WheelConfig::default()).is_none());
    }

    #[test]
    fn test_zero_elapsed_time_is_zero_speed() {
        let previous = Sample {
            wheel: Some((100, 512)),
            crank: Some((10, 512)),
        };
        let current = Sample {
            wheel: Some((103, 512)),
            crank: Some((11, 512)),
        };
        let config = WheelConfig::default();
        assert_eq!(wheel_kph(&current, &previous, &config), Some(0.0));
        assert_eq!(crank_rpm(&current, &previous), Some(0.0));
    }

    #[test]
    fn test_crank_rpm_with_rollover() {
        // Counter wraps from 65534 to 1 (3 revolutions), one second elapsed
        let previous = Sample {
            wheel: None,
            crank: Some((65534, 2048)),
        };
        let current = Sample {
            wheel: None,
            crank: Some((1, 3072)),
        };
        let rpm = crank_rpm(&current, &previous).unwrap();
        assert!((rpm - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_derive_combines_both_quantities() {
        let previous = Sample {
            wheel: Some((100, 0)),
            crank: Some((50, 0)),
        };
        let current = Sample {
            wheel: Some((103, 1024)),
            crank: Some((52, 1024)),
        };
        let metrics = derive(&current, &previous, &WheelConfig::new(213.3, 1024));
        assert!(metrics.speed_kph.is_some());
        assert!((metrics.cadence_rpm.unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_sensor_location() {
        assert_eq!(read_sensor_location(&[5]), Some(SensorLocation::LeftCrank));
        assert_eq!(read_sensor_location(&[14]), Some(SensorLocation::Chest));
        assert_eq!(read_sensor_location(&[17]), None);
        assert_eq!(read_sensor_location(&[]), None);
    }
}
