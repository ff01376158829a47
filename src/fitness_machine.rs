use bitflags::bitflags;
use bytes::Buf;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fitness Machine service UUID (0x1826)
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1826_0000_1000_8000_0080_5f9b_34fb);

/// Fitness Machine Feature characteristic UUID (0x2ACC)
pub const FEATURE_UUID: Uuid = Uuid::from_u128(0x0000_2acc_0000_1000_8000_0080_5f9b_34fb);

/// Indoor Bike Data characteristic UUID (0x2AD2)
pub const INDOOR_BIKE_DATA_UUID: Uuid = Uuid::from_u128(0x0000_2ad2_0000_1000_8000_0080_5f9b_34fb);

/// Training Status characteristic UUID (0x2AD3)
pub const TRAINING_STATUS_UUID: Uuid = Uuid::from_u128(0x0000_2ad3_0000_1000_8000_0080_5f9b_34fb);

/// Supported Resistance Level Range characteristic UUID (0x2AD6)
pub const SUPPORTED_RESISTANCE_LEVEL_RANGE_UUID: Uuid =
    Uuid::from_u128(0x0000_2ad6_0000_1000_8000_0080_5f9b_34fb);

/// Supported Power Range characteristic UUID (0x2AD8)
pub const SUPPORTED_POWER_RANGE_UUID: Uuid =
    Uuid::from_u128(0x0000_2ad8_0000_1000_8000_0080_5f9b_34fb);

/// Fitness Machine Control Point characteristic UUID (0x2AD9)
pub const CONTROL_POINT_UUID: Uuid = Uuid::from_u128(0x0000_2ad9_0000_1000_8000_0080_5f9b_34fb);

/// Fitness Machine Status characteristic UUID (0x2ADA)
pub const MACHINE_STATUS_UUID: Uuid = Uuid::from_u128(0x0000_2ada_0000_1000_8000_0080_5f9b_34fb);

bitflags! {
    /// Machine capabilities from the first word of the Feature characteristic
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MachineFeatures: u32 {
        /// Average speed supported
        const AVERAGE_SPEED = 1 << 0;
        /// Cadence supported
        const CADENCE = 1 << 1;
        /// Total distance supported
        const TOTAL_DISTANCE = 1 << 2;
        /// Inclination supported
        const INCLINATION = 1 << 3;
        /// Elevation gain supported
        const ELEVATION_GAIN = 1 << 4;
        /// Pace supported
        const PACE = 1 << 5;
        /// Step count supported
        const STEP_COUNT = 1 << 6;
        /// Resistance level supported
        const RESISTANCE_LEVEL = 1 << 7;
        /// Stride count supported
        const STRIDE_COUNT = 1 << 8;
        /// Expended energy supported
        const EXPENDED_ENERGY = 1 << 9;
        /// Heart rate measurement supported
        const HEART_RATE_MEASUREMENT = 1 << 10;
        /// Metabolic equivalent supported
        const METABOLIC_EQUIVALENT = 1 << 11;
        /// Elapsed time supported
        const ELAPSED_TIME = 1 << 12;
        /// Remaining time supported
        const REMAINING_TIME = 1 << 13;
        /// Power measurement supported
        const POWER_MEASUREMENT = 1 << 14;
        /// Force on belt and power output supported
        const FORCE_ON_BELT_AND_POWER_OUTPUT = 1 << 15;
        /// User data retention supported
        const USER_DATA_RETENTION = 1 << 16;
    }
}

bitflags! {
    /// Target-setting capabilities from the second word of the Feature characteristic
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TargetSettingFeatures: u32 {
        /// Speed target supported
        const SPEED_TARGET = 1 << 0;
        /// Inclination target supported
        const INCLINATION_TARGET = 1 << 1;
        /// Resistance target supported
        const RESISTANCE_TARGET = 1 << 2;
        /// Power target supported
        const POWER_TARGET = 1 << 3;
        /// Heart rate target supported
        const HEART_RATE_TARGET = 1 << 4;
        /// Targeted expended energy configuration supported
        const TARGETED_EXPENDED_ENERGY = 1 << 5;
        /// Targeted step number configuration supported
        const TARGETED_STEP_NUMBER = 1 << 6;
        /// Targeted stride number configuration supported
        const TARGETED_STRIDE_NUMBER = 1 << 7;
        /// Targeted distance configuration supported
        const TARGETED_DISTANCE = 1 << 8;
        /// Targeted training time configuration supported
        const TARGETED_TRAINING_TIME = 1 << 9;
        /// Targeted time in two heart rate zones supported
        const TARGETED_TIME_IN_TWO_HR_ZONES = 1 << 10;
        /// Targeted time in three heart rate zones supported
        const TARGETED_TIME_IN_THREE_HR_ZONES = 1 << 11;
        /// Targeted time in five heart rate zones supported
        const TARGETED_TIME_IN_FIVE_HR_ZONES = 1 << 12;
        /// Indoor bike simulation parameters supported
        const INDOOR_BIKE_SIMULATION = 1 << 13;
        /// Wheel circumference configuration supported
        const WHEEL_CIRCUMFERENCE = 1 << 14;
        /// Spin down control supported
        const SPIN_DOWN_CONTROL = 1 << 15;
        /// Targeted cadence configuration supported
        const TARGETED_CADENCE = 1 << 16;
    }
}

/// Read the Fitness Machine Feature characteristic (two LE u32 words)
#[must_use]
pub fn read_features(data: &[u8]) -> Option<(MachineFeatures, TargetSettingFeatures)> {
    let mut buf = data;
    if buf.remaining() < 8 {
        return None;
    }
    let machine = MachineFeatures::from_bits_retain(buf.get_u32_le());
    let target = TargetSettingFeatures::from_bits_retain(buf.get_u32_le());
    Some((machine, target))
}

bitflags! {
    /// Flags leading a Training Status notification
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TrainingStatusFlags: u8 {
        /// A UTF-8 status string follows the status byte
        const TRAINING_STATUS_STRING_PRESENT = 1 << 0;
        /// The status string is an extended string
        const EXTENDED_STRING_PRESENT = 1 << 2;
    }
}

/// Training state reported by the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum TrainingStatusField {
    #[default]
    Other = 0x00,
    Idle = 0x01,
    WarmingUp = 0x02,
    LowIntensityInterval = 0x03,
    HighIntensityInterval = 0x04,
    RecoveryInterval = 0x05,
    Isometric = 0x06,
    HeartRateControl = 0x07,
    FitnessTest = 0x08,
    SpeedOutsideControlRegionLow = 0x09,
    SpeedOutsideControlRegionHigh = 0x0A,
    CoolDown = 0x0B,
    WattControl = 0x0C,
    ManualMode = 0x0D,
    PreWorkout = 0x0E,
    PostWorkout = 0x0F,
}

impl From<u8> for TrainingStatusField {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::Idle,
            0x02 => Self::WarmingUp,
            0x03 => Self::LowIntensityInterval,
            0x04 => Self::HighIntensityInterval,
            0x05 => Self::RecoveryInterval,
            0x06 => Self::Isometric,
            0x07 => Self::HeartRateControl,
            0x08 => Self::FitnessTest,
            0x09 => Self::SpeedOutsideControlRegionLow,
            0x0A => Self::SpeedOutsideControlRegionHigh,
            0x0B => Self::CoolDown,
            0x0C => Self::WattControl,
            0x0D => Self::ManualMode,
            0x0E => Self::PreWorkout,
            0x0F => Self::PostWorkout,
            _ => Self::Other,
        }
    }
}

/// Decoded Training Status notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingStatus {
    /// Status flags
    pub flags: TrainingStatusFlags,
    /// Training state
    pub status: TrainingStatusField,
    /// Optional trailing status string
    pub status_string: Option<String>,
}

/// Decode a Training Status notification, `None` if shorter than two bytes
#[must_use]
pub fn read_training_status(data: &[u8]) -> Option<TrainingStatus> {
    if data.len() < 2 {
        return None;
    }
    let flags = TrainingStatusFlags::from_bits_retain(data[0]);
    let status_string = if flags.contains(TrainingStatusFlags::TRAINING_STATUS_STRING_PRESENT)
        && data.len() > 2
    {
        Some(String::from_utf8_lossy(&data[2..]).into_owned())
    } else {
        None
    };
    Some(TrainingStatus {
        flags,
        status: TrainingStatusField::from(data[1]),
        status_string,
    })
}

/// Fitness Machine Control Point op codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ControlOpCode {
    RequestControl = 0x00,
    Reset = 0x01,
    SetTargetSpeed = 0x02,
    SetTargetInclination = 0x03,
    SetTargetResistanceLevel = 0x04,
    SetTargetPower = 0x05,
    SetTargetHeartRate = 0x06,
    StartOrResume = 0x07,
    StopOrPause = 0x08,
    SetTargetedExpendedEnergy = 0x09,
    SetTargetedNumberOfSteps = 0x0A,
    SetTargetedNumberOfStrides = 0x0B,
    SetTargetedDistance = 0x0C,
    SetTargetedTrainingTime = 0x0D,
    SetTargetedTimeInTwoHeartRateZones = 0x0E,
    SetTargetedTimeInThreeHeartRateZones = 0x0F,
    SetTargetedTimeInFiveHeartRateZones = 0x10,
    SetIndoorBikeSimulationParameters = 0x11,
    SetWheelCircumference = 0x12,
    SpinDownControl = 0x13,
    SetTargetedCadence = 0x14,
    ResponseCode = 0x80,
    #[default]
    Unknown = 0xFF,
}

impl From<u8> for ControlOpCode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::RequestControl,
            0x01 => Self::Reset,
            0x02 => Self::SetTargetSpeed,
            0x03 => Self::SetTargetInclination,
            0x04 => Self::SetTargetResistanceLevel,
            0x05 => Self::SetTargetPower,
            0x06 => Self::SetTargetHeartRate,
            0x07 => Self::StartOrResume,
            0x08 => Self::StopOrPause,
            0x09 => Self::SetTargetedExpendedEnergy,
            0x0A => Self::SetTargetedNumberOfSteps,
            0x0B => Self::SetTargetedNumberOfStrides,
            0x0C => Self::SetTargetedDistance,
            0x0D => Self::SetTargetedTrainingTime,
            0x0E => Self::SetTargetedTimeInTwoHeartRateZones,
            0x0F => Self::SetTargetedTimeInThreeHeartRateZones,
            0x10 => Self::SetTargetedTimeInFiveHeartRateZones,
            0x11 => Self::SetIndoorBikeSimulationParameters,
            0x12 => Self::SetWheelCircumference,
            0x13 => Self::SpinDownControl,
            0x14 => Self::SetTargetedCadence,
            0x80 => Self::ResponseCode,
            _ => Self::Unknown,
        }
    }
}

/// Result codes echoed in control point responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ResultCode {
    #[default]
    Reserved = 0x00,
    Success = 0x01,
    OpCodeNotSupported = 0x02,
    InvalidParameter = 0x03,
    OperationFailed = 0x04,
    ControlNotPermitted = 0x05,
}

impl From<u8> for ResultCode {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::Success,
            0x02 => Self::OpCodeNotSupported,
            0x03 => Self::InvalidParameter,
            0x04 => Self::OperationFailed,
            0x05 => Self::ControlNotPermitted,
            _ => Self::Reserved,
        }
    }
}

/// Indoor bike simulation target, in engineering units
///
/// Wire resolutions: wind speed 0.001 m/s, grade 0.01 %, rolling resistance
/// coefficient 0.0001, wind resistance coefficient 0.01 kg/m.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndoorBikeSimulationParameters {
    /// Wind speed in meters per second
    pub wind_speed: f64,
    /// Grade in percent
    pub grade: f64,
    /// Coefficient of rolling resistance
    pub crr: f64,
    /// Wind resistance coefficient in kg/m
    pub cwr: f64,
}

impl IndoorBikeSimulationParameters {
    /// Compare against another parameter set within `epsilon` per field
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.wind_speed - other.wind_speed).abs() <= epsilon
            && (self.grade - other.grade).abs() <= epsilon
            && (self.crr - other.crr).abs() <= epsilon
            && (self.cwr - other.cwr).abs() <= epsilon
    }
}

fn scale_to_i16(value: f64, scale: f64) -> i16 {
    let scaled = (value * scale).round();
    scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

fn scale_to_u8(value: f64, scale: f64) -> u8 {
    let scaled = (value * scale).round();
    scaled.clamp(0.0, f64::from(u8::MAX)) as u8
}

/// Build a Request Control command
#[must_use]
pub fn request_control() -> Vec<u8> {
    vec![ControlOpCode::RequestControl as u8]
}

/// Build a Reset command
#[must_use]
pub fn reset() -> Vec<u8> {
    vec![ControlOpCode::Reset as u8]
}

/// Build a Start or Resume command
#[must_use]
pub fn start_or_resume() -> Vec<u8> {
    vec![ControlOpCode::StartOrResume as u8]
}

/// Build a Stop command
#[must_use]
pub fn stop() -> Vec<u8> {
    vec![ControlOpCode::StopOrPause as u8, 0x01]
}

/// Build a Pause command
#[must_use]
pub fn pause() -> Vec<u8> {
    vec![ControlOpCode::StopOrPause as u8, 0x02]
}

/// Build a Set Target Power command
#[must_use]
pub fn set_target_power(watts: i16) -> Vec<u8> {
    let mut command = vec![ControlOpCode::SetTargetPower as u8];
    command.extend_from_slice(&watts.to_le_bytes());
    command
}

/// Build a Set Target Resistance Level command (unitless, 0.1 resolution)
///
/// The level is clamped to the representable fixed-point range.
#[must_use]
pub fn set_target_resistance_level(level: f64) -> Vec<u8> {
    let raw = scale_to_i16(level, 10.0);
    let mut command = vec![ControlOpCode::SetTargetResistanceLevel as u8];
    command.extend_from_slice(&raw.to_le_bytes());
    command
}

/// Build a Set Indoor Bike Simulation Parameters command
///
/// Each field is clamped to its representable fixed-point range.
#[must_use]
pub fn set_indoor_bike_simulation_parameters(
    params: &IndoorBikeSimulationParameters,
) -> Vec<u8> {
    let wind_speed = scale_to_i16(params.wind_speed, 1000.0);
    let grade = scale_to_i16(params.grade, 100.0);
    let crr = scale_to_u8(params.crr, 10000.0);
    let cwr = scale_to_u8(params.cwr, 100.0);

    let mut command = vec![ControlOpCode::SetIndoorBikeSimulationParameters as u8];
    command.extend_from_slice(&wind_speed.to_le_bytes());
    command.extend_from_slice(&grade.to_le_bytes());
    command.push(crr);
    command.push(cwr);
    command
}

/// Build a Spin Down Control command that starts the procedure
#[must_use]
pub fn start_spin_down() -> Vec<u8> {
    vec![ControlOpCode::SpinDownControl as u8, 0x01]
}

/// Build a Spin Down Control command that ignores the machine's request
#[must_use]
pub fn ignore_spin_down_request() -> Vec<u8> {
    vec![ControlOpCode::SpinDownControl as u8, 0x02]
}

/// Decoded control point indication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPointResponse {
    /// Op code of the request being answered
    pub request_op_code: ControlOpCode,
    /// Outcome of the request
    pub result_code: ResultCode,
    /// Spin-down target speed lower bound in km/h
    ///
    /// Populated only on a successful spin-down-control response.
    pub spin_down_target_speed_low: Option<f64>,
    /// Spin-down target speed upper bound in km/h
    pub spin_down_target_speed_high: Option<f64>,
}

/// Decode a control point indication
///
/// Returns `None` unless the buffer starts with the response op code (0x80)
/// and carries the echoed op code and result code.
#[must_use]
pub fn read_control_point_response(data: &[u8]) -> Option<ControlPointResponse> {
    let mut buf = data;
    if buf.remaining() < 3 || buf.get_u8() != ControlOpCode::ResponseCode as u8 {
        return None;
    }

    let mut response = ControlPointResponse {
        request_op_code: ControlOpCode::from(buf.get_u8()),
        result_code: ResultCode::from(buf.get_u8()),
        spin_down_target_speed_low: None,
        spin_down_target_speed_high: None,
    };

    if response.request_op_code == ControlOpCode::SpinDownControl
        && response.result_code == ResultCode::Success
        && buf.remaining() >= 4
    {
        response.spin_down_target_speed_low = Some(f64::from(buf.get_u16_le()) / 100.0);
        response.spin_down_target_speed_high = Some(f64::from(buf.get_u16_le()) / 100.0);
    }

    Some(response)
}

bitflags! {
    /// Presence flags leading an Indoor Bike Data notification
    ///
    /// Instantaneous speed is the implicit first field: it is present when
    /// `MORE_DATA` is clear.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct IndoorBikeDataFlags: u16 {
        /// More data follows in another notification; instantaneous speed absent
        const MORE_DATA = 1 << 0;
        /// Average speed present
        const AVERAGE_SPEED_PRESENT = 1 << 1;
        /// Instantaneous cadence present
        const INSTANTANEOUS_CADENCE_PRESENT = 1 << 2;
        /// Average cadence present
        const AVERAGE_CADENCE_PRESENT = 1 << 3;
        /// Total distance present
        const TOTAL_DISTANCE_PRESENT = 1 << 4;
        /// Resistance level present
        const RESISTANCE_LEVEL_PRESENT = 1 << 5;
        /// Instantaneous power present
        const INSTANTANEOUS_POWER_PRESENT = 1 << 6;
        /// Average power present
        const AVERAGE_POWER_PRESENT = 1 << 7;
        /// Expended energy fields present
        const EXPENDED_ENERGY_PRESENT = 1 << 8;
        /// Heart rate present
        const HEART_RATE_PRESENT = 1 << 9;
        /// Metabolic equivalent present
        const METABOLIC_EQUIVALENT_PRESENT = 1 << 10;
        /// Elapsed time present
        const ELAPSED_TIME_PRESENT = 1 << 11;
        /// Remaining time present
        const REMAINING_TIME_PRESENT = 1 << 12;
    }
}

/// Decoded Indoor Bike Data notification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndoorBikeData {
    /// Raw presence flags
    pub flags: IndoorBikeDataFlags,
    /// Instantaneous speed in km/h
    pub instantaneous_speed: Option<f64>,
    /// Average speed in km/h
    pub average_speed: Option<f64>,
    /// Instantaneous cadence in rpm
    pub instantaneous_cadence: Option<f64>,
    /// Average cadence in rpm
    pub average_cadence: Option<f64>,
    /// Total distance in meters
    pub total_distance: Option<u32>,
    /// Resistance level, unitless
    pub resistance_level: Option<i16>,
    /// Instantaneous power in watts
    pub instantaneous_power: Option<i16>,
    /// Average power in watts
    pub average_power: Option<i16>,
    /// Total expended energy in kilocalories
    pub total_energy: Option<u16>,
    /// Energy burn rate in kilocalories per hour
    pub energy_per_hour: Option<u16>,
    /// Energy burn rate in kilocalories per minute
    pub energy_per_minute: Option<u8>,
    /// Heart rate in beats per minute
    pub heart_rate: Option<u8>,
    /// Metabolic equivalent
    pub metabolic_equivalent: Option<f64>,
    /// Elapsed time in seconds
    pub elapsed_time: Option<u16>,
    /// Remaining time in seconds
    pub remaining_time: Option<u16>,
}

impl Default for IndoorBikeDataFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Decode an Indoor Bike Data notification
///
/// Fields are consumed strictly in wire order, each gated by its flag and
/// by enough bytes remaining. Returns `None` when the two flag bytes are
/// missing.
#[must_use]
pub fn read_indoor_bike_data(data: &[u8]) -> Option<IndoorBikeData> {
    let mut buf = data;
    if buf.remaining() < 2 {
        return None;
    }

    let flags = IndoorBikeDataFlags::from_bits_retain(buf.get_u16_le());
    let mut bike = IndoorBikeData {
        flags,
        ..IndoorBikeData::default()
    };

    if !flags.contains(IndoorBikeDataFlags::MORE_DATA) && buf.remaining() >= 2 {
        bike.instantaneous_speed = Some(f64::from(buf.get_u16_le()) / 100.0);
    }
    if flags.contains(IndoorBikeDataFlags::AVERAGE_SPEED_PRESENT) && buf.remaining() >= 2 {
        bike.average_speed = Some(f64::from(buf.get_u16_le()) / 100.0);
    }
    if flags.contains(IndoorBikeDataFlags::INSTANTANEOUS_CADENCE_PRESENT) && buf.remaining() >= 2 {
        bike.instantaneous_cadence = Some(f64::from(buf.get_u16_le()) / 2.0);
    }
    if flags.contains(IndoorBikeDataFlags::AVERAGE_CADENCE_PRESENT) && buf.remaining() >= 2 {
        bike.average_cadence = Some(f64::from(buf.get_u16_le()) / 2.0);
    }
    if flags.contains(IndoorBikeDataFlags::TOTAL_DISTANCE_PRESENT) && buf.remaining() >= 3 {
        let low = u32::from(buf.get_u16_le());
        let high = u32::from(buf.get_u8());
        bike.total_distance = Some(low | high << 16);
    }
    if flags.contains(IndoorBikeDataFlags::RESISTANCE_LEVEL_PRESENT) && buf.remaining() >= 2 {
        bike.resistance_level = Some(buf.get_i16_le());
    }
    if flags.contains(IndoorBikeDataFlags::INSTANTANEOUS_POWER_PRESENT) && buf.remaining() >= 2 {
        bike.instantaneous_power = Some(buf.get_i16_le());
    }
    if flags.contains(IndoorBikeDataFlags::AVERAGE_POWER_PRESENT) && buf.remaining() >= 2 {
        bike.average_power = Some(buf.get_i16_le());
    }
    if flags.contains(IndoorBikeDataFlags::EXPENDED_ENERGY_PRESENT) && buf.remaining() >= 5 {
        bike.total_energy = Some(buf.get_u16_le());
        bike.energy_per_hour = Some(buf.get_u16_le());
        bike.energy_per_minute = Some(buf.get_u8());
    }
    if flags.contains(IndoorBikeDataFlags::HEART_RATE_PRESENT) && buf.remaining() >= 1 {
        bike.heart_rate = Some(buf.get_u8());
    }
    if flags.contains(IndoorBikeDataFlags::METABOLIC_EQUIVALENT_PRESENT) && buf.remaining() >= 1 {
        bike.metabolic_equivalent = Some(f64::from(buf.get_u8()) / 10.0);
    }
    if flags.contains(IndoorBikeDataFlags::ELAPSED_TIME_PRESENT) && buf.remaining() >= 2 {
        bike.elapsed_time = Some(buf.get_u16_le());
    }
    if flags.contains(IndoorBikeDataFlags::REMAINING_TIME_PRESENT) && buf.remaining() >= 2 {
        bike.remaining_time = Some(buf.get_u16_le());
    }

    Some(bike)
}

/// Supported resistance level range (unitless, 0.1 resolution on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SupportedResistanceLevelRange {
    /// Minimum resistance level
    pub minimum_resistance_level: f64,
    /// Maximum resistance level
    pub maximum_resistance_level: f64,
    /// Minimum increment
    pub minimum_increment: f64,
}

impl SupportedResistanceLevelRange {
    /// Map a percentage in `-1.0..=1.0` onto this machine's resistance scale
    #[must_use]
    pub fn resistance_for_percent(&self, percent: f64) -> f64 {
        if self.minimum_resistance_level >= 0.0 {
            self.minimum_resistance_level
                + percent * (self.maximum_resistance_level - self.minimum_resistance_level)
        } else {
            let abs_max = self
                .maximum_resistance_level
                .max(self.minimum_resistance_level.abs());
            (percent * abs_max)
                .clamp(self.minimum_resistance_level, self.maximum_resistance_level)
        }
    }
}

/// Decode the Supported Resistance Level Range characteristic
#[must_use]
pub fn read_supported_resistance_level_range(
    data: &[u8],
) -> Option<SupportedResistanceLevelRange> {
    let mut buf = data;
    if buf.remaining() < 6 {
        return None;
    }
    Some(SupportedResistanceLevelRange {
        minimum_resistance_level: f64::from(buf.get_i16_le()) / 10.0,
        maximum_resistance_level: f64::from(buf.get_i16_le()) / 10.0,
        minimum_increment: f64::from(buf.get_u16_le()) / 10.0,
    })
}

/// Supported power range in watts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupportedPowerRange {
    /// Minimum power target
    pub minimum_power: i16,
    /// Maximum power target
    pub maximum_power: i16,
    /// Minimum increment
    pub minimum_increment: u16,
}

/// Decode the Supported Power Range characteristic
#[must_use]
pub fn read_supported_power_range(data: &[u8]) -> Option<SupportedPowerRange> {
    let mut buf = data;
    if buf.remaining() < 6 {
        return None;
    }
    Some(SupportedPowerRange {
        minimum_power: buf.get_i16_le(),
        maximum_power: buf.get_i16_le(),
        minimum_increment: buf.get_u16_le(),
    })
}

/// Fitness Machine Status op codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum MachineStatusOpCode {
    #[default]
    ReservedForFutureUse = 0x00,
    Reset = 0x01,
    StoppedOrPausedByUser = 0x02,
    StoppedBySafetyKey = 0x03,
    StartedOrResumedByUser = 0x04,
    TargetSpeedChanged = 0x05,
    TargetInclineChanged = 0x06,
    TargetResistanceLevelChanged = 0x07,
    TargetPowerChanged = 0x08,
    TargetHeartRateChanged = 0x09,
    TargetedExpendedEnergyChanged = 0x0A,
    TargetedNumberOfStepsChanged = 0x0B,
    TargetedNumberOfStridesChanged = 0x0C,
    TargetedDistanceChanged = 0x0D,
    TargetedTrainingTimeChanged = 0x0E,
    TargetedTimeInTwoHeartRateZonesChanged = 0x0F,
    TargetedTimeInThreeHeartRateZonesChanged = 0x10,
    TargetedTimeInFiveHeartRateZonesChanged = 0x11,
    IndoorBikeSimulationParametersChanged = 0x12,
    WheelCircumferenceChanged = 0x13,
    SpinDownStatus = 0x14,
    TargetedCadenceChanged = 0x15,
    ControlPermissionLost = 0xFF,
}

impl From<u8> for MachineStatusOpCode {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::Reset,
            0x02 => Self::StoppedOrPausedByUser,
            0x03 => Self::StoppedBySafetyKey,
            0x04 => Self::StartedOrResumedByUser,
            0x05 => Self::TargetSpeedChanged,
            0x06 => Self::TargetInclineChanged,
            0x07 => Self::TargetResistanceLevelChanged,
            0x08 => Self::TargetPowerChanged,
            0x09 => Self::TargetHeartRateChanged,
            0x0A => Self::TargetedExpendedEnergyChanged,
            0x0B => Self::TargetedNumberOfStepsChanged,
            0x0C => Self::TargetedNumberOfStridesChanged,
            0x0D => Self::TargetedDistanceChanged,
            0x0E => Self::TargetedTrainingTimeChanged,
            0x0F => Self::TargetedTimeInTwoHeartRateZonesChanged,
            0x10 => Self::TargetedTimeInThreeHeartRateZonesChanged,
            0x11 => Self::TargetedTimeInFiveHeartRateZonesChanged,
            0x12 => Self::IndoorBikeSimulationParametersChanged,
            0x13 => Self::WheelCircumferenceChanged,
            0x14 => Self::SpinDownStatus,
            0x15 => Self::TargetedCadenceChanged,
            0xFF => Self::ControlPermissionLost,
            _ => Self::ReservedForFutureUse,
        }
    }
}

/// Spin-down procedure state carried by a machine status event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum SpinDownStatusField {
    Requested = 0x01,
    Success = 0x02,
    Error = 0x03,
    StopPedaling = 0x04,
}

impl SpinDownStatusField {
    /// Convert from the wire byte
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Requested),
            0x02 => Some(Self::Success),
            0x03 => Some(Self::Error),
            0x04 => Some(Self::StopPedaling),
            _ => None,
        }
    }
}

/// Decoded Fitness Machine Status event
///
/// Only the target-power, target-resistance, simulation-parameter and
/// spin-down opcodes carry typed parameters today; the remaining opcodes are
/// recognized but their parameters are not decoded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MachineStatusMessage {
    /// Event op code
    pub op_code: MachineStatusOpCode,
    /// New target power in watts
    pub target_power: Option<i16>,
    /// New target resistance level (unitless)
    pub target_resistance_level: Option<f64>,
    /// New simulation parameters
    pub target_sim_parameters: Option<IndoorBikeSimulationParameters>,
    /// Spin-down procedure state
    pub spin_down_status: Option<SpinDownStatusField>,
}

/// Decode a Fitness Machine Status event, `None` on an empty buffer
#[must_use]
pub fn read_machine_status(data: &[u8]) -> Option<MachineStatusMessage> {
    let mut buf = data;
    if buf.remaining() < 1 {
        return None;
    }

    let mut message = MachineStatusMessage {
        op_code: MachineStatusOpCode::from(buf.get_u8()),
        ..MachineStatusMessage::default()
    };

    match message.op_code {
        MachineStatusOpCode::TargetPowerChanged => {
            if buf.remaining() >= 2 {
                message.target_power = Some(buf.get_i16_le());
            }
        }
        MachineStatusOpCode::TargetResistanceLevelChanged => {
            if buf.remaining() >= 2 {
                message.target_resistance_level = Some(f64::from(buf.get_i16_le()) / 10.0);
            }
        }
        MachineStatusOpCode::IndoorBikeSimulationParametersChanged => {
            if buf.remaining() >= 6 {
                message.target_sim_parameters = Some(IndoorBikeSimulationParameters {
                    wind_speed: f64::from(buf.get_i16_le()) / 1000.0,
                    grade: f64::from(buf.get_i16_le()) / 100.0,
                    crr: f64::from(buf.get_u8()) / 10000.0,
                    cwr: f64::from(buf.get_u8()) / 100.0,
                });
            }
        }
        MachineStatusOpCode::SpinDownStatus => {
            if buf.remaining() >= 1 {
                message.spin_down_status = SpinDownStatusField::from_raw(buf.get_u8());
            }
        }
        _ => {}
    }

    Some(message)
}
