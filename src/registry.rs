use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    cycling, error::Result, error::VelolinkError, fitness_machine, heart_rate, power,
    speed_cadence,
};

/// A typed record decoded from a characteristic notification or read
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Record {
    PowerFeatures(power::Features),
    PowerMeasurement(power::PowerMeasurement),
    PowerVector(power::VectorData),
    SensorLocation(cycling::SensorLocation),
    CscFeatures(speed_cadence::Features),
    CscMeasurement(speed_cadence::CscMeasurement),
    HeartRate(heart_rate::HeartRateMeasurement),
    BodySensorLocation(heart_rate::BodySensorLocation),
    FitnessMachineFeatures(
        fitness_machine::MachineFeatures,
        fitness_machine::TargetSettingFeatures,
    ),
    TrainingStatus(fitness_machine::TrainingStatus),
    ControlPointResponse(fitness_machine::ControlPointResponse),
    IndoorBikeData(fitness_machine::IndoorBikeData),
    MachineStatus(fitness_machine::MachineStatusMessage),
    SupportedResistanceLevelRange(fitness_machine::SupportedResistanceLevelRange),
    SupportedPowerRange(fitness_machine::SupportedPowerRange),
}

/// Decode function registered per characteristic
///
/// Returns `None` when the buffer is shorter than the message's mandatory
/// lead; anything longer decodes totally.
pub type DecodeFn = fn(&[u8]) -> Option<Record>;

/// Characteristic-keyed codec table
///
/// Replaces a per-capability type hierarchy: the transport looks the
/// notifying characteristic up here and gets back a typed [`Record`]
/// variant instead of a polymorphic object.
#[derive(Debug, Clone, Default)]
pub struct CodecRegistry {
    decoders: HashMap<Uuid, DecodeFn>,
}

impl CodecRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every standard characteristic codec
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(power::FEATURE_UUID, |data| {
            Some(Record::PowerFeatures(power::read_features(data)))
        });
        registry.register(power::MEASUREMENT_UUID, |data| {
            power::read_measurement(data).map(Record::PowerMeasurement)
        });
        registry.register(power::VECTOR_UUID, |data| {
            power::read_vector(data).map(Record::PowerVector)
        });
        registry.register(power::SENSOR_LOCATION_UUID, |data| {
            cycling::read_sensor_location(data).map(Record::SensorLocation)
        });
        registry.register(speed_cadence::FEATURE_UUID, |data| {
            Some(Record::CscFeatures(speed_cadence::read_features(data)))
        });
        registry.register(speed_cadence::MEASUREMENT_UUID, |data| {
            speed_cadence::read_measurement(data).map(Record::CscMeasurement)
        });
        registry.register(heart_rate::MEASUREMENT_UUID, |data| {
            heart_rate::read_measurement(data).map(Record::HeartRate)
        });
        registry.register(heart_rate::BODY_SENSOR_LOCATION_UUID, |data| {
            heart_rate::read_sensor_location(data).map(Record::BodySensorLocation)
        });
        registry.register(fitness_machine::FEATURE_UUID, |data| {
            fitness_machine::read_features(data)
                .map(|(machine, target)| Record::FitnessMachineFeatures(machine, target))
        });
        registry.register(fitness_machine::TRAINING_STATUS_UUID, |data| {
            fitness_machine::read_training_status(data).map(Record::TrainingStatus)
        });
        registry.register(fitness_machine::CONTROL_POINT_UUID, |data| {
            fitness_machine::read_control_point_response(data).map(Record::ControlPointResponse)
        });
        registry.register(fitness_machine::MACHINE_STATUS_UUID, |data| {
            fitness_machine::read_machine_status(data).map(Record::MachineStatus)
        });
        registry.register(fitness_machine::INDOOR_BIKE_DATA_UUID, |data| {
            fitness_machine::read_indoor_bike_data(data).map(Record::IndoorBikeData)
        });
        registry.register(
            fitness_machine::SUPPORTED_RESISTANCE_LEVEL_RANGE_UUID,
            |data| {
                fitness_machine::read_supported_resistance_level_range(data)
                    .map(Record::SupportedResistanceLevelRange)
            },
        );
        registry.register(fitness_machine::SUPPORTED_POWER_RANGE_UUID, |data| {
            fitness_machine::read_supported_power_range(data).map(Record::SupportedPowerRange)
        });
        registry
    }

    /// Register (or replace) the decoder for a characteristic
    pub fn register(&mut self, characteristic: Uuid, decoder: DecodeFn) {
        self.decoders.insert(characteristic, decoder);
    }

    /// Whether a decoder is registered for the characteristic
    #[must_use]
    pub fn supports(&self, characteristic: Uuid) -> bool {
        self.decoders.contains_key(&characteristic)
    }

    /// Decode a notification for the given characteristic
    ///
    /// # Errors
    ///
    /// Returns [`VelolinkError::UnknownCharacteristic`] when no decoder is
    /// registered, or [`VelolinkError::Truncated`] when the buffer is
    /// shorter than the message's mandatory lead.
    pub fn decode(&self, characteristic: Uuid, data: &[u8]) -> Result<Record> {
        let decoder = self
            .decoders
            .get(&characteristic)
            .ok_or(VelolinkError::UnknownCharacteristic(characteristic))?;
        decoder(data).ok_or(VelolinkError::Truncated { characteristic })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_dispatch() {
        let registry = CodecRegistry::standard();

        let record = registry
            .decode(heart_rate::MEASUREMENT_UUID, &[0x00, 0x3C])
            .unwrap();
        match record {
            Record::HeartRate(measurement) => assert_eq!(measurement.heart_rate, 60),
            other => panic!("unexpected record: {other:?}"),
        }

        let record = registry
            .decode(fitness_machine::MACHINE_STATUS_UUID, &[0x08, 0xFA, 0x00])
            .unwrap();
        match record {
            Record::MachineStatus(message) => assert_eq!(message.target_power, Some(250)),
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_characteristic() {
        let registry = CodecRegistry::standard();
        let unknown = Uuid::from_u128(0xDEAD_BEEF);
        assert!(matches!(
            registry.decode(unknown, &[0x00]),
            Err(VelolinkError::UnknownCharacteristic(uuid)) if uuid == unknown
        ));
    }

    #[test]
    fn test_truncated_lead_is_reported() {
        let registry = CodecRegistry::standard();
        assert!(matches!(
            registry.decode(heart_rate::MEASUREMENT_UUID, &[]),
            Err(VelolinkError::Truncated { characteristic })
                if characteristic == heart_rate::MEASUREMENT_UUID
        ));
    }

    #[test]
    fn test_custom_registration_overrides() {
        let mut registry = CodecRegistry::new();
        assert!(!registry.supports(power::MEASUREMENT_UUID));

        registry.register(power::MEASUREMENT_UUID, |data| {
            power::read_measurement(data).map(Record::PowerMeasurement)
        });
        assert!(registry.supports(power::MEASUREMENT_UUID));
    }
}
