use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use crate::{NOT_SET, timestamp};

/// The kind of sensor that produced a reading.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorKind {
    /// Ambient temperature, in degrees Celsius.
    Temperature,
    /// Relative humidity, as a percentage.
    Humidity,
    /// Barometric pressure, in millibars.
    Pressure,
}

impl SensorKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
        }
    }
}

impl core::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.name().fmt(f)
    }
}

/// A single timestamped measurement produced by one sensor.
///
/// The timestamp is refreshed on every mutation and is strictly
/// non-decreasing across the mutations of one instance.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// The kind of sensor that produced this reading.
    pub kind: SensorKind,
    /// Sensor name, the cache and persistence key for this reading.
    pub name: String,
    /// Identifier of the device location this reading was taken at.
    pub location_id: String,
    /// Measured value.
    pub value: f64,
    /// Instant of the last mutation of this record.
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    /// Creates a [`SensorReading`] with a zero value and an unset location.
    #[must_use]
    pub fn new(kind: SensorKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            location_id: NOT_SET.into(),
            value: 0.,
            timestamp: Utc::now(),
        }
    }

    /// Sets the measured value, refreshing the timestamp.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.timestamp = timestamp::refresh(self.timestamp);
    }

    /// Sets the location identifier, refreshing the timestamp.
    pub fn set_location_id(&mut self, location_id: impl Into<String>) {
        self.location_id = location_id.into();
        self.timestamp = timestamp::refresh(self.timestamp);
    }

    /// Sets the measured value while constructing a [`SensorReading`].
    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.set_value(value);
        self
    }

    /// Encodes this reading as a JSON string.
    ///
    /// # Errors
    ///
    /// An error is returned when the record cannot be serialized.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a reading from a JSON string.
    ///
    /// # Errors
    ///
    /// An error is returned when the payload is not a valid reading.
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

impl core::fmt::Display for SensorReading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} reading `{}` = {} (location `{}`)",
            self.kind, self.name, self.value, self.location_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{SensorKind, SensorReading};

    #[test]
    fn timestamp_never_decreases() {
        let mut reading = SensorReading::new(SensorKind::Temperature, "temperature");

        let t0 = reading.timestamp;
        reading.set_value(21.5);
        let t1 = reading.timestamp;
        reading.set_location_id("greenhouse-1");
        let t2 = reading.timestamp;

        assert!(t1 >= t0);
        assert!(t2 >= t1);
    }

    #[test]
    fn json_round_trip() {
        let reading = SensorReading::new(SensorKind::Pressure, "pressure").with_value(1013.25);

        let decoded = SensorReading::from_json(&reading.to_json().unwrap()).unwrap();

        assert_eq!(decoded, reading);
    }

    #[test]
    fn rejects_malformed_payload() {
        assert!(SensorReading::from_json("{\"kind\": 42}").is_err());
    }
}
