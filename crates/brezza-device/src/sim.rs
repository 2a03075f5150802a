use brezza::actuation::{ActuatorKind, STATUS_OK};
use brezza::reading::{SensorKind, SensorReading};

use rand::Rng;

use tracing::info;

use crate::config::AdapterEngine;
use crate::dispatch::{ActuatorDriver, ActuatorSlot};

// Default value bands for the built-in environmental sensors.
const TEMPERATURE_BAND: (f64, f64) = (15., 28.);
const HUMIDITY_BAND: (f64, f64) = (30., 60.);
const PRESSURE_BAND: (f64, f64) = (990., 1030.);

// Number of emulated readings per diurnal cycle.
const TICKS_PER_CYCLE: u32 = 288;

/// A source of sensor readings.
///
/// One adapter per sensor present on this device; the backing behind it is
/// selected at startup by [`sensor_suite`].
pub trait SensorAdapter: Send {
    /// The kind of sensor this adapter reads.
    fn kind(&self) -> SensorKind;

    /// The sensor name stamped onto every reading.
    fn name(&self) -> &str;

    /// Acquires one reading.
    fn read_once(&mut self) -> SensorReading;
}

/// A sensor backed by uniform pseudo-random values within a band.
#[derive(Debug)]
pub struct SimulatedSensor {
    kind: SensorKind,
    name: String,
    floor: f64,
    ceiling: f64,
}

impl SimulatedSensor {
    /// Creates a [`SimulatedSensor`] producing values in `[floor, ceiling]`.
    #[must_use]
    pub fn new(kind: SensorKind, name: impl Into<String>, floor: f64, ceiling: f64) -> Self {
        Self {
            kind,
            name: name.into(),
            floor,
            ceiling,
        }
    }
}

impl SensorAdapter for SimulatedSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_once(&mut self) -> SensorReading {
        let value = rand::thread_rng().gen_range(self.floor..=self.ceiling);
        SensorReading::new(self.kind, self.name.clone()).with_value(value)
    }
}

/// A sensor backed by a deterministic diurnal curve.
///
/// Stands in for an emulator-backed reading source: values follow a sine
/// wave between the band bounds, advancing one tick per read.
#[derive(Debug)]
pub struct EmulatedSensor {
    kind: SensorKind,
    name: String,
    midpoint: f64,
    amplitude: f64,
    tick: u32,
}

impl EmulatedSensor {
    /// Creates an [`EmulatedSensor`] oscillating between `floor` and
    /// `ceiling` over one diurnal cycle.
    #[must_use]
    pub fn new(kind: SensorKind, name: impl Into<String>, floor: f64, ceiling: f64) -> Self {
        Self {
            kind,
            name: name.into(),
            midpoint: (floor + ceiling) / 2.,
            amplitude: (ceiling - floor) / 2.,
            tick: 0,
        }
    }
}

impl SensorAdapter for EmulatedSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_once(&mut self) -> SensorReading {
        let phase = f64::from(self.tick) / f64::from(TICKS_PER_CYCLE);
        let value = self.midpoint + self.amplitude * (phase * core::f64::consts::TAU).sin();
        self.tick = (self.tick + 1) % TICKS_PER_CYCLE;

        SensorReading::new(self.kind, self.name.clone()).with_value(value)
    }
}

/// Builds the environmental sensor adapters for the given backing.
#[must_use]
pub fn sensor_suite(engine: AdapterEngine) -> Vec<Box<dyn SensorAdapter>> {
    let bands = [
        (SensorKind::Temperature, "temperature", TEMPERATURE_BAND),
        (SensorKind::Humidity, "humidity", HUMIDITY_BAND),
        (SensorKind::Pressure, "pressure", PRESSURE_BAND),
    ];

    bands
        .into_iter()
        .map(|(kind, name, (floor, ceiling))| match engine {
            AdapterEngine::Simulated => {
                Box::new(SimulatedSensor::new(kind, name, floor, ceiling)) as Box<dyn SensorAdapter>
            }
            AdapterEngine::Emulated => {
                Box::new(EmulatedSensor::new(kind, name, floor, ceiling)) as Box<dyn SensorAdapter>
            }
        })
        .collect()
}

/// A logging actuator driver.
///
/// Both backings drive their units by logging the transition; a hardware
/// driver implements [`ActuatorDriver`] over the real unit instead.
#[derive(Debug)]
pub struct LoggingActuatorDriver {
    name: &'static str,
}

impl LoggingActuatorDriver {
    /// Creates a [`LoggingActuatorDriver`] for the unit with the given name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl ActuatorDriver for LoggingActuatorDriver {
    fn activate(&mut self, value: f64, state_data: &str) -> i32 {
        if state_data.is_empty() {
            info!("`{}` actuator ON, value {value}", self.name);
        } else {
            info!(
                "`{}` actuator ON, value {value}, state `{state_data}`",
                self.name
            );
        }
        STATUS_OK
    }

    fn deactivate(&mut self, value: f64, state_data: &str) -> i32 {
        if state_data.is_empty() {
            info!("`{}` actuator OFF, value {value}", self.name);
        } else {
            info!(
                "`{}` actuator OFF, value {value}, state `{state_data}`",
                self.name
            );
        }
        STATUS_OK
    }
}

/// Builds the actuator slots for the given backing.
#[must_use]
pub fn actuator_suite(_engine: AdapterEngine) -> Vec<ActuatorSlot> {
    vec![
        ActuatorSlot::new(
            ActuatorKind::Hvac,
            "hvac",
            Box::new(LoggingActuatorDriver::new("hvac")),
        ),
        ActuatorSlot::new(
            ActuatorKind::Humidifier,
            "humidifier",
            Box::new(LoggingActuatorDriver::new("humidifier")),
        ),
        ActuatorSlot::new(
            ActuatorKind::Led,
            "led",
            Box::new(LoggingActuatorDriver::new("led")),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use brezza::reading::SensorKind;

    use crate::config::AdapterEngine;

    use super::{EmulatedSensor, SensorAdapter, SimulatedSensor, sensor_suite};

    #[test]
    fn simulated_values_stay_in_band() {
        let mut sensor = SimulatedSensor::new(SensorKind::Temperature, "temperature", 15., 28.);

        for _ in 0..100 {
            let reading = sensor.read_once();
            assert!((15. ..=28.).contains(&reading.value));
            assert_eq!(reading.kind, SensorKind::Temperature);
        }
    }

    #[test]
    fn emulated_values_stay_in_band_and_repeat() {
        let mut sensor = EmulatedSensor::new(SensorKind::Humidity, "humidity", 30., 60.);

        let first = sensor.read_once().value;
        for _ in 0..500 {
            let reading = sensor.read_once();
            assert!((30. ..=60.).contains(&reading.value));
        }

        // One full cycle later the curve repeats.
        let mut fresh = EmulatedSensor::new(SensorKind::Humidity, "humidity", 30., 60.);
        assert_eq!(fresh.read_once().value, first);
    }

    #[test]
    fn suite_covers_all_environmental_sensors() {
        let suite = sensor_suite(AdapterEngine::Emulated);

        let kinds: Vec<SensorKind> = suite.iter().map(|adapter| adapter.kind()).collect();
        assert_eq!(
            kinds,
            [
                SensorKind::Temperature,
                SensorKind::Humidity,
                SensorKind::Pressure
            ]
        );
    }
}
