use std::path::Path;

use serde::Deserialize;

use tracing::warn;

use crate::error::{Error, ErrorKind, Result};

/// Default telemetry poll interval, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default performance sampling interval, in seconds.
pub const DEFAULT_PERF_INTERVAL_SECS: u64 = 30;

fn config_error(info: impl Into<std::borrow::Cow<'static, str>>) -> Error {
    Error::new(ErrorKind::Config, info)
}

/// The adapter backing selected at startup.
///
/// Each variant is produced by the same factory; a hardware backing plugs in
/// at the same seam and is provided by a separate crate.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterEngine {
    /// Pseudo-random values within a configured band.
    #[default]
    Simulated,
    /// Deterministic diurnal-curve values.
    Emulated,
}

/// Connection settings for the pub/sub transport.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker host name or address.
    pub host: String,
    /// Broker port number.
    pub port: u16,
    /// Keep-alive interval, in seconds.
    pub keep_alive_secs: u64,
    /// Default quality of service for publishes and subscriptions (0, 1, 2).
    pub qos: u8,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            keep_alive_secs: 5,
            qos: 0,
        }
    }
}

/// Connection settings for the request/response transport.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Base URL resources are resolved against.
    pub base_url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            timeout_secs: 5,
        }
    }
}

/// Settings for the best-effort persistence connector.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Database file path.
    pub path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: "brezza-device.redb".into(),
        }
    }
}

/// Device configuration.
///
/// Every optional subsystem is gated here; a disabled subsystem is never
/// constructed, and its absence is presence-guarded at every call site.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device identifier, used as the transport client identity.
    pub device_id: String,
    /// Location identifier stamped onto every record produced locally.
    ///
    /// Inbound commands addressed to another location are ignored.
    pub location_id: String,
    /// Constructs the telemetry poller.
    pub enable_sensing: bool,
    /// Constructs the actuation dispatcher.
    pub enable_actuation: bool,
    /// Constructs the performance monitor.
    pub enable_performance_monitoring: bool,
    /// Constructs the pub/sub transport connector.
    pub enable_mqtt: bool,
    /// Constructs the request/response transport connector.
    pub enable_http: bool,
    /// Constructs the persistence connector.
    pub enable_persistence: bool,
    /// Evaluates the temperature control policy locally.
    ///
    /// When disabled, temperature readings are only cached and relayed.
    pub handle_temperature_locally: bool,
    /// Temperature below which the HVAC unit is driven back to the floor.
    pub hvac_trigger_floor: f64,
    /// Temperature above which the HVAC unit is driven back to the ceiling.
    pub hvac_trigger_ceiling: f64,
    /// Telemetry poll interval, in seconds. Zero is corrected to the default.
    pub poll_interval_secs: u64,
    /// Performance sampling interval, in seconds. Zero is corrected to the
    /// default.
    pub perf_interval_secs: u64,
    /// The adapter backing constructed by the factory.
    pub adapter_engine: AdapterEngine,
    /// Pub/sub transport settings.
    pub mqtt: MqttConfig,
    /// Request/response transport settings.
    pub http: HttpConfig,
    /// Persistence settings.
    pub persistence: PersistenceConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: "brezza-device-001".into(),
            location_id: brezza::NOT_SET.into(),
            enable_sensing: true,
            enable_actuation: true,
            enable_performance_monitoring: true,
            enable_mqtt: false,
            enable_http: false,
            enable_persistence: false,
            handle_temperature_locally: true,
            hvac_trigger_floor: 18.,
            hvac_trigger_ceiling: 26.,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            perf_interval_secs: DEFAULT_PERF_INTERVAL_SECS,
            adapter_engine: AdapterEngine::Simulated,
            mqtt: MqttConfig::default(),
            http: HttpConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// Loads and validates a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// An error is returned when the file cannot be read or parsed, or when
    /// the control policy thresholds are unusable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            config_error(format!(
                "cannot read configuration file `{}`: {e}",
                path.display()
            ))
        })?;

        let mut config: Self = toml::from_str(&contents)
            .map_err(|e| config_error(format!("invalid configuration: {e}")))?;
        config.validate()?;

        Ok(config)
    }

    /// Validates this configuration, correcting recoverable values.
    ///
    /// A zero poll or sampling interval is corrected to its default with a
    /// warning. An unusable control policy is a fatal condition: the process
    /// must not start with `hvac_trigger_floor >= hvac_trigger_ceiling`.
    ///
    /// # Errors
    ///
    /// An error is returned when the control policy thresholds are unusable.
    pub fn validate(&mut self) -> Result<()> {
        if self.hvac_trigger_floor >= self.hvac_trigger_ceiling {
            return Err(config_error(format!(
                "hvac trigger floor ({}) must be below the ceiling ({})",
                self.hvac_trigger_floor, self.hvac_trigger_ceiling
            )));
        }

        if self.poll_interval_secs == 0 {
            warn!(
                "Poll interval of 0s is invalid, corrected to {DEFAULT_POLL_INTERVAL_SECS}s default"
            );
            self.poll_interval_secs = DEFAULT_POLL_INTERVAL_SECS;
        }

        if self.perf_interval_secs == 0 {
            warn!(
                "Performance sampling interval of 0s is invalid, corrected to {DEFAULT_PERF_INTERVAL_SECS}s default"
            );
            self.perf_interval_secs = DEFAULT_PERF_INTERVAL_SECS;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::{AdapterEngine, DEFAULT_POLL_INTERVAL_SECS, DeviceConfig};

    #[test]
    fn default_configuration_is_valid() {
        let mut config = DeviceConfig::default();

        config.validate().unwrap();

        assert!(config.enable_sensing);
        assert!(!config.enable_mqtt);
        assert_eq!(config.adapter_engine, AdapterEngine::Simulated);
    }

    #[test]
    fn inverted_thresholds_are_fatal() {
        let mut config = DeviceConfig {
            hvac_trigger_floor: 30.,
            hvac_trigger_ceiling: 20.,
            ..DeviceConfig::default()
        };

        let error = config.validate().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[test]
    fn zero_poll_interval_is_corrected() {
        let mut config = DeviceConfig {
            poll_interval_secs: 0,
            ..DeviceConfig::default()
        };

        config.validate().unwrap();

        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    }

    #[test]
    fn parses_toml_tables() {
        let config: DeviceConfig = toml::from_str(
            r#"
            location_id = "greenhouse-1"
            enable_mqtt = true
            adapter_engine = "emulated"

            [mqtt]
            host = "broker.local"
            port = 8883
            "#,
        )
        .unwrap();

        assert_eq!(config.location_id, "greenhouse-1");
        assert!(config.enable_mqtt);
        assert_eq!(config.adapter_engine, AdapterEngine::Emulated);
        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 8883);
        // Unspecified tables keep their defaults.
        assert_eq!(config.http.timeout_secs, 5);
    }
}
