use serde::{Deserialize, Serialize};

/// A logical upstream addressing key.
///
/// Resources name the relay channels a device exchanges records over. A
/// resource is independent of any transport: a pub/sub connector maps it to a
/// topic, a request/response connector to a URI path, and the persistence
/// connector uses it as a key prefix.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    /// Sensor readings relayed upstream.
    SensorMsg,
    /// Actuator commands delivered to the device.
    ActuatorCmd,
    /// Actuator responses echoed upstream.
    ActuatorResponse,
    /// Device performance samples.
    SystemPerfMsg,
}

impl Resource {
    /// The stable path of this resource, usable as a topic or a URI path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::SensorMsg => "brezza/device/sensor-msg",
            Self::ActuatorCmd => "brezza/device/actuator-cmd",
            Self::ActuatorResponse => "brezza/device/actuator-response",
            Self::SystemPerfMsg => "brezza/device/system-perf-msg",
        }
    }

    /// Parses a resource back from its stable path.
    ///
    /// Returns [`None`] for paths that do not name a known resource.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "brezza/device/sensor-msg" => Some(Self::SensorMsg),
            "brezza/device/actuator-cmd" => Some(Self::ActuatorCmd),
            "brezza/device/actuator-response" => Some(Self::ActuatorResponse),
            "brezza/device/system-perf-msg" => Some(Self::SystemPerfMsg),
            _ => None,
        }
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.path().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::Resource;

    const ALL: [Resource; 4] = [
        Resource::SensorMsg,
        Resource::ActuatorCmd,
        Resource::ActuatorResponse,
        Resource::SystemPerfMsg,
    ];

    #[test]
    fn path_round_trip() {
        for resource in ALL {
            assert_eq!(Resource::from_path(resource.path()), Some(resource));
        }
    }

    #[test]
    fn unknown_path_is_none() {
        assert_eq!(Resource::from_path("brezza/device/unknown"), None);
        assert_eq!(Resource::from_path(""), None);
    }
}
