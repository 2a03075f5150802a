use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use crate::{NOT_SET, timestamp};

/// Default name of the device-wide performance sample.
pub const SYSTEM_PERF_NAME: &str = "system-performance";

/// A device-level CPU and memory utilization snapshot.
///
/// Both utilization figures are expected to fall within the 0.0–100.0 range,
/// although the range is not enforced.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PerformanceSample {
    /// Sample name, the cache key for this record.
    pub name: String,
    /// Identifier of the device location this sample was taken at.
    pub location_id: String,
    /// CPU utilization percentage.
    pub cpu_util: f64,
    /// Memory utilization percentage.
    pub mem_util: f64,
    /// Instant of the last mutation of this record.
    pub timestamp: DateTime<Utc>,
}

impl PerformanceSample {
    /// Creates a [`PerformanceSample`] with the default name, zero
    /// utilization figures and an unset location.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: SYSTEM_PERF_NAME.into(),
            location_id: NOT_SET.into(),
            cpu_util: 0.,
            mem_util: 0.,
            timestamp: Utc::now(),
        }
    }

    /// Sets the CPU utilization percentage, refreshing the timestamp.
    pub fn set_cpu_util(&mut self, cpu_util: f64) {
        self.cpu_util = cpu_util;
        self.timestamp = timestamp::refresh(self.timestamp);
    }

    /// Sets the memory utilization percentage, refreshing the timestamp.
    pub fn set_mem_util(&mut self, mem_util: f64) {
        self.mem_util = mem_util;
        self.timestamp = timestamp::refresh(self.timestamp);
    }

    /// Sets the location identifier, refreshing the timestamp.
    pub fn set_location_id(&mut self, location_id: impl Into<String>) {
        self.location_id = location_id.into();
        self.timestamp = timestamp::refresh(self.timestamp);
    }

    /// Encodes this sample as a JSON string.
    ///
    /// # Errors
    ///
    /// An error is returned when the record cannot be serialized.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a sample from a JSON string.
    ///
    /// # Errors
    ///
    /// An error is returned when the payload is not a valid sample.
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

impl Default for PerformanceSample {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{PerformanceSample, SYSTEM_PERF_NAME};

    #[test]
    fn json_round_trip() {
        let mut sample = PerformanceSample::new();
        sample.set_cpu_util(12.5);
        sample.set_mem_util(48.75);

        let decoded = PerformanceSample::from_json(&sample.to_json().unwrap()).unwrap();

        assert_eq!(decoded, sample);
        assert_eq!(decoded.name, SYSTEM_PERF_NAME);
    }

    #[test]
    fn timestamp_never_decreases() {
        let mut sample = PerformanceSample::new();

        let t0 = sample.timestamp;
        sample.set_cpu_util(3.);
        assert!(sample.timestamp >= t0);
    }
}
