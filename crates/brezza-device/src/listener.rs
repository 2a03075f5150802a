use async_trait::async_trait;

use brezza::actuation::Actuation;
use brezza::perf::PerformanceSample;
use brezza::reading::SensorReading;
use brezza::resource::Resource;

/// The entry points a device data manager exposes to its sub-managers.
///
/// This is the only contract between the telemetry poller, the performance
/// monitor, the actuation dispatcher, the transport connectors, and the
/// coordination core. Every method must be safe to invoke concurrently from
/// any task; faults are signalled through the boolean or optional return,
/// never through a panic or an error type.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Handles a freshly acquired sensor reading.
    ///
    /// Returns `false` when the reading is rejected as invalid.
    async fn handle_sensor_message(&self, reading: SensorReading) -> bool;

    /// Handles an actuator command, locally generated or received upstream.
    ///
    /// Returns the dispatch response, or [`None`] when the command was
    /// rejected or suppressed as a duplicate.
    async fn handle_actuator_command_message(&self, command: Actuation) -> Option<Actuation>;

    /// Handles the response produced by an applied actuator command.
    ///
    /// Returns `false` when the response is rejected as invalid.
    async fn handle_actuator_command_response(&self, response: Actuation) -> bool;

    /// Handles a device performance sample.
    ///
    /// Returns `false` when the sample is rejected as invalid.
    async fn handle_performance_message(&self, sample: PerformanceSample) -> bool;

    /// Handles a raw transport payload addressed to the given resource.
    ///
    /// The payload is decoded according to the resource kind and re-enters
    /// the matching typed handler. Returns `false` when the payload cannot
    /// be decoded.
    async fn handle_incoming_message(&self, resource: Resource, payload: &str) -> bool;
}
