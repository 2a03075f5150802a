use async_trait::async_trait;

use brezza::reading::SensorReading;
use brezza::resource::Resource;

use tracing::debug;

/// Request/response transport connector.
pub mod http;
/// Pub/sub transport connector.
pub mod mqtt;
/// Best-effort persistence connector.
pub mod persistence;

/// An upstream transport connector.
///
/// Every operation returns a boolean outcome instead of an error: a failed
/// connector call is logged at its detection point and isolated from the
/// other connectors and from the local control loop. Implementations must
/// bound the time any call can block.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connects to the remote endpoint.
    ///
    /// Connecting an already connected transport is a no-op returning
    /// `false`.
    async fn connect(&self) -> bool;

    /// Disconnects from the remote endpoint.
    ///
    /// Disconnecting an already disconnected transport is a no-op returning
    /// `false`.
    async fn disconnect(&self) -> bool;

    /// Sends a serialized record to the named upstream resource.
    ///
    /// The optional quality of service only applies to transports with a
    /// delivery-guarantee notion; others ignore it.
    async fn publish(&self, resource: Resource, payload: &str, qos: Option<u8>) -> bool;

    /// Subscribes to inbound deliveries for the named resource.
    ///
    /// Transports without an inbound delivery channel ignore the request.
    async fn subscribe(&self, resource: Resource, qos: Option<u8>) -> bool {
        debug!("Transport has no subscription support for `{resource}`. Ignoring.");
        false
    }

    /// Cancels the subscription for the named resource.
    async fn unsubscribe(&self, resource: Resource) -> bool {
        debug!("Transport has no subscription support for `{resource}`. Ignoring.");
        false
    }
}

/// A best-effort store of the latest sensor reading per resource and name.
///
/// No transactional guarantee is provided; a failed store is logged and
/// reported through the boolean outcome only.
#[async_trait]
pub trait PersistenceConnector: Send + Sync {
    /// Opens the underlying store.
    async fn connect(&self) -> bool;

    /// Closes the underlying store.
    async fn disconnect(&self) -> bool;

    /// Stores a reading keyed by resource and reading name.
    async fn store(&self, resource: Resource, reading: &SensorReading) -> bool;
}
