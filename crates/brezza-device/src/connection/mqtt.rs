use std::sync::{Mutex, Weak};
use std::time::Duration;

use brezza::resource::Resource;

use async_trait::async_trait;

use rumqttc::v5::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, mqttbytes::QoS,
    mqttbytes::v5::Packet,
};

use tokio::task::JoinHandle;

use tokio_util::sync::CancellationToken;

use tracing::{debug, error, info, warn};

use crate::config::MqttConfig;
use crate::listener::MessageSink;

use super::Transport;

// The capacity of the bounded asynchronous channel.
const ASYNC_CHANNEL_CAPACITY: usize = 10;

fn to_qos(qos: u8) -> QoS {
    match qos {
        2 => QoS::ExactlyOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::AtMostOnce,
    }
}

struct Connection {
    client: AsyncClient,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// The pub/sub transport connector.
///
/// Publishes serialized records to broker topics named after their
/// [`Resource`] and delivers inbound publishes for subscribed resources to
/// the registered listener through its generic incoming-message entry point.
pub struct MqttTransport {
    client_id: String,
    config: MqttConfig,
    listener: Weak<dyn MessageSink>,
    connection: Mutex<Option<Connection>>,
}

impl core::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("client_id", &self.client_id)
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .finish_non_exhaustive()
    }
}

#[inline]
fn parse_publish(
    event: &Result<Event, ConnectionError>,
) -> Option<(String, String)> {
    let event = match event {
        Ok(event) => event,
        Err(e) => {
            error!("Error in receiving an event, discard it: {e}");
            return None;
        }
    };

    let packet = match event {
        Event::Incoming(packet) => packet,
        Event::Outgoing(_) => return None,
    };

    let Packet::Publish(publish) = packet else {
        debug!("Packet ignored: {:?}", packet);
        return None;
    };

    let topic = String::from_utf8_lossy(&publish.topic).into_owned();
    let payload = String::from_utf8_lossy(&publish.payload).into_owned();

    Some((topic, payload))
}

async fn run_event_loop(
    mut eventloop: EventLoop,
    token: CancellationToken,
    listener: Weak<dyn MessageSink>,
) {
    loop {
        tokio::select! {
            () = token.cancelled() => { break; }
            event = eventloop.poll() => {
                let Some((topic, payload)) = parse_publish(&event) else {
                    continue;
                };

                let Some(resource) = Resource::from_path(&topic) else {
                    warn!("Inbound publish on unknown topic `{topic}`. Ignoring.");
                    continue;
                };

                let Some(listener) = listener.upgrade() else {
                    // The manager is gone; nothing left to deliver to.
                    break;
                };

                if !listener.handle_incoming_message(resource, &payload).await {
                    warn!("Inbound payload for `{resource}` was rejected");
                }
            }
        }
    }
    drop(eventloop);
}

impl MqttTransport {
    /// Creates an [`MqttTransport`] delivering inbound publishes to the
    /// given listener.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        config: MqttConfig,
        listener: Weak<dyn MessageSink>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            config,
            listener,
            connection: Mutex::new(None),
        }
    }

    fn client(&self) -> Option<AsyncClient> {
        self.connection
            .lock()
            .expect("mqtt connection lock poisoned")
            .as_ref()
            .map(|connection| connection.client.clone())
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn connect(&self) -> bool {
        let mut connection = self
            .connection
            .lock()
            .expect("mqtt connection lock poisoned");
        if connection.is_some() {
            warn!(
                "MQTT client already connected to broker (host={}, port={}), ignoring request.",
                self.config.host, self.config.port
            );
            return false;
        }

        info!(
            "MQTT client connecting to broker (host={}, port={})",
            self.config.host, self.config.port
        );

        let mut options =
            MqttOptions::new(self.client_id.clone(), self.config.host.clone(), self.config.port);
        let _ = options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));

        let (client, eventloop) = AsyncClient::new(options, ASYNC_CHANNEL_CAPACITY);

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_event_loop(
            eventloop,
            token.clone(),
            self.listener.clone(),
        ));

        *connection = Some(Connection {
            client,
            token,
            handle,
        });

        true
    }

    async fn disconnect(&self) -> bool {
        let entry = self
            .connection
            .lock()
            .expect("mqtt connection lock poisoned")
            .take();

        let Some(connection) = entry else {
            warn!("MQTT client already disconnected, ignoring request.");
            return false;
        };

        if let Err(e) = connection.client.disconnect().await {
            error!("Failed to disconnect the MQTT client: {e}");
        }
        connection.token.cancel();
        if let Err(e) = connection.handle.await {
            error!("Failed to await the MQTT event loop task: {e}");
        }

        info!("MQTT client disconnected from broker.");
        true
    }

    async fn publish(&self, resource: Resource, payload: &str, qos: Option<u8>) -> bool {
        let Some(client) = self.client() else {
            warn!("MQTT client not connected, cannot publish to `{resource}`.");
            return false;
        };

        let qos = to_qos(qos.unwrap_or(self.config.qos));
        match client
            .publish(resource.path(), qos, false, payload.as_bytes().to_vec())
            .await
        {
            Ok(()) => {
                debug!("Published to MQTT resource `{resource}`");
                true
            }
            Err(e) => {
                error!("Failed to publish to MQTT resource `{resource}`: {e}");
                false
            }
        }
    }

    async fn subscribe(&self, resource: Resource, qos: Option<u8>) -> bool {
        let Some(client) = self.client() else {
            warn!("MQTT client not connected, cannot subscribe to `{resource}`.");
            return false;
        };

        let qos = to_qos(qos.unwrap_or(self.config.qos));
        match client.subscribe(resource.path(), qos).await {
            Ok(()) => {
                info!("Subscribed to MQTT resource `{resource}`");
                true
            }
            Err(e) => {
                error!("Failed to subscribe to MQTT resource `{resource}`: {e}");
                false
            }
        }
    }

    async fn unsubscribe(&self, resource: Resource) -> bool {
        let Some(client) = self.client() else {
            warn!("MQTT client not connected, cannot unsubscribe from `{resource}`.");
            return false;
        };

        match client.unsubscribe(resource.path()).await {
            Ok(()) => {
                info!("Unsubscribed from MQTT resource `{resource}`");
                true
            }
            Err(e) => {
                error!("Failed to unsubscribe from MQTT resource `{resource}`: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rumqttc::v5::mqttbytes::QoS;

    use super::to_qos;

    #[test]
    fn qos_mapping_saturates_to_at_most_once() {
        assert_eq!(to_qos(0), QoS::AtMostOnce);
        assert_eq!(to_qos(1), QoS::AtLeastOnce);
        assert_eq!(to_qos(2), QoS::ExactlyOnce);
        assert_eq!(to_qos(7), QoS::AtMostOnce);
    }
}
