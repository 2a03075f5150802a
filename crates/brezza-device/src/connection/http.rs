use std::sync::Mutex;
use std::time::Duration;

use brezza::resource::Resource;

use async_trait::async_trait;

use reqwest::Client;

use tracing::{debug, error, info, warn};

use crate::config::HttpConfig;

use super::Transport;

/// The request/response transport connector.
///
/// Publishing a record maps to a `PUT` of its serialized payload against the
/// resource path below the configured base URL. Every request carries the
/// configured bounded timeout, so a stalled endpoint cannot stall the
/// control loop.
pub struct HttpTransport {
    config: HttpConfig,
    client: Mutex<Option<Client>>,
}

impl core::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.config.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Creates an [`HttpTransport`] for the given endpoint settings.
    #[must_use]
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    fn url(&self, resource: Resource) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            resource.path()
        )
    }

    fn connected_client(&self) -> Option<Client> {
        self.client
            .lock()
            .expect("http client lock poisoned")
            .clone()
    }

    /// Retrieves the current upstream representation of a resource.
    ///
    /// Returns the response body, or [`None`] when the transport is not
    /// connected or the request fails.
    pub async fn send_get(&self, resource: Resource) -> Option<String> {
        let client = self.connected_client()?;

        let response = match client.get(self.url(resource)).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to GET resource `{resource}`: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            error!(
                "GET for resource `{resource}` answered with status {}",
                response.status()
            );
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                error!("Failed to read the GET body for `{resource}`: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn connect(&self) -> bool {
        let mut client = self.client.lock().expect("http client lock poisoned");
        if client.is_some() {
            warn!("HTTP client already built, ignoring request.");
            return false;
        }

        match Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
        {
            Ok(built) => {
                info!("HTTP client ready for `{}`", self.config.base_url);
                *client = Some(built);
                true
            }
            Err(e) => {
                error!("Failed to build the HTTP client: {e}");
                false
            }
        }
    }

    async fn disconnect(&self) -> bool {
        let dropped = self
            .client
            .lock()
            .expect("http client lock poisoned")
            .take()
            .is_some();

        if dropped {
            info!("HTTP client released.");
        } else {
            warn!("HTTP client already released, ignoring request.");
        }
        dropped
    }

    async fn publish(&self, resource: Resource, payload: &str, _qos: Option<u8>) -> bool {
        let Some(client) = self.connected_client() else {
            warn!("HTTP client not connected, cannot PUT to `{resource}`.");
            return false;
        };

        match client
            .put(self.url(resource))
            .body(payload.to_owned())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("PUT to HTTP resource `{resource}`");
                true
            }
            Ok(response) => {
                error!(
                    "PUT to HTTP resource `{resource}` answered with status {}",
                    response.status()
                );
                false
            }
            Err(e) => {
                error!("Failed to PUT to HTTP resource `{resource}`: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use brezza::resource::Resource;

    use crate::config::HttpConfig;
    use crate::connection::Transport;

    use super::HttpTransport;

    #[test]
    fn resource_url_joins_base_and_path() {
        let transport = HttpTransport::new(HttpConfig {
            base_url: "http://gateway.local:8080/".into(),
            timeout_secs: 5,
        });

        assert_eq!(
            transport.url(Resource::SensorMsg),
            "http://gateway.local:8080/brezza/device/sensor-msg"
        );
    }

    #[tokio::test]
    async fn operations_require_a_connection() {
        let transport = HttpTransport::new(HttpConfig::default());

        assert!(!transport.publish(Resource::SensorMsg, "{}", None).await);
        assert!(transport.send_get(Resource::SensorMsg).await.is_none());
        assert!(!transport.disconnect().await);

        assert!(transport.connect().await);
        // Connecting twice is a guarded no-op.
        assert!(!transport.connect().await);
        assert!(transport.disconnect().await);
    }

    #[tokio::test]
    async fn subscriptions_are_unsupported() {
        let transport = HttpTransport::new(HttpConfig::default());

        assert!(!transport.subscribe(Resource::ActuatorCmd, None).await);
        assert!(!transport.unsubscribe(Resource::ActuatorCmd).await);
    }
}
