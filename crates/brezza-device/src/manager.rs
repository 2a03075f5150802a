use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use brezza::actuation::{Actuation, ActuatorKind, Command};
use brezza::perf::PerformanceSample;
use brezza::reading::{SensorKind, SensorReading};
use brezza::resource::Resource;

use async_trait::async_trait;

use tracing::{debug, error, info, warn};

use crate::config::DeviceConfig;
use crate::connection::http::HttpTransport;
use crate::connection::mqtt::MqttTransport;
use crate::connection::persistence::RedbPersistence;
use crate::connection::{PersistenceConnector, Transport};
use crate::dispatch::ActuationDispatcher;
use crate::error::Result;
use crate::listener::MessageSink;
use crate::perf::PerformanceMonitor;
use crate::poller::TelemetryPoller;
use crate::sim;

// Name of the actuator driven by the built-in temperature rule.
const HVAC_ACTUATOR_NAME: &str = "hvac";

/// The device data manager.
///
/// The single coordination point between periodic sensor acquisition, local
/// actuation dispatch, upstream transport connectors, and the best-effort
/// reading store. It owns the local control policy and the three
/// latest-value caches (sensor readings, actuator responses, performance
/// samples), each keyed by record name with last-writer-wins semantics.
///
/// Every optional subsystem is held as an optional reference and
/// presence-guarded at its call sites; a disabled or failed subsystem never
/// destabilizes the local control loop.
///
/// The manager's public surface towards its sub-managers is exactly the
/// [`MessageSink`] contract; [`DeviceDataManager::start`] and
/// [`DeviceDataManager::stop`] bracket its lifecycle.
pub struct DeviceDataManager {
    config: DeviceConfig,
    started: AtomicBool,
    sensor_cache: Mutex<HashMap<String, SensorReading>>,
    response_cache: Mutex<HashMap<String, Actuation>>,
    perf_cache: Mutex<HashMap<String, PerformanceSample>>,
    dispatcher: Option<ActuationDispatcher>,
    poller: Option<TelemetryPoller>,
    perf_monitor: Option<PerformanceMonitor>,
    transports: Vec<Arc<dyn Transport>>,
    persistence: Option<Arc<dyn PersistenceConnector>>,
}

impl core::fmt::Debug for DeviceDataManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceDataManager")
            .field("config", &self.config)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl DeviceDataManager {
    /// Creates a [`DeviceDataManager`], constructing every subsystem enabled
    /// by the configuration.
    ///
    /// # Errors
    ///
    /// An error is returned when the configuration is unusable
    /// (`hvac_trigger_floor >= hvac_trigger_ceiling`).
    pub fn new(mut config: DeviceConfig) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Self::assemble(config, None))
    }

    /// Creates a [`DeviceDataManager`] over the given connectors instead of
    /// the ones the configuration would construct.
    ///
    /// The transport and persistence gates of the configuration are ignored;
    /// the sub-manager gates still apply. This is the seam for plugging in
    /// custom connector implementations.
    ///
    /// # Errors
    ///
    /// An error is returned when the configuration is unusable
    /// (`hvac_trigger_floor >= hvac_trigger_ceiling`).
    pub fn with_connectors(
        mut config: DeviceConfig,
        transports: Vec<Arc<dyn Transport>>,
        persistence: Option<Arc<dyn PersistenceConnector>>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Self::assemble(config, Some((transports, persistence))))
    }

    #[allow(clippy::type_complexity)]
    fn assemble(
        config: DeviceConfig,
        connectors: Option<(Vec<Arc<dyn Transport>>, Option<Arc<dyn PersistenceConnector>>)>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Self>| {
            let listener = me.clone() as Weak<dyn MessageSink>;

            let dispatcher = config.enable_actuation.then(|| {
                info!("Actuation dispatcher enabled.");
                ActuationDispatcher::new(
                    config.location_id.clone(),
                    sim::actuator_suite(config.adapter_engine),
                    listener.clone(),
                )
            });

            let poller = config.enable_sensing.then(|| {
                info!("Telemetry poller enabled.");
                TelemetryPoller::new(
                    Duration::from_secs(config.poll_interval_secs),
                    config.location_id.clone(),
                    sim::sensor_suite(config.adapter_engine),
                )
            });

            let perf_monitor = config.enable_performance_monitoring.then(|| {
                info!("Performance monitor enabled.");
                PerformanceMonitor::new(
                    Duration::from_secs(config.perf_interval_secs),
                    config.location_id.clone(),
                )
            });

            let (transports, persistence) = match connectors {
                Some(connectors) => connectors,
                None => {
                    let mut transports: Vec<Arc<dyn Transport>> = Vec::new();
                    if config.enable_mqtt {
                        info!("Pub/sub transport enabled.");
                        transports.push(Arc::new(MqttTransport::new(
                            config.device_id.clone(),
                            config.mqtt.clone(),
                            listener.clone(),
                        )));
                    }
                    if config.enable_http {
                        info!("Request/response transport enabled.");
                        transports.push(Arc::new(HttpTransport::new(config.http.clone())));
                    }

                    let persistence = config.enable_persistence.then(|| {
                        info!("Persistence connector enabled.");
                        Arc::new(RedbPersistence::new(config.persistence.path.clone()))
                            as Arc<dyn PersistenceConnector>
                    });

                    (transports, persistence)
                }
            };

            Self {
                config,
                started: AtomicBool::new(false),
                sensor_cache: Mutex::new(HashMap::new()),
                response_cache: Mutex::new(HashMap::new()),
                perf_cache: Mutex::new(HashMap::new()),
                dispatcher,
                poller,
                perf_monitor,
                transports,
                persistence,
            }
        })
    }

    /// Starts every enabled subsystem: the performance monitor, the
    /// telemetry poller, the persistence connector, and finally each
    /// transport connector (connect, then subscribe to inbound commands).
    ///
    /// Starting an already started manager is a no-op. A subsystem that
    /// fails to start is logged and skipped; it never prevents the others
    /// from starting.
    pub async fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Device data manager already started. Ignoring.");
            return;
        }

        info!("Starting device data manager...");

        if let Some(monitor) = &self.perf_monitor {
            monitor.start(Arc::clone(self) as Arc<dyn MessageSink>);
        }

        if let Some(poller) = &self.poller {
            poller.start(Arc::clone(self) as Arc<dyn MessageSink>);
        }

        if let Some(persistence) = &self.persistence {
            if !persistence.connect().await {
                error!("Failed to open the persistence store.");
            }
        }

        for transport in &self.transports {
            if !transport.connect().await {
                error!("Failed to connect a transport connector.");
                continue;
            }
            if !transport.subscribe(Resource::ActuatorCmd, None).await {
                debug!("Transport did not subscribe to inbound commands.");
            }
        }

        info!("Device data manager started.");
    }

    /// Stops every enabled subsystem in the reverse order of
    /// [`DeviceDataManager::start`]: transports, persistence, the telemetry
    /// poller, and finally the performance monitor.
    ///
    /// Safe to call while polling or transport activity is in flight;
    /// in-flight handler invocations drain within a bounded timeout.
    /// Stopping an already stopped manager is a no-op.
    pub async fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            warn!("Device data manager already stopped. Ignoring.");
            return;
        }

        info!("Stopping device data manager...");

        for transport in &self.transports {
            let _ = transport.unsubscribe(Resource::ActuatorCmd).await;
            if !transport.disconnect().await {
                warn!("A transport connector was already disconnected.");
            }
        }

        if let Some(persistence) = &self.persistence {
            if !persistence.disconnect().await {
                warn!("The persistence store was already closed.");
            }
        }

        if let Some(poller) = &self.poller {
            poller.stop().await;
        }

        if let Some(monitor) = &self.perf_monitor {
            monitor.stop().await;
        }

        info!("Stopped device data manager.");
    }

    /// Retrieves the latest cached reading for the named sensor.
    ///
    /// Returns [`None`] when the name has never been observed.
    #[must_use]
    pub fn latest_sensor(&self, name: &str) -> Option<SensorReading> {
        self.sensor_cache
            .lock()
            .expect("sensor cache lock poisoned")
            .get(name)
            .cloned()
    }

    /// Retrieves the latest cached response for the named actuator.
    ///
    /// Returns [`None`] when the name has never been observed.
    #[must_use]
    pub fn latest_actuator_response(&self, name: &str) -> Option<Actuation> {
        self.response_cache
            .lock()
            .expect("response cache lock poisoned")
            .get(name)
            .cloned()
    }

    /// Retrieves the latest cached performance sample with the given name.
    ///
    /// Returns [`None`] when the name has never been observed.
    #[must_use]
    pub fn latest_performance(&self, name: &str) -> Option<PerformanceSample> {
        self.perf_cache
            .lock()
            .expect("performance cache lock poisoned")
            .get(name)
            .cloned()
    }

    // Relays a serialized record to every configured transport. Each
    // connector's failure is independent and non-fatal to the others.
    async fn relay_upstream(&self, resource: Resource, payload: &str) {
        for transport in &self.transports {
            if transport.publish(resource, payload, None).await {
                debug!("Relayed `{resource}` upstream");
            } else {
                error!("Failed to relay `{resource}` upstream");
            }
        }
    }

    // Evaluates the built-in temperature rule against a reading.
    //
    // The transition is stateless: each reading is classified freshly
    // against the configured band, and the emitted command always targets a
    // band boundary, never the raw excursion. The command re-enters the
    // generic dispatch path exactly like an externally received one.
    async fn evaluate_sensor_policy(&self, reading: &SensorReading) {
        if reading.kind != SensorKind::Temperature {
            return;
        }

        if !self.config.handle_temperature_locally {
            debug!("Device is not configured to handle temperature locally. Ignoring.");
            return;
        }

        let floor = self.config.hvac_trigger_floor;
        let ceiling = self.config.hvac_trigger_ceiling;

        let mut command = Actuation::command(ActuatorKind::Hvac, HVAC_ACTUATOR_NAME);
        command.set_location_id(self.config.location_id.clone());

        if reading.value > ceiling {
            command.set_command(Command::On);
            command.set_value(ceiling);
        } else if reading.value < floor {
            command.set_command(Command::On);
            command.set_value(floor);
        } else {
            command.set_command(Command::Off);
            command.set_value(floor);
        }

        debug!(
            "Temperature {} classified against [{floor}, {ceiling}]: {:?} {}",
            reading.value, command.command, command.value
        );

        let _ = self.handle_actuator_command_message(command).await;
    }
}

#[async_trait]
impl MessageSink for DeviceDataManager {
    async fn handle_sensor_message(&self, reading: SensorReading) -> bool {
        if reading.name.is_empty() {
            warn!("Incoming sensor reading is invalid (unnamed). Ignoring.");
            return false;
        }

        debug!("Handling sensor message: {reading}");

        if let Some(persistence) = &self.persistence {
            if !persistence.store(Resource::SensorMsg, &reading).await {
                warn!("Failed to persist the reading `{}`", reading.name);
            }
        }

        self.evaluate_sensor_policy(&reading).await;

        match reading.to_json() {
            Ok(payload) => self.relay_upstream(Resource::SensorMsg, &payload).await,
            Err(e) => error!("Reading `{}` cannot be serialized: {e}", reading.name),
        }

        let _ = self
            .sensor_cache
            .lock()
            .expect("sensor cache lock poisoned")
            .insert(reading.name.clone(), reading);

        true
    }

    async fn handle_actuator_command_message(&self, command: Actuation) -> Option<Actuation> {
        if command.name.is_empty() {
            warn!("Incoming actuator command is invalid (unnamed). Ignoring.");
            return None;
        }

        debug!("Handling actuator command message: {command}");

        let Some(dispatcher) = &self.dispatcher else {
            warn!("Actuation is disabled, ignoring command for `{}`.", command.name);
            return None;
        };

        dispatcher.dispatch(&command).await
    }

    async fn handle_actuator_command_response(&self, response: Actuation) -> bool {
        if response.name.is_empty() {
            warn!("Incoming actuator response is invalid (unnamed). Ignoring.");
            return false;
        }

        debug!("Handling actuator command response: {response}");

        let _ = self
            .response_cache
            .lock()
            .expect("response cache lock poisoned")
            .insert(response.name.clone(), response.clone());

        match response.to_json() {
            Ok(payload) => {
                self.relay_upstream(Resource::ActuatorResponse, &payload)
                    .await;
            }
            Err(e) => error!("Response `{}` cannot be serialized: {e}", response.name),
        }

        true
    }

    async fn handle_performance_message(&self, sample: PerformanceSample) -> bool {
        if sample.name.is_empty() {
            warn!("Incoming performance sample is invalid (unnamed). Ignoring.");
            return false;
        }

        debug!(
            "Handling performance message: cpu {:.1}%, mem {:.1}%",
            sample.cpu_util, sample.mem_util
        );

        // Performance data is local-only: cached, never relayed upstream.
        let _ = self
            .perf_cache
            .lock()
            .expect("performance cache lock poisoned")
            .insert(sample.name.clone(), sample);

        true
    }

    async fn handle_incoming_message(&self, resource: Resource, payload: &str) -> bool {
        debug!("Handling incoming message for `{resource}`");

        match resource {
            Resource::ActuatorCmd => match Actuation::from_json(payload) {
                Ok(command) => {
                    // A suppressed or rejected dispatch is a no-op here, not
                    // a failure of the inbound delivery.
                    let _ = self.handle_actuator_command_message(command).await;
                    true
                }
                Err(e) => {
                    warn!("Inbound actuator command cannot be decoded: {e}");
                    false
                }
            },
            Resource::SensorMsg => match SensorReading::from_json(payload) {
                Ok(reading) => self.handle_sensor_message(reading).await,
                Err(e) => {
                    warn!("Inbound sensor reading cannot be decoded: {e}");
                    false
                }
            },
            Resource::ActuatorResponse => match Actuation::from_json(payload) {
                Ok(response) => self.handle_actuator_command_response(response).await,
                Err(e) => {
                    warn!("Inbound actuator response cannot be decoded: {e}");
                    false
                }
            },
            Resource::SystemPerfMsg => match PerformanceSample::from_json(payload) {
                Ok(sample) => self.handle_performance_message(sample).await,
                Err(e) => {
                    warn!("Inbound performance sample cannot be decoded: {e}");
                    false
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use brezza::actuation::{Actuation, ActuatorKind, Command, STATUS_OK};
    use brezza::perf::PerformanceSample;
    use brezza::reading::{SensorKind, SensorReading};
    use brezza::resource::Resource;

    use crate::config::DeviceConfig;
    use crate::connection::{PersistenceConnector, Transport};
    use crate::listener::MessageSink;

    use super::DeviceDataManager;

    #[derive(Default)]
    struct RecordingTransport {
        connects: AtomicUsize,
        disconnects: AtomicUsize,
        subscriptions: Mutex<Vec<Resource>>,
        published: Mutex<Vec<(Resource, String)>>,
    }

    impl RecordingTransport {
        fn published_to(&self, resource: Resource) -> Vec<String> {
            self.published
                .lock()
                .unwrap()
                .iter()
                .filter(|(r, _)| *r == resource)
                .map(|(_, payload)| payload.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn connect(&self) -> bool {
            self.connects.fetch_add(1, Ordering::SeqCst);
            true
        }

        async fn disconnect(&self) -> bool {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            true
        }

        async fn publish(&self, resource: Resource, payload: &str, _qos: Option<u8>) -> bool {
            self.published
                .lock()
                .unwrap()
                .push((resource, payload.to_owned()));
            true
        }

        async fn subscribe(&self, resource: Resource, _qos: Option<u8>) -> bool {
            self.subscriptions.lock().unwrap().push(resource);
            true
        }

        async fn unsubscribe(&self, _resource: Resource) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        readings: Mutex<HashMap<String, SensorReading>>,
    }

    #[async_trait]
    impl PersistenceConnector for RecordingStore {
        async fn connect(&self) -> bool {
            true
        }

        async fn disconnect(&self) -> bool {
            true
        }

        async fn store(&self, _resource: Resource, reading: &SensorReading) -> bool {
            let _ = self
                .readings
                .lock()
                .unwrap()
                .insert(reading.name.clone(), reading.clone());
            true
        }
    }

    fn test_config() -> DeviceConfig {
        DeviceConfig {
            location_id: "greenhouse-1".into(),
            ..DeviceConfig::default()
        }
    }

    fn temperature(value: f64) -> SensorReading {
        let mut reading =
            SensorReading::new(SensorKind::Temperature, "temperature").with_value(value);
        reading.set_location_id("greenhouse-1");
        reading
    }

    fn wired_manager() -> (
        Arc<DeviceDataManager>,
        Arc<RecordingTransport>,
        Arc<RecordingStore>,
    ) {
        let transport = Arc::new(RecordingTransport::default());
        let store = Arc::new(RecordingStore::default());
        let manager = DeviceDataManager::with_connectors(
            test_config(),
            vec![Arc::clone(&transport) as Arc<dyn Transport>],
            Some(Arc::clone(&store) as Arc<dyn PersistenceConnector>),
        )
        .unwrap();
        (manager, transport, store)
    }

    #[tokio::test]
    async fn high_temperature_drives_hvac_to_ceiling() {
        let (manager, transport, store) = wired_manager();

        assert!(manager.handle_sensor_message(temperature(30.)).await);

        let response = manager.latest_actuator_response("hvac").unwrap();
        assert!(response.is_response);
        assert_eq!(response.command, Command::On);
        assert_eq!(response.value, 26.);
        assert_eq!(response.status_code, STATUS_OK);

        // The reading was persisted, relayed, and cached; the response was
        // relayed as well.
        assert!(store.readings.lock().unwrap().contains_key("temperature"));
        assert_eq!(transport.published_to(Resource::SensorMsg).len(), 1);
        assert_eq!(transport.published_to(Resource::ActuatorResponse).len(), 1);
        assert_eq!(manager.latest_sensor("temperature").unwrap().value, 30.);
    }

    #[tokio::test]
    async fn low_temperature_drives_hvac_to_floor() {
        let (manager, _transport, _store) = wired_manager();

        assert!(manager.handle_sensor_message(temperature(10.)).await);

        let response = manager.latest_actuator_response("hvac").unwrap();
        assert_eq!(response.command, Command::On);
        assert_eq!(response.value, 18.);
    }

    #[tokio::test]
    async fn in_band_temperature_turns_hvac_off() {
        let (manager, _transport, _store) = wired_manager();

        assert!(manager.handle_sensor_message(temperature(22.)).await);

        let response = manager.latest_actuator_response("hvac").unwrap();
        assert_eq!(response.command, Command::Off);
        assert_eq!(response.value, 18.);
    }

    #[tokio::test]
    async fn repeated_policy_outcome_is_suppressed() {
        let (manager, transport, _store) = wired_manager();

        // Two distinct excursions past the ceiling map to one command.
        assert!(manager.handle_sensor_message(temperature(30.)).await);
        assert!(manager.handle_sensor_message(temperature(31.5)).await);

        assert_eq!(transport.published_to(Resource::SensorMsg).len(), 2);
        assert_eq!(transport.published_to(Resource::ActuatorResponse).len(), 1);
    }

    #[tokio::test]
    async fn emitted_value_stays_within_the_band() {
        let (manager, _transport, _store) = wired_manager();

        for value in [-40., 10., 22., 30., 85.] {
            assert!(manager.handle_sensor_message(temperature(value)).await);
            let response = manager.latest_actuator_response("hvac").unwrap();
            assert!(
                (18. ..=26.).contains(&response.value),
                "value {value} emitted {}",
                response.value
            );
        }
    }

    #[tokio::test]
    async fn disabled_policy_only_caches_and_relays() {
        let transport = Arc::new(RecordingTransport::default());
        let manager = DeviceDataManager::with_connectors(
            DeviceConfig {
                handle_temperature_locally: false,
                ..test_config()
            },
            vec![Arc::clone(&transport) as Arc<dyn Transport>],
            None,
        )
        .unwrap();

        assert!(manager.handle_sensor_message(temperature(30.)).await);

        assert!(manager.latest_actuator_response("hvac").is_none());
        assert_eq!(transport.published_to(Resource::SensorMsg).len(), 1);
    }

    #[tokio::test]
    async fn location_mismatch_command_is_ignored() {
        let (manager, _transport, _store) = wired_manager();

        let mut command = Actuation::command(ActuatorKind::Hvac, "hvac")
            .with_command(Command::On)
            .with_value(26.);
        command.set_location_id("somewhere-else");

        assert_eq!(manager.handle_actuator_command_message(command).await, None);
        assert!(manager.latest_actuator_response("hvac").is_none());
    }

    #[tokio::test]
    async fn runs_with_all_connectors_disabled() {
        let manager = DeviceDataManager::new(test_config()).unwrap();

        assert!(manager.handle_sensor_message(temperature(30.)).await);

        // The control loop is unaffected by the missing connectors.
        let response = manager.latest_actuator_response("hvac").unwrap();
        assert_eq!(response.command, Command::On);
        assert_eq!(manager.latest_sensor("temperature").unwrap().value, 30.);
    }

    #[tokio::test]
    async fn caches_are_last_writer_wins() {
        let (manager, _transport, _store) = wired_manager();

        assert!(manager.handle_sensor_message(temperature(20.)).await);
        assert!(manager.handle_sensor_message(temperature(24.)).await);

        assert_eq!(manager.latest_sensor("temperature").unwrap().value, 24.);
        assert!(manager.latest_sensor("humidity").is_none());

        let mut sample = PerformanceSample::new();
        sample.set_cpu_util(12.5);
        assert!(manager.handle_performance_message(sample).await);
        let cached = manager
            .latest_performance(brezza::perf::SYSTEM_PERF_NAME)
            .unwrap();
        assert_eq!(cached.cpu_util, 12.5);
    }

    #[tokio::test]
    async fn unnamed_records_are_rejected() {
        let (manager, _transport, _store) = wired_manager();

        let mut reading = temperature(22.);
        reading.name = String::new();
        assert!(!manager.handle_sensor_message(reading).await);

        let mut response = Actuation::command(ActuatorKind::Hvac, "").into_response(STATUS_OK);
        response.set_location_id("greenhouse-1");
        assert!(!manager.handle_actuator_command_response(response).await);
    }

    #[tokio::test]
    async fn garbled_inbound_payload_is_rejected() {
        let (manager, _transport, _store) = wired_manager();

        assert!(
            !manager
                .handle_incoming_message(Resource::ActuatorCmd, "not json")
                .await
        );
        assert!(
            !manager
                .handle_incoming_message(Resource::SensorMsg, "{\"kind\": 42}")
                .await
        );
    }

    #[tokio::test]
    async fn inbound_command_reaches_the_actuator() {
        let (manager, transport, _store) = wired_manager();

        let mut command = Actuation::command(ActuatorKind::Hvac, "hvac")
            .with_command(Command::On)
            .with_value(24.);
        command.set_location_id("greenhouse-1");
        let payload = command.to_json().unwrap();

        assert!(
            manager
                .handle_incoming_message(Resource::ActuatorCmd, &payload)
                .await
        );

        let response = manager.latest_actuator_response("hvac").unwrap();
        assert_eq!(response.value, 24.);
        assert_eq!(transport.published_to(Resource::ActuatorResponse).len(), 1);
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let transport = Arc::new(RecordingTransport::default());
        let manager = DeviceDataManager::with_connectors(
            DeviceConfig {
                enable_sensing: false,
                enable_performance_monitoring: false,
                ..test_config()
            },
            vec![Arc::clone(&transport) as Arc<dyn Transport>],
            None,
        )
        .unwrap();

        manager.start().await;
        manager.start().await;

        assert_eq!(transport.connects.load(Ordering::SeqCst), 1);
        assert_eq!(
            transport.subscriptions.lock().unwrap().as_slice(),
            &[Resource::ActuatorCmd]
        );

        manager.stop().await;
        manager.stop().await;

        assert_eq!(transport.disconnects.load(Ordering::SeqCst), 1);
    }
}
