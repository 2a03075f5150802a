use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use tokio_util::sync::CancellationToken;

use tracing::{debug, error, info, warn};

use crate::listener::MessageSink;
use crate::sim::SensorAdapter;

// Upper bound on waiting for the in-flight poll cycle when stopping.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The telemetry poller.
///
/// On a fixed interval, acquires one reading from every registered sensor
/// adapter, stamps the device location onto it, and forwards it to the
/// listener. At most one poll cycle is in flight at a time; a tick that
/// would overlap a still-running cycle is skipped rather than queued.
pub struct TelemetryPoller {
    interval: Duration,
    location_id: String,
    adapters: Arc<Mutex<Vec<Box<dyn SensorAdapter>>>>,
    running: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl core::fmt::Debug for TelemetryPoller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TelemetryPoller")
            .field("interval", &self.interval)
            .field("location_id", &self.location_id)
            .finish_non_exhaustive()
    }
}

async fn run_poll_loop(
    interval: Duration,
    location_id: String,
    adapters: Arc<Mutex<Vec<Box<dyn SensorAdapter>>>>,
    token: CancellationToken,
    listener: Arc<dyn MessageSink>,
) {
    let mut ticker = tokio::time::interval(interval);
    // Coalesce ticks missed while a cycle was in flight instead of bursting.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = token.cancelled() => { break; }
            _ = ticker.tick() => {
                // Acquire every reading before forwarding any, so the
                // adapter lock is never held across an await point.
                let readings: Vec<_> = {
                    let mut adapters = adapters.lock().expect("sensor adapters lock poisoned");
                    adapters
                        .iter_mut()
                        .map(|adapter| {
                            let mut reading = adapter.read_once();
                            reading.set_location_id(location_id.clone());
                            reading
                        })
                        .collect()
                };

                for reading in readings {
                    debug!("Polled reading: {reading}");
                    if !listener.handle_sensor_message(reading).await {
                        warn!("Listener rejected a polled reading");
                    }
                }
            }
        }
    }
}

impl TelemetryPoller {
    /// Creates a [`TelemetryPoller`] over the given sensor adapters.
    #[must_use]
    pub fn new(
        interval: Duration,
        location_id: impl Into<String>,
        adapters: Vec<Box<dyn SensorAdapter>>,
    ) -> Self {
        Self {
            interval,
            location_id: location_id.into(),
            adapters: Arc::new(Mutex::new(adapters)),
            running: Mutex::new(None),
        }
    }

    /// Starts the background poll loop, forwarding readings to `listener`.
    ///
    /// Starting an already running poller is a no-op.
    pub fn start(&self, listener: Arc<dyn MessageSink>) {
        let mut running = self.running.lock().expect("poller state lock poisoned");
        if running.is_some() {
            warn!("Telemetry poller already started. Ignoring.");
            return;
        }

        info!("Starting telemetry poller (interval {:?})", self.interval);

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_poll_loop(
            self.interval,
            self.location_id.clone(),
            Arc::clone(&self.adapters),
            token.clone(),
            listener,
        ));

        *running = Some((token, handle));
    }

    /// Stops the background poll loop, waiting for an in-flight cycle to
    /// drain within a bounded shutdown timeout.
    ///
    /// Stopping an already stopped poller is a no-op.
    pub async fn stop(&self) {
        let entry = self
            .running
            .lock()
            .expect("poller state lock poisoned")
            .take();

        let Some((token, handle)) = entry else {
            warn!("Telemetry poller already stopped. Ignoring.");
            return;
        };

        token.cancel();
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(())) => info!("Stopped telemetry poller."),
            Ok(Err(e)) => error!("Failed to await the poll task: {e}"),
            Err(_) => error!("Telemetry poller did not drain within {SHUTDOWN_TIMEOUT:?}"),
        }
    }
}
