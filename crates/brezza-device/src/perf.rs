use std::sync::{Arc, Mutex};
use std::time::Duration;

use brezza::perf::PerformanceSample;

use sysinfo::System;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use tokio_util::sync::CancellationToken;

use tracing::{debug, error, info, warn};

use crate::listener::MessageSink;

// Upper bound on waiting for the in-flight sampling cycle when stopping.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The device performance monitor.
///
/// On a fixed interval, samples CPU and memory utilization and forwards a
/// [`PerformanceSample`] to the listener. Skipped ticks are coalesced like
/// the telemetry poller's.
pub struct PerformanceMonitor {
    interval: Duration,
    location_id: String,
    running: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl core::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("interval", &self.interval)
            .field("location_id", &self.location_id)
            .finish_non_exhaustive()
    }
}

fn sample_utilization(system: &mut System) -> (f64, f64) {
    system.refresh_cpu_usage();
    system.refresh_memory();

    let cpu_util = f64::from(system.global_cpu_usage());
    let mem_util = if system.total_memory() == 0 {
        0.
    } else {
        system.used_memory() as f64 / system.total_memory() as f64 * 100.
    };

    (cpu_util, mem_util)
}

async fn run_sampling_loop(
    interval: Duration,
    location_id: String,
    token: CancellationToken,
    listener: Arc<dyn MessageSink>,
) {
    let mut system = System::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = token.cancelled() => { break; }
            _ = ticker.tick() => {
                let (cpu_util, mem_util) = sample_utilization(&mut system);

                let mut sample = PerformanceSample::new();
                sample.set_location_id(location_id.clone());
                sample.set_cpu_util(cpu_util);
                sample.set_mem_util(mem_util);

                debug!("Sampled performance: cpu {cpu_util:.1}%, mem {mem_util:.1}%");
                if !listener.handle_performance_message(sample).await {
                    warn!("Listener rejected a performance sample");
                }
            }
        }
    }
}

impl PerformanceMonitor {
    /// Creates a [`PerformanceMonitor`] sampling at the given interval.
    #[must_use]
    pub fn new(interval: Duration, location_id: impl Into<String>) -> Self {
        Self {
            interval,
            location_id: location_id.into(),
            running: Mutex::new(None),
        }
    }

    /// Starts the background sampling loop, forwarding samples to
    /// `listener`.
    ///
    /// Starting an already running monitor is a no-op.
    pub fn start(&self, listener: Arc<dyn MessageSink>) {
        let mut running = self.running.lock().expect("monitor state lock poisoned");
        if running.is_some() {
            warn!("Performance monitor already started. Ignoring.");
            return;
        }

        info!("Starting performance monitor (interval {:?})", self.interval);

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_sampling_loop(
            self.interval,
            self.location_id.clone(),
            token.clone(),
            listener,
        ));

        *running = Some((token, handle));
    }

    /// Stops the background sampling loop within a bounded shutdown timeout.
    ///
    /// Stopping an already stopped monitor is a no-op.
    pub async fn stop(&self) {
        let entry = self
            .running
            .lock()
            .expect("monitor state lock poisoned")
            .take();

        let Some((token, handle)) = entry else {
            warn!("Performance monitor already stopped. Ignoring.");
            return;
        };

        token.cancel();
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(())) => info!("Stopped performance monitor."),
            Ok(Err(e)) => error!("Failed to await the sampling task: {e}"),
            Err(_) => error!("Performance monitor did not drain within {SHUTDOWN_TIMEOUT:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use sysinfo::System;

    use super::sample_utilization;

    #[test]
    fn utilization_is_in_percentage_range() {
        let mut system = System::new();

        let (cpu_util, mem_util) = sample_utilization(&mut system);

        assert!((0. ..=100.).contains(&cpu_util));
        assert!((0. ..=100.).contains(&mem_util));
    }
}
