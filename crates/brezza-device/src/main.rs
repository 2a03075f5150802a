use tracing::{info, warn};

use brezza_device::config::DeviceConfig;
use brezza_device::error::Result;
use brezza_device::manager::DeviceDataManager;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brezza=info,brezza_device=info".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => DeviceConfig::load(path)?,
        None => {
            warn!("No configuration file given, using the built-in defaults.");
            DeviceConfig::default()
        }
    };

    let manager = DeviceDataManager::new(config)?;
    manager.start().await;

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for the shutdown signal: {e}");
    }

    info!("Shutdown signal received.");
    manager.stop().await;

    Ok(())
}
