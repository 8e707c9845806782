//! # Twins Runtime
//!
//! Entry point for the twins service.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use twin_runtime::{RuntimeConfig, TwinsRuntime};
use twin_telemetry::{encode_metrics, init_telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("Failed to load configuration")?;

    let _telemetry = init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    if config.credentials.is_empty() {
        warn!("TWINS_AUTH_TOKENS is empty, every authenticated call will be rejected");
    }

    let runtime = TwinsRuntime::new(config);
    runtime.start();

    info!("Twins service is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown();
    match encode_metrics() {
        Ok(snapshot) => debug!(metrics = %snapshot, "Final metrics snapshot"),
        Err(e) => warn!("Failed to encode metrics: {}", e),
    }
    info!("Shutdown complete");

    Ok(())
}
