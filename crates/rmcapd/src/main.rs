use anyhow::{Context, Result};
use rmcap_hw::{open_synthetic, spawn_capture, CaptureHandle, CaptureOptions};
use tracing_subscriber::EnvFilter;

mod config;
mod status;

use config::Config;
use status::SensorStatus;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rmcapd starting");

    let config = Config::from_env().context("invalid configuration")?;
    let mut handles = start_sensors(&config)?;

    tracing::info!(sensors = handles.len(), "rmcapd ready");

    let mut ticker = tokio::time::interval(config.status_interval);
    // The first tick completes immediately; skip it so the first report has data.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => log_status(&handles),
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                break;
            }
        }
    }

    tracing::info!("rmcapd shutting down");
    // Joining capture threads blocks; keep it off the async workers.
    tokio::task::spawn_blocking(move || {
        for handle in handles.iter_mut() {
            handle.stop();
        }
    })
    .await
    .context("capture shutdown task failed")?;

    Ok(())
}

/// Open every configured sensor and start its capture thread.
fn start_sensors(config: &Config) -> Result<Vec<CaptureHandle>> {
    let mut handles = Vec::with_capacity(config.sensors.len());
    for sensor in &config.sensors {
        let opened = open_synthetic(sensor.kind, config.row_alignment)
            .with_context(|| format!("failed to open sensor {}", sensor.kind))?;
        let handle = spawn_capture(
            opened,
            CaptureOptions {
                interval: sensor.interval,
                stall_after: config.stall_after,
            },
        )?;
        handles.push(handle);
    }
    Ok(handles)
}

fn log_status(handles: &[CaptureHandle]) {
    for handle in handles {
        let status = SensorStatus::of(handle);
        match serde_json::to_string(&status) {
            Ok(json) => tracing::info!(sensor = %status.sensor, status = %json, "sensor status"),
            Err(err) => tracing::warn!(sensor = %status.sensor, error = %err, "failed to encode status"),
        }
    }
}
