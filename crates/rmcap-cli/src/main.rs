use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rmcap_core::SensorKind;
use rmcap_hw::{open_synthetic, Sensor};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rmcap", about = "Research-mode sensor capture tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported sensors
    Sensors,
    /// Run a sensor's capture loop and print each iteration's result as JSON
    Probe {
        /// Sensor name (e.g., "left-front", "depth-ahat")
        #[arg(short, long)]
        sensor: SensorKind,
        /// Number of capture iterations
        #[arg(short = 'n', long, default_value_t = 5)]
        frames: usize,
    },
    /// Capture frames and save the sensor texture as a PNG
    Snapshot {
        #[arg(short, long)]
        sensor: SensorKind,
        /// Output image path
        #[arg(short, long)]
        output: PathBuf,
        /// Capture iterations to run before saving
        #[arg(short = 'n', long, default_value_t = 1)]
        frames: usize,
        /// Texture row alignment in bytes
        #[arg(long, default_value_t = 256)]
        row_alignment: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sensors => {
            for kind in SensorKind::all() {
                let orientation = kind
                    .vlc_orientation()
                    .map(|o| format!("{o:?}"))
                    .or_else(|| kind.throw_mode().map(|m| format!("{m:?} throw")))
                    .unwrap_or_default();
                println!(
                    "{:<18} {:<6} {:>9}  {}",
                    kind.name(),
                    kind.family(),
                    kind.texture_resolution().to_string(),
                    orientation
                );
            }
        }
        Commands::Probe { sensor, frames } => {
            tracing::info!(sensor = %sensor, frames, "probing sensor");
            let mut opened = open_synthetic(sensor, 256)?;
            let reader = opened.reader();
            for iteration in 1..=frames {
                let outcome = opened.run_once();
                let frame = reader.snapshot();
                let line = serde_json::json!({
                    "iteration": iteration,
                    "sensor": sensor,
                    "ok": outcome.is_ok(),
                    "error": outcome.err().map(|e| e.to_string()),
                    "frame": frame,
                });
                println!("{line}");
            }
        }
        Commands::Snapshot {
            sensor,
            output,
            frames,
            row_alignment,
        } => {
            tracing::info!(sensor = %sensor, frames, row_alignment, "capturing snapshot");
            let mut opened = open_synthetic(sensor, row_alignment)?;
            capture_frames(opened.as_mut(), frames)?;
            let resolution = sensor.texture_resolution();
            let bgra = opened
                .texture_bgra()
                .context("sensor texture cannot be read back")?;
            let image = image::RgbaImage::from_raw(resolution.width, resolution.height, bgra_to_rgba(bgra))
                .context("texture size does not match sensor resolution")?;
            image
                .save(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Saved {resolution} {sensor} texture to {}", output.display());
        }
    }

    Ok(())
}

/// Run `frames` iterations and require the last one to succeed.
fn capture_frames(sensor: &mut dyn Sensor, frames: usize) -> Result<()> {
    let mut last = None;
    for iteration in 1..=frames.max(1) {
        let outcome = sensor.run_once();
        if let Err(err) = &outcome {
            tracing::debug!(iteration, error = %err, "capture iteration failed");
        }
        last = Some(outcome);
    }
    match last {
        Some(Ok(())) => Ok(()),
        Some(Err(err)) => bail!("last capture failed: {err}"),
        None => bail!("no capture attempted"),
    }
}

/// Swap blue and red and make every texel opaque.
fn bgra_to_rgba(mut texels: Vec<u8>) -> Vec<u8> {
    for px in texels.chunks_exact_mut(4) {
        px.swap(0, 2);
        px[3] = u8::MAX;
    }
    texels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_to_rgba() {
        assert_eq!(bgra_to_rgba(vec![1, 2, 3, 0, 9, 9, 9, 0]), vec![3, 2, 1, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn test_capture_frames_on_synthetic_sensor() {
        let mut sensor = open_synthetic(SensorKind::RightRight, 64).unwrap();
        capture_frames(sensor.as_mut(), 2).unwrap();
        assert!(sensor.reader().get_frame().is_some());
    }
}
