//! Dedicated capture thread per sensor.
//!
//! The thread calls [`Sensor::run_once`] at a fixed cadence until stopped.
//! Failed iterations are normal while a sensor warms up, so they are logged
//! at debug level; a sensor that keeps failing is reported once at warn.

use crate::sensor::{Sensor, SensorError, SensorReader};
use rmcap_core::SensorKind;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Capture thread settings.
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    /// Target time between iteration starts.
    pub interval: Duration,
    /// Consecutive failures before the sensor is reported as stalled.
    pub stall_after: u64,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(33),
            stall_after: 30,
        }
    }
}

/// Iteration counters for one capture thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    pub frames: u64,
    pub failures: u64,
    pub consecutive_failures: u64,
}

#[derive(Default)]
struct Counters {
    frames: AtomicU64,
    failures: AtomicU64,
    consecutive_failures: AtomicU64,
}

/// Owner of a running capture thread. Dropping it stops and joins the thread.
pub struct CaptureHandle {
    reader: SensorReader,
    stop: Arc<AtomicBool>,
    counters: Arc<Counters>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    pub fn kind(&self) -> SensorKind {
        self.reader.kind()
    }

    pub fn reader(&self) -> SensorReader {
        self.reader.clone()
    }

    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            frames: self.counters.frames.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            consecutive_failures: self.counters.consecutive_failures.load(Ordering::Relaxed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the thread to exit and wait for it.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        thread.thread().unpark();
        if thread.join().is_err() {
            tracing::error!(sensor = %self.reader.kind(), "capture thread panicked");
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn a named OS thread that drives `sensor` until the handle is stopped.
pub fn spawn_capture(
    mut sensor: Box<dyn Sensor>,
    options: CaptureOptions,
) -> Result<CaptureHandle, SensorError> {
    let kind = sensor.kind();
    let reader = sensor.reader();
    let stop = Arc::new(AtomicBool::new(false));
    let counters = Arc::new(Counters::default());

    let thread_stop = Arc::clone(&stop);
    let thread_counters = Arc::clone(&counters);
    let thread = std::thread::Builder::new()
        .name(format!("rmcap-{kind}"))
        .spawn(move || {
            tracing::info!(sensor = %kind, interval_ms = options.interval.as_millis() as u64, "capture thread started");
            while !thread_stop.load(Ordering::Acquire) {
                let started = Instant::now();
                run_iteration(sensor.as_mut(), &thread_counters, options.stall_after);
                if let Some(rest) = options.interval.checked_sub(started.elapsed()) {
                    std::thread::park_timeout(rest);
                }
            }
            tracing::info!(sensor = %kind, "capture thread exiting");
        })
        .map_err(|source| SensorError::Spawn { kind, source })?;

    Ok(CaptureHandle {
        reader,
        stop,
        counters,
        thread: Some(thread),
    })
}

fn run_iteration(sensor: &mut dyn Sensor, counters: &Counters, stall_after: u64) {
    let kind = sensor.kind();
    match sensor.run_once() {
        Ok(()) => {
            counters.frames.fetch_add(1, Ordering::Relaxed);
            let previous = counters.consecutive_failures.swap(0, Ordering::Relaxed);
            if stall_after > 0 && previous >= stall_after {
                tracing::info!(sensor = %kind, failed_iterations = previous, "sensor recovered");
            }
        }
        Err(err) => {
            counters.failures.fetch_add(1, Ordering::Relaxed);
            let streak = counters.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
            if streak == stall_after {
                tracing::warn!(sensor = %kind, error = %err, streak, "sensor producing no frames");
            } else {
                tracing::debug!(sensor = %kind, error = %err, "capture iteration failed");
            }
        }
    }
}
