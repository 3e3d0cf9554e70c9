use rmcap_core::{SensorFamily, SensorKind};
use rmcap_hw::{CaptureHandle, CaptureStats};
use serde::Serialize;

/// Point-in-time view of one capture thread, logged as JSON.
#[derive(Debug, Serialize)]
pub struct SensorStatus {
    pub sensor: SensorKind,
    pub family: SensorFamily,
    pub running: bool,
    pub valid: bool,
    pub width: u32,
    pub height: u32,
    /// Gain and exposure of the latest VLC frame; absent for depth or while invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure: Option<u64>,
    pub sequence: u64,
    #[serde(flatten)]
    pub stats: CaptureStats,
}

impl SensorStatus {
    pub fn of(handle: &CaptureHandle) -> Self {
        let kind = handle.kind();
        let frame = handle.reader().snapshot();
        let intrinsics = match kind.family() {
            SensorFamily::Vlc if frame.is_valid => Some(frame.intrinsics),
            _ => None,
        };
        Self {
            sensor: kind,
            family: kind.family(),
            running: handle.is_running(),
            valid: frame.is_valid,
            width: frame.width,
            height: frame.height,
            gain: intrinsics.map(|i| i.gain),
            exposure: intrinsics.map(|i| i.exposure),
            sequence: frame.sequence,
            stats: handle.stats(),
        }
    }
}
