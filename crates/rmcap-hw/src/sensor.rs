//! Sensor abstraction shared by the VLC and depth capture loops.

use crate::cpu_texture::CpuTexture;
use crate::depth::DepthCamera;
use crate::sink::{MappedTexture, SinkError, TextureSink};
use crate::source::FrameError;
use crate::synthetic::{SyntheticDepthSource, SyntheticVlcSource};
use crate::vlc::VlcCamera;
use rmcap_core::texture::TextureView;
use rmcap_core::{
    CachedFrame, FrameCache, GreyFrame, Intrinsics, RemapError, Resolution, SensorFamily,
    SensorKind,
};
use std::sync::Arc;
use thiserror::Error;

/// Why one capture iteration produced no frame.
///
/// Every variant is an expected, per-iteration condition: the loop marks
/// the cache invalid and the next iteration retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("sensor not ready")]
    DeviceUnready,
    #[error("no frame available")]
    FrameUnavailable,
    #[error("failed to read frame metadata: {0}")]
    Metadata(FrameError),
    #[error("failed to read frame buffer: {0}")]
    Buffer(FrameError),
    #[error("invalid frame buffer: {0}")]
    Remap(#[from] RemapError),
    #[error("texture sink unavailable: {0}")]
    SinkUnavailable(#[from] SinkError),
}

/// Construction-time misconfiguration.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("sensor {kind} is not a {expected} sensor")]
    FamilyMismatch {
        kind: SensorKind,
        expected: SensorFamily,
    },
    #[error("texture is {actual}, sensor {kind} produces {expected}")]
    TextureResolution {
        kind: SensorKind,
        expected: Resolution,
        actual: Resolution,
    },
    #[error("failed to spawn capture thread for {kind}: {source}")]
    Spawn {
        kind: SensorKind,
        #[source]
        source: std::io::Error,
    },
}

/// A sensor whose capture loop can be driven one iteration at a time.
pub trait Sensor: Send {
    fn kind(&self) -> SensorKind;

    /// Run one capture iteration.
    ///
    /// On error the cached frame has already been invalidated and the
    /// texture left as it was.
    fn run_once(&mut self) -> Result<(), CaptureError>;

    /// Client handle onto this sensor's frame cache.
    fn reader(&self) -> SensorReader;

    /// Tightly packed BGRA copy of the last submitted texture, if readable.
    fn texture_bgra(&self) -> Option<Vec<u8>>;
}

/// Cheap, clonable client view of a sensor's latest frame.
#[derive(Clone, Debug)]
pub struct SensorReader {
    kind: SensorKind,
    cache: Arc<FrameCache>,
}

impl SensorReader {
    pub(crate) fn new(kind: SensorKind, cache: Arc<FrameCache>) -> Self {
        Self { kind, cache }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Latest frame, or `None` while the sensor has nothing valid.
    pub fn get_frame(&self) -> Option<CachedFrame> {
        let frame = self.cache.read_frame();
        frame.is_valid.then_some(frame)
    }

    /// Gain and exposure of the latest frame, or `None` while invalid.
    pub fn get_intrinsics(&self) -> Option<Intrinsics> {
        let (intrinsics, valid) = self.cache.read_intrinsics();
        valid.then_some(intrinsics)
    }

    /// Current cache state, valid or not.
    pub fn snapshot(&self) -> CachedFrame {
        self.cache.read_frame()
    }
}

/// Map `sink`, fill both the texture and a fresh frame buffer with `fill`,
/// then publish to `cache` before the texture is unmapped and submitted.
pub(crate) fn write_and_publish<T, F>(
    sink: &mut T,
    resolution: Resolution,
    cache: &FrameCache,
    intrinsics: Intrinsics,
    fill: F,
) -> Result<(), CaptureError>
where
    T: TextureSink + ?Sized,
    F: FnOnce(&mut [u8], &mut TextureView<'_>) -> Result<(), RemapError>,
{
    let mut mapped = MappedTexture::acquire(sink)?;
    let mut view = mapped.view(resolution)?;
    let mut pixels = vec![0u8; resolution.pixel_count()];
    fill(&mut pixels, &mut view)?;
    cache.publish(GreyFrame::new(pixels, resolution)?, intrinsics);
    Ok(())
}

/// Open a sensor of `kind` backed by a synthetic source and a host texture.
pub fn open_synthetic(kind: SensorKind, row_alignment: u32) -> Result<Box<dyn Sensor>, SensorError> {
    let texture = CpuTexture::new(kind.texture_resolution(), row_alignment);
    let sensor: Box<dyn Sensor> = match kind.family() {
        SensorFamily::Vlc => Box::new(VlcCamera::new(
            kind,
            SyntheticVlcSource::new(kind.device_resolution()),
            texture,
        )?),
        SensorFamily::Depth => {
            let source = SyntheticDepthSource::new(kind)?;
            Box::new(DepthCamera::new(kind, source, texture)?)
        }
    };
    Ok(sensor)
}
