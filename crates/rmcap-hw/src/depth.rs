//! Depth camera capture loop.

use crate::sensor::{write_and_publish, CaptureError, Sensor, SensorError, SensorReader};
use crate::sink::TextureSink;
use crate::source::{DepthFrame, FrameError, FrameSource};
use rmcap_core::depth::{depth_into, DEPTH_BYTES_PER_PIXEL};
use rmcap_core::{
    FrameCache, Intrinsics, RemapError, Resolution, SensorFamily, SensorKind, ThrowMode,
};
use std::sync::Arc;

/// A depth camera in either short- or long-throw mode.
///
/// Depth frames carry no gain or exposure; the cache publishes zeroed
/// intrinsics and clients read only frames.
pub struct DepthCamera<S, T> {
    kind: SensorKind,
    mode: ThrowMode,
    resolution: Resolution,
    source: S,
    sink: T,
    cache: Arc<FrameCache>,
}

impl<S, T> DepthCamera<S, T>
where
    S: FrameSource,
    S::Frame: DepthFrame,
    T: TextureSink,
{
    pub fn new(kind: SensorKind, source: S, sink: T) -> Result<Self, SensorError> {
        let mode = kind.throw_mode().ok_or(SensorError::FamilyMismatch {
            kind,
            expected: SensorFamily::Depth,
        })?;
        let resolution = SensorFamily::Depth.texture_resolution(source.resolution());
        if sink.resolution() != resolution {
            return Err(SensorError::TextureResolution {
                kind,
                expected: resolution,
                actual: sink.resolution(),
            });
        }

        tracing::info!(
            sensor = %kind,
            mode = ?mode,
            resolution = %resolution,
            max_clamp_mm = mode.max_clamp_mm(),
            "depth camera ready"
        );

        Ok(Self {
            kind,
            mode,
            resolution,
            source,
            sink,
            cache: Arc::new(FrameCache::new()),
        })
    }

    pub fn mode(&self) -> ThrowMode {
        self.mode
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    fn capture(&mut self) -> Result<(), CaptureError> {
        if !self.source.begin_capture() {
            return Err(CaptureError::DeviceUnready);
        }
        let frame = self
            .source
            .query_latest_frame()
            .ok_or(CaptureError::FrameUnavailable)?;

        let pixels = self.resolution.pixel_count();
        let raw = frame.depth_buffer().map_err(CaptureError::Buffer)?;
        if raw.len() < pixels * DEPTH_BYTES_PER_PIXEL {
            return Err(CaptureError::Remap(RemapError::ShortBuffer {
                expected: pixels * DEPTH_BYTES_PER_PIXEL,
                actual: raw.len(),
            }));
        }
        let sigma = frame.sigma_buffer().map_err(CaptureError::Buffer)?;
        if self.mode.has_sigma() {
            let sigma =
                sigma.ok_or(CaptureError::Buffer(FrameError::Unavailable("sigma buffer")))?;
            if sigma.len() < pixels {
                return Err(CaptureError::Remap(RemapError::ShortBuffer {
                    expected: pixels,
                    actual: sigma.len(),
                }));
            }
        }

        let (resolution, mode) = (self.resolution, self.mode);
        write_and_publish(
            &mut self.sink,
            resolution,
            &self.cache,
            Intrinsics::default(),
            |out, texture| depth_into(raw, sigma, resolution, mode, out, Some(texture)),
        )
    }
}

impl<S, T> Sensor for DepthCamera<S, T>
where
    S: FrameSource,
    S::Frame: DepthFrame,
    T: TextureSink,
{
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn run_once(&mut self) -> Result<(), CaptureError> {
        let result = self.capture();
        if result.is_err() {
            self.cache.invalidate();
        }
        result
    }

    fn reader(&self) -> SensorReader {
        SensorReader::new(self.kind, Arc::clone(&self.cache))
    }

    fn texture_bgra(&self) -> Option<Vec<u8>> {
        self.sink.read_bgra()
    }
}
