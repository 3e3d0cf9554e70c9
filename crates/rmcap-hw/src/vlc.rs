//! Visible-light tracking camera capture loop.

use crate::sensor::{write_and_publish, CaptureError, Sensor, SensorError, SensorReader};
use crate::sink::TextureSink;
use crate::source::{FrameSource, VlcFrame};
use rmcap_core::remap::remap_into;
use rmcap_core::{FrameCache, Intrinsics, Resolution, SensorFamily, SensorKind, SensorOrientation};
use std::sync::Arc;

/// A VLC camera: greyscale frames mirrored per mounting, with gain/exposure.
pub struct VlcCamera<S, T> {
    kind: SensorKind,
    orientation: SensorOrientation,
    /// Display-oriented frame size, i.e. the device resolution transposed.
    native: Resolution,
    source: S,
    sink: T,
    cache: Arc<FrameCache>,
}

impl<S, T> VlcCamera<S, T>
where
    S: FrameSource,
    S::Frame: VlcFrame,
    T: TextureSink,
{
    /// Build a camera for a VLC sensor kind.
    ///
    /// Fails if `kind` is not a VLC sensor or the texture does not match the
    /// display-oriented frame size.
    pub fn new(kind: SensorKind, source: S, sink: T) -> Result<Self, SensorError> {
        let orientation = kind.vlc_orientation().ok_or(SensorError::FamilyMismatch {
            kind,
            expected: SensorFamily::Vlc,
        })?;
        let native = SensorFamily::Vlc.texture_resolution(source.resolution());
        if sink.resolution() != native {
            return Err(SensorError::TextureResolution {
                kind,
                expected: native,
                actual: sink.resolution(),
            });
        }

        tracing::info!(
            sensor = %kind,
            orientation = ?orientation,
            resolution = %native,
            row_pitch = sink.row_pitch(),
            "VLC camera ready"
        );

        Ok(Self {
            kind,
            orientation,
            native,
            source,
            sink,
            cache: Arc::new(FrameCache::new()),
        })
    }

    pub fn orientation(&self) -> SensorOrientation {
        self.orientation
    }

    pub fn resolution(&self) -> Resolution {
        self.native
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

        let intrinsics = Intrinsics {
            gain: frame.gain().map_err(CaptureError::Metadata)?,
            exposure: frame.exposure().map_err(CaptureError::Metadata)?,
        };

        let raw = frame.buffer().map_err(CaptureError::Buffer)?;
        let expected = self.native.pixel_count();
        if raw.len() < expected {
            return Err(CaptureError::Remap(rmcap_core::RemapError::ShortBuffer {
                expected,
                actual: raw.len(),
            }));
        }

        let (native, orientation) = (self.native, self.orientation);
        write_and_publish(&mut self.sink, native, &self.cache, intrinsics, |out, texture| {
            remap_into(raw, native, orientation, out, Some(texture))
        })
    }
}

impl<S, T> Sensor for VlcCamera<S, T>
where
    S: FrameSource,
    S::Frame: VlcFrame,
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
