//! Frame source boundary.
//!
//! A research-mode device exposes each sensor as a source that can be
//! asked to start a capture and then for its latest frame. Frames are
//! borrowed for one loop iteration only and are never cached by the loop.

use rmcap_core::Resolution;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// A device accessor returned a failure status.
    #[error("{call} failed with status {status:#010x}")]
    Device { call: &'static str, status: u32 },
    #[error("{0} is not available on this frame")]
    Unavailable(&'static str),
}

/// A sensor that yields frames on demand.
pub trait FrameSource: Send {
    type Frame;

    /// Prepare the sensor for a capture. `false` means the sensor is not ready.
    fn begin_capture(&mut self) -> bool;

    /// Latest frame, or `None` when nothing is ready this cycle.
    fn query_latest_frame(&mut self) -> Option<Self::Frame>;

    /// Resolution as the device reports it, before any family-specific swap.
    fn resolution(&self) -> Resolution;
}

/// Accessors on a visible-light camera frame.
pub trait VlcFrame {
    fn gain(&self) -> Result<u32, FrameError>;
    fn exposure(&self) -> Result<u64, FrameError>;
    /// 8-bit pixels, row-major over the device-reported resolution.
    fn buffer(&self) -> Result<&[u8], FrameError>;
}

/// Accessors on a depth camera frame.
pub trait DepthFrame {
    /// Little-endian 16-bit millimetre samples.
    fn depth_buffer(&self) -> Result<&[u8], FrameError>;

    /// Per-pixel sigma flags. Only long-throw frames carry them.
    fn sigma_buffer(&self) -> Result<Option<&[u8]>, FrameError> {
        Ok(None)
    }
}
