//! Synthetic frame sources for running without research-mode hardware.
//!
//! Each source renders a moving test pattern so successive frames differ,
//! and the VLC source varies gain and exposure per frame.

use crate::sensor::SensorError;
use crate::source::{DepthFrame, FrameError, FrameSource, VlcFrame};
use rmcap_core::{Resolution, SensorFamily, SensorKind, ThrowMode};

/// Owned frame produced by [`SyntheticVlcSource`].
pub struct SyntheticVlcFrame {
    data: Vec<u8>,
    gain: u32,
    exposure: u64,
}

impl VlcFrame for SyntheticVlcFrame {
    fn gain(&self) -> Result<u32, FrameError> {
        Ok(self.gain)
    }

    fn exposure(&self) -> Result<u64, FrameError> {
        Ok(self.exposure)
    }

    fn buffer(&self) -> Result<&[u8], FrameError> {
        Ok(&self.data)
    }
}

/// Diagonal gradient that scrolls by a few pixels per frame.
pub struct SyntheticVlcSource {
    resolution: Resolution,
    tick: u64,
    drop_every: Option<u64>,
}

impl SyntheticVlcSource {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            tick: 0,
            drop_every: None,
        }
    }

    /// Report no frame on every `n`th query, like a sensor running slower
    /// than its poll rate.
    pub fn with_drop_every(mut self, n: u64) -> Self {
        self.drop_every = (n > 0).then_some(n);
        self
    }
}

impl FrameSource for SyntheticVlcSource {
    type Frame = SyntheticVlcFrame;

    fn begin_capture(&mut self) -> bool {
        true
    }

    fn query_latest_frame(&mut self) -> Option<SyntheticVlcFrame> {
        self.tick += 1;
        if self.drop_every.is_some_and(|n| self.tick % n == 0) {
            return None;
        }

        // Device layout: row-major over the reported resolution. The
        // gradient runs along device rows, which display as columns.
        let width = self.resolution.width.max(1) as usize;
        let shift = self.tick * 3;
        let data = (0..self.resolution.pixel_count())
            .map(|k| {
                let (row, col) = (k / width, k % width);
                (2 * col as u64 + row as u64 + shift) as u8
            })
            .collect();

        Some(SyntheticVlcFrame {
            data,
            gain: 64 + (self.tick % 32) as u32,
            exposure: 8_000 + (self.tick % 50) * 100,
        })
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Owned frame produced by [`SyntheticDepthSource`].
pub struct SyntheticDepthFrame {
    depth: Vec<u8>,
    sigma: Option<Vec<u8>>,
}

impl DepthFrame for SyntheticDepthFrame {
    fn depth_buffer(&self) -> Result<&[u8], FrameError> {
        Ok(&self.depth)
    }

    fn sigma_buffer(&self) -> Result<Option<&[u8]>, FrameError> {
        Ok(self.sigma.as_deref())
    }
}

/// Horizontal depth ramp running a quarter past the clamp distance, so the
/// far edge exercises the out-of-range path. Long throw also flags a sparse
/// set of pixels through the sigma buffer.
pub struct SyntheticDepthSource {
    resolution: Resolution,
    mode: ThrowMode,
    tick: u64,
}

impl SyntheticDepthSource {
    pub fn new(kind: SensorKind) -> Result<Self, SensorError> {
        let mode = kind.throw_mode().ok_or(SensorError::FamilyMismatch {
            kind,
            expected: SensorFamily::Depth,
        })?;
        Ok(Self {
            resolution: kind.device_resolution(),
            mode,
            tick: 0,
        })
    }
}

impl FrameSource for SyntheticDepthSource {
    type Frame = SyntheticDepthFrame;

    fn begin_capture(&mut self) -> bool {
        true
    }

    fn query_latest_frame(&mut self) -> Option<SyntheticDepthFrame> {
        self.tick += 1;
        let width = u64::from(self.resolution.width.max(1));
        let span = u64::from(self.mode.max_clamp_mm()) * 5 / 4;
        let pixels = self.resolution.pixel_count();

        let mut depth = Vec::with_capacity(pixels * 2);
        for k in 0..pixels as u64 {
            let mm = ((k % width) * span / width + self.tick * 10) % span;
            depth.extend_from_slice(&(mm as u16).to_le_bytes());
        }

        let sigma = self.mode.has_sigma().then(|| {
            (0..pixels as u64)
                .map(|k| if (k + self.tick) % 37 == 0 { 0x80 } else { 0 })
                .collect()
        });

        Some(SyntheticDepthFrame { depth, sigma })
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vlc_frames_change_between_queries() {
        let mut source = SyntheticVlcSource::new(Resolution::new(8, 4));
        let a = source.query_latest_frame().unwrap();
        let b = source.query_latest_frame().unwrap();
        assert_eq!(a.buffer().unwrap().len(), 32);
        assert_ne!(a.buffer().unwrap(), b.buffer().unwrap());
        assert_ne!(a.gain().unwrap(), b.gain().unwrap());
    }

    #[test]
    fn test_vlc_frame_is_in_device_layout() {
        let mut source = SyntheticVlcSource::new(Resolution::new(4, 2));
        let frame = source.query_latest_frame().unwrap();
        let data = frame.buffer().unwrap();
        // Steps of 2 along a device row, 1 down a device column.
        assert_eq!(data[1].wrapping_sub(data[0]), 2);
        assert_eq!(data[4].wrapping_sub(data[0]), 1);
    }

    #[test]
    fn test_drop_every() {
        let mut source = SyntheticVlcSource::new(Resolution::new(2, 2)).with_drop_every(3);
        let got: Vec<bool> = (0..6).map(|_| source.query_latest_frame().is_some()).collect();
        assert_eq!(got, vec![true, true, false, true, true, false]);
    }

    #[test]
    fn test_depth_source_sizes() {
        let mut ahat = SyntheticDepthSource::new(SensorKind::DepthAhat).unwrap();
        let frame = ahat.query_latest_frame().unwrap();
        assert_eq!(frame.depth_buffer().unwrap().len(), 512 * 512 * 2);
        assert!(frame.sigma_buffer().unwrap().is_none());

        let mut long = SyntheticDepthSource::new(SensorKind::DepthLongThrow).unwrap();
        let frame = long.query_latest_frame().unwrap();
        assert_eq!(frame.sigma_buffer().unwrap().map(<[u8]>::len), Some(320 * 288));
    }

    #[test]
    fn test_depth_source_rejects_vlc_kind() {
        assert!(SyntheticDepthSource::new(SensorKind::LeftLeft).is_err());
    }
}
