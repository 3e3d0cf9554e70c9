//! Greyscale remapping from sensor-native layout to display orientation.

use crate::texture::TextureView;
use crate::types::{MirrorAxis, Resolution, SensorOrientation};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemapError {
    #[error("raw buffer too short: expected {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },
    #[error("output buffer has {actual} bytes, expected {expected}")]
    OutputSize { expected: usize, actual: usize },
    #[error("texture is {texture}, frame is {frame}")]
    TextureMismatch { texture: Resolution, frame: Resolution },
    #[error("long-throw depth frame has no sigma buffer")]
    MissingSigma,
}

/// A single-channel frame whose buffer always holds `width * height` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreyFrame {
    data: Vec<u8>,
    resolution: Resolution,
}

impl GreyFrame {
    pub fn new(data: Vec<u8>, resolution: Resolution) -> Result<Self, RemapError> {
        if data.len() != resolution.pixel_count() {
            return Err(RemapError::OutputSize {
                expected: resolution.pixel_count(),
                actual: data.len(),
            });
        }
        Ok(Self { data, resolution })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn into_parts(self) -> (Vec<u8>, Resolution) {
        (self.data, self.resolution)
    }
}

/// Remap a raw 8-bit frame into a freshly allocated buffer.
pub fn remap(
    raw: &[u8],
    native: Resolution,
    orientation: SensorOrientation,
) -> Result<GreyFrame, RemapError> {
    let mut data = vec![0u8; native.pixel_count()];
    remap_into(raw, native, orientation, &mut data, None)?;
    GreyFrame::new(data, native)
}

/// Remap a raw 8-bit frame into `out` and, when given, a mapped texture.
///
/// `native` is the display-oriented frame size. `raw` is the buffer as the
/// device delivers it: row-major over the transposed size, so display pixel
/// `(i, j)` sits at `raw[j * height + i]`. Front-left and side-right mounts
/// mirror columns; front-right and side-left mirror rows. Both outputs are
/// filled in the same pass. All lengths are checked before the first write,
/// so an error leaves `out` and the texture untouched.
pub fn remap_into(
    raw: &[u8],
    native: Resolution,
    orientation: SensorOrientation,
    out: &mut [u8],
    mut texture: Option<&mut TextureView<'_>>,
) -> Result<(), RemapError> {
    check_lengths(raw.len(), native, out.len(), texture.as_deref())?;

    let width = native.width as usize;
    let height = native.height as usize;
    let axis = orientation.mirror();

    for i in 0..height {
        for j in 0..width {
            let value = raw[j * height + i];
            let (row, col) = match axis {
                MirrorAxis::Horizontal => (i, width - 1 - j),
                MirrorAxis::Vertical => (height - 1 - i, j),
            };
            out[row * width + col] = value;
            if let Some(tex) = texture.as_mut() {
                tex.put_grey(row, col, value);
            }
        }
    }
    Ok(())
}

pub(crate) fn check_lengths(
    raw_len: usize,
    native: Resolution,
    out_len: usize,
    texture: Option<&TextureView<'_>>,
) -> Result<(), RemapError> {
    let expected = native.pixel_count();
    if raw_len < expected {
        return Err(RemapError::ShortBuffer {
            expected,
            actual: raw_len,
        });
    }
    if out_len != expected {
        return Err(RemapError::OutputSize {
            expected,
            actual: out_len,
        });
    }
    if let Some(tex) = texture {
        if tex.resolution() != native {
            return Err(RemapError::TextureMismatch {
                texture: tex.resolution(),
                frame: native,
            });
        }
    }
    Ok(())
}
