//! Depth frame conversion.
//!
//! Depth sensors deliver 16-bit little-endian millimetre values. Each value
//! is scaled to one greyscale byte against the throw mode's clamp distance;
//! anything beyond the clamp, or flagged by the long-throw sigma buffer,
//! becomes 0. Depth output keeps the device orientation.

use crate::remap::{check_lengths, RemapError};
use crate::texture::TextureView;
use crate::types::Resolution;
use serde::{Deserialize, Serialize};

/// Raw bytes per depth pixel.
pub const DEPTH_BYTES_PER_PIXEL: usize = 2;

/// Sigma bit marking a long-throw pixel as invalid.
pub const SIGMA_INVALID_MASK: u8 = 0x80;

/// Depth sensing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThrowMode {
    /// Articulated-hand tracking range (AHAT).
    Short,
    Long,
}

impl ThrowMode {
    /// Farthest depth, in millimetres, mapped to a non-zero intensity.
    pub const fn max_clamp_mm(self) -> u16 {
        match self {
            ThrowMode::Short => 1000,
            ThrowMode::Long => 4000,
        }
    }

    pub const fn has_sigma(self) -> bool {
        matches!(self, ThrowMode::Long)
    }
}

/// Scale one depth sample to 0..=255, or 0 when out of range.
#[inline]
pub fn depth_to_grey(depth_mm: u16, mode: ThrowMode) -> u8 {
    let max = mode.max_clamp_mm();
    if depth_mm > max {
        return 0;
    }
    (u32::from(depth_mm) * 255 / u32::from(max)) as u8
}

/// Convert a raw depth frame into `out` and, when given, a mapped texture.
///
/// `sigma` is required for [`ThrowMode::Long`] and ignored otherwise.
pub fn depth_into(
    raw: &[u8],
    sigma: Option<&[u8]>,
    resolution: Resolution,
    mode: ThrowMode,
    out: &mut [u8],
    mut texture: Option<&mut TextureView<'_>>,
) -> Result<(), RemapError> {
    let pixels = resolution.pixel_count();
    if raw.len() < pixels * DEPTH_BYTES_PER_PIXEL {
        return Err(RemapError::ShortBuffer {
            expected: pixels * DEPTH_BYTES_PER_PIXEL,
            actual: raw.len(),
        });
    }
    let sigma = if mode.has_sigma() {
        let sigma = sigma.ok_or(RemapError::MissingSigma)?;
        if sigma.len() < pixels {
            return Err(RemapError::ShortBuffer {
                expected: pixels,
                actual: sigma.len(),
            });
        }
        Some(sigma)
    } else {
        None
    };
    check_lengths(pixels, resolution, out.len(), texture.as_deref())?;

    let width = resolution.width as usize;
    if width == 0 {
        return Ok(());
    }

    for (idx, sample) in raw[..pixels * DEPTH_BYTES_PER_PIXEL]
        .chunks_exact(DEPTH_BYTES_PER_PIXEL)
        .enumerate()
    {
        let masked = sigma.is_some_and(|s| s[idx] & SIGMA_INVALID_MASK != 0);
        let value = if masked {
            0
        } else {
            depth_to_grey(u16::from_le_bytes([sample[0], sample[1]]), mode)
        };
        out[idx] = value;
        if let Some(tex) = texture.as_mut() {
            tex.put_grey(idx / width, idx % width, value);
        }
    }
    Ok(())
}
