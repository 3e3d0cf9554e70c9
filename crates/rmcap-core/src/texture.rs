//! Strided writes into a mapped 32-bit texture.
//!
//! Texels are B8G8R8A8 and the row pitch is always measured in bytes: the
//! texel at (row, col) starts at `row * row_pitch + col * 4`. Pitch may be
//! larger than `width * 4` when the allocator pads rows for alignment.

use crate::types::Resolution;
use thiserror::Error;

/// Bytes per output texel.
pub const BYTES_PER_TEXEL: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextureError {
    #[error("row pitch {row_pitch} is smaller than a {row_bytes}-byte row")]
    PitchTooSmall { row_pitch: usize, row_bytes: usize },
    #[error("mapped buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },
}

/// Replicate one intensity into the blue, green and red channels.
///
/// Alpha stays zero.
#[inline]
pub const fn grey_texel(value: u8) -> u32 {
    let v = value as u32;
    v | (v << 8) | (v << 16)
}

/// Bytes needed to hold `resolution` at `row_pitch`; the last row needs no padding.
pub fn required_len(resolution: Resolution, row_pitch: usize) -> usize {
    match resolution.height as usize {
        0 => 0,
        rows => row_pitch * (rows - 1) + resolution.width as usize * BYTES_PER_TEXEL,
    }
}

/// Writable view over a mapped texture with a known row pitch.
pub struct TextureView<'a> {
    data: &'a mut [u8],
    row_pitch: usize,
    resolution: Resolution,
}

impl<'a> TextureView<'a> {
    /// Validate geometry up front so no write can land outside `data`.
    pub fn new(
        data: &'a mut [u8],
        row_pitch: usize,
        resolution: Resolution,
    ) -> Result<Self, TextureError> {
        let row_bytes = resolution.width as usize * BYTES_PER_TEXEL;
        if row_pitch < row_bytes {
            return Err(TextureError::PitchTooSmall {
                row_pitch,
                row_bytes,
            });
        }
        let required = required_len(resolution, row_pitch);
        if data.len() < required {
            return Err(TextureError::BufferTooSmall {
                required,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            row_pitch,
            resolution,
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn row_pitch(&self) -> usize {
        self.row_pitch
    }

    /// Write a greyscale texel at (row, col).
    #[inline]
    pub fn put_grey(&mut self, row: usize, col: usize, value: u8) {
        let offset = row * self.row_pitch + col * BYTES_PER_TEXEL;
        self.data[offset..offset + BYTES_PER_TEXEL].copy_from_slice(&grey_texel(value).to_le_bytes());
    }
}
