//! Heap-backed texture sink with padded rows and read-back.

use crate::sink::{SinkError, TextureSink};
use rmcap_core::texture::{required_len, BYTES_PER_TEXEL};
use rmcap_core::Resolution;

/// A BGRA texture kept in host memory.
///
/// Writes go to a staging buffer; `unmap_and_submit` copies staging into the
/// submitted buffer, which is what [`read_bgra`](TextureSink::read_bgra)
/// returns. Rows are padded to `row_alignment` bytes like a GPU allocator
/// would.
pub struct CpuTexture {
    resolution: Resolution,
    row_pitch: u32,
    staging: Vec<u8>,
    submitted: Vec<u8>,
    mapped: bool,
    submissions: u64,
}

impl CpuTexture {
    pub fn new(resolution: Resolution, row_alignment: u32) -> Self {
        let row_bytes = resolution.width * BYTES_PER_TEXEL as u32;
        let row_pitch = row_bytes.next_multiple_of(row_alignment.max(1));
        let len = required_len(resolution, row_pitch as usize);
        Self {
            resolution,
            row_pitch,
            staging: vec![0; len],
            submitted: vec![0; len],
            mapped: false,
            submissions: 0,
        }
    }

    /// Number of completed unmap/submit cycles.
    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    /// Raw submitted bytes, including row padding.
    pub fn submitted(&self) -> &[u8] {
        &self.submitted
    }
}

impl TextureSink for CpuTexture {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn row_pitch(&self) -> u32 {
        self.row_pitch
    }

    fn map_write_buffer(&mut self) -> Result<(), SinkError> {
        if self.mapped {
            return Err(SinkError::AlreadyMapped);
        }
        self.mapped = true;
        Ok(())
    }

    fn mapped_buffer(&mut self) -> &mut [u8] {
        debug_assert!(self.mapped, "mapped_buffer called on an unmapped texture");
        &mut self.staging
    }

    fn unmap_and_submit(&mut self) {
        if !self.mapped {
            return;
        }
        self.mapped = false;
        self.submitted.copy_from_slice(&self.staging);
        self.submissions += 1;
    }

    fn read_bgra(&self) -> Option<Vec<u8>> {
        let row_bytes = self.resolution.width as usize * BYTES_PER_TEXEL;
        let pitch = self.row_pitch as usize;
        let mut out = Vec::with_capacity(row_bytes * self.resolution.height as usize);
        for row in 0..self.resolution.height as usize {
            let start = row * pitch;
            out.extend_from_slice(&self.submitted[start..start + row_bytes]);
        }
        Some(out)
    }
}
