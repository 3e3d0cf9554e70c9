//! Texture sink boundary and scoped write access.

use rmcap_core::{Resolution, TextureError, TextureView};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("texture could not be mapped for writing: {0}")]
    MapFailed(String),
    #[error("texture is already mapped")]
    AlreadyMapped,
    #[error("invalid texture geometry: {0}")]
    Geometry(#[from] TextureError),
}

/// A CPU-writable staging texture that is submitted to the GPU after writing.
pub trait TextureSink: Send {
    fn resolution(&self) -> Resolution;

    /// Distance in bytes between the starts of consecutive rows.
    fn row_pitch(&self) -> u32;

    /// Map the write buffer. On success the sink stays mapped until
    /// [`unmap_and_submit`](Self::unmap_and_submit); on failure nothing is touched.
    fn map_write_buffer(&mut self) -> Result<(), SinkError>;

    /// The mapped bytes. Only called between a successful map and its unmap.
    fn mapped_buffer(&mut self) -> &mut [u8];

    fn unmap_and_submit(&mut self);

    /// Tightly packed BGRA copy of the last submitted contents, if the sink
    /// can read back.
    fn read_bgra(&self) -> Option<Vec<u8>> {
        None
    }
}

/// A mapped texture; dropping it unmaps and submits on every exit path.
pub struct MappedTexture<'a, T: TextureSink + ?Sized> {
    sink: &'a mut T,
}

impl<'a, T: TextureSink + ?Sized> MappedTexture<'a, T> {
    pub fn acquire(sink: &'a mut T) -> Result<Self, SinkError> {
        sink.map_write_buffer()?;
        Ok(Self { sink })
    }

    /// Strided view over the mapped bytes for a frame of `resolution`.
    pub fn view(&mut self, resolution: Resolution) -> Result<TextureView<'_>, SinkError> {
        let row_pitch = self.sink.row_pitch() as usize;
        Ok(TextureView::new(
            self.sink.mapped_buffer(),
            row_pitch,
            resolution,
        )?)
    }
}

impl<T: TextureSink + ?Sized> Drop for MappedTexture<'_, T> {
    fn drop(&mut self) {
        self.sink.unmap_and_submit();
    }
}
