//! Latest-frame cache shared between a capture loop and its clients.
//!
//! One mutex guards every field, so a reader sees either a whole frame from
//! a single publish or the invalid state. Readers always receive copies.

use crate::remap::GreyFrame;
use crate::types::{Intrinsics, Resolution};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The most recent frame as seen by a client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CachedFrame {
    /// Greyscale pixels, `width * height` bytes. Empty while invalid.
    #[serde(skip)]
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub intrinsics: Intrinsics,
    /// Number of frames published so far; identifies the iteration.
    pub sequence: u64,
    pub is_valid: bool,
}

impl CachedFrame {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Thread-safe holder of one sensor's latest frame.
#[derive(Debug, Default)]
pub struct FrameCache {
    inner: Mutex<CachedFrame>,
}

impl FrameCache {
    /// Create an empty, invalid cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached frame and its intrinsics, marking it valid.
    pub fn publish(&self, frame: GreyFrame, intrinsics: Intrinsics) {
        let (data, resolution) = frame.into_parts();
        let mut cached = self.lock();
        cached.data = data;
        cached.width = resolution.width;
        cached.height = resolution.height;
        cached.intrinsics = intrinsics;
        cached.sequence += 1;
        cached.is_valid = true;
    }

    /// Mark the cached frame as unavailable until the next publish.
    pub fn invalidate(&self) {
        self.lock().is_valid = false;
    }

    /// Last published intrinsics plus the current validity flag.
    pub fn read_intrinsics(&self) -> (Intrinsics, bool) {
        let cached = self.lock();
        (cached.intrinsics, cached.is_valid)
    }

    /// Copy of the current frame.
    ///
    /// While invalid the pixel buffer is not copied and dimensions read as
    /// zero, so stale pixels can never pass for a fresh frame.
    pub fn read_frame(&self) -> CachedFrame {
        let cached = self.lock();
        if cached.is_valid {
            cached.clone()
        } else {
            CachedFrame {
                intrinsics: cached.intrinsics,
                sequence: cached.sequence,
                ..CachedFrame::default()
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lock().is_valid
    }

    // Every mutation is a plain field store, so a poisoned guard still holds
    // a consistent frame.
    fn lock(&self) -> MutexGuard<'_, CachedFrame> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn frame(value: u8, width: u32, height: u32) -> GreyFrame {
        let res = Resolution::new(width, height);
        GreyFrame::new(vec![value; res.pixel_count()], res).unwrap()
    }

    #[test]
    fn test_new_cache_is_invalid() {
        let cache = FrameCache::new();
        let read = cache.read_frame();
        assert!(!read.is_valid);
        assert!(read.data.is_empty());
        assert!(!cache.read_intrinsics().1);
    }

    #[test]
    fn test_publish_then_read() {
        let cache = FrameCache::new();
        let intrinsics = Intrinsics {
            gain: 12,
            exposure: 34_000,
        };
        cache.publish(frame(200, 3, 2), intrinsics);

        let read = cache.read_frame();
        assert!(read.is_valid);
        assert_eq!(read.data, vec![200; 6]);
        assert_eq!(read.resolution(), Resolution::new(3, 2));
        assert_eq!(read.intrinsics, intrinsics);
        assert_eq!(read.sequence, 1);
        assert_eq!(cache.read_intrinsics(), (intrinsics, true));
    }

    #[test]
    fn test_invalidate_hides_previous_frame() {
        let cache = FrameCache::new();
        cache.publish(frame(1, 2, 2), Intrinsics::default());
        cache.invalidate();

        let read = cache.read_frame();
        assert!(!read.is_valid);
        assert!(read.data.is_empty());
        assert_eq!((read.width, read.height), (0, 0));

        cache.publish(frame(2, 2, 2), Intrinsics::default());
        assert!(cache.read_frame().is_valid);
    }

    #[test]
    fn test_repeated_reads_are_identical() {
        let cache = FrameCache::new();
        cache.publish(frame(42, 4, 3), Intrinsics { gain: 1, exposure: 2 });
        let first = cache.read_frame();
        let second = cache.read_frame();
        assert_eq!(first, second);
    }

    #[test]
    fn test_concurrent_reads_never_mix_iterations() {
        let cache = Arc::new(FrameCache::new());
        let writer_cache = Arc::clone(&cache);

        let writer = std::thread::spawn(move || {
            for seq in 1..=500u32 {
                // Dimensions, pixels and gain all derive from the iteration.
                let width = 8 + seq % 5;
                let value = (seq % 251) as u8;
                writer_cache.publish(
                    frame(value, width, 4),
                    Intrinsics {
                        gain: seq,
                        exposure: u64::from(seq) * 10,
                    },
                );
            }
        });

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..2000 {
                        let read = cache.read_frame();
                        if !read.is_valid {
                            continue;
                        }
                        let seq = read.intrinsics.gain;
                        assert_eq!(read.data.len(), (read.width * read.height) as usize);
                        assert_eq!(read.width, 8 + seq % 5);
                        assert_eq!(read.intrinsics.exposure, u64::from(seq) * 10);
                        let value = (seq % 251) as u8;
                        assert!(read.data.iter().all(|&b| b == value));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.read_frame().sequence, 500);
    }
}
