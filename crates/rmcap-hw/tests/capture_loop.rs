//! End-to-end capture loop behavior with scripted sources and concurrent readers.

use rmcap_core::{Intrinsics, Resolution, SensorKind};
use rmcap_hw::{
    spawn_capture, CaptureError, CaptureOptions, CpuTexture, FrameError, FrameSource, Sensor,
    SinkError, TextureSink, VlcCamera, VlcFrame,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Frame {
    gain: u32,
    exposure: u64,
    data: Vec<u8>,
}

impl VlcFrame for Frame {
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

/// Plays back queued outcomes: `None` means "sensor not ready".
struct Playback {
    resolution: Resolution,
    queue: VecDeque<Option<Frame>>,
    pending: Option<Frame>,
}

impl Playback {
    fn new(resolution: Resolution, queue: Vec<Option<Frame>>) -> Self {
        Self {
            resolution,
            queue: queue.into(),
            pending: None,
        }
    }
}

impl FrameSource for Playback {
    type Frame = Frame;

    fn begin_capture(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(Some(frame)) => {
                self.pending = Some(frame);
                true
            }
            _ => false,
        }
    }

    fn query_latest_frame(&mut self) -> Option<Frame> {
        self.pending.take()
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Endless source where every field is derived from the frame number.
struct Counting {
    resolution: Resolution,
    n: u32,
}

impl FrameSource for Counting {
    type Frame = Frame;

    fn begin_capture(&mut self) -> bool {
        true
    }

    fn query_latest_frame(&mut self) -> Option<Frame> {
        self.n += 1;
        Some(Frame {
            gain: self.n,
            exposure: u64::from(self.n) * 3,
            data: vec![(self.n % 256) as u8; self.resolution.pixel_count()],
        })
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Texture sink whose mapping can be switched off.
struct Switchable {
    inner: CpuTexture,
    available: Arc<AtomicBool>,
}

impl TextureSink for Switchable {
    fn resolution(&self) -> Resolution {
        self.inner.resolution()
    }
    fn row_pitch(&self) -> u32 {
        self.inner.row_pitch()
    }
    fn map_write_buffer(&mut self) -> Result<(), SinkError> {
        if !self.available.load(Ordering::Relaxed) {
            return Err(SinkError::MapFailed("device lost".into()));
        }
        self.inner.map_write_buffer()
    }
    fn mapped_buffer(&mut self) -> &mut [u8] {
        self.inner.mapped_buffer()
    }
    fn unmap_and_submit(&mut self) {
        self.inner.unmap_and_submit()
    }
    fn read_bgra(&self) -> Option<Vec<u8>> {
        self.inner.read_bgra()
    }
}

#[test]
fn test_side_left_all_white_frame_is_published() {
    let res = Resolution::new(4, 4);
    let source = Playback::new(
        res,
        vec![Some(Frame {
            gain: 21,
            exposure: 123_456,
            data: vec![255; 16],
        })],
    );
    let mut cam = VlcCamera::new(SensorKind::LeftLeft, source, CpuTexture::new(res, 64)).unwrap();
    cam.run_once().unwrap();

    let frame = cam.reader().get_frame().expect("frame should be valid");
    assert_eq!((frame.width, frame.height), (4, 4));
    assert_eq!(frame.data, vec![255; 16]);
    assert_eq!(
        frame.intrinsics,
        Intrinsics {
            gain: 21,
            exposure: 123_456
        }
    );
    assert!(cam
        .texture_bgra()
        .unwrap()
        .chunks_exact(4)
        .all(|texel| texel == [255, 255, 255, 0]));
}

#[test]
fn test_not_ready_hides_previous_valid_frame() {
    let res = Resolution::new(2, 2);
    let source = Playback::new(
        res,
        vec![
            Some(Frame {
                gain: 1,
                exposure: 1,
                data: vec![9; 4],
            }),
            None,
        ],
    );
    let mut cam = VlcCamera::new(SensorKind::LeftFront, source, CpuTexture::new(res, 8)).unwrap();

    cam.run_once().unwrap();
    assert!(cam.reader().get_frame().is_some());

    assert_eq!(cam.run_once(), Err(CaptureError::DeviceUnready));
    let reader = cam.reader();
    assert!(reader.get_frame().is_none());
    assert!(!reader.snapshot().is_valid);
}

#[test]
fn test_sink_failure_keeps_texture_and_invalidates() {
    let res = Resolution::new(2, 2);
    let available = Arc::new(AtomicBool::new(true));
    let sink = Switchable {
        inner: CpuTexture::new(res, 8),
        available: Arc::clone(&available),
    };
    let source = Counting { resolution: res, n: 0 };
    let mut cam = VlcCamera::new(SensorKind::RightRight, source, sink).unwrap();

    cam.run_once().unwrap();
    let before = cam.texture_bgra().unwrap();

    available.store(false, Ordering::Relaxed);
    assert!(matches!(
        cam.run_once(),
        Err(CaptureError::SinkUnavailable(SinkError::MapFailed(_)))
    ));
    assert!(cam.reader().get_frame().is_none());
    assert_eq!(cam.texture_bgra().unwrap(), before);

    available.store(true, Ordering::Relaxed);
    cam.run_once().unwrap();
    assert!(cam.reader().get_frame().is_some());
}

#[test]
fn test_repeated_reads_without_publish_match() {
    let res = Resolution::new(3, 3);
    let mut cam = VlcCamera::new(
        SensorKind::RightFront,
        Counting { resolution: res, n: 0 },
        CpuTexture::new(res, 16),
    )
    .unwrap();
    cam.run_once().unwrap();

    let reader = cam.reader();
    let first = reader.get_frame();
    assert_eq!(first, reader.get_frame());
    assert_eq!(first, reader.get_frame());
}

#[test]
fn test_readers_see_whole_frames_while_capture_thread_runs() {
    let res = Resolution::new(48, 32);
    let cam = VlcCamera::new(
        SensorKind::LeftFront,
        Counting {
            resolution: res.transposed(),
            n: 0,
        },
        CpuTexture::new(res, 256),
    )
    .unwrap();
    let mut handle = spawn_capture(
        Box::new(cam),
        CaptureOptions {
            interval: Duration::ZERO,
            stall_after: 0,
        },
    )
    .unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let reader = handle.reader();
            std::thread::spawn(move || {
                let deadline = Instant::now() + Duration::from_millis(300);
                let mut checked = 0u32;
                while Instant::now() < deadline {
                    let Some(frame) = reader.get_frame() else {
                        continue;
                    };
                    let n = frame.intrinsics.gain;
                    assert_eq!(frame.data.len(), (frame.width * frame.height) as usize);
                    assert_eq!(frame.intrinsics.exposure, u64::from(n) * 3);
                    let expected = (n % 256) as u8;
                    assert!(frame.data.iter().all(|&b| b == expected));
                    checked += 1;
                }
                checked
            })
        })
        .collect();

    let checked: u32 = readers.into_iter().map(|r| r.join().unwrap()).sum();
    handle.stop();

    assert!(checked > 0);
    assert!(handle.stats().frames > 0);
    assert_eq!(handle.stats().failures, 0);
}
