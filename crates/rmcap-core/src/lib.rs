//! rmcap-core — Sensor data model and pixel pipeline.
//!
//! Pure, I/O-free building blocks shared by every capture loop: sensor
//! kinds and mounting orientations, the greyscale remapper, depth
//! conversion, strided texture writes and the per-sensor frame cache.

pub mod cache;
pub mod depth;
pub mod remap;
pub mod texture;
pub mod types;

pub use cache::{CachedFrame, FrameCache};
pub use depth::ThrowMode;
pub use remap::{GreyFrame, RemapError};
pub use texture::{TextureError, TextureView};
pub use types::{Intrinsics, MirrorAxis, Resolution, SensorFamily, SensorKind, SensorOrientation};
