//! rmcap-hw — Device boundary and per-sensor capture loops.
//!
//! Defines the frame-source and texture-sink seams a research-mode device
//! plugs into, the VLC and depth capture loops built on them, and the
//! dedicated capture thread that drives a sensor at frame rate.

pub mod capture;
pub mod cpu_texture;
pub mod depth;
pub mod sensor;
pub mod sink;
pub mod source;
pub mod synthetic;
pub mod vlc;

pub use capture::{spawn_capture, CaptureHandle, CaptureOptions, CaptureStats};
pub use cpu_texture::CpuTexture;
pub use depth::DepthCamera;
pub use sensor::{open_synthetic, CaptureError, Sensor, SensorError, SensorReader};
pub use sink::{MappedTexture, SinkError, TextureSink};
pub use source::{DepthFrame, FrameError, FrameSource, VlcFrame};
pub use vlc::VlcCamera;
