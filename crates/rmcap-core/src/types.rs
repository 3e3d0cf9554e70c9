//! Sensor identities and frame geometry.
//!
//! Each research-mode sensor has a fixed family, mounting orientation or
//! throw mode, and device resolution. VLC frames are delivered transposed,
//! so their texture resolution swaps the device width and height.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::depth::ThrowMode;

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Same frame with width and height exchanged.
    pub const fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Per-frame sensor parameters published alongside the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intrinsics {
    pub gain: u32,
    /// Exposure time as reported by the sensor (wider range than gain).
    pub exposure: u64,
}

/// Physical mounting position of a visible-light tracking camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorOrientation {
    FrontLeft,
    FrontRight,
    SideLeft,
    SideRight,
}

/// Which axis the remapper flips for a given mounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAxis {
    /// Columns are reversed, rows are kept.
    Horizontal,
    /// Rows are reversed, columns are kept.
    Vertical,
}

impl SensorOrientation {
    /// Mirror transform for this mounting.
    ///
    /// Every orientation resolves to exactly one axis; a new mounting must
    /// be given its own arm here before it compiles.
    pub const fn mirror(self) -> MirrorAxis {
        match self {
            SensorOrientation::FrontLeft | SensorOrientation::SideRight => MirrorAxis::Horizontal,
            SensorOrientation::FrontRight | SensorOrientation::SideLeft => MirrorAxis::Vertical,
        }
    }
}

/// Sensor family; decides the frame format and the capture loop used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorFamily {
    /// Visible-light tracking camera, 8-bit greyscale with gain/exposure.
    Vlc,
    /// Time-of-flight depth camera, 16-bit millimetres.
    Depth,
}

impl SensorFamily {
    /// Raw bytes per pixel delivered by the device.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            SensorFamily::Vlc => 1,
            SensorFamily::Depth => crate::depth::DEPTH_BYTES_PER_PIXEL,
        }
    }

    /// Output (texture) resolution for a device-reported resolution.
    ///
    /// VLC frames arrive transposed relative to display orientation, so the
    /// two axes are exchanged. Depth frames are used as delivered.
    pub const fn texture_resolution(self, device: Resolution) -> Resolution {
        match self {
            SensorFamily::Vlc => device.transposed(),
            SensorFamily::Depth => device,
        }
    }
}

impl fmt::Display for SensorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SensorFamily::Vlc => "vlc",
            SensorFamily::Depth => "depth",
        })
    }
}

/// The research-mode sensors a device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorKind {
    LeftFront,
    LeftLeft,
    RightFront,
    RightRight,
    DepthAhat,
    DepthLongThrow,
}

impl SensorKind {
    pub const fn all() -> [SensorKind; 6] {
        [
            SensorKind::LeftFront,
            SensorKind::LeftLeft,
            SensorKind::RightFront,
            SensorKind::RightRight,
            SensorKind::DepthAhat,
            SensorKind::DepthLongThrow,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            SensorKind::LeftFront => "left-front",
            SensorKind::LeftLeft => "left-left",
            SensorKind::RightFront => "right-front",
            SensorKind::RightRight => "right-right",
            SensorKind::DepthAhat => "depth-ahat",
            SensorKind::DepthLongThrow => "depth-long-throw",
        }
    }

    pub const fn family(self) -> SensorFamily {
        match self {
            SensorKind::LeftFront
            | SensorKind::LeftLeft
            | SensorKind::RightFront
            | SensorKind::RightRight => SensorFamily::Vlc,
            SensorKind::DepthAhat | SensorKind::DepthLongThrow => SensorFamily::Depth,
        }
    }

    /// Mounting orientation for VLC kinds, `None` for depth.
    pub const fn vlc_orientation(self) -> Option<SensorOrientation> {
        match self {
            SensorKind::LeftFront => Some(SensorOrientation::FrontLeft),
            SensorKind::RightFront => Some(SensorOrientation::FrontRight),
            SensorKind::LeftLeft => Some(SensorOrientation::SideLeft),
            SensorKind::RightRight => Some(SensorOrientation::SideRight),
            SensorKind::DepthAhat | SensorKind::DepthLongThrow => None,
        }
    }

    /// Throw mode for depth kinds, `None` for VLC.
    pub const fn throw_mode(self) -> Option<ThrowMode> {
        match self {
            SensorKind::DepthAhat => Some(ThrowMode::Short),
            SensorKind::DepthLongThrow => Some(ThrowMode::Long),
            _ => None,
        }
    }

    /// Resolution the device reports for this sensor.
    pub const fn device_resolution(self) -> Resolution {
        match self.family() {
            SensorFamily::Vlc => Resolution::new(640, 480),
            SensorFamily::Depth => match self {
                SensorKind::DepthAhat => Resolution::new(512, 512),
                _ => Resolution::new(320, 288),
            },
        }
    }

    /// Resolution of the remapped output for this sensor.
    pub const fn texture_resolution(self) -> Resolution {
        self.family().texture_resolution(self.device_resolution())
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sensor kind: {0}")]
pub struct ParseSensorKindError(pub String);

impl FromStr for SensorKind {
    type Err = ParseSensorKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        SensorKind::all()
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| ParseSensorKindError(s.to_string()))
    }
}
