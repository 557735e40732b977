/// Shared data structures for a photo session
///
/// These structs represent the data model that flows between
/// the sequencer, the message bus and the capture store.
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::BoothError;

/// Every named layout a guest can pick on the layout screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutId {
    Square1,
    Square2,
    Square3,
    Square4,
    Square5,
    FourFive1,
    FourFive2,
    FourFive3,
    FourFive4,
    FourFive5,
    FourFive6,
}

impl LayoutId {
    pub const ALL: [LayoutId; 11] = [
        LayoutId::Square1,
        LayoutId::Square2,
        LayoutId::Square3,
        LayoutId::Square4,
        LayoutId::Square5,
        LayoutId::FourFive1,
        LayoutId::FourFive2,
        LayoutId::FourFive3,
        LayoutId::FourFive4,
        LayoutId::FourFive5,
        LayoutId::FourFive6,
    ];

    /// The tag stored in preferences and used in filenames
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutId::Square1 => "Squarelayout1",
            LayoutId::Square2 => "Squarelayout2",
            LayoutId::Square3 => "Squarelayout3",
            LayoutId::Square4 => "Squarelayout4",
            LayoutId::Square5 => "Squarelayout5",
            LayoutId::FourFive1 => "_4:5layout1",
            LayoutId::FourFive2 => "_4:5layout2",
            LayoutId::FourFive3 => "_4:5layout3",
            LayoutId::FourFive4 => "_4:5layout4",
            LayoutId::FourFive5 => "_4:5layout5",
            LayoutId::FourFive6 => "_4:5layout6",
        }
    }
}

impl FromStr for LayoutId {
    type Err = BoothError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayoutId::ALL
            .into_iter()
            .find(|layout| layout.as_str() == s)
            .ok_or_else(|| BoothError::UnknownLayout(s.to_string()))
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    Square,
    FourFive,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "square",
            AspectRatio::FourFive => "4:5",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = BoothError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "square" => Ok(AspectRatio::Square),
            "4:5" => Ok(AspectRatio::FourFive),
            other => Err(BoothError::config(format!("unknown aspect ratio '{}'", other))),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera zoom preset picked before the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoomLevel {
    Standard,
    Closeup,
}

impl ZoomLevel {
    /// Requested camera resolution (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            ZoomLevel::Standard => (1280, 720),
            ZoomLevel::Closeup => (1920, 1080),
        }
    }
}

impl FromStr for ZoomLevel {
    type Err = BoothError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ZoomLevel::Standard),
            "closeup" => Ok(ZoomLevel::Closeup),
            other => Err(BoothError::config(format!("unknown zoom level '{}'", other))),
        }
    }
}

/// The two cooperating display surfaces of the kiosk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    ScreenA,
    ScreenB,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::ScreenA => "screenA",
            Surface::ScreenB => "screenB",
        }
    }
}

/// Immutable settings for one photo session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Language tag (e.g., "english")
    pub language: String,
    pub layout: LayoutId,
    pub aspect_ratio: AspectRatio,
    pub zoom: ZoomLevel,
}

/// A single frame delivered by the camera
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// Encoded JPEG bytes
    pub image: Vec<u8>,
    pub config: SessionConfig,
    /// 1-based for session shots, 0-based for time-lapse frames
    pub sequence_index: u32,
}

/// A file the capture store has written
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// Frames recorded for one time-lapse, waiting to be stitched
#[derive(Debug, Clone, PartialEq)]
pub struct TimeLapseJob {
    pub config: SessionConfig,
    /// Frames in capture order
    pub frames: Vec<CapturedFrame>,
}

impl TimeLapseJob {
    /// File name of the stitched video inside the capture directory
    pub fn output_name(&self) -> String {
        crate::capture::timelapse_file_name(
            &self.config.language,
            self.config.aspect_ratio,
            self.config.layout,
        )
    }
}
