/// Display surface and overlay placement
///
/// The shooting screen is driven entirely through these two traits, so the
/// sequencer never touches rendering code.
use serde::Deserialize;

use crate::error::{BoothError, Result};

/// Where the live camera view sits inside the overlay
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Supplies camera placement once the overlay has loaded
pub trait OverlayProvider: Send + Sync {
    fn placement(&self) -> Result<Placement>;
}

/// Overlay with a fixed, configured camera window
#[derive(Debug, Clone, Copy)]
pub struct StaticOverlay {
    placement: Option<Placement>,
}

impl StaticOverlay {
    pub fn new(placement: Option<Placement>) -> Self {
        Self { placement }
    }
}

impl OverlayProvider for StaticOverlay {
    fn placement(&self) -> Result<Placement> {
        match self.placement {
            Some(p) if p.width > 0.0 && p.height > 0.0 => Ok(p),
            Some(_) => Err(BoothError::overlay("cameraClip has an empty bounding box")),
            None => Err(BoothError::overlay("cameraClip not configured")),
        }
    }
}

/// What the shooting screen can show
pub trait Display: Send + Sync {
    fn place_camera(&self, placement: Placement);
    fn show_countdown(&self, remaining: u8);
    fn show_progress(&self, taken: u32, total: u32);
    fn set_flash(&self, on: bool);
    fn swap_overlay(&self, asset: &str);
}

/// Display that renders every update to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

impl Display for LogDisplay {
    fn place_camera(&self, p: Placement) {
        tracing::info!(
            "✅ Camera feed clipped to cameraClip at ({}, {}) {}x{}",
            p.x,
            p.y,
            p.width,
            p.height
        );
    }

    fn show_countdown(&self, remaining: u8) {
        tracing::info!("⏳ {}", remaining);
    }

    fn show_progress(&self, taken: u32, total: u32) {
        tracing::info!("🖼  {}/{}", taken, total);
    }

    fn set_flash(&self, on: bool) {
        tracing::debug!("flash {}", if on { "on" } else { "off" });
    }

    fn swap_overlay(&self, asset: &str) {
        tracing::info!("🔄 Switching to alternate SVG: {}", asset);
    }
}
