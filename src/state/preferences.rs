/// Persisted kiosk preferences
///
/// The earlier screens store the guest's choices as a small JSON
/// key/value file. A session reads it exactly once, when its
/// `SessionConfig` is built.
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data::{SessionConfig, ZoomLevel};
use crate::error::{BoothError, Result};

/// Guest choices as written by the selection screens
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_language")]
    pub selected_language: String,
    #[serde(default = "default_layout")]
    pub selected_layout: String,
    #[serde(default = "default_aspect_ratio")]
    pub selected_aspect_ratio: String,
    #[serde(default = "default_zoom")]
    pub selected_zoom: String,
}

fn default_language() -> String {
    "english".to_string()
}

fn default_layout() -> String {
    "Squarelayout1".to_string()
}

fn default_aspect_ratio() -> String {
    "square".to_string()
}

fn default_zoom() -> String {
    "standard".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            selected_language: default_language(),
            selected_layout: default_layout(),
            selected_aspect_ratio: default_aspect_ratio(),
            selected_zoom: default_zoom(),
        }
    }
}

impl Preferences {
    /// Parse from the JSON preferences file contents
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load preferences from disk, falling back to defaults if the file is missing
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json).map_err(|e| {
                BoothError::config(format!("invalid preferences {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("⚠️  No preferences at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(BoothError::config(format!(
                "failed to read preferences {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Build the immutable session config
    ///
    /// An unrecognised layout fails here, before any session timer exists.
    pub fn session_config(&self) -> Result<SessionConfig> {
        Ok(SessionConfig {
            language: self.selected_language.clone(),
            layout: self.selected_layout.parse()?,
            aspect_ratio: self.selected_aspect_ratio.parse()?,
            zoom: self.selected_zoom.parse::<ZoomLevel>()?,
        })
    }
}
