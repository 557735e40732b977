/// Overlay asset lookup
///
/// The asset map is static JSON keyed by surface, then language, then
/// page key, e.g. `{"screenB": {"english": {"page10b_01": "..svg"}}}`.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::data::{LayoutId, Surface};
use super::layout::LayoutSpec;
use crate::error::{BoothError, Result};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct AssetMap {
    surfaces: HashMap<String, HashMap<String, HashMap<String, String>>>,
}

impl AssetMap {
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            BoothError::config(format!("failed to read asset map {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
            .map_err(|e| BoothError::config(format!("invalid asset map {}: {}", path.display(), e)))
    }

    /// Overlay shown on `surface` while shooting `layout` in `language`
    pub fn overlay(&self, surface: Surface, language: &str, layout: LayoutId) -> Result<String> {
        let key = LayoutSpec::for_layout(layout).overlay_key;
        let pages = self
            .surfaces
            .get(surface.as_str())
            .and_then(|languages| languages.get(language))
            .ok_or_else(|| {
                BoothError::AssetNotFound(format!(
                    "{} assets not found for language: {}",
                    surface.as_str(),
                    language
                ))
            })?;

        pages.get(key).cloned().ok_or_else(|| {
            BoothError::AssetNotFound(format!("{} has no '{}' for {}", surface.as_str(), key, language))
        })
    }
}

/// Overlay swapped in mid-session for the layouts that switch
pub fn alternate_overlay(language: &str) -> String {
    format!("../../assets/screenB/{language}/screenBpage10{language}-04.svg")
}
