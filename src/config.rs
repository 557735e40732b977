/// Kiosk configuration
///
/// Loaded from a TOML file. Every section is optional and falls back to
/// the values the booth ships with.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::sweep::RetentionPolicy;
use crate::display::Placement;
use crate::error::{BoothError, Result};
use crate::session::SessionTiming;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct BoothConfig {
    pub paths: PathsConfig,
    pub timing: TimingConfig,
    pub retention: RetentionConfig,
    pub camera: CameraConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub capture_dir: PathBuf,
    pub preferences: PathBuf,
    pub assets_map: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            capture_dir: default_capture_dir(),
            preferences: PathBuf::from("config/preferences.json"),
            assets_map: PathBuf::from("config/assetsMap.json"),
        }
    }
}

/// `<data dir>/photobooth/captured`, or `./captured` when there is no data dir
fn default_capture_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("photobooth").join("captured"))
        .unwrap_or_else(|| PathBuf::from("captured"))
}

/// Session timings, in milliseconds
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub tick_ms: u64,
    pub flash_ms: u64,
    pub between_shots_ms: u64,
    pub grace_ms: u64,
    pub encoder_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            flash_ms: 100,
            between_shots_ms: 2000,
            grace_ms: 3000,
            encoder_delay_ms: 3000,
        }
    }
}

impl TimingConfig {
    pub fn session(&self) -> SessionTiming {
        SessionTiming {
            tick: Duration::from_millis(self.tick_ms),
            flash: Duration::from_millis(self.flash_ms),
            between_shots: Duration::from_millis(self.between_shots_ms),
            grace: Duration::from_millis(self.grace_ms),
        }
    }

    pub fn encoder_delay(&self) -> Duration {
        Duration::from_millis(self.encoder_delay_ms)
    }
}

/// One week
const MAX_SWEEP_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RetentionConfig {
    pub max_age_hours: u64,
    pub interval_minutes: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 12,
            interval_minutes: 60,
        }
    }
}

impl RetentionConfig {
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_age: Duration::from_secs(self.max_age_hours.saturating_mul(60 * 60)),
            interval: Duration::from_secs(self.interval_minutes.saturating_mul(60)),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Serve this JPEG instead of the test card
    pub still_image: Option<PathBuf>,
    /// Camera window inside the overlay
    pub window: Option<Placement>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            still_image: None,
            window: Some(Placement {
                x: 0.0,
                y: 0.0,
                width: 1280.0,
                height: 720.0,
            }),
        }
    }
}

impl BoothConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| BoothError::config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(BoothError::config(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.timing.tick_ms == 0 {
            return Err(BoothError::config("timing.tick_ms must be positive"));
        }
        if self.retention.interval_minutes == 0 {
            return Err(BoothError::config("retention.interval_minutes must be positive"));
        }
        if self.retention.interval_minutes > MAX_SWEEP_INTERVAL_MINUTES {
            return Err(BoothError::config(format!(
                "retention.interval_minutes must be at most {}",
                MAX_SWEEP_INTERVAL_MINUTES
            )));
        }
        Ok(())
    }
}
