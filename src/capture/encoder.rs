/// Time-lapse video encoding
///
/// Merging frames into a video sits behind `VideoEncoder` so a real encoder
/// can be dropped in without touching the store or the sequencer. The
/// kiosk currently ships the placeholder, which produces no video file.
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Merge `frames` (in order) into `output` and return the artifact path
    async fn merge(&self, frames: &[PathBuf], output: &Path) -> Result<PathBuf>;
}

/// Stand-in encoder: waits a fixed delay and writes nothing
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderEncoder {
    delay: Duration,
}

impl PlaceholderEncoder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for PlaceholderEncoder {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

#[async_trait]
impl VideoEncoder for PlaceholderEncoder {
    async fn merge(&self, frames: &[PathBuf], output: &Path) -> Result<PathBuf> {
        tracing::info!("🎬 Merging {} frames into time-lapse video...", frames.len());
        tokio::time::sleep(self.delay).await;
        tracing::info!(
            "✅ Time-lapse video saved: {} (placeholder encoder, no file written)",
            output.display()
        );
        Ok(output.to_path_buf())
    }
}
