use chrono::Utc;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::encoder::VideoEncoder;
use super::{frame_file_name, photo_file_name, timelapse_file_name};
use crate::bus::{from_data_url, PhotoPayload, TimeLapsePayload};
use crate::error::{BoothError, Result};
use crate::state::data::StoredArtifact;

/// Result of one time-lapse save
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeLapseReport {
    pub frames_written: usize,
    /// Merged video, `None` when the merge was skipped
    pub video: Option<PathBuf>,
    pub frames_removed: usize,
    /// One message per failed frame write or cleanup
    pub failures: Vec<String>,
}

/// Writes captures into the capture directory
pub struct CaptureStore {
    dir: PathBuf,
    encoder: Arc<dyn VideoEncoder>,
}

impl CaptureStore {
    /// Open the store, creating the capture directory if it is missing
    pub fn open(dir: impl Into<PathBuf>, encoder: Arc<dyn VideoEncoder>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|source| BoothError::FileWrite {
                path: dir.clone(),
                source,
            })?;
            info!("📂 Created captured folder: {}", dir.display());
        }
        Ok(Self { dir, encoder })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode a photo payload and write it under its deterministic name
    pub async fn save_photo(&self, payload: &PhotoPayload) -> Result<StoredArtifact> {
        let jpeg = decode_jpeg(&payload.image_data)?;
        let name = photo_file_name(
            &payload.language,
            payload.aspect_ratio,
            payload.layout,
            payload.photo_index,
        );

        let artifact = write_file(self.dir.join(name), jpeg).await?;
        info!("📸 Saved photo: {}", artifact.path.display());
        Ok(artifact)
    }

    /// Write every frame, wait for all writes, then merge and clean up
    ///
    /// The merge only runs when every frame was written. Frames left behind
    /// after a failed write are removed by the retention sweep.
    pub async fn save_time_lapse(&self, payload: &TimeLapsePayload) -> Result<TimeLapseReport> {
        let mut report = TimeLapseReport::default();
        if payload.frames.is_empty() {
            warn!("⚠️  Time-lapse has no frames, nothing to save");
            return Ok(report);
        }

        let mut writes = JoinSet::new();
        for (index, frame) in payload.frames.iter().enumerate() {
            let path = self.dir.join(frame_file_name(index));
            let frame = frame.clone();
            writes.spawn(async move {
                let result = match decode_jpeg(&frame) {
                    Ok(jpeg) => write_file(path, jpeg).await,
                    Err(e) => Err(e),
                };
                (index, result)
            });
        }

        let mut written = Vec::with_capacity(payload.frames.len());
        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((index, Ok(artifact))) => written.push((index, artifact.path)),
                Ok((index, Err(e))) => {
                    error!("❌ Error saving time-lapse frame {}: {}", index, e);
                    report.failures.push(e.to_string());
                }
                Err(e) => {
                    error!("❌ Time-lapse frame task failed: {}", e);
                    report.failures.push(e.to_string());
                }
            }
        }
        written.sort_by_key(|(index, _)| *index);
        report.frames_written = written.len();

        if !report.failures.is_empty() {
            error!(
                "❌ Error saving time-lapse frames: {} of {} failed, skipping merge",
                report.failures.len(),
                payload.frames.len()
            );
            return Ok(report);
        }
        info!("📽 Time-lapse frames saved successfully.");

        let frame_paths: Vec<PathBuf> = written.into_iter().map(|(_, path)| path).collect();
        let output = self.dir.join(timelapse_file_name(
            &payload.language,
            payload.aspect_ratio,
            payload.layout,
        ));
        report.video = Some(self.encoder.merge(&frame_paths, &output).await?);

        for path in &frame_paths {
            let source = match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    report.frames_removed += 1;
                    continue;
                }
                Err(source) => source,
            };
            let err = BoothError::FileDelete {
                path: path.clone(),
                source,
            };
            // Already swept
            if err.is_not_found() {
                continue;
            }
            error!("❌ Error deleting frame: {}", err);
            report.failures.push(err.to_string());
        }

        Ok(report)
    }
}

impl std::fmt::Debug for CaptureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureStore")
            .field("dir", &self.dir)
            .finish()
    }
}

/// Decode a data URL and make sure it really holds a JPEG
fn decode_jpeg(data: &str) -> Result<Vec<u8>> {
    let bytes = from_data_url(data)?;
    match image::guess_format(&bytes) {
        Ok(ImageFormat::Jpeg) => Ok(bytes),
        Ok(other) => Err(BoothError::InvalidPayload(format!(
            "expected JPEG, got {:?}",
            other
        ))),
        Err(_) => Err(BoothError::InvalidPayload(
            "unrecognised image data".to_string(),
        )),
    }
}

async fn write_file(path: PathBuf, bytes: Vec<u8>) -> Result<StoredArtifact> {
    match tokio::fs::write(&path, bytes).await {
        Ok(()) => Ok(StoredArtifact {
            path,
            created_at: Utc::now(),
        }),
        Err(source) => Err(BoothError::FileWrite { path, source }),
    }
}
