/// Time-lapse recording
///
/// Grabs one frame per interval from the camera until the frame budget
/// is used up or recording is stopped, then hands the frames to the bus
/// as a `save-time-lapse` event.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::bus::{Event, EventSink, TimeLapsePayload};
use crate::camera::CameraSource;
use crate::state::data::{CapturedFrame, SessionConfig, TimeLapseJob};

/// Frames in a full time-lapse
pub const TIME_LAPSE_FRAMES: u32 = 7;

pub struct TimeLapseRecorder {
    camera: Arc<dyn CameraSource>,
    config: SessionConfig,
    sink: Arc<dyn EventSink>,
    frame_count: u32,
    interval: Duration,
    recording: AtomicBool,
}

impl TimeLapseRecorder {
    pub fn new(camera: Arc<dyn CameraSource>, config: SessionConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            camera,
            config,
            sink,
            frame_count: TIME_LAPSE_FRAMES,
            interval: Duration::from_secs(1),
            recording: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn with_timing(mut self, frame_count: u32, interval: Duration) -> Self {
        self.frame_count = frame_count;
        self.interval = interval;
        self
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Stop after the frame currently in flight
    pub fn stop(&self) {
        if self.recording.swap(false, Ordering::SeqCst) {
            info!("⏹️ Time-lapse recording stopped");
        }
    }

    /// Record frames until the budget is reached or `stop` is called
    ///
    /// The first frame is taken immediately. Frames captured before a stop
    /// are kept and a failed grab is skipped. Returns `None` when another
    /// recording is already running.
    pub async fn record(&self) -> Option<TimeLapseJob> {
        if self.recording.swap(true, Ordering::SeqCst) {
            warn!("⚠️  Time-lapse already recording, ignoring request");
            return None;
        }
        info!("🎥 Time-lapse recording started");

        let mut frames = Vec::with_capacity(self.frame_count as usize);
        for index in 0..self.frame_count {
            if !self.is_recording() {
                break;
            }

            let camera = Arc::clone(&self.camera);
            match tokio::task::spawn_blocking(move || camera.frame()).await {
                Ok(Ok(image)) => frames.push(CapturedFrame {
                    image,
                    config: self.config.clone(),
                    sequence_index: index,
                }),
                Ok(Err(e)) => error!("❌ Time-lapse frame {}: {}", index, e),
                Err(e) => error!("❌ Camera task failed: {}", e),
            }

            tokio::time::sleep(self.interval).await;
        }

        self.recording.store(false, Ordering::SeqCst);
        info!("📽 Time-lapse recorded {} frames", frames.len());
        Some(TimeLapseJob {
            config: self.config.clone(),
            frames,
        })
    }

    /// Ship the recorded frames to the store
    pub fn save(&self, job: &TimeLapseJob) {
        info!("💾 Saving time-lapse video... ({})", job.output_name());
        self.sink
            .send(Event::SaveTimeLapse(TimeLapsePayload::from_job(job)));
    }
}
