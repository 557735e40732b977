/// One-way message bus between the session, the camera side and the store
///
/// Senders never wait for a reply. Every event is dropped into an
/// unbounded channel and the router decides who handles it.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::capture::store::{CaptureStore, TimeLapseReport};
use crate::capture::timelapse::TimeLapseRecorder;
use crate::error::{BoothError, Result};
use crate::state::data::{
    AspectRatio, CapturedFrame, LayoutId, StoredArtifact, Surface, TimeLapseJob,
};

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Encode JPEG bytes the way the capture surface ships them
pub fn to_data_url(jpeg: &[u8]) -> String {
    format!("{}{}", JPEG_DATA_URL_PREFIX, STANDARD.encode(jpeg))
}

/// Decode a JPEG data URL (the prefix is optional)
pub fn from_data_url(data: &str) -> Result<Vec<u8>> {
    let encoded = data.strip_prefix(JPEG_DATA_URL_PREFIX).unwrap_or(data);
    STANDARD
        .decode(encoded)
        .map_err(|e| BoothError::InvalidPayload(format!("bad base64: {}", e)))
}

/// Body of a `save-photo` event
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoPayload {
    /// `data:image/jpeg;base64,...`
    pub image_data: String,
    pub language: String,
    pub aspect_ratio: AspectRatio,
    pub layout: LayoutId,
    pub photo_index: u32,
}

impl PhotoPayload {
    pub fn from_frame(frame: &CapturedFrame) -> Self {
        Self {
            image_data: to_data_url(&frame.image),
            language: frame.config.language.clone(),
            aspect_ratio: frame.config.aspect_ratio,
            layout: frame.config.layout,
            photo_index: frame.sequence_index,
        }
    }
}

/// Body of a `save-time-lapse` event
#[derive(Debug, Clone, PartialEq)]
pub struct TimeLapsePayload {
    /// Data URLs in capture order
    pub frames: Vec<String>,
    pub language: String,
    pub aspect_ratio: AspectRatio,
    pub layout: LayoutId,
}

impl TimeLapsePayload {
    pub fn from_job(job: &TimeLapseJob) -> Self {
        Self {
            frames: job.frames.iter().map(|f| to_data_url(&f.image)).collect(),
            language: job.config.language.clone(),
            aspect_ratio: job.config.aspect_ratio,
            layout: job.config.layout,
        }
    }
}

/// Named events carried by the bus
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CapturePhoto { index: u32 },
    StartTimeLapse,
    SavePhoto(PhotoPayload),
    SaveTimeLapse(TimeLapsePayload),
    Navigate { surface: Surface, page: String },
}

impl Event {
    /// Channel name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Event::CapturePhoto { .. } => "capture-photo",
            Event::StartTimeLapse => "start-time-lapse",
            Event::SavePhoto(_) => "save-photo",
            Event::SaveTimeLapse(_) => "save-time-lapse",
            Event::Navigate {
                surface: Surface::ScreenA,
                ..
            } => "navigate-screenA",
            Event::Navigate {
                surface: Surface::ScreenB,
                ..
            } => "navigate-screenB",
        }
    }
}

/// Fire-and-forget event sender
pub trait EventSink: Send + Sync {
    fn send(&self, event: Event);
}

/// Sink backed by an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn send(&self, event: Event) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            warn!("⚠️  Dropped '{}': bus receiver is gone", name);
        }
    }
}

/// Outcome of one store operation, published for diagnostics
#[derive(Debug, Clone)]
pub enum StoreReport {
    PhotoSaved(StoredArtifact),
    TimeLapseSaved(TimeLapseReport),
    Failed { event: &'static str, error: String },
}

/// Drains the bus and dispatches each event to its handler
pub struct Router {
    store: Arc<CaptureStore>,
    recorder: Option<Arc<TimeLapseRecorder>>,
    reports: broadcast::Sender<StoreReport>,
}

impl Router {
    pub fn new(store: Arc<CaptureStore>) -> Self {
        let (reports, _) = broadcast::channel(64);
        Self {
            store,
            recorder: None,
            reports,
        }
    }

    /// Handle `start-time-lapse` with this recorder
    pub fn with_recorder(mut self, recorder: Arc<TimeLapseRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Side channel carrying the result of every store operation
    pub fn subscribe(&self) -> broadcast::Receiver<StoreReport> {
        self.reports.subscribe()
    }

    /// Run until the bus closes or `cancel` fires
    pub fn spawn(
        self,
        mut rx: mpsc::UnboundedReceiver<Event>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Bus router shutting down");
                        break;
                    }
                    event = rx.recv() => match event {
                        Some(event) => self.dispatch(event),
                        None => break,
                    },
                }
            }
        })
    }

    fn dispatch(&self, event: Event) {
        debug!("📨 {}", event.name());
        match event {
            Event::CapturePhoto { index } => {
                info!("📸 Capture requested for photo {}", index);
            }
            Event::StartTimeLapse => match &self.recorder {
                Some(recorder) => {
                    let recorder = Arc::clone(recorder);
                    tokio::spawn(async move {
                        if let Some(job) = recorder.record().await {
                            recorder.save(&job);
                        }
                    });
                }
                None => warn!("⚠️  Time-lapse requested but no recorder is attached"),
            },
            Event::SavePhoto(payload) => {
                let store = Arc::clone(&self.store);
                let reports = self.reports.clone();
                tokio::spawn(async move {
                    let report = match store.save_photo(&payload).await {
                        Ok(artifact) => StoreReport::PhotoSaved(artifact),
                        Err(e) => {
                            error!("❌ Error saving photo: {}", e);
                            StoreReport::Failed {
                                event: "save-photo",
                                error: e.to_string(),
                            }
                        }
                    };
                    let _ = reports.send(report);
                });
            }
            Event::SaveTimeLapse(payload) => {
                let store = Arc::clone(&self.store);
                let reports = self.reports.clone();
                tokio::spawn(async move {
                    let report = match store.save_time_lapse(&payload).await {
                        Ok(report) => StoreReport::TimeLapseSaved(report),
                        Err(e) => {
                            error!("❌ Error saving time-lapse frames: {}", e);
                            StoreReport::Failed {
                                event: "save-time-lapse",
                                error: e.to_string(),
                            }
                        }
                    };
                    let _ = reports.send(report);
                });
            }
            Event::Navigate { surface, page } => {
                info!("➡️  {} navigating to {}", surface.as_str(), page);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::encoder::PlaceholderEncoder;
    use crate::state::data::{SessionConfig, ZoomLevel};
    use crate::testing::jpeg_bytes;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config() -> SessionConfig {
        SessionConfig {
            language: "english".to_string(),
            layout: LayoutId::Square1,
            aspect_ratio: AspectRatio::Square,
            zoom: ZoomLevel::Standard,
        }
    }

    #[test]
    fn test_data_url_round_trip() {
        let jpeg = jpeg_bytes();
        let url = to_data_url(&jpeg);
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(from_data_url(&url).unwrap(), jpeg);
        assert!(matches!(
            from_data_url("data:image/jpeg;base64,!!!"),
            Err(BoothError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_event_names() {
        let nav_a = Event::Navigate {
            surface: Surface::ScreenA,
            page: "page11".into(),
        };
        let nav_b = Event::Navigate {
            surface: Surface::ScreenB,
            page: "page11b".into(),
        };
        assert_eq!(nav_a.name(), "navigate-screenA");
        assert_eq!(nav_b.name(), "navigate-screenB");
        assert_eq!(Event::CapturePhoto { index: 1 }.name(), "capture-photo");
        assert_eq!(Event::StartTimeLapse.name(), "start-time-lapse");
    }

    #[test]
    fn test_photo_payload_from_frame() {
        let frame = CapturedFrame {
            image: jpeg_bytes(),
            config: config(),
            sequence_index: 3,
        };
        let payload = PhotoPayload::from_frame(&frame);
        assert_eq!(payload.photo_index, 3);
        assert_eq!(payload.layout, LayoutId::Square1);
        assert_eq!(from_data_url(&payload.image_data).unwrap(), frame.image);
    }

    #[tokio::test]
    async fn test_router_saves_photo_and_reports() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            CaptureStore::open(dir.path(), Arc::new(PlaceholderEncoder::new(Duration::ZERO)))
                .unwrap(),
        );
        let router = Router::new(store);
        let mut reports = router.subscribe();
        let (sink, rx) = ChannelSink::new();
        let cancel = CancellationToken::new();
        let handle = router.spawn(rx, cancel.clone());

        sink.send(Event::SavePhoto(PhotoPayload::from_frame(&CapturedFrame {
            image: jpeg_bytes(),
            config: config(),
            sequence_index: 1,
        })));

        match reports.recv().await.unwrap() {
            StoreReport::PhotoSaved(artifact) => {
                assert_eq!(
                    artifact.path,
                    dir.path().join("photo_english_square_Squarelayout1_1.jpg")
                );
                assert!(artifact.path.exists());
            }
            other => panic!("unexpected report: {:?}", other),
        }

        sink.send(Event::SavePhoto(PhotoPayload {
            image_data: to_data_url(b"not a jpeg"),
            language: "english".into(),
            aspect_ratio: AspectRatio::Square,
            layout: LayoutId::Square1,
            photo_index: 2,
        }));
        assert!(matches!(
            reports.recv().await.unwrap(),
            StoreReport::Failed { event: "save-photo", .. }
        ));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_time_lapse_request_saves_once() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            CaptureStore::open(dir.path(), Arc::new(PlaceholderEncoder::new(Duration::ZERO)))
                .unwrap(),
        );
        let recorded = Arc::new(crate::testing::RecordingSink::default());
        let recorder = Arc::new(
            TimeLapseRecorder::new(
                Arc::new(crate::testing::FakeCamera::working()),
                config(),
                recorded.clone(),
            )
            .with_timing(2, Duration::from_secs(1)),
        );
        let router = Router::new(store).with_recorder(recorder);
        let (sink, rx) = ChannelSink::new();
        let cancel = CancellationToken::new();
        let handle = router.spawn(rx, cancel.clone());

        sink.send(Event::StartTimeLapse);
        sink.send(Event::StartTimeLapse);
        tokio::time::sleep(Duration::from_secs(5)).await;

        let events = recorded.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::SaveTimeLapse(payload) => assert_eq!(payload.frames.len(), 2),
            other => panic!("unexpected event: {:?}", other),
        }

        cancel.cancel();
        handle.await.unwrap();
    }
}
