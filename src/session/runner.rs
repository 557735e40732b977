/// Async driver for the session machine
///
/// The runner executes the machine's effects, keeps at most one pending
/// timer, and feeds timer expiries and camera results back in as inputs.
/// Cancelling the session token drops the pending timer and turns the next
/// input into `Stop`.
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::machine::{step, Effect, Input, Phase, SessionState, Wait};
use crate::bus::{Event, EventSink, PhotoPayload};
use crate::camera::CameraSource;
use crate::display::{Display, OverlayProvider};
use crate::error::Result;
use crate::state::assets::alternate_overlay;
use crate::state::data::{CapturedFrame, SessionConfig, Surface};
use crate::state::layout::LayoutSpec;

/// Page each surface moves to when a session completes
const NEXT_PAGES: [(Surface, &str); 2] = [(Surface::ScreenA, "page11"), (Surface::ScreenB, "page11b")];

/// Durations of every timed step in a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionTiming {
    pub tick: Duration,
    pub flash: Duration,
    pub between_shots: Duration,
    pub grace: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            flash: Duration::from_millis(100),
            between_shots: Duration::from_secs(2),
            grace: Duration::from_secs(3),
        }
    }
}

impl SessionTiming {
    fn duration(&self, wait: Wait) -> Duration {
        match wait {
            Wait::Tick => self.tick,
            Wait::BetweenShots => self.between_shots,
            Wait::Grace => self.grace,
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed { shots: u32 },
    Stopped { shots: u32 },
}

/// Drives one photo session from first countdown to navigation
pub struct Sequencer {
    config: SessionConfig,
    timing: SessionTiming,
    state: SessionState,
    camera: Arc<dyn CameraSource>,
    overlay: Arc<dyn OverlayProvider>,
    display: Arc<dyn Display>,
    sink: Arc<dyn EventSink>,
}

impl Sequencer {
    pub fn new(
        config: SessionConfig,
        timing: SessionTiming,
        camera: Arc<dyn CameraSource>,
        overlay: Arc<dyn OverlayProvider>,
        display: Arc<dyn Display>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let state = SessionState::new(LayoutSpec::for_layout(config.layout));
        Self {
            config,
            timing,
            state,
            camera,
            overlay,
            display,
            sink,
        }
    }

    /// Place the camera view and start the session in the background
    ///
    /// Fails with `OverlayNotReady` before any timer is scheduled.
    pub fn start(self) -> Result<SessionHandle> {
        let placement = self.overlay.placement()?;
        self.display.place_camera(placement);

        info!(
            "🟢 Session started: {} / {} / {} ({} shots)",
            self.config.language,
            self.config.aspect_ratio,
            self.config.layout,
            self.state.total_shots
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(cancel.clone()));
        Ok(SessionHandle {
            cancel,
            task: Some(task),
        })
    }

    async fn run(mut self, cancel: CancellationToken) -> SessionOutcome {
        let mut queue = VecDeque::from([Input::Ready]);
        let mut timer: Option<Wait> = None;

        loop {
            let input = match queue.pop_front() {
                Some(input) => input,
                None => match timer.take() {
                    Some(wait) => {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Input::Stop,
                            _ = tokio::time::sleep(self.timing.duration(wait)) => wait.input(),
                        }
                    }
                    None => break,
                },
            };
            let input = if cancel.is_cancelled() { Input::Stop } else { input };

            let (next, effects) = step(&self.state, input);
            self.state = next;
            for effect in effects {
                self.apply(effect, &mut queue, &mut timer).await;
            }

            if self.state.phase.is_terminal() {
                break;
            }
        }

        let shots = self.state.shots_taken;
        match self.state.phase {
            Phase::Finished => SessionOutcome::Completed { shots },
            _ => {
                info!("⏹️ Session stopped after {} shots", shots);
                SessionOutcome::Stopped { shots }
            }
        }
    }

    async fn apply(&self, effect: Effect, queue: &mut VecDeque<Input>, timer: &mut Option<Wait>) {
        match effect {
            Effect::ShowCountdown(n) => self.display.show_countdown(n),
            Effect::ShowProgress { taken, total } => self.display.show_progress(taken, total),
            Effect::Flash => {
                let display = Arc::clone(&self.display);
                let duration = self.timing.flash;
                tokio::spawn(async move {
                    display.set_flash(true);
                    tokio::time::sleep(duration).await;
                    display.set_flash(false);
                });
            }
            Effect::Capture { index } => {
                info!(
                    "📸 Capturing photo {} / {}",
                    index, self.state.total_shots
                );
                self.sink.send(Event::CapturePhoto { index });
                queue.push_back(Input::Shutter(self.grab_frame(index).await));
            }
            Effect::Persist(Some(frame)) => {
                self.sink.send(Event::SavePhoto(PhotoPayload::from_frame(&frame)));
                info!("📸 Captured Photo {}", frame.sequence_index);
                queue.push_back(Input::Persisted);
            }
            Effect::Persist(None) => {
                warn!("⚠️  No frame to save for this shot");
                queue.push_back(Input::Persisted);
            }
            Effect::SwapOverlay => {
                self.display
                    .swap_overlay(&alternate_overlay(&self.config.language));
            }
            Effect::Schedule(wait) => {
                if self.state.phase == Phase::Complete {
                    info!("🎉 Photo session complete!");
                }
                *timer = Some(wait);
            }
            Effect::Navigate => {
                for (surface, page) in NEXT_PAGES {
                    self.sink.send(Event::Navigate {
                        surface,
                        page: page.to_string(),
                    });
                }
            }
        }
    }

    async fn grab_frame(&self, index: u32) -> Option<CapturedFrame> {
        let camera = Arc::clone(&self.camera);
        let image = match tokio::task::spawn_blocking(move || camera.frame()).await {
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                error!("❌ {}", e);
                return None;
            }
            Err(e) => {
                error!("❌ Camera task failed: {}", e);
                return None;
            }
        };

        Some(CapturedFrame {
            image,
            config: self.config.clone(),
            sequence_index: index,
        })
    }
}

/// Handle to a running session
///
/// Dropping the handle stops the session, as when the surface unloads.
#[derive(Debug)]
pub struct SessionHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<SessionOutcome>>,
}

impl SessionHandle {
    /// Cancel any pending timer and suppress further transitions
    pub fn stop(&self) {
        debug!("stop requested");
        self.cancel.cancel();
    }

    /// Wait for the session to finish or stop
    ///
    /// Safe to call again after an earlier `wait` was dropped mid-way.
    pub async fn wait(&mut self) -> SessionOutcome {
        let Some(task) = self.task.as_mut() else {
            return SessionOutcome::Stopped { shots: 0 };
        };
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("❌ Session task failed: {}", e);
                SessionOutcome::Stopped { shots: 0 }
            }
        };
        self.task = None;
        outcome
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
