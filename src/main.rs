use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod bus;
mod camera;
mod capture;
mod config;
mod display;
mod error;
mod session;
mod state;

#[cfg(test)]
mod testing;

use bus::{ChannelSink, Event, EventSink, Router, StoreReport};
use camera::{CameraSource, StillImageCamera, TestPatternCamera};
use capture::encoder::PlaceholderEncoder;
use capture::store::CaptureStore;
use capture::sweep::{delete_old_files, spawn_retention_task};
use capture::timelapse::TimeLapseRecorder;
use config::BoothConfig;
use display::{Display, LogDisplay, StaticOverlay};
use session::{SessionOutcome, Sequencer};
use state::assets::AssetMap;
use state::data::Surface;
use state::preferences::Preferences;

#[derive(Parser, Debug)]
#[command(name = "photobooth", version, about = "Kiosk photobooth session runner")]
struct Args {
    /// TOML config file
    #[arg(long, default_value = "config/booth.toml")]
    config: PathBuf,

    /// Override the capture directory
    #[arg(long)]
    capture_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one photo session, then keep sweeping until Ctrl+C
    Run {
        /// Record a time-lapse alongside the session
        #[arg(long)]
        time_lapse: bool,
    },
    /// Delete expired captures once and exit
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = BoothConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(dir) = args.capture_dir {
        config.paths.capture_dir = dir;
    }

    match args.command {
        Command::Run { time_lapse } => run(config, time_lapse).await,
        Command::Sweep => sweep(config).await,
    }
}

async fn sweep(config: BoothConfig) -> anyhow::Result<()> {
    let dir = config.paths.capture_dir.clone();
    let max_age = config.retention.policy().max_age;
    let report = tokio::task::spawn_blocking(move || delete_old_files(&dir, max_age, SystemTime::now()))
        .await
        .context("sweep task panicked")?
        .with_context(|| format!("sweeping {}", config.paths.capture_dir.display()))?;

    println!(
        "🧹 Swept {}: {} scanned, {} deleted, {} failed",
        config.paths.capture_dir.display(),
        report.scanned,
        report.deleted.len(),
        report.failures.len()
    );
    Ok(())
}

async fn run(config: BoothConfig, time_lapse: bool) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let encoder = Arc::new(PlaceholderEncoder::new(config.timing.encoder_delay()));
    let store = Arc::new(
        CaptureStore::open(&config.paths.capture_dir, encoder).context("opening capture store")?,
    );
    let retention = spawn_retention_task(
        store.dir().to_path_buf(),
        config.retention.policy(),
        cancel.clone(),
    );

    let session_config = Preferences::load(&config.paths.preferences)?
        .session_config()
        .context("building session config")?;

    let (camera, test_card): (Arc<dyn CameraSource>, Option<Arc<TestPatternCamera>>) =
        match &config.camera.still_image {
            Some(path) => (Arc::new(StillImageCamera::new(path)) as Arc<dyn CameraSource>, None),
            None => {
                let card = Arc::new(TestPatternCamera::new(session_config.zoom));
                (card.clone() as Arc<dyn CameraSource>, Some(card))
            }
        };

    let (sink, rx) = ChannelSink::new();
    let sink: Arc<dyn EventSink> = Arc::new(sink);
    let recorder = Arc::new(TimeLapseRecorder::new(
        Arc::clone(&camera),
        session_config.clone(),
        Arc::clone(&sink),
    ));
    let router = Router::new(Arc::clone(&store)).with_recorder(Arc::clone(&recorder));
    let reports = router.subscribe();
    let router_task = router.spawn(rx, cancel.clone());
    tokio::spawn(log_reports(reports));

    let display: Arc<dyn Display> = Arc::new(LogDisplay);
    match AssetMap::load(&config.paths.assets_map).and_then(|assets| {
        assets.overlay(Surface::ScreenB, &session_config.language, session_config.layout)
    }) {
        Ok(overlay) => display.swap_overlay(&overlay),
        Err(e) => warn!("⚠️  {}", e),
    }

    if time_lapse {
        sink.send(Event::StartTimeLapse);
    }

    let mut handle = Sequencer::new(
        session_config,
        config.timing.session(),
        camera,
        Arc::new(StaticOverlay::new(config.camera.window)),
        display,
        Arc::clone(&sink),
    )
    .start()
    .context("starting session")?;

    let interrupted = tokio::select! {
        outcome = handle.wait() => {
            log_outcome(outcome);
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        handle.stop();
        log_outcome(handle.wait().await);
    } else {
        info!("Kiosk idle, retention sweep running. Press Ctrl+C to exit.");
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Failed to listen for Ctrl+C: {}", e);
        }
    }

    info!("Shutting down");
    recorder.stop();
    if let Some(card) = test_card {
        card.stop();
    }
    cancel.cancel();
    let _ = tokio::join!(router_task, retention);
    Ok(())
}

fn log_outcome(outcome: SessionOutcome) {
    match outcome {
        SessionOutcome::Completed { shots } => info!("✅ Session finished with {} photos", shots),
        SessionOutcome::Stopped { shots } => info!("⏹️ Session stopped with {} photos", shots),
    }
}

async fn log_reports(mut reports: tokio::sync::broadcast::Receiver<StoreReport>) {
    loop {
        match reports.recv().await {
            Ok(StoreReport::PhotoSaved(artifact)) => info!(
                "💾 {} at {}",
                artifact.path.display(),
                artifact.created_at.format("%H:%M:%S")
            ),
            Ok(StoreReport::TimeLapseSaved(report)) => info!(
                "💾 Time-lapse: {} frames, video {:?}, {} failures",
                report.frames_written,
                report.video,
                report.failures.len()
            ),
            Ok(StoreReport::Failed { event, error }) => error!("❌ {} failed: {}", event, error),
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                warn!("⚠️  Missed {} store reports", n)
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
