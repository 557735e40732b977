/// Camera sources
///
/// The sequencer only needs one thing from a camera: the current frame
/// as encoded JPEG bytes. Anything that can produce that can drive a
/// session.
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::{BoothError, Result};
use crate::state::data::ZoomLevel;

/// JPEG quality used for encoded frames
const JPEG_QUALITY: u8 = 85;

/// A live camera stream
pub trait CameraSource: Send + Sync {
    /// Grab the current frame as JPEG bytes
    fn frame(&self) -> Result<Vec<u8>>;
}

/// Encode an RGB image to JPEG bytes
pub fn encode_jpeg(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .encode_image(img)
        .map_err(|e| BoothError::InvalidPayload(format!("JPEG encode failed: {}", e)))?;
    Ok(buffer)
}

/// Synthetic camera that renders a moving test card
///
/// Used on kiosks without a capture device and for burn-in runs.
#[derive(Debug)]
pub struct TestPatternCamera {
    width: u32,
    height: u32,
    frames: AtomicU32,
    stopped: AtomicBool,
}

impl TestPatternCamera {
    pub fn new(zoom: ZoomLevel) -> Self {
        let (width, height) = zoom.resolution();
        tracing::info!("📷 Camera initialized successfully ({}x{}).", width, height);
        Self {
            width,
            height,
            frames: AtomicU32::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// Stop the stream; further frames fail with `CameraUnavailable`
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        tracing::info!("⏹️ Camera stopped.");
    }
}

impl CameraSource for TestPatternCamera {
    fn frame(&self) -> Result<Vec<u8>> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(BoothError::camera("camera stream not available"));
        }

        // Shift the gradient every frame so consecutive shots differ
        let offset = self.frames.fetch_add(1, Ordering::SeqCst).wrapping_mul(17);
        let img = RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb([
                (x.wrapping_add(offset) % 256) as u8,
                (y.wrapping_add(offset) % 256) as u8,
                (((x + y) / 2) % 256) as u8,
            ])
        });
        encode_jpeg(&img)
    }
}

/// Camera that always serves the same JPEG from disk
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CameraSource for StillImageCamera {
    fn frame(&self) -> Result<Vec<u8>> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            BoothError::camera(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        match image::guess_format(&bytes) {
            Ok(ImageFormat::Jpeg) => Ok(bytes),
            _ => Err(BoothError::camera(format!(
                "{} is not a JPEG",
                self.path.display()
            ))),
        }
    }
}
