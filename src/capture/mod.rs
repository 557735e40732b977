/// Capture persistence module
///
/// This module handles:
/// - Writing captured photos under deterministic names (store.rs)
/// - Recording time-lapse frames (timelapse.rs)
/// - Stitching frames into a video through a pluggable encoder (encoder.rs)
/// - Expiring old captures (sweep.rs)

pub mod encoder;
pub mod store;
pub mod sweep;
pub mod timelapse;

use crate::state::data::{AspectRatio, LayoutId};

/// `photo_{language}_{aspectRatio}_{layout}_{index}.jpg`
pub fn photo_file_name(language: &str, aspect: AspectRatio, layout: LayoutId, index: u32) -> String {
    format!("photo_{}_{}_{}_{}.jpg", language, aspect, layout, index)
}

/// `timelapse_{language}_{aspectRatio}_{layout}.mp4`
pub fn timelapse_file_name(language: &str, aspect: AspectRatio, layout: LayoutId) -> String {
    format!("timelapse_{}_{}_{}.mp4", language, aspect, layout)
}

/// Intermediate frame file, removed once the video is merged
pub fn frame_file_name(index: usize) -> String {
    format!("timelapse_frame_{}.jpg", index)
}
