//! Test doubles shared by the unit tests

use std::sync::Mutex;

use crate::bus::{Event, EventSink};
use crate::camera::{encode_jpeg, CameraSource};
use crate::display::{Display, Placement};
use crate::error::{BoothError, Result};

/// A tiny valid JPEG
pub fn jpeg_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 40, 90]));
    encode_jpeg(&img).unwrap()
}

/// Sink that remembers every event in send order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn send(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    Placed(Placement),
    Countdown(u8),
    Progress(u32, u32),
    Flash(bool),
    Overlay(String),
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    calls: Mutex<Vec<DisplayCall>>,
}

impl RecordingDisplay {
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: DisplayCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Display for RecordingDisplay {
    fn place_camera(&self, placement: Placement) {
        self.push(DisplayCall::Placed(placement));
    }

    fn show_countdown(&self, remaining: u8) {
        self.push(DisplayCall::Countdown(remaining));
    }

    fn show_progress(&self, taken: u32, total: u32) {
        self.push(DisplayCall::Progress(taken, total));
    }

    fn set_flash(&self, on: bool) {
        self.push(DisplayCall::Flash(on));
    }

    fn swap_overlay(&self, asset: &str) {
        self.push(DisplayCall::Overlay(asset.to_string()));
    }
}

/// Camera returning a fixed JPEG, or always failing
#[derive(Debug, Clone)]
pub struct FakeCamera {
    frame: Option<Vec<u8>>,
}

impl FakeCamera {
    pub fn working() -> Self {
        Self {
            frame: Some(jpeg_bytes()),
        }
    }

    pub fn broken() -> Self {
        Self { frame: None }
    }
}

impl CameraSource for FakeCamera {
    fn frame(&self) -> Result<Vec<u8>> {
        self.frame
            .clone()
            .ok_or_else(|| BoothError::camera("camera stream not available"))
    }
}
