//! Test doubles for the capture backend, pointer platform and surface

use crate::capture::{CaptureBackend, DisplayBounds, RawFrame};
use crate::display::MonitorDescriptor;
use crate::error::{PreviewError, Result};
use crate::pointer::PointerPlatform;
use crate::surface::PreviewSurface;
use image::RgbImage;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FakeBackend {
    displays: Vec<DisplayBounds>,
    available: bool,
    /// Grabs that succeed before every further grab reports capture loss
    fail_after: Option<usize>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    grabs: AtomicUsize,
}

pub struct FakeHandle;

impl FakeBackend {
    pub fn new(displays: Vec<DisplayBounds>) -> Self {
        Self {
            displays,
            available: true,
            fail_after: None,
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            grabs: AtomicUsize::new(0),
        }
    }

    pub fn single(width: u32, height: u32) -> Self {
        Self::new(vec![DisplayBounds {
            left: 0,
            top: 0,
            width,
            height,
        }])
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn failing_after(mut self, grabs: usize) -> Self {
        self.fail_after = Some(grabs);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn open_handles(&self) -> usize {
        self.opened() - self.closed.load(Ordering::SeqCst)
    }

    pub fn grabs(&self) -> usize {
        self.grabs.load(Ordering::SeqCst)
    }
}

impl CaptureBackend for FakeBackend {
    type Handle = FakeHandle;

    fn open(&self) -> Result<FakeHandle> {
        if !self.available {
            return Err(PreviewError::EnumerationFailed("no display server".into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle)
    }

    fn list_displays(&self, _handle: &FakeHandle) -> Result<Vec<DisplayBounds>> {
        Ok(self.displays.clone())
    }

    fn grab(&self, _handle: &mut FakeHandle, rect: &MonitorDescriptor) -> Result<RawFrame> {
        let done = self.grabs.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| done >= limit) {
            return Err(PreviewError::CaptureLost(format!(
                "monitor {} disconnected",
                rect.index
            )));
        }
        let stride = rect.width as usize * 4;
        RawFrame::new(vec![0; stride * rect.height as usize], rect.width, rect.height, stride)
    }

    fn close(&self, _handle: FakeHandle) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakePointer {
    pub physical: Option<(i32, i32)>,
    pub logical: Option<(i32, i32)>,
    pub monitor_scale: Option<f64>,
    pub system_scale: Option<f64>,
    pub panic_on_query: bool,
}

impl FakePointer {
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            physical: Some((x, y)),
            ..Default::default()
        }
    }
}

impl PointerPlatform for FakePointer {
    fn physical_position(&self) -> Option<(i32, i32)> {
        if self.panic_on_query {
            panic!("pointer query exploded");
        }
        self.physical
    }

    fn logical_position(&self) -> Option<(i32, i32)> {
        self.logical
    }

    fn monitor_scale(&self, _x: i32, _y: i32) -> Option<f64> {
        self.monitor_scale
    }

    fn system_scale(&self) -> Option<f64> {
        self.system_scale
    }
}

pub struct RecordingSurface {
    pub viewport: (u32, u32),
    pub frames: Vec<RgbImage>,
    pub statuses: Vec<String>,
}

impl RecordingSurface {
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            viewport,
            frames: Vec::new(),
            statuses: Vec::new(),
        }
    }

    pub fn last_status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }
}

impl PreviewSurface for RecordingSurface {
    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn present(&mut self, frame: RgbImage) {
        self.frames.push(frame);
    }

    fn set_status(&mut self, text: &str) {
        self.statuses.push(text.to_string());
    }
}
