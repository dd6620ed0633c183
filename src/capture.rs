//! Capture subsystem boundary
//!
//! The pipeline only talks to a [`CaptureBackend`]; the X11 implementation
//! lives in `crate::linux` and tests use the fakes in `crate::fakes`.

use crate::display::MonitorDescriptor;
use crate::error::{PreviewError, Result};
use image::RgbImage;
use rayon::prelude::*;

/// Bounds of one physical display in virtual-desktop pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayBounds {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// A grabbed region with raw BGRA pixel data, top-down
pub struct RawFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    /// Bytes per row, may include padding
    stride: usize,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, stride: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PreviewError::CaptureLost(format!(
                "empty capture ({}x{})",
                width, height
            )));
        }
        if stride < width as usize * 4 || data.len() < stride * height as usize {
            return Err(PreviewError::CaptureLost(format!(
                "short capture buffer: {} bytes for {}x{} (stride {})",
                data.len(),
                width,
                height,
                stride
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Drop the 4th channel and produce a contiguous, owned RGB frame
    pub fn to_rgb(&self) -> RgbImage {
        let row_bytes = self.width as usize * 3;
        let mut out = vec![0u8; row_bytes * self.height as usize];

        out.par_chunks_exact_mut(row_bytes)
            .zip(self.data.par_chunks(self.stride))
            .for_each(|(dst, src)| {
                for (d, s) in dst.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
                    d[0] = s[2];
                    d[1] = s[1];
                    d[2] = s[0];
                }
            });

        // Length is checked in `new`
        RgbImage::from_raw(self.width, self.height, out)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }
}

/// Platform capture subsystem
pub trait CaptureBackend: Send + Sync + 'static {
    type Handle: Send + 'static;

    /// Connect to the capture subsystem
    fn open(&self) -> Result<Self::Handle>;

    /// Physical displays in backend order
    fn list_displays(&self, handle: &Self::Handle) -> Result<Vec<DisplayBounds>>;

    /// Grab the pixels of `rect`
    fn grab(&self, handle: &mut Self::Handle, rect: &MonitorDescriptor) -> Result<RawFrame>;

    /// Release the handle
    fn close(&self, handle: Self::Handle);
}
