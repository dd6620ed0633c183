//! Capture surface enumeration
//!
//! Index 0 is always the virtual desktop (union of every display), indices
//! 1..=N are the physical displays in backend order.

use crate::capture::{CaptureBackend, DisplayBounds};
use crate::error::{PreviewError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorDescriptor {
    pub index: usize,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorDescriptor {
    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    /// Inclusive left/top, exclusive right/bottom
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (x, y) = (x as i64, y as i64);
        x >= self.left as i64 && x < self.right() && y >= self.top as i64 && y < self.bottom()
    }

    pub fn is_union(&self) -> bool {
        self.index == 0
    }

    /// Option text for display pickers
    pub fn label(&self) -> String {
        if self.is_union() {
            format!("[0] All displays  {}x{}", self.width, self.height)
        } else {
            format!(
                "[{}] Monitor {}  {}x{} @({},{})",
                self.index, self.index, self.width, self.height, self.left, self.top
            )
        }
    }
}

/// Recover the monitor index from a bare number or a
/// [`MonitorDescriptor::label`] string. Unparseable input selects the first
/// physical display.
pub fn parse_monitor_label(label: &str) -> usize {
    let label = label.trim();
    if let Ok(index) = label.parse() {
        return index;
    }
    label
        .strip_prefix('[')
        .and_then(|rest| rest.split(']').next())
        .and_then(|idx| idx.trim().parse().ok())
        .unwrap_or(1)
}

/// Lists capture surfaces through a capture backend
pub struct DisplayEnumerator<'a, B: CaptureBackend> {
    backend: &'a B,
}

impl<'a, B: CaptureBackend> DisplayEnumerator<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Open a short-lived handle, list displays and release it again
    pub fn enumerate(&self) -> Result<Vec<MonitorDescriptor>> {
        let handle = self.backend.open().map_err(into_enumeration_error)?;
        let listed = self.backend.list_displays(&handle);
        self.backend.close(handle);

        Ok(build_monitor_list(&listed.map_err(into_enumeration_error)?))
    }
}

fn into_enumeration_error(err: PreviewError) -> PreviewError {
    match err {
        PreviewError::EnumerationFailed(_) => err,
        other => PreviewError::EnumerationFailed(other.to_string()),
    }
}

/// Number the physical displays from 1 and prepend their union as index 0.
/// Degenerate rectangles are skipped.
pub fn build_monitor_list(displays: &[DisplayBounds]) -> Vec<MonitorDescriptor> {
    let physical: Vec<&DisplayBounds> = displays
        .iter()
        .filter(|d| d.width > 0 && d.height > 0)
        .collect();

    if physical.is_empty() {
        return Vec::new();
    }

    let left = physical.iter().map(|d| d.left as i64).min().unwrap_or(0);
    let top = physical.iter().map(|d| d.top as i64).min().unwrap_or(0);
    let right = physical
        .iter()
        .map(|d| d.left as i64 + d.width as i64)
        .max()
        .unwrap_or(0);
    let bottom = physical
        .iter()
        .map(|d| d.top as i64 + d.height as i64)
        .max()
        .unwrap_or(0);

    let mut monitors = Vec::with_capacity(physical.len() + 1);
    monitors.push(MonitorDescriptor {
        index: 0,
        left: left as i32,
        top: top as i32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    });

    for (i, d) in physical.iter().enumerate() {
        monitors.push(MonitorDescriptor {
            index: i + 1,
            left: d.left,
            top: d.top,
            width: d.width,
            height: d.height,
        });
    }

    monitors
}
