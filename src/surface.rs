//! Preview surface boundary and the terminal implementation used by the CLI

use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// UI-owned canvas. Every method is called from the UI thread only.
pub trait PreviewSurface {
    /// Current viewport size; zero before the surface is laid out
    fn viewport(&self) -> (u32, u32);

    fn present(&mut self, frame: RgbImage);

    fn set_status(&mut self, text: &str);
}

/// Top-left corner that centers a frame inside the viewport. Frames larger
/// than the viewport are pinned to the origin on that axis.
pub fn centered_origin(viewport: (u32, u32), frame: (u32, u32)) -> (u32, u32) {
    let x = viewport.0.saturating_sub(frame.0) / 2;
    let y = viewport.1.saturating_sub(frame.1) / 2;
    (x, y)
}

/// Spinner-backed surface: reports what would be shown and how fast
pub struct TerminalSurface {
    viewport: (u32, u32),
    spinner: ProgressBar,
    presented: u64,
    last_size: (u32, u32),
    window_start: Instant,
    window_frames: u32,
    fps: f64,
    status: String,
}

impl TerminalSurface {
    pub fn new(viewport: (u32, u32)) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {elapsed_precise} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            viewport,
            spinner,
            presented: 0,
            last_size: (0, 0),
            window_start: Instant::now(),
            window_frames: 0,
            fps: 0.0,
            status: String::new(),
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    fn refresh(&self) {
        let (x, y) = centered_origin(self.viewport, self.last_size);
        self.spinner.set_message(format!(
            "{}x{} at ({},{}) | {:.1} fps | {} frames | {}",
            self.last_size.0, self.last_size.1, x, y, self.fps, self.presented, self.status
        ));
    }
}

impl PreviewSurface for TerminalSurface {
    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn present(&mut self, frame: RgbImage) {
        self.presented += 1;
        self.window_frames += 1;
        self.last_size = frame.dimensions();

        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.window_frames as f64 / elapsed.as_secs_f64();
            self.window_frames = 0;
            self.window_start = Instant::now();
        }
        self.refresh();
    }

    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_origin() {
        assert_eq!(centered_origin((800, 600), (400, 300)), (200, 150));
        assert_eq!(centered_origin((800, 600), (800, 450)), (0, 75));
        assert_eq!(centered_origin((100, 100), (200, 50)), (0, 25));
        assert_eq!(centered_origin((0, 0), (200, 50)), (0, 0));
    }

    #[test]
    fn test_terminal_surface_counts_frames() {
        let mut surface = TerminalSurface::new((640, 480));
        surface.present(RgbImage::new(320, 240));
        surface.present(RgbImage::new(320, 240));
        surface.set_status("Preview started");

        assert_eq!(surface.presented(), 2);
        assert_eq!(surface.viewport(), (640, 480));
        surface.finish();
    }
}
