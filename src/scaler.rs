use image::imageops::{self, FilterType};
use image::RgbImage;

/// Fits frames into the preview viewport.
///
/// `max_scale` bounds the output relative to the captured frame, so a
/// factor of 1.0 behaves like a thumbnail (never upscales) and 1.5 lets a
/// small capture grow into a larger viewport.
pub struct FrameScaler {
    max_scale: f64,
    filter: FilterType,
}

impl FrameScaler {
    pub fn new(max_scale: f64) -> Self {
        Self {
            max_scale,
            filter: FilterType::Lanczos3,
        }
    }

    /// Output size for a `src` frame in a `target` viewport, or `None` when
    /// the viewport has no area yet
    pub fn target_size(&self, src: (u32, u32), target: (u32, u32)) -> Option<(u32, u32)> {
        let (sw, sh) = src;
        let (tw, th) = target;
        if tw == 0 || th == 0 || sw == 0 || sh == 0 {
            return None;
        }

        let scale = (tw as f64 / sw as f64)
            .min(th as f64 / sh as f64)
            .min(self.max_scale);

        let width = ((sw as f64 * scale).round() as u32).clamp(1, tw);
        let height = ((sh as f64 * scale).round() as u32).clamp(1, th);
        Some((width, height))
    }

    pub fn fit(&self, frame: RgbImage, target_width: u32, target_height: u32) -> RgbImage {
        match self.target_size(frame.dimensions(), (target_width, target_height)) {
            Some(size) if size != frame.dimensions() => {
                imageops::resize(&frame, size.0, size.1, self.filter)
            }
            _ => frame,
        }
    }
}
