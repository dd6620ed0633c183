use crate::config::{AnchorMode, PreviewConfig};
use crate::display::MonitorDescriptor;
use crate::pointer::CursorSample;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_antialiased_line_segment_mut;
use imageproc::pixelops::interpolate;
use std::f64::consts::FRAC_PI_4;

/// Share of the segment length used by the tip wings
pub const TIP_RATIO: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowSegment {
    pub tail: (i32, i32),
    pub tip: (i32, i32),
}

/// What the overlay step did for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayOutcome {
    pub inside: bool,
    /// The raw logical position located the pointer
    pub fallback_used: bool,
    pub segment: Option<ArrowSegment>,
}

/// Compute the arrow for a frame-local cursor point, clipped to the frame
pub fn arrow_endpoints(
    cursor: (i32, i32),
    config: &PreviewConfig,
    frame_width: u32,
    frame_height: u32,
) -> ArrowSegment {
    let (ux, uy) = config.arrow_direction.unit_vector();
    let length = config.total_arrow_length() as f64;
    let (cx, cy) = (cursor.0 as f64, cursor.1 as f64);

    let max_x = frame_width.saturating_sub(1) as f64;
    let max_y = frame_height.saturating_sub(1) as f64;
    let clip = |x: f64, y: f64| (x.round().clamp(0.0, max_x) as i32, y.round().clamp(0.0, max_y) as i32);

    let cursor = clip(cx, cy);
    match config.anchor_mode {
        AnchorMode::TipOut => ArrowSegment {
            tail: cursor,
            tip: clip(cx + ux * length, cy + uy * length),
        },
        AnchorMode::BaseIn => ArrowSegment {
            tail: clip(cx - ux * length, cy - uy * length),
            tip: cursor,
        },
    }
}

/// Translate a virtual-desktop point into frame coordinates, if it lands on
/// both the monitor and the frame.
fn to_frame_local(point: (i32, i32), monitor: &MonitorDescriptor, frame: &RgbImage) -> Option<(i32, i32)> {
    if !monitor.contains(point.0, point.1) {
        return None;
    }
    let local = (point.0 - monitor.left, point.1 - monitor.top);
    let (w, h) = frame.dimensions();
    if local.0 >= 0 && local.1 >= 0 && (local.0 as u32) < w && (local.1 as u32) < h {
        Some(local)
    } else {
        None
    }
}

/// Draw the cursor arrow into `frame`.
///
/// The physical sample is tried first. When it misses the monitor,
/// `raw_logical` is asked for the unscaled logical position as a second
/// chance; it is not called otherwise. When both miss, the frame is left
/// untouched.
pub fn draw_arrow_overlay<F>(
    frame: &mut RgbImage,
    sample: &CursorSample,
    monitor: &MonitorDescriptor,
    config: &PreviewConfig,
    raw_logical: F,
) -> OverlayOutcome
where
    F: FnOnce() -> Option<(i32, i32)>,
{
    let physical = if sample.is_resolved() {
        to_frame_local((sample.x, sample.y), monitor, frame)
    } else {
        None
    };

    let (local, fallback_used) = match physical {
        Some(local) => (local, false),
        None => match raw_logical().and_then(|p| to_frame_local(p, monitor, frame)) {
            Some(local) => (local, true),
            None => return OverlayOutcome::default(),
        },
    };

    let segment = arrow_endpoints(local, config, frame.width(), frame.height());
    draw_arrow(frame, &segment, config.arrow_color);

    OverlayOutcome {
        inside: true,
        fallback_used,
        segment: Some(segment),
    }
}

/// Anti-aliased 2px arrow: shaft plus two wings at ±45° around the tip
fn draw_arrow(frame: &mut RgbImage, segment: &ArrowSegment, color: Rgb<u8>) {
    let (tail, tip) = (segment.tail, segment.tip);
    draw_thick_line(frame, tail, tip, color);

    let dx = (tail.0 - tip.0) as f64;
    let dy = (tail.1 - tip.1) as f64;
    let tip_size = (dx * dx + dy * dy).sqrt() * TIP_RATIO;
    if tip_size < 1.0 {
        return;
    }

    let angle = dy.atan2(dx);
    for wing_angle in [angle + FRAC_PI_4, angle - FRAC_PI_4] {
        let wing = (
            (tip.0 as f64 + tip_size * wing_angle.cos()).round() as i32,
            (tip.1 as f64 + tip_size * wing_angle.sin()).round() as i32,
        );
        draw_thick_line(frame, wing, tip, color);
    }
}

fn draw_thick_line(frame: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    draw_antialiased_line_segment_mut(frame, from, to, color, interpolate);

    // Second pass one pixel across the dominant axis
    let (ox, oy) = if (to.0 - from.0).abs() >= (to.1 - from.1).abs() {
        (0, 1)
    } else {
        (1, 0)
    };
    draw_antialiased_line_segment_mut(
        frame,
        (from.0 + ox, from.1 + oy),
        (to.0 + ox, to.1 + oy),
        color,
        interpolate,
    );
}
