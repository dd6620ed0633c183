//! Linux X11 display enumeration using RandR extension

use crate::capture::DisplayBounds;
use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::randr::{self, ConnectionExt as RandrExt};
use x11rb::rust_connection::RustConnection;

/// Physical displays driven by an active CRTC with a connected output
pub fn list_displays(conn: &RustConnection, screen_num: usize) -> Result<Vec<DisplayBounds>> {
    let screen = &conn.setup().roots[screen_num];
    let root = screen.root;

    let resources = conn
        .randr_get_screen_resources(root)
        .context("Failed to query RandR screen resources")?
        .reply()
        .context("Failed to get RandR screen resources reply")?;

    let mut displays = Vec::new();

    for crtc in &resources.crtcs {
        let crtc_info = conn
            .randr_get_crtc_info(*crtc, resources.config_timestamp)
            .context("Failed to query CRTC info")?
            .reply()
            .context("Failed to get CRTC info reply")?;

        // Skip disabled CRTCs (no outputs connected or zero size)
        if crtc_info.outputs.is_empty() || crtc_info.width == 0 || crtc_info.height == 0 {
            continue;
        }

        let has_connected_output = crtc_info.outputs.iter().any(|output| {
            conn.randr_get_output_info(*output, resources.config_timestamp)
                .ok()
                .and_then(|cookie| cookie.reply().ok())
                .is_some_and(|info| info.connection == randr::Connection::CONNECTED)
        });

        if !has_connected_output {
            continue;
        }

        displays.push(DisplayBounds {
            left: crtc_info.x as i32,
            top: crtc_info.y as i32,
            width: crtc_info.width as u32,
            height: crtc_info.height as u32,
        });
    }

    // If no CRTCs found, fall back to screen dimensions
    if displays.is_empty() {
        displays.push(DisplayBounds {
            left: 0,
            top: 0,
            width: screen.width_in_pixels as u32,
            height: screen.height_in_pixels as u32,
        });
    }

    Ok(displays)
}
