//! Linux X11 screen capture using core `GetImage` on the root window

use crate::capture::{CaptureBackend, DisplayBounds, RawFrame};
use crate::display::MonitorDescriptor;
use crate::error::{PreviewError, Result};
use anyhow::Context;
use log::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt, ImageFormat, ImageOrder, Window};
use x11rb::rust_connection::RustConnection;

/// Open X11 connection owned by whoever holds it
pub struct X11Handle {
    conn: RustConnection,
    screen_num: usize,
    root: Window,
}

/// Capture backend for the X server named by `$DISPLAY`
#[derive(Default)]
pub struct X11Capture;

impl X11Capture {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for X11Capture {
    type Handle = X11Handle;

    fn open(&self) -> Result<X11Handle> {
        let (conn, screen_num) = RustConnection::connect(None)
            .context("Failed to connect to X11 display")
            .map_err(|e| PreviewError::EnumerationFailed(format!("{:#}", e)))?;
        let root = conn.setup().roots[screen_num].root;
        debug!("Connected to X11 screen {}", screen_num);

        Ok(X11Handle {
            conn,
            screen_num,
            root,
        })
    }

    fn list_displays(&self, handle: &X11Handle) -> Result<Vec<DisplayBounds>> {
        crate::linux::display::list_displays(&handle.conn, handle.screen_num)
            .map_err(|e| PreviewError::EnumerationFailed(format!("{:#}", e)))
    }

    fn grab(&self, handle: &mut X11Handle, rect: &MonitorDescriptor) -> Result<RawFrame> {
        grab_region(handle, rect).map_err(into_capture_lost)
    }

    fn close(&self, handle: X11Handle) {
        debug!("Closing X11 capture connection");
        drop(handle);
    }
}

/// Errors that already are [`PreviewError`]s pass through unchanged
fn into_capture_lost(err: anyhow::Error) -> PreviewError {
    match err.downcast::<PreviewError>() {
        Ok(err) => err,
        Err(err) => PreviewError::CaptureLost(format!("{:#}", err)),
    }
}

fn grab_region(handle: &X11Handle, rect: &MonitorDescriptor) -> anyhow::Result<RawFrame> {
    let conn = &handle.conn;
    let image = conn
        .get_image(
            ImageFormat::Z_PIXMAP,
            handle.root,
            rect.left as i16,
            rect.top as i16,
            rect.width as u16,
            rect.height as u16,
            u32::MAX,
        )
        .context("Failed to request screen image")?
        .reply()
        .with_context(|| format!("Failed to capture {}", rect.label()))?;

    let bits_per_pixel = conn
        .setup()
        .pixmap_formats
        .iter()
        .find(|f| f.depth == image.depth)
        .map(|f| f.bits_per_pixel)
        .unwrap_or(0);
    if bits_per_pixel != 32 {
        anyhow::bail!(
            "Unsupported pixel format: depth {} at {} bits per pixel",
            image.depth,
            bits_per_pixel
        );
    }

    let mut data = image.data;
    if conn.setup().image_byte_order == ImageOrder::MSB_FIRST {
        // ARGB in memory, flip to BGRA
        for px in data.chunks_exact_mut(4) {
            px.reverse();
        }
    }

    let stride = data.len() / rect.height.max(1) as usize;
    RawFrame::new(data, rect.width, rect.height, stride).map_err(anyhow::Error::from)
}
