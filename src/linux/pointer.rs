//! Linux X11 pointer position and DPI queries

use crate::pointer::PointerPlatform;
use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

/// Reference DPI that maps to a scale of 1.0
const BASE_DPI: f64 = 96.0;

/// X11 reports pointer coordinates in device pixels, so `QueryPointer`
/// answers the physical query directly. There is no logical coordinate
/// space and no per-monitor DPI; the system scale comes from `Xft.dpi`.
pub struct X11Pointer {
    conn: RustConnection,
    root: Window,
    system_scale: Option<f64>,
}

impl X11Pointer {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) =
            RustConnection::connect(None).context("Failed to connect to X11 display")?;
        let root = conn.setup().roots[screen_num].root;
        let system_scale = read_resource_manager(&conn, root)
            .ok()
            .flatten()
            .and_then(|db| parse_xft_dpi(&db))
            .map(|dpi| dpi / BASE_DPI);

        Ok(Self {
            conn,
            root,
            system_scale,
        })
    }
}

impl PointerPlatform for X11Pointer {
    fn physical_position(&self) -> Option<(i32, i32)> {
        let reply = self.conn.query_pointer(self.root).ok()?.reply().ok()?;
        // Pointer is on another screen of this display
        if !reply.same_screen {
            return None;
        }
        Some((reply.root_x as i32, reply.root_y as i32))
    }

    fn logical_position(&self) -> Option<(i32, i32)> {
        None
    }

    fn monitor_scale(&self, _x: i32, _y: i32) -> Option<f64> {
        None
    }

    fn system_scale(&self) -> Option<f64> {
        self.system_scale
    }
}

/// Contents of the root window's RESOURCE_MANAGER property
fn read_resource_manager(conn: &RustConnection, root: Window) -> Result<Option<String>> {
    let reply = conn
        .get_property(false, root, AtomEnum::RESOURCE_MANAGER, AtomEnum::STRING, 0, u32::MAX)
        .context("Failed to get property")?
        .reply()
        .context("Failed to get property reply")?;

    if reply.value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
    }
}

/// Find `Xft.dpi` in an X resource database dump
pub fn parse_xft_dpi(resources: &str) -> Option<f64> {
    resources
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "Xft.dpi")
        .and_then(|(_, value)| value.trim().parse::<f64>().ok())
        .filter(|dpi| *dpi > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xft_dpi() {
        let db = "Xcursor.size:\t24\nXft.antialias:\t1\nXft.dpi:\t144\nXft.hinting:\t1\n";
        assert_eq!(parse_xft_dpi(db), Some(144.0));
        assert_eq!(parse_xft_dpi(db).map(|d| d / BASE_DPI), Some(1.5));
    }

    #[test]
    fn test_parse_xft_dpi_missing_or_bad() {
        assert_eq!(parse_xft_dpi("Xcursor.size:\t24\n"), None);
        assert_eq!(parse_xft_dpi("Xft.dpi:\tlots\n"), None);
        assert_eq!(parse_xft_dpi("Xft.dpi: 0\n"), None);
        assert_eq!(parse_xft_dpi(""), None);
    }
}
