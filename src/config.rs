//! Preview configuration
//!
//! [`PreviewSettings`] is the loose, serializable form read from a config
//! file and CLI flags. It is turned into an immutable [`PreviewConfig`] once,
//! before the pipeline starts.

use crate::display::MonitorDescriptor;
use crate::error::{PreviewError, Result};
use anyhow::Context;
use clap::ValueEnum;
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 1.5;
pub const MAX_FPS: u32 = 240;

/// Shortest arrow drawn before the offset is applied
pub const MIN_ARROW_LENGTH: i32 = 5;

/// Upper bound for the arrow length and the magnitude of its offset
pub const MAX_ARROW_LENGTH: i32 = 16_384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArrowDirection {
    Right,
    Left,
    Up,
    Down,
    DownRight,
    DownLeft,
    UpRight,
    UpLeft,
}

impl ArrowDirection {
    #[cfg(test)]
    pub const ALL: [ArrowDirection; 8] = [
        ArrowDirection::Right,
        ArrowDirection::Left,
        ArrowDirection::Up,
        ArrowDirection::Down,
        ArrowDirection::DownRight,
        ArrowDirection::DownLeft,
        ArrowDirection::UpRight,
        ArrowDirection::UpLeft,
    ];

    /// Screen-space step (y grows downwards)
    pub fn step(self) -> (i32, i32) {
        match self {
            ArrowDirection::Right => (1, 0),
            ArrowDirection::Left => (-1, 0),
            ArrowDirection::Up => (0, -1),
            ArrowDirection::Down => (0, 1),
            ArrowDirection::DownRight => (1, 1),
            ArrowDirection::DownLeft => (-1, 1),
            ArrowDirection::UpRight => (1, -1),
            ArrowDirection::UpLeft => (-1, -1),
        }
    }

    pub fn unit_vector(self) -> (f64, f64) {
        let (vx, vy) = self.step();
        let (vx, vy) = (vx as f64, vy as f64);
        let len = (vx * vx + vy * vy).sqrt();
        (vx / len, vy / len)
    }
}

/// Which end of the arrow is pinned to the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorMode {
    /// Tail on the cursor, tip pointing away
    TipOut,
    /// Tip on the cursor, arrow pointing into it
    BaseIn,
}

impl fmt::Display for AnchorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorMode::TipOut => write!(f, "tip-out"),
            AnchorMode::BaseIn => write!(f, "base-in"),
        }
    }
}

/// Parse `#RRGGBB` (leading `#` optional)
pub fn parse_hex_color(input: &str) -> Result<Rgb<u8>> {
    let hex = input.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PreviewError::InvalidConfig(format!(
            "color must be #RRGGBB, got {:?}",
            input
        )));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
    Ok(Rgb([channel(0), channel(2), channel(4)]))
}

pub fn format_hex_color(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Validated settings captured when the pipeline starts
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    pub monitor_index: usize,
    pub scale_factor: f64,
    pub target_fps: u32,
    pub show_cursor: bool,
    pub debug: bool,
    pub arrow_length: i32,
    pub arrow_direction: ArrowDirection,
    pub arrow_color: Rgb<u8>,
    pub anchor_mode: AnchorMode,
    pub arrow_offset: i32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            monitor_index: 1,
            scale_factor: 0.5,
            target_fps: 30,
            show_cursor: true,
            debug: false,
            arrow_length: 24,
            arrow_direction: ArrowDirection::Right,
            arrow_color: Rgb([255, 0, 0]),
            anchor_mode: AnchorMode::BaseIn,
            arrow_offset: 0,
        }
    }
}

impl PreviewConfig {
    /// Range checks that do not need the display list
    pub fn validate(&self) -> Result<()> {
        if !self.scale_factor.is_finite()
            || self.scale_factor < MIN_SCALE
            || self.scale_factor > MAX_SCALE
        {
            return Err(PreviewError::InvalidConfig(format!(
                "scale must be between {} and {}, got {}",
                MIN_SCALE, MAX_SCALE, self.scale_factor
            )));
        }
        if self.target_fps < 1 || self.target_fps > MAX_FPS {
            return Err(PreviewError::InvalidConfig(format!(
                "fps must be between 1 and {}, got {}",
                MAX_FPS, self.target_fps
            )));
        }
        if self.arrow_length > MAX_ARROW_LENGTH {
            return Err(PreviewError::InvalidConfig(format!(
                "arrow length must be at most {}, got {}",
                MAX_ARROW_LENGTH, self.arrow_length
            )));
        }
        if !(-MAX_ARROW_LENGTH..=MAX_ARROW_LENGTH).contains(&self.arrow_offset) {
            return Err(PreviewError::InvalidConfig(format!(
                "arrow offset must be between -{} and {}, got {}",
                MAX_ARROW_LENGTH, MAX_ARROW_LENGTH, self.arrow_offset
            )));
        }
        Ok(())
    }

    /// Check the monitor index against a fresh enumeration
    pub fn validate_monitor(&self, monitors: &[MonitorDescriptor]) -> Result<MonitorDescriptor> {
        monitors
            .iter()
            .find(|m| m.index == self.monitor_index)
            .copied()
            .ok_or_else(|| {
                PreviewError::InvalidConfig(format!(
                    "monitor {} does not exist ({} available)",
                    self.monitor_index,
                    monitors.len()
                ))
            })
    }

    /// `max(5, arrow_length) + arrow_offset`, saturating at the `i32` range
    pub fn total_arrow_length(&self) -> i32 {
        self.arrow_length
            .max(MIN_ARROW_LENGTH)
            .saturating_add(self.arrow_offset)
    }

    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64)
    }
}

/// Serializable settings, as stored in a config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// `None` picks the first physical display
    pub monitor: Option<usize>,
    pub scale: f64,
    pub fps: u32,
    pub show_cursor: bool,
    pub debug: bool,
    pub arrow_length: i32,
    pub arrow_direction: ArrowDirection,
    pub arrow_color: String,
    pub anchor: AnchorMode,
    pub arrow_offset: i32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        let defaults = PreviewConfig::default();
        Self {
            monitor: None,
            scale: defaults.scale_factor,
            fps: defaults.target_fps,
            show_cursor: defaults.show_cursor,
            debug: defaults.debug,
            arrow_length: defaults.arrow_length,
            arrow_direction: defaults.arrow_direction,
            arrow_color: format_hex_color(defaults.arrow_color),
            anchor: defaults.anchor_mode,
            arrow_offset: defaults.arrow_offset,
        }
    }
}

impl PreviewSettings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let settings: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write config to {:?}", path))?;
        Ok(())
    }

    /// Resolve into a [`PreviewConfig`]. The monitor defaults to display 1,
    /// or to the union when it is the only entry.
    pub fn resolve(&self, monitors: &[MonitorDescriptor]) -> Result<PreviewConfig> {
        let monitor_index = self
            .monitor
            .unwrap_or(if monitors.len() > 1 { 1 } else { 0 });

        let config = PreviewConfig {
            monitor_index,
            scale_factor: self.scale,
            target_fps: self.fps,
            show_cursor: self.show_cursor,
            debug: self.debug,
            arrow_length: self.arrow_length,
            arrow_direction: self.arrow_direction,
            arrow_color: parse_hex_color(&self.arrow_color)?,
            anchor_mode: self.anchor,
            arrow_offset: self.arrow_offset,
        };
        config.validate()?;
        Ok(config)
    }
}
