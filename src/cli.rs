use crate::config::{AnchorMode, ArrowDirection, PreviewSettings};
use crate::display::parse_monitor_label;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "monpeek")]
#[command(about = "Live monitor preview with a directional cursor indicator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available capture surfaces
    List {
        #[arg(value_enum)]
        target: ListTarget,
    },

    /// Mirror a display into the preview surface
    Preview(PreviewArgs),
}

#[derive(Clone, ValueEnum)]
pub enum ListTarget {
    /// List the virtual desktop and each physical display
    Displays,
}

#[derive(Args)]
pub struct PreviewArgs {
    /// Display index or a label from `list displays` (0 = all displays)
    #[arg(short, long, value_parser = parse_monitor)]
    pub monitor: Option<usize>,

    /// Output scale relative to the captured frame (0.1 - 1.5)
    #[arg(long)]
    pub scale: Option<f64>,

    /// Target frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Do not draw the cursor arrow
    #[arg(long)]
    pub no_cursor: bool,

    /// Show per-frame cursor diagnostics in the status line
    #[arg(long)]
    pub debug: bool,

    /// Arrow length in pixels (at least 5)
    #[arg(long)]
    pub arrow_length: Option<i32>,

    #[arg(long, value_enum)]
    pub arrow_direction: Option<ArrowDirection>,

    /// Arrow color as #RRGGBB
    #[arg(long)]
    pub arrow_color: Option<String>,

    /// Which end of the arrow sits on the cursor
    #[arg(long, value_enum)]
    pub anchor: Option<AnchorMode>,

    /// Added to the arrow length, may be negative
    #[arg(long, allow_hyphen_values = true)]
    pub arrow_offset: Option<i32>,

    /// Preview surface size as WIDTHxHEIGHT
    #[arg(long, default_value = "960x540", value_parser = parse_viewport)]
    pub viewport: (u32, u32),

    /// Load settings from a JSON file; flags given here take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective settings to a JSON file before starting
    #[arg(long)]
    pub save_config: Option<PathBuf>,
}

impl PreviewArgs {
    /// Settings from `--config` (or the defaults) with the flags layered on top
    pub fn settings(&self) -> anyhow::Result<PreviewSettings> {
        let base = match &self.config {
            Some(path) => PreviewSettings::load(path)?,
            None => PreviewSettings::default(),
        };
        Ok(self.apply_to(base))
    }

    /// Layer explicit flags over `base`
    pub fn apply_to(&self, base: PreviewSettings) -> PreviewSettings {
        let mut settings = base;
        if self.monitor.is_some() {
            settings.monitor = self.monitor;
        }
        if let Some(scale) = self.scale {
            settings.scale = scale;
        }
        if let Some(fps) = self.fps {
            settings.fps = fps;
        }
        if self.no_cursor {
            settings.show_cursor = false;
        }
        if self.debug {
            settings.debug = true;
        }
        if let Some(length) = self.arrow_length {
            settings.arrow_length = length;
        }
        if let Some(direction) = self.arrow_direction {
            settings.arrow_direction = direction;
        }
        if let Some(color) = &self.arrow_color {
            settings.arrow_color = color.clone();
        }
        if let Some(anchor) = self.anchor {
            settings.anchor = anchor;
        }
        if let Some(offset) = self.arrow_offset {
            settings.arrow_offset = offset;
        }
        settings
    }
}

fn parse_monitor(input: &str) -> Result<usize, String> {
    Ok(parse_monitor_label(input))
}

fn parse_viewport(input: &str) -> Result<(u32, u32), String> {
    let (w, h) = input
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", input))?;
    let w = w.trim().parse().map_err(|_| format!("bad width {:?}", w))?;
    let h = h.trim().parse().map_err(|_| format!("bad height {:?}", h))?;
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> PreviewArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Preview(args) => args,
            _ => panic!("expected preview"),
        }
    }

    #[test]
    fn test_viewport_parser() {
        assert_eq!(parse_viewport("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_viewport("640X480"), Ok((640, 480)));
        assert!(parse_viewport("640").is_err());
        assert!(parse_viewport("ax480").is_err());
    }

    #[test]
    fn test_preview_flags() {
        let args = parse(&[
            "monpeek",
            "preview",
            "--monitor",
            "2",
            "--arrow-direction",
            "up-left",
            "--anchor",
            "tip-out",
            "--arrow-offset",
            "-12",
            "--no-cursor",
        ]);

        assert_eq!(args.monitor, Some(2));
        assert_eq!(args.arrow_direction, Some(ArrowDirection::UpLeft));
        assert_eq!(args.anchor, Some(AnchorMode::TipOut));
        assert_eq!(args.arrow_offset, Some(-12));
        assert_eq!(args.viewport, (960, 540));

        let settings = args.apply_to(PreviewSettings::default());
        assert!(!settings.show_cursor);
        assert_eq!(settings.monitor, Some(2));
        assert_eq!(settings.arrow_offset, -12);
        assert_eq!(settings.fps, 30);
    }

    #[test]
    fn test_flags_override_file_settings() {
        let base = PreviewSettings {
            fps: 60,
            scale: 0.8,
            arrow_color: "#00FF00".to_string(),
            ..Default::default()
        };
        let args = parse(&["monpeek", "preview", "--fps", "15"]);
        let settings = args.apply_to(base);

        assert_eq!(settings.fps, 15);
        assert_eq!(settings.scale, 0.8);
        assert_eq!(settings.arrow_color, "#00FF00");
    }

    #[test]
    fn test_settings_read_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.json");
        std::fs::write(&path, r#"{"debug": true, "fps": 12}"#).unwrap();

        let path = path.to_string_lossy().into_owned();
        let settings = parse(&["monpeek", "preview", "--config", &path, "--fps", "20"])
            .settings()
            .unwrap();

        assert!(settings.debug);
        assert_eq!(settings.fps, 20);
        assert_eq!(settings.arrow_length, 24);
    }

    #[test]
    fn test_monitor_accepts_label() {
        let args = parse(&["monpeek", "preview", "-m", "[2] Monitor 2  2560x1440 @(1920,0)"]);
        assert_eq!(args.monitor, Some(2));
    }

    #[test]
    fn test_list_displays() {
        let cli = Cli::try_parse_from(["monpeek", "list", "displays"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                target: ListTarget::Displays
            }
        ));
    }
}
