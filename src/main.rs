mod capture;
mod cli;
mod config;
mod display;
mod error;
#[cfg(test)]
mod fakes;
mod handoff;
#[cfg(target_os = "linux")]
mod linux;
mod overlay;
mod pipeline;
mod pointer;
mod scaler;
mod surface;

use anyhow::{Context, Result};
use capture::CaptureBackend;
use clap::Parser;
use cli::{Cli, Commands, ListTarget, PreviewArgs};
use config::PreviewSettings;
use display::DisplayEnumerator;
use pipeline::{CapturePipeline, PipelineState, StopReason};
use pointer::PointerPlatform;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use surface::TerminalSurface;

/// How long the UI loop idles between pumps
const PUMP_INTERVAL: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

#[cfg(target_os = "linux")]
fn run(cli: Cli) -> Result<()> {
    let backend = linux::X11Capture::new();
    match cli.command {
        Commands::List { target } => {
            init_logging(false);
            match target {
                ListTarget::Displays => list_displays(&backend)?,
            }
        }
        Commands::Preview(args) => {
            let settings = args.settings()?;
            init_logging(settings.debug);
            let pointer = linux::X11Pointer::connect()?;
            run_preview(backend, Arc::new(pointer), &args, settings)?;
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn run(_cli: Cli) -> Result<()> {
    init_logging(false);
    anyhow::bail!("No capture backend for this platform; monpeek requires X11")
}

fn init_logging(debug: bool) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(debug)))
        .format_timestamp(None)
        .init();
}

/// Default filter when `RUST_LOG` is unset
fn log_filter(debug: bool) -> &'static str {
    if debug {
        "info,monpeek=debug"
    } else {
        "info"
    }
}

fn list_displays<B: CaptureBackend>(backend: &B) -> Result<()> {
    let monitors = DisplayEnumerator::new(backend).enumerate()?;
    if monitors.is_empty() {
        println!("No displays found.");
    } else {
        println!("Available displays:");
        for monitor in monitors {
            println!("  {}", monitor.label());
        }
    }
    Ok(())
}

fn run_preview<B: CaptureBackend>(
    backend: B,
    pointer: Arc<dyn PointerPlatform>,
    args: &PreviewArgs,
    settings: PreviewSettings,
) -> Result<()> {
    if let Some(path) = &args.save_config {
        settings.save(path)?;
        println!("Saved settings to {}", path.display());
    }

    let mut pipeline = CapturePipeline::new(Arc::new(backend), pointer);
    let monitors = pipeline.monitors()?;
    let config = settings.resolve(&monitors)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    if let Some(monitor) = monitors.iter().find(|m| m.index == config.monitor_index) {
        println!("Previewing {}", monitor.label());
    }
    println!("Press Ctrl+C to stop...\n");

    let mut surface = TerminalSurface::new(args.viewport);
    pipeline.start(config).context("Failed to start preview")?;

    while running.load(Ordering::SeqCst) {
        if !pipeline.pump(&mut surface) {
            break;
        }
        std::thread::sleep(PUMP_INTERVAL);
    }

    pipeline.stop();
    pipeline.pump(&mut surface);
    surface.finish();

    println!("{} frames presented", surface.presented());
    match pipeline.state() {
        PipelineState::Stopped(StopReason::Failed(reason)) => {
            anyhow::bail!("Preview ended: {}", reason)
        }
        _ => println!("Preview stopped."),
    }
    Ok(())
}
