//! Capture pipeline orchestrator
//!
//! A worker thread grabs the configured monitor, draws the cursor arrow,
//! fits the frame to the viewport and publishes it into a latest-wins slot.
//! The UI thread calls [`CapturePipeline::pump`] to present what arrived.

use crate::capture::{CaptureBackend, RawFrame};
use crate::config::PreviewConfig;
use crate::display::{build_monitor_list, DisplayEnumerator, MonitorDescriptor};
use crate::error::{PreviewError, Result};
use crate::handoff::{slot, SlotPublisher, SlotReader};
use crate::overlay::{draw_arrow_overlay, OverlayOutcome};
use crate::pointer::{CursorSample, PointerLocator, PointerPlatform};
use crate::scaler::FrameScaler;
use crate::surface::PreviewSurface;
use crossbeam_channel::{unbounded, Receiver, Sender};
use image::RgbImage;
use log::{debug, info, trace, warn};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    Failed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => write!(f, "stopped by user"),
            StopReason::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopping,
    Stopped(StopReason),
}

/// Cooperative stop signal, polled once per loop iteration
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Viewport size shared with the worker, width in the high half so both
/// dimensions are read together
#[derive(Clone, Default)]
pub struct Viewport(Arc<AtomicU64>);

impl Viewport {
    pub fn set(&self, (width, height): (u32, u32)) {
        self.0
            .store((width as u64) << 32 | height as u64, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u32, u32) {
        let packed = self.0.load(Ordering::Relaxed);
        ((packed >> 32) as u32, packed as u32)
    }
}

/// Frame pacing against monotonic deadlines. A late frame moves the next
/// deadline forward instead of bursting to catch up.
pub struct Pacer {
    interval: Duration,
    next: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    pub fn wait(&mut self) {
        let now = Instant::now();
        match self.next {
            Some(deadline) if deadline > now => {
                thread::sleep(deadline - now);
                self.next = Some(deadline + self.interval);
            }
            _ => self.next = Some(now + self.interval),
        }
    }
}

enum WorkerEvent {
    Failed,
}

struct Session {
    token: CancelToken,
    worker: JoinHandle<StopReason>,
    frames: SlotReader<RgbImage>,
    status: SlotReader<String>,
    events: Receiver<WorkerEvent>,
}

struct Worker<B: CaptureBackend> {
    backend: Arc<B>,
    locator: PointerLocator,
    config: PreviewConfig,
    token: CancelToken,
    viewport: Viewport,
    state: Arc<Mutex<PipelineState>>,
    frames: SlotPublisher<RgbImage>,
    status: SlotPublisher<String>,
    events: Sender<WorkerEvent>,
}

pub struct CapturePipeline<B: CaptureBackend> {
    backend: Arc<B>,
    pointer: Arc<dyn PointerPlatform>,
    viewport: Viewport,
    state: Arc<Mutex<PipelineState>>,
    session: Option<Session>,
    notices: Vec<String>,
}

impl<B: CaptureBackend> CapturePipeline<B> {
    pub fn new(backend: Arc<B>, pointer: Arc<dyn PointerPlatform>) -> Self {
        Self {
            backend,
            pointer,
            viewport: Viewport::default(),
            state: Arc::new(Mutex::new(PipelineState::Idle)),
            session: None,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        lock_state(&self.state).clone()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn monitors(&self) -> Result<Vec<MonitorDescriptor>> {
        DisplayEnumerator::new(self.backend.as_ref()).enumerate()
    }

    /// Validate `config` and spawn the worker. Nothing is spawned when
    /// validation fails.
    pub fn start(&mut self, config: PreviewConfig) -> Result<()> {
        if self.session.is_some() {
            return Err(PreviewError::AlreadyRunning);
        }
        config.validate()?;
        let monitor = config.validate_monitor(&self.monitors()?)?;

        let token = CancelToken::default();
        let (frame_tx, frame_rx) = slot();
        let (status_tx, status_rx) = slot();
        let (event_tx, event_rx) = unbounded();

        let started = format!(
            "Preview started (monitor {}, scale {}, {} FPS).",
            monitor.index, config.scale_factor, config.target_fps
        );

        *lock_state(&self.state) = PipelineState::Running;
        let worker = Worker {
            backend: Arc::clone(&self.backend),
            locator: PointerLocator::new(Arc::clone(&self.pointer)),
            config,
            token: token.clone(),
            viewport: self.viewport.clone(),
            state: Arc::clone(&self.state),
            frames: frame_tx,
            status: status_tx,
            events: event_tx,
        };
        let handle = thread::spawn(move || worker.run());

        info!("{}", started);
        self.notices.push(started);
        self.session = Some(Session {
            token,
            worker: handle,
            frames: frame_rx,
            status: status_rx,
            events: event_rx,
        });
        Ok(())
    }

    /// Request a cooperative stop and wait for the worker to exit
    pub fn stop(&mut self) -> Option<StopReason> {
        let session = self.session.as_ref()?;
        session.token.cancel();
        {
            let mut state = lock_state(&self.state);
            if *state == PipelineState::Running {
                *state = PipelineState::Stopping;
            }
        }
        self.reap()
    }

    /// UI-thread side: present the latest frame, forward status text and
    /// collect a worker that stopped on its own. Returns whether the
    /// pipeline is still running.
    pub fn pump(&mut self, surface: &mut dyn PreviewSurface) -> bool {
        self.viewport.set(surface.viewport());

        let mut failed = false;
        if let Some(session) = &self.session {
            if let Some(frame) = session.frames.take() {
                surface.present(frame);
            }
            if let Some(line) = session.status.take() {
                surface.set_status(&line);
            }
            failed = matches!(session.events.try_recv(), Ok(WorkerEvent::Failed));
        }
        if failed {
            self.reap();
        }

        for notice in self.notices.drain(..) {
            surface.set_status(&notice);
        }
        self.is_running()
    }

    fn reap(&mut self) -> Option<StopReason> {
        let session = self.session.take()?;
        session.token.cancel();

        let reason = session.worker.join().unwrap_or_else(|payload| {
            StopReason::Failed(format!("capture worker panicked: {}", panic_message(payload.as_ref())))
        });

        *lock_state(&self.state) = PipelineState::Stopped(reason.clone());
        let notice = match &reason {
            StopReason::Requested => "Preview stopped.".to_string(),
            StopReason::Failed(why) => format!("Preview ended: {}", why),
        };
        info!("{}", notice);
        self.notices.push(notice);
        Some(reason)
    }
}

impl<B: CaptureBackend> Drop for CapturePipeline<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<B: CaptureBackend> Worker<B> {
    fn run(self) -> StopReason {
        let result = match self.backend.open() {
            Ok(mut handle) => {
                let result = self.capture_loop(&mut handle);
                self.backend.close(handle);
                result
            }
            Err(e) => Err(into_capture_lost(e)),
        };

        match result {
            Ok(()) => {
                info!("Capture worker exited");
                StopReason::Requested
            }
            Err(e) => {
                warn!("Capture worker stopping: {}", e);
                {
                    let mut state = lock_state(&self.state);
                    if *state == PipelineState::Running {
                        *state = PipelineState::Stopping;
                    }
                }
                let _ = self.events.send(WorkerEvent::Failed);
                StopReason::Failed(e.to_string())
            }
        }
    }

    fn capture_loop(&self, handle: &mut B::Handle) -> Result<()> {
        let displays = self.backend.list_displays(handle).map_err(into_capture_lost)?;
        let monitor = build_monitor_list(&displays)
            .into_iter()
            .find(|m| m.index == self.config.monitor_index)
            .ok_or_else(|| {
                PreviewError::CaptureLost(format!(
                    "monitor {} is no longer available",
                    self.config.monitor_index
                ))
            })?;
        info!("Capturing {}", monitor.label());

        let scaler = FrameScaler::new(self.config.scale_factor);
        let mut pacer = Pacer::new(self.config.frame_interval());

        loop {
            pacer.wait();
            if self.token.is_cancelled() {
                return Ok(());
            }

            let raw = self.backend.grab(handle, &monitor).map_err(into_capture_lost)?;

            let (frame, status) = if self.config.show_cursor {
                let (frame, drawn) = with_overlay(&raw, |frame| self.draw_cursor(frame, &monitor));
                let status = match drawn {
                    Ok((sample, outcome)) => debug_line(&sample, &outcome, &monitor, &self.config),
                    Err(e) => {
                        debug!("{}", e);
                        format!("cursor_err:{}", e)
                    }
                };
                (frame, status)
            } else {
                let status = format!(
                    "cursor=off MON:[{},{},{},{}]",
                    monitor.left, monitor.top, monitor.width, monitor.height
                );
                (raw.to_rgb(), status)
            };

            let (width, height) = self.viewport.get();
            let frame = scaler.fit(frame, width, height);

            if self.frames.publish(frame) {
                debug!("Dropped an unpresented frame");
            }
            if self.config.debug {
                self.status.publish(format!("DEBUG: {}", status));
            }
        }
    }

    fn draw_cursor(&self, frame: &mut RgbImage, monitor: &MonitorDescriptor) -> (CursorSample, OverlayOutcome) {
        let sample = self.locator.locate();
        if !sample.is_resolved() {
            debug!("{}", PreviewError::CursorResolutionDegraded);
        }
        let outcome = draw_arrow_overlay(frame, &sample, monitor, &self.config, || {
            self.locator.raw_logical()
        });
        if let Some(segment) = outcome.segment {
            trace!("Arrow {:?} -> {:?}", segment.tail, segment.tip);
        }
        (sample, outcome)
    }
}

/// Convert `raw` and run the best-effort `draw` step on it. A panic inside
/// `draw` is contained, and a fresh conversion of `raw` replaces whatever
/// was drawn before it.
fn with_overlay<T>(raw: &RawFrame, draw: impl FnOnce(&mut RgbImage) -> T) -> (RgbImage, Result<T>) {
    let mut frame = raw.to_rgb();
    match panic::catch_unwind(AssertUnwindSafe(|| draw(&mut frame))) {
        Ok(value) => (frame, Ok(value)),
        Err(payload) => (
            raw.to_rgb(),
            Err(PreviewError::OverlayDrawFailed(panic_message(payload.as_ref()))),
        ),
    }
}

/// Status line published once per frame in debug mode
pub fn debug_line(
    sample: &CursorSample,
    outcome: &OverlayOutcome,
    monitor: &MonitorDescriptor,
    config: &PreviewConfig,
) -> String {
    format!(
        "CUR:{},{} method={}{} MON:[{},{},{},{}] inside={} anchor={} off={}",
        sample.x,
        sample.y,
        sample.method,
        if outcome.fallback_used { "+raw-fallback" } else { "" },
        monitor.left,
        monitor.top,
        monitor.width,
        monitor.height,
        outcome.inside,
        config.anchor_mode,
        config.arrow_offset
    )
}

fn into_capture_lost(err: PreviewError) -> PreviewError {
    match err {
        PreviewError::CaptureLost(_) => err,
        other => PreviewError::CaptureLost(other.to_string()),
    }
}

fn lock_state(state: &Mutex<PipelineState>) -> std::sync::MutexGuard<'_, PipelineState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
