//! Capture loop: drives the per-tick pipeline from a frame source.
//!
//! The loop is a state machine run as a tokio task:
//!
//! ```text
//! Idle -> Requesting -> Active -> Idle
//!             |
//!             +-> Error -> Idle
//! ```
//!
//! Each tick pulls one frame, awaits the landmark source, then renders.
//! The landmark await is the only suspension point inside a tick, and the
//! next frame is not requested until the current tick has finished. A
//! generation counter is bumped by [`CaptureLoop::stop`]. It is checked once
//! a frame arrives, so no new inference starts after stop, and again under
//! the state lock right before rendering, so an inference result that
//! arrives after stop is dropped instead of drawn. Every session counts into
//! its own [`LoopStats`].

use crate::{
    assets::GarmentAssets,
    config::Config,
    frame::FrameSource,
    landmarks::{LandmarkSource, PoseFrame},
    pipeline::{Pipeline, TickSettings},
    render::SharedSurface,
    Error, Result,
};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::{
    fmt,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::{sync::watch, task::JoinHandle};

/// Consecutive frame read failures tolerated before the session ends
const MAX_CONSECUTIVE_FRAME_ERRORS: u32 = 30;

/// Capture loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not running
    Idle,
    /// Waiting for the frame source to open
    Requesting,
    /// Processing frames
    Active,
    /// Opening the frame source failed
    Error,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Idle => "idle",
            LoopState::Requesting => "requesting",
            LoopState::Active => "active",
            LoopState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Counters updated by the running loop
#[derive(Debug, Default)]
pub struct LoopStats {
    ticks: AtomicU64,
    overlays: AtomicU64,
    skipped: AtomicU64,
    discarded: AtomicU64,
}

/// Point-in-time copy of [`LoopStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames rendered, with or without a garment
    pub ticks: u64,
    /// Frames with the garment drawn
    pub overlays: u64,
    /// Frames drawn as background only
    pub skipped: u64,
    /// Inference results dropped after stop
    pub discarded: u64,
}

impl LoopStats {
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            overlays: self.overlays.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks, {} overlays, {} skipped, {} discarded",
            self.ticks, self.overlays, self.skipped, self.discarded
        )
    }
}

/// Handle owning the capture session
pub struct CaptureLoop {
    config: Config,
    surface: SharedSurface,
    state: Arc<Mutex<LoopState>>,
    generation: Arc<AtomicU64>,
    /// Counters of the latest session; each session owns its own
    stats: Mutex<Arc<LoopStats>>,
    task: Mutex<Option<JoinHandle<()>>>,
    last_error: Mutex<Option<String>>,
    frame_output: Option<PathBuf>,
}

impl CaptureLoop {
    /// Create an idle loop rendering into `surface`
    #[must_use]
    pub fn new(config: Config, surface: SharedSurface) -> Self {
        Self {
            config,
            surface,
            state: Arc::new(Mutex::new(LoopState::Idle)),
            generation: Arc::new(AtomicU64::new(0)),
            stats: Mutex::new(Arc::new(LoopStats::default())),
            task: Mutex::new(None),
            last_error: Mutex::new(None),
            frame_output: None,
        }
    }

    /// Also write every rendered frame as `frame_NNNNN.png` into `directory`
    #[must_use]
    pub fn with_frame_output<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.frame_output = Some(directory.into());
        self
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        *self.state.lock()
    }

    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.lock().snapshot()
    }

    #[must_use]
    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    /// Message of the last failed start, if any
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Open `frames` and start processing.
    ///
    /// Returns once the loop is Active, or once a concurrent [`stop`] has
    /// cancelled the request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when the loop is not idle, or the frame
    /// source's error when it cannot be opened. In the latter case the loop
    /// passes through `Error` back to `Idle`.
    ///
    /// [`stop`]: CaptureLoop::stop
    pub async fn start<C, L>(
        &self,
        mut frames: C,
        mut landmarks: L,
        assets: Arc<GarmentAssets>,
        settings: watch::Receiver<TickSettings>,
    ) -> Result<()>
    where
        C: FrameSource + 'static,
        L: LandmarkSource + 'static,
    {
        let token = {
            let mut state = self.state.lock();
            if *state != LoopState::Idle {
                return Err(Error::InvalidState(format!("Cannot start while {}", *state)));
            }
            *state = LoopState::Requesting;
            self.generation.load(Ordering::SeqCst)
        };
        *self.last_error.lock() = None;
        info!("Requesting frame source");

        if let Err(e) = frames.open().await {
            let mut state = self.state.lock();
            if self.generation.load(Ordering::SeqCst) == token {
                *state = LoopState::Error;
                error!("Failed to open frame source: {}", e);
                *self.last_error.lock() = Some(e.to_string());
                *state = LoopState::Idle;
            }
            return Err(e);
        }

        {
            let mut state = self.state.lock();
            if self.generation.load(Ordering::SeqCst) != token {
                info!("Stopped while requesting, not starting");
                return Ok(());
            }
            *state = LoopState::Active;
        }

        let stats = Arc::new(LoopStats::default());
        *self.stats.lock() = Arc::clone(&stats);
        landmarks.configure(&self.config.pose);
        self.surface.attach();
        info!("Capture loop active ({} garment views loaded)", assets.len());
        for view in assets.missing() {
            warn!("No {} asset, that view will draw background only", view);
        }

        let session = Session {
            token,
            generation: Arc::clone(&self.generation),
            state: Arc::clone(&self.state),
            stats,
            surface: self.surface.clone(),
            pipeline: Pipeline::new(&self.config),
            assets,
            settings,
            frame_output: self.frame_output.clone(),
        };
        let handle = tokio::spawn(session.run(frames, landmarks));
        *self.task.lock() = Some(handle);
        Ok(())
    }

    /// Stop the session.
    ///
    /// No new frames are requested. An inference already in flight is
    /// allowed to finish, but its result is never rendered.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if *state == LoopState::Idle {
            return;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        info!("Stopping capture loop (was {})", *state);
        *state = LoopState::Idle;
    }

    /// Wait for the loop task to exit
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the task panicked.
    pub async fn wait(&self) -> Result<()> {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| Error::InvalidState(format!("Capture task failed: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State moved into the spawned loop task
struct Session {
    token: u64,
    generation: Arc<AtomicU64>,
    state: Arc<Mutex<LoopState>>,
    stats: Arc<LoopStats>,
    surface: SharedSurface,
    pipeline: Pipeline,
    assets: Arc<GarmentAssets>,
    settings: watch::Receiver<TickSettings>,
    frame_output: Option<PathBuf>,
}

impl Session {
    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.token
    }

    /// Encode the current surface off the async workers
    async fn write_frame(surface: &SharedSurface, path: PathBuf) {
        let Some(image) = surface.snapshot() else {
            return;
        };
        let result = tokio::task::spawn_blocking(move || image.save(&path).map_err(|e| (path, e))).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err((path, e))) => warn!("Failed to write {}: {}", path.display(), e),
            Err(e) => warn!("Frame write task failed: {}", e),
        }
    }

    async fn run<C: FrameSource, L: LandmarkSource>(mut self, mut frames: C, mut landmarks: L) {
        let mut frame_errors = 0u32;
        let mut ticks_since_report = 0u32;
        let mut last_report = Instant::now();

        while self.is_current() {
            let frame = match frames.next_frame().await {
                Ok(Some(frame)) => {
                    frame_errors = 0;
                    frame
                }
                Ok(None) => {
                    info!("End of stream reached");
                    break;
                }
                Err(e) => {
                    frame_errors += 1;
                    if frame_errors >= MAX_CONSECUTIVE_FRAME_ERRORS {
                        error!("Frame source failed {} times in a row, ending session: {}", frame_errors, e);
                        break;
                    }
                    warn!("Failed to read frame, retrying: {}", e);
                    tokio::task::yield_now().await;
                    continue;
                }
            };

            // A frame that arrives after stop never reaches the landmark source
            if !self.is_current() {
                debug!("Dropping frame {} read after stop", frame.sequence);
                break;
            }

            let settings = *self.settings.borrow();

            let pose = match landmarks.estimate(&frame).await {
                Ok(pose) => pose,
                Err(e) => {
                    warn!("Landmark estimation failed for frame {}: {}", frame.sequence, e);
                    PoseFrame::empty(frame.width(), frame.height())
                }
            };

            // Liveness check and render under the state lock so stop() cannot interleave
            let outcome = {
                let _state = self.state.lock();
                if !self.is_current() {
                    self.stats.discarded.fetch_add(1, Ordering::Relaxed);
                    debug!("Discarding result for frame {} after stop", frame.sequence);
                    break;
                }
                self.pipeline
                    .composite(&self.surface, &frame, &pose, &self.assets, &settings)
            };

            if outcome.rendered {
                self.stats.ticks.fetch_add(1, Ordering::Relaxed);
                if outcome.garment_drawn() {
                    self.stats.overlays.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                }
            }
            if let (true, Some(directory)) = (outcome.rendered, &self.frame_output) {
                let path = directory.join(format!("frame_{:05}.png", frame.sequence));
                Self::write_frame(&self.surface, path).await;
            }
            debug!(
                "Frame {}: view {:?}, drawn {}",
                frame.sequence,
                outcome.view,
                outcome.garment_drawn()
            );

            ticks_since_report += 1;
            if last_report.elapsed() >= Duration::from_secs(1) {
                let fps = f64::from(ticks_since_report) / last_report.elapsed().as_secs_f64();
                debug!("Capture loop running at {:.1} FPS", fps);
                ticks_since_report = 0;
                last_report = Instant::now();
            }
        }

        // Natural end of stream returns to Idle; after stop() the state is already Idle
        {
            let mut state = self.state.lock();
            if self.is_current() {
                *state = LoopState::Idle;
            }
        }
        info!("Capture loop finished: {}", self.stats.snapshot());
    }
}
