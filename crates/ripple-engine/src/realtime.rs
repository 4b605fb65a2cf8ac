//! Realtime frame clock: a background tick thread steps the engine at a
//! fixed rate.
//!
//! ```text
//! User / UI threads             Tick thread                 Frame consumer
//!     |                             |                             |
//!     |--submit_touch()------------>| inbox.drain_into(engine)    |
//!     |   [touch_tx: bounded(N)]    | engine.step()               |
//!     |--attach_source()/set_*()--->| frames_tx.send(frame) ----->| frames().recv()
//!     |   [control_tx: bounded(64)] | park_timeout(budget - dt)   |
//! ```
//!
//! Shutdown sets a flag, unparks the tick thread, joins it once any
//! in-flight step completes, and disposes the recovered engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use ripple_core::{PixelBuffer, SourceImageSupplier, Touch};
use ripple_touch::TouchSource;

use crate::config::{ConfigError, RippleConfig};
use crate::engine::RippleEngine;
use crate::ingress::{submit_to, SubmitError, TouchInbox};
use crate::metrics::StepMetrics;
use crate::tick_thread::{Control, TickStats, TickThreadState};

/// One rendered frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Zero-based frame number; consecutive frames differ by one.
    pub index: u64,
    /// The rendered pixels.
    pub image: PixelBuffer,
}

/// Report from [`RealtimeRipple::shutdown`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Whether the tick thread was joined successfully.
    pub tick_joined: bool,
    /// Frames produced over the clock's lifetime.
    pub frames_produced: u64,
    /// Whether the recovered engine was disposed (false if it was never
    /// sized or the tick thread panicked).
    pub engine_disposed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownState {
    Running,
    Dropped,
}

/// Ripple clock driven by a background tick thread.
pub struct RealtimeRipple {
    touch_tx: Option<Sender<Touch>>,
    control_tx: Option<Sender<Control>>,
    frames_rx: Receiver<Frame>,
    shutdown_flag: Arc<AtomicBool>,
    stats: Arc<TickStats>,
    tick_thread: Option<JoinHandle<RippleEngine>>,
    state: ShutdownState,
    tick_rate_hz: f64,
}

impl RealtimeRipple {
    /// Build the engine and spawn the tick thread.
    pub fn new(
        config: RippleConfig,
        supplier: impl SourceImageSupplier + 'static,
    ) -> Result<Self, ConfigError> {
        let engine = RippleEngine::new(&config, supplier)?;
        let tick_rate_hz = config.tick_rate_hz;
        let tick_budget = config.tick_budget()?;

        let inbox = TouchInbox::new(config.touch_queue_capacity);
        let touch_tx = inbox.sender();
        let (control_tx, control_rx) = crossbeam_channel::bounded(64);
        let (frames_tx, frames_rx) = crossbeam_channel::unbounded();
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(TickStats::default());

        let tick_shutdown = Arc::clone(&shutdown_flag);
        let tick_stats = Arc::clone(&stats);
        let tick_thread = thread::Builder::new()
            .name("ripple-tick".into())
            .spawn(move || {
                TickThreadState::new(
                    engine,
                    inbox,
                    control_rx,
                    frames_tx,
                    tick_shutdown,
                    tick_stats,
                    tick_budget,
                )
                .run()
            })
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("tick thread: {e}"),
            })?;
        log::info!("realtime ripple started at {tick_rate_hz} Hz");

        Ok(Self {
            touch_tx: Some(touch_tx),
            control_tx: Some(control_tx),
            frames_rx,
            shutdown_flag,
            stats,
            tick_thread: Some(tick_thread),
            state: ShutdownState::Running,
            tick_rate_hz,
        })
    }

    /// Queue a touch for the next tick. Non-blocking.
    pub fn submit_touch(&self, touch: Touch) -> Result<(), SubmitError> {
        let tx = self.touch_tx.as_ref().ok_or(SubmitError::Shutdown)?;
        submit_to(tx, touch)
    }

    /// A sender feeding the touch queue.
    pub fn touch_sender(&self) -> Result<Sender<Touch>, SubmitError> {
        self.touch_tx.clone().ok_or(SubmitError::Shutdown)
    }

    /// Drain `source`'s stream on every tick. The source learns the image
    /// size as soon as the engine has one.
    pub fn attach_source(&self, source: Arc<dyn TouchSource>) -> Result<(), SubmitError> {
        let rx = source.touches()?;
        self.send_control(Control::Attach { source, rx })
    }

    /// Enable or disable touch application from the next tick.
    pub fn set_active(&self, active: bool) -> Result<(), SubmitError> {
        self.send_control(Control::SetActive(active))
    }

    /// Toggle the barrier at `index`. Blocks until the tick thread has
    /// applied it (at most one tick).
    pub fn set_barrier_active(&self, index: usize, active: bool) -> Result<(), SubmitError> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.send_control(Control::SetBarrierActive {
            index,
            active,
            reply: reply_tx,
        })?;
        reply_rx.recv().map_err(|_| SubmitError::Shutdown)??;
        Ok(())
    }

    /// Receiver for rendered frames, in order, one per step.
    pub fn frames(&self) -> Receiver<Frame> {
        self.frames_rx.clone()
    }

    /// Metrics from the most recent step.
    pub fn last_metrics(&self) -> StepMetrics {
        self.stats
            .metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Frames produced so far.
    pub fn frame_count(&self) -> u64 {
        self.stats.frames.load(Ordering::Acquire)
    }

    /// Configured tick rate.
    pub fn tick_rate_hz(&self) -> f64 {
        self.tick_rate_hz
    }

    /// Whether the tick thread is still running.
    pub fn is_running(&self) -> bool {
        self.state == ShutdownState::Running
    }

    /// Stop the tick thread, join it, and dispose the engine.
    ///
    /// Idempotent: later calls return an empty report.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.state == ShutdownState::Dropped {
            return ShutdownReport {
                total_ms: 0,
                tick_joined: true,
                frames_produced: self.frame_count(),
                engine_disposed: false,
            };
        }
        let start = Instant::now();
        self.state = ShutdownState::Dropped;
        self.shutdown_flag.store(true, Ordering::Release);

        // Wake the tick thread if it is parked in a budget sleep.
        if let Some(handle) = &self.tick_thread {
            handle.thread().unpark();
        }
        self.touch_tx.take();
        self.control_tx.take();

        let (tick_joined, engine_disposed) = match self.tick_thread.take() {
            Some(handle) => match handle.join() {
                Ok(mut engine) => match engine.dispose() {
                    Ok(()) => (true, true),
                    Err(e) => {
                        log::debug!("engine not disposed at shutdown: {e}");
                        (true, false)
                    }
                },
                Err(_) => {
                    log::warn!("ripple tick thread panicked");
                    (false, false)
                }
            },
            None => (true, false),
        };

        let report = ShutdownReport {
            total_ms: start.elapsed().as_millis() as u64,
            tick_joined,
            frames_produced: self.frame_count(),
            engine_disposed,
        };
        log::info!(
            "realtime ripple shut down after {} frames ({} ms)",
            report.frames_produced,
            report.total_ms
        );
        report
    }

    fn send_control(&self, control: Control) -> Result<(), SubmitError> {
        let tx = self.control_tx.as_ref().ok_or(SubmitError::Shutdown)?;
        tx.send(control).map_err(|_| SubmitError::Shutdown)
    }
}

impl Drop for RealtimeRipple {
    fn drop(&mut self) {
        if self.state != ShutdownState::Dropped {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for RealtimeRipple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeRipple")
            .field("state", &self.state)
            .field("tick_rate_hz", &self.tick_rate_hz)
            .field("frames", &self.frame_count())
            .finish()
    }
}
