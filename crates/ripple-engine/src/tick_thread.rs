//! Tick loop for [`RealtimeRipple`](crate::realtime::RealtimeRipple).
//!
//! The tick thread owns the [`RippleEngine`] exclusively (moved in via
//! `thread::spawn`). Touches and control requests arrive over crossbeam
//! channels and are applied strictly between steps; frames leave over an
//! unbounded channel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use ripple_core::{ImageSize, RippleError, Touch};
use ripple_touch::TouchSource;

use crate::engine::RippleEngine;
use crate::ingress::TouchInbox;
use crate::metrics::StepMetrics;
use crate::realtime::Frame;

/// A request from the owning handle, applied between steps.
pub(crate) enum Control {
    /// Drain `rx` (the stream of `source`) before every step.
    Attach {
        source: Arc<dyn TouchSource>,
        rx: Receiver<Touch>,
    },
    /// Enable or disable touch application.
    SetActive(bool),
    /// Toggle one barrier and report the outcome.
    SetBarrierActive {
        index: usize,
        active: bool,
        reply: Sender<Result<(), RippleError>>,
    },
}

/// Counters the tick thread publishes to the handle.
#[derive(Default)]
pub(crate) struct TickStats {
    pub frames: AtomicU64,
    pub metrics: Mutex<StepMetrics>,
}

/// State held by the tick thread's main loop.
pub(crate) struct TickThreadState {
    engine: RippleEngine,
    inbox: TouchInbox,
    control_rx: Receiver<Control>,
    frames_tx: Sender<Frame>,
    sources: Vec<Arc<dyn TouchSource>>,
    shutdown_flag: Arc<AtomicBool>,
    stats: Arc<TickStats>,
    tick_budget: Duration,
}

impl TickThreadState {
    pub fn new(
        engine: RippleEngine,
        inbox: TouchInbox,
        control_rx: Receiver<Control>,
        frames_tx: Sender<Frame>,
        shutdown_flag: Arc<AtomicBool>,
        stats: Arc<TickStats>,
        tick_budget: Duration,
    ) -> Self {
        Self {
            engine,
            inbox,
            control_rx,
            frames_tx,
            sources: Vec::new(),
            shutdown_flag,
            stats,
            tick_budget,
        }
    }

    /// Main tick loop. Runs until `shutdown_flag` is set.
    ///
    /// Consumes self and returns the engine so the handle can dispose it
    /// after the join.
    pub fn run(mut self) -> RippleEngine {
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            let tick_start = Instant::now();

            // 1. Control requests.
            self.drain_control();

            // 2. Size from the supplier if still unsized, then touches and step.
            if self.ensure_sized() {
                self.inbox.drain_into(&mut self.engine);
                self.execute_step();
            }

            // 3. Sleep for the remaining budget.
            self.sleep_until(tick_start + self.tick_budget);
        }
        self.engine
    }

    fn drain_control(&mut self) {
        while let Ok(control) = self.control_rx.try_recv() {
            match control {
                Control::Attach { source, rx } => {
                    if let Some(size) = self.engine.size() {
                        if let Err(e) = source.set_image_size(size) {
                            log::warn!("touch source rejected image size: {e}");
                        }
                    }
                    self.inbox.attach(rx);
                    self.sources.push(source);
                }
                Control::SetActive(active) => self.engine.set_active(active),
                Control::SetBarrierActive {
                    index,
                    active,
                    reply,
                } => {
                    let result = self.engine.barriers_mut().set_active(index, active);
                    // Best-effort reply; the caller may have given up.
                    let _ = reply.send(result);
                }
            }
        }
    }

    /// Whether the engine is ready to step.
    fn ensure_sized(&mut self) -> bool {
        if self.engine.is_sized() {
            return true;
        }
        if self.engine.is_disposed() {
            return false;
        }
        match self.engine.establish_size_from_supplier() {
            Ok(size) => {
                self.announce_size(size);
                true
            }
            Err(RippleError::SupplierUnavailable) => {
                log::trace!("waiting for first source image");
                false
            }
            Err(e) => {
                log::warn!("could not size ripple engine: {e}");
                false
            }
        }
    }

    fn announce_size(&self, size: ImageSize) {
        for source in &self.sources {
            if let Err(e) = source.set_image_size(size) {
                log::warn!("touch source rejected image size: {e}");
            }
        }
    }

    fn execute_step(&mut self) {
        let image = match self.engine.step() {
            Ok(frame) => frame.clone(),
            Err(RippleError::SupplierUnavailable) => {
                log::trace!("waiting for first source image");
                return;
            }
            Err(e) => {
                log::warn!("ripple step failed: {e}");
                return;
            }
        };
        let index = self.stats.frames.fetch_add(1, Ordering::AcqRel);
        // The handle keeps a receiver alive, so this only fails after it is gone.
        let _ = self.frames_tx.send(Frame { index, image });
        *self
            .stats
            .metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = self.engine.last_metrics().clone();
    }

    /// Park until `deadline` or shutdown. `unpark()` wakes immediately.
    fn sleep_until(&self, deadline: Instant) {
        while !self.shutdown_flag.load(Ordering::Acquire) {
            match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) if !remaining.is_zero() => thread::park_timeout(remaining),
                _ => return,
            }
        }
    }
}
