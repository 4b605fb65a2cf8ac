//! Lockstep (caller-driven) frame clock.
//!
//! [`LockstepRipple`] owns the engine and a touch inbox. Each call to
//! [`step_sync()`](LockstepRipple::step_sync) drains pending touches,
//! runs one engine step, and returns a borrow of the frame. The borrow
//! prevents calling `step_sync()` again while the frame is held.
//!
//! No background threads are involved; touch sources run their own
//! threads and only feed the inbox.

use std::sync::Arc;

use crossbeam_channel::Sender;
use ripple_core::{ImageSize, PixelBuffer, RippleError, SourceImageSupplier, Touch};
use ripple_touch::TouchSource;

use crate::config::{ConfigError, RippleConfig};
use crate::engine::RippleEngine;
use crate::ingress::{SubmitError, TouchInbox};
use crate::metrics::StepMetrics;

// Compile-time assertion: LockstepRipple can move between threads.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<LockstepRipple>();
    }
};

// ── StepResult ──────────────────────────────────────────────────

/// Result of a successful [`LockstepRipple::step_sync()`] call.
#[derive(Debug)]
pub struct StepResult<'r> {
    /// The rendered frame.
    pub frame: &'r PixelBuffer,
    /// Zero-based index of this frame.
    pub frame_index: u64,
    /// Metrics for this step.
    pub metrics: StepMetrics,
}

// ── LockstepRipple ──────────────────────────────────────────────

/// Caller-driven ripple clock.
///
/// # Example
///
/// ```ignore
/// let mut ripple = LockstepRipple::new(RippleConfig::sized(64, 64)?, supplier)?;
/// ripple.submit_touch(touch)?;
/// let frame = ripple.step_sync()?.frame;
/// ```
pub struct LockstepRipple {
    engine: RippleEngine,
    inbox: TouchInbox,
    sources: Vec<Arc<dyn TouchSource>>,
    frames: u64,
}

impl LockstepRipple {
    /// Build the engine from `config` and `supplier`.
    pub fn new(
        config: RippleConfig,
        supplier: impl SourceImageSupplier + 'static,
    ) -> Result<Self, ConfigError> {
        let engine = RippleEngine::new(&config, supplier)?;
        Ok(Self {
            engine,
            inbox: TouchInbox::new(config.touch_queue_capacity),
            sources: Vec::new(),
            frames: 0,
        })
    }

    /// Drain pending touches, step once, and return the frame.
    ///
    /// An unsized engine is first sized from the supplier.
    ///
    /// # Errors
    ///
    /// [`RippleError::SupplierUnavailable`] while the supplier has never
    /// produced an image; [`RippleError::IllegalState`] once disposed.
    pub fn step_sync(&mut self) -> Result<StepResult<'_>, RippleError> {
        if !self.engine.is_sized() && !self.engine.is_disposed() {
            let size = self.engine.establish_size_from_supplier()?;
            self.announce_size(size);
        }
        if self.engine.is_sized() {
            self.inbox.drain_into(&mut self.engine);
        }
        self.engine.step()?;
        let frame_index = self.frames;
        self.frames += 1;
        let metrics = self.engine.last_metrics().clone();
        let frame = self
            .engine
            .output()
            .ok_or_else(|| RippleError::illegal_state("step produced no frame"))?;
        Ok(StepResult {
            frame,
            frame_index,
            metrics,
        })
    }

    /// Queue a touch for the next step.
    pub fn submit_touch(&self, touch: Touch) -> Result<(), SubmitError> {
        self.inbox.submit(touch)
    }

    /// A sender feeding the touch queue, for producers on other threads.
    pub fn touch_sender(&self) -> Sender<Touch> {
        self.inbox.sender()
    }

    /// Drain `source`'s stream before every step.
    ///
    /// The source is told the image size now if it is known, otherwise as
    /// soon as the engine is sized.
    pub fn attach_source(&mut self, source: Arc<dyn TouchSource>) -> Result<(), RippleError> {
        let rx = source.touches()?;
        if let Some(size) = self.engine.size() {
            source.set_image_size(size)?;
        }
        self.inbox.attach(rx);
        self.sources.push(source);
        Ok(())
    }

    /// Enable or disable touch application.
    pub fn set_active(&mut self, active: bool) {
        self.engine.set_active(active);
    }

    /// Toggle the barrier at `index`.
    pub fn set_barrier_active(&mut self, index: usize, active: bool) -> Result<(), RippleError> {
        self.engine.barriers_mut().set_active(index, active)
    }

    /// Number of frames produced so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Metrics from the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        self.engine.last_metrics()
    }

    /// The underlying engine.
    pub fn engine(&self) -> &RippleEngine {
        &self.engine
    }

    /// Mutable access to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut RippleEngine {
        &mut self.engine
    }

    /// Dispose the engine. Attached sources are left to their owners.
    pub fn dispose(&mut self) -> Result<(), RippleError> {
        self.engine.dispose()?;
        self.sources.clear();
        Ok(())
    }

    fn announce_size(&self, size: ImageSize) {
        for source in &self.sources {
            if let Err(e) = source.set_image_size(size) {
                log::warn!("touch source rejected image size: {e}");
            }
        }
    }
}

impl std::fmt::Debug for LockstepRipple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockstepRipple")
            .field("frames", &self.frames)
            .field("sources", &self.sources.len())
            .field("engine", &self.engine)
            .finish()
    }
}
