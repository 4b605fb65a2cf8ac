//! The [`TouchSource`] trait and the lifecycle/emission plumbing shared by
//! every source.
//!
//! ```text
//! Created ──start──▶ Active ◀──start── Paused
//!    │                 │  └───pause───▶   │
//!    └──────pause──────┼────────────────▶ │
//!                      ▼                  ▼
//!                  Disposed ◀──dispose────┘
//! ```
//!
//! `Disposed` is terminal: every operation on a disposed source fails
//! with [`RippleError::IllegalState`]. Disposing closes the source's
//! emission channel; receivers drain what was already sent and then see
//! a disconnect.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use ripple_core::{ImageSize, RippleError, Touch};

/// Lifecycle state of a touch source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchSourceState {
    /// Constructed, never started. Emits nothing.
    Created,
    /// Emitting touches.
    Active,
    /// Temporarily silent.
    Paused,
    /// Terminal; the emission stream is closed.
    Disposed,
}

/// A long-lived producer of [`Touch`] events.
///
/// Sources are shared between the UI/event side (which drives pointer
/// callbacks and lifecycle) and the consumer (which drains
/// [`touches`](TouchSource::touches)), so every method takes `&self`.
pub trait TouchSource: Send + Sync {
    /// Current lifecycle state.
    fn state(&self) -> TouchSourceState;

    /// Whether the source is currently emitting.
    fn is_active(&self) -> bool {
        self.state() == TouchSourceState::Active
    }

    /// Begin (or resume) emitting.
    fn start(&self) -> Result<(), RippleError>;

    /// Stop emitting until the next [`start`](TouchSource::start).
    fn pause(&self) -> Result<(), RippleError>;

    /// Stop permanently and close the emission stream.
    fn dispose(&self) -> Result<(), RippleError>;

    /// Tell the source the bounds of the image it emits for.
    fn set_image_size(&self, size: ImageSize) -> Result<(), RippleError>;

    /// A receiver for this source's emissions.
    ///
    /// All receivers share one queue: each touch is delivered to exactly
    /// one of them.
    fn touches(&self) -> Result<Receiver<Touch>, RippleError>;
}

/// Mutex-guarded lifecycle state machine.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    name: &'static str,
    state: Mutex<TouchSourceState>,
}

impl Lifecycle {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(TouchSourceState::Created),
        }
    }

    pub(crate) fn get(&self) -> TouchSourceState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.get() == TouchSourceState::Active
    }

    /// Fail if disposed.
    pub(crate) fn ensure_live(&self) -> Result<(), RippleError> {
        if self.get() == TouchSourceState::Disposed {
            return Err(self.disposed_error());
        }
        Ok(())
    }

    /// Move to `Active`. Returns the state it left.
    pub(crate) fn start(&self) -> Result<TouchSourceState, RippleError> {
        self.transition(TouchSourceState::Active)
    }

    /// Move to `Paused`. Returns the state it left.
    pub(crate) fn pause(&self) -> Result<TouchSourceState, RippleError> {
        self.transition(TouchSourceState::Paused)
    }

    /// Move to `Disposed`. Returns the state it left.
    pub(crate) fn dispose(&self) -> Result<TouchSourceState, RippleError> {
        self.transition(TouchSourceState::Disposed)
    }

    fn transition(&self, next: TouchSourceState) -> Result<TouchSourceState, RippleError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let prev = *state;
        if prev == TouchSourceState::Disposed {
            return Err(self.disposed_error());
        }
        *state = next;
        if prev != next {
            log::debug!("{} touch source: {prev:?} -> {next:?}", self.name);
        }
        Ok(prev)
    }

    fn disposed_error(&self) -> RippleError {
        RippleError::illegal_state(format!("{} touch source is disposed", self.name))
    }
}

/// Sending half of a source's emission stream plus a template receiver.
#[derive(Debug)]
pub(crate) struct Emitter {
    tx: Mutex<Option<Sender<Touch>>>,
    rx: Receiver<Touch>,
}

impl Emitter {
    pub(crate) fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
        }
    }

    /// Send `touch` unless it is empty or the stream is closed.
    /// Returns whether it was sent.
    pub(crate) fn emit(&self, touch: Touch) -> bool {
        if touch.is_empty() {
            return false;
        }
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match tx.as_ref() {
            Some(tx) => tx.send(touch).is_ok(),
            None => false,
        }
    }

    pub(crate) fn subscribe(&self) -> Receiver<Touch> {
        self.rx.clone()
    }

    /// Drop the sender so receivers disconnect after draining.
    pub(crate) fn close(&self) {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
