//! Merge several touch sources into one stream.
//!
//! A forwarding thread selects over every sub-source receiver and relays
//! each touch onto the compound stream. Sub-streams that disconnect are
//! dropped from the selection; when the last one goes the forwarder exits
//! and the compound stream closes.
//!
//! Dropping a compound without disposing it stops and joins the forwarder
//! but leaves the sub-sources running; touches they emit afterwards stay
//! in their own streams.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Select, Sender};
use ripple_core::{ImageSize, RippleError, Touch};

use crate::source::{TouchSource, TouchSourceState};

/// Merges the emissions of N sub-sources.
///
/// Lifecycle calls fan out to every sub-source. The compound reports
/// [`Active`](TouchSourceState::Active) only when every sub-source is
/// active.
pub struct CompoundTouchSource {
    sources: Vec<Arc<dyn TouchSource>>,
    rx: Receiver<Touch>,
    stop_tx: Mutex<Option<Sender<()>>>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

fn forward(mut inputs: Vec<Receiver<Touch>>, out: Sender<Touch>, stop_rx: Receiver<()>) {
    while !inputs.is_empty() {
        let mut sel = Select::new();
        let stop = sel.recv(&stop_rx);
        for rx in &inputs {
            sel.recv(rx);
        }
        let oper = sel.select();
        let index = oper.index();
        if index == stop {
            // Only ever disconnects; the handle never sends.
            let _ = oper.recv(&stop_rx);
            log::debug!("compound touch source dropped; forwarder stopping");
            return;
        }
        let input = index - 1;
        match oper.recv(&inputs[input]) {
            // The compound holds a receiver until the forwarder is joined.
            Ok(touch) => {
                let _ = out.send(touch);
            }
            Err(_) => {
                inputs.swap_remove(input);
            }
        }
    }
    log::debug!("compound touch source: all sub-streams closed");
}

impl CompoundTouchSource {
    /// Merge `sources`.
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::InvalidArgument`] if `sources` is empty,
    /// [`RippleError::IllegalState`] if any source is already disposed or
    /// the forwarding thread cannot be spawned.
    pub fn new(sources: Vec<Arc<dyn TouchSource>>) -> Result<Self, RippleError> {
        if sources.is_empty() {
            return Err(RippleError::invalid_argument(
                "compound touch source needs at least one sub-source",
            ));
        }
        let inputs = sources
            .iter()
            .map(|s| s.touches())
            .collect::<Result<Vec<_>, _>>()?;
        let (tx, rx) = crossbeam_channel::unbounded();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(0);
        let forwarder = thread::Builder::new()
            .name("ripple-touch-merge".into())
            .spawn(move || forward(inputs, tx, stop_rx))
            .map_err(|e| {
                RippleError::illegal_state(format!("failed to spawn touch forwarder: {e}"))
            })?;
        Ok(Self {
            sources,
            rx,
            stop_tx: Mutex::new(Some(stop_tx)),
            forwarder: Mutex::new(Some(forwarder)),
            disposed: AtomicBool::new(false),
        })
    }

    /// Number of merged sub-sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always false; construction rejects an empty list.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn ensure_live(&self) -> Result<(), RippleError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(RippleError::illegal_state(
                "compound touch source is disposed",
            ));
        }
        Ok(())
    }

    /// Wait for the forwarder to exit.
    fn join_forwarder(&self) {
        let handle = self
            .forwarder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::warn!("touch forwarder thread panicked");
            }
        }
    }

    /// Apply `op` to every sub-source, returning the first error after
    /// all have been visited.
    fn fan_out(
        &self,
        op: impl Fn(&dyn TouchSource) -> Result<(), RippleError>,
    ) -> Result<(), RippleError> {
        let mut first = None;
        for source in &self.sources {
            if let Err(e) = op(source.as_ref()) {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl TouchSource for CompoundTouchSource {
    fn state(&self) -> TouchSourceState {
        if self.disposed.load(Ordering::Acquire) {
            return TouchSourceState::Disposed;
        }
        let states: Vec<TouchSourceState> = self.sources.iter().map(|s| s.state()).collect();
        if states.iter().all(|&s| s == TouchSourceState::Active) {
            TouchSourceState::Active
        } else if states.iter().all(|&s| s == TouchSourceState::Created) {
            TouchSourceState::Created
        } else {
            TouchSourceState::Paused
        }
    }

    fn start(&self) -> Result<(), RippleError> {
        self.ensure_live()?;
        self.fan_out(|s| s.start())
    }

    fn pause(&self) -> Result<(), RippleError> {
        self.ensure_live()?;
        self.fan_out(|s| s.pause())
    }

    fn dispose(&self) -> Result<(), RippleError> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Err(RippleError::illegal_state(
                "compound touch source is disposed",
            ));
        }
        // Sub-sources disposed elsewhere already closed their streams.
        let result = self.fan_out(|s| {
            if s.state() == TouchSourceState::Disposed {
                Ok(())
            } else {
                s.dispose()
            }
        });
        self.join_forwarder();
        result
    }

    fn set_image_size(&self, size: ImageSize) -> Result<(), RippleError> {
        self.ensure_live()?;
        self.fan_out(|s| s.set_image_size(size))
    }

    fn touches(&self) -> Result<Receiver<Touch>, RippleError> {
        self.ensure_live()?;
        Ok(self.rx.clone())
    }
}

impl Drop for CompoundTouchSource {
    fn drop(&mut self) {
        // Disconnecting the stop channel ends the forwarder even while
        // sub-sources stay alive.
        self.stop_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.join_forwarder();
    }
}
