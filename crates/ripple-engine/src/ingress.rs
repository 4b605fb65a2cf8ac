//! Touch ingress: the queue between touch producers and the tick owner.
//!
//! [`TouchInbox`] owns a bounded queue for touches submitted directly and
//! a list of attached touch-source streams. The tick owner drains both
//! strictly between steps, so a touch never lands mid-pass.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use ripple_core::{RippleError, Touch};

use crate::engine::RippleEngine;

/// Error submitting a touch or control request to a clock.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The touch queue is full (back-pressure).
    QueueFull,
    /// The clock has shut down.
    Shutdown,
    /// The request was rejected by the engine.
    Rejected(RippleError),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueueFull => write!(f, "touch queue full"),
            Self::Shutdown => write!(f, "ripple clock has shut down"),
            Self::Rejected(e) => write!(f, "rejected: {e}"),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RippleError> for SubmitError {
    fn from(e: RippleError) -> Self {
        Self::Rejected(e)
    }
}

/// Outcome of one [`TouchInbox::drain_into`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct DrainStats {
    /// Touches handed to the engine.
    pub touches: usize,
    /// Touches the engine rejected (e.g. out of bounds).
    pub rejected: usize,
    /// Attached streams that disconnected during this drain.
    pub closed_streams: usize,
}

/// Bounded submit queue plus attached source streams.
pub(crate) struct TouchInbox {
    tx: Sender<Touch>,
    rx: Receiver<Touch>,
    attached: Vec<Receiver<Touch>>,
}

impl TouchInbox {
    /// An inbox whose own queue holds at most `capacity` touches.
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            tx,
            rx,
            attached: Vec::new(),
        }
    }

    /// A sender into the bounded queue.
    pub(crate) fn sender(&self) -> Sender<Touch> {
        self.tx.clone()
    }

    /// Queue `touch` without blocking.
    pub(crate) fn submit(&self, touch: Touch) -> Result<(), SubmitError> {
        submit_to(&self.tx, touch)
    }

    /// Drain an additional stream alongside the queue.
    pub(crate) fn attach(&mut self, rx: Receiver<Touch>) {
        self.attached.push(rx);
    }

    /// Number of attached streams still connected.
    pub(crate) fn attached_len(&self) -> usize {
        self.attached.len()
    }

    /// Apply every pending touch to `engine`, queue first, then each
    /// attached stream in attach order.
    pub(crate) fn drain_into(&mut self, engine: &mut RippleEngine) -> DrainStats {
        let mut stats = DrainStats::default();
        let mut apply = |touch: Touch, stats: &mut DrainStats| {
            stats.touches += 1;
            if let Err(e) = engine.apply_touch(&touch) {
                stats.rejected += 1;
                log::debug!("dropping touch: {e}");
            }
        };

        while let Ok(touch) = self.rx.try_recv() {
            apply(touch, &mut stats);
        }
        self.attached.retain(|rx| loop {
            match rx.try_recv() {
                Ok(touch) => apply(touch, &mut stats),
                Err(TryRecvError::Empty) => break true,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("touch source stream disconnected; detaching");
                    stats.closed_streams += 1;
                    break false;
                }
            }
        });
        stats
    }
}

/// Non-blocking send mapped onto [`SubmitError`].
pub(crate) fn submit_to(tx: &Sender<Touch>, touch: Touch) -> Result<(), SubmitError> {
    tx.try_send(touch).map_err(|e| match e {
        TrySendError::Full(_) => SubmitError::QueueFull,
        TrySendError::Disconnected(_) => SubmitError::Shutdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RippleConfig;
    use ripple_core::{StaticImageSupplier, TouchPoint};
    use ripple_test_utils::gradient_image;

    fn engine() -> RippleEngine {
        RippleEngine::new(
            &RippleConfig::sized(4, 4).unwrap(),
            StaticImageSupplier::new(gradient_image(4, 4)),
        )
        .unwrap()
    }

    fn touch(x: u32, y: u32) -> Touch {
        Touch::single(TouchPoint::new(x, y, 1.0).unwrap())
    }

    #[test]
    fn bounded_queue_reports_full() {
        let inbox = TouchInbox::new(1);
        inbox.submit(touch(0, 0)).unwrap();
        assert_eq!(inbox.submit(touch(1, 1)), Err(SubmitError::QueueFull));
    }

    #[test]
    fn drains_queue_and_attached_streams() {
        let mut inbox = TouchInbox::new(8);
        let (tx, rx) = crossbeam_channel::unbounded();
        inbox.attach(rx);
        inbox.submit(touch(0, 0)).unwrap();
        tx.send(touch(1, 1)).unwrap();
        tx.send(touch(9, 9)).unwrap();

        let mut e = engine();
        let stats = inbox.drain_into(&mut e);
        assert_eq!(stats.touches, 3);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.closed_streams, 0);
        let hf = e.heights().unwrap();
        assert_eq!(hf.get(0, 0), Some(512));
        assert_eq!(hf.get(1, 1), Some(512));
    }

    #[test]
    fn disconnected_streams_detach_after_draining() {
        let mut inbox = TouchInbox::new(8);
        let (tx, rx) = crossbeam_channel::unbounded();
        inbox.attach(rx);
        tx.send(touch(2, 2)).unwrap();
        drop(tx);

        let mut e = engine();
        let stats = inbox.drain_into(&mut e);
        assert_eq!(stats.touches, 1);
        assert_eq!(stats.closed_streams, 1);
        assert_eq!(inbox.attached_len(), 0);
    }

    #[test]
    fn submit_error_display_and_source() {
        use std::error::Error;
        let err = SubmitError::from(RippleError::SupplierUnavailable);
        assert!(err.source().is_some());
        assert_eq!(format!("{}", SubmitError::QueueFull), "touch queue full");
    }
}
