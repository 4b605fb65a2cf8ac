//! Periodic "rain" touch source.
//!
//! Owns a timer thread that fires at a configurable rate, independent of
//! the render clock. On each firing, if the source is active, a drop
//! origin is drawn uniformly over the image bounds and mapped through the
//! source's mapper (a [`RainMapper`] by default).
//!
//! Until [`set_image_size`](TouchSource::set_image_size) is called the
//! bounds are a degenerate 1×1 image, so every drop lands on `(0, 0)`.
//! This corrects itself as soon as the real size arrives.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ripple_core::{ImageSize, RippleError, Touch};

use crate::mapper::{RainMapper, TouchMapper};
use crate::source::{Emitter, Lifecycle, TouchSource, TouchSourceState};

const DEGENERATE_BOUNDS: ImageSize = ImageSize {
    width: 1,
    height: 1,
};

/// State shared between the source handle and its timer thread.
struct RainShared {
    lifecycle: Lifecycle,
    emitter: Emitter,
    mapper: Box<dyn TouchMapper>,
    bounds: Mutex<Option<ImageSize>>,
    rng: Mutex<ChaCha8Rng>,
}

impl RainShared {
    /// One timer firing. Returns whether a touch was emitted.
    fn fire(&self) -> bool {
        if !self.lifecycle.is_active() {
            return false;
        }
        let bounds = self
            .bounds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or(DEGENERATE_BOUNDS);
        let origin = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            (
                rng.random_range(0..bounds.width),
                rng.random_range(0..bounds.height),
            )
        };
        self.emitter.emit(self.mapper.map(origin, bounds))
    }
}

struct Timer {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

impl Timer {
    fn stop(self) {
        drop(self.stop_tx);
        if self.thread.join().is_err() {
            log::warn!("rain timer thread panicked");
        }
    }
}

fn run_timer(shared: Arc<RainShared>, interval: Duration, stop_rx: Receiver<()>) {
    let ticker = crossbeam_channel::tick(interval);
    loop {
        crossbeam_channel::select! {
            recv(ticker) -> _ => {
                shared.fire();
            }
            recv(stop_rx) -> _ => break,
        }
    }
}

/// Emits randomly placed drops at a fixed rate.
pub struct RainTouchSource {
    shared: Arc<RainShared>,
    interval: Duration,
    timer: Mutex<Option<Timer>>,
}

/// Builder for [`RainTouchSource`].
pub struct RainTouchSourceBuilder {
    drops_per_second: f64,
    seed: u64,
    mapper: Option<Box<dyn TouchMapper>>,
}

impl RainTouchSource {
    /// Create a builder with defaults: 10 drops per second, seed 0, and a
    /// default [`RainMapper`].
    pub fn builder() -> RainTouchSourceBuilder {
        RainTouchSourceBuilder {
            drops_per_second: 10.0,
            seed: 0,
            mapper: None,
        }
    }

    /// Time between drops.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fire one drop immediately, as the timer would.
    ///
    /// Returns `Ok(true)` if a touch was emitted (the source is active).
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::IllegalState`] once disposed.
    pub fn fire_now(&self) -> Result<bool, RippleError> {
        self.shared.lifecycle.ensure_live()?;
        Ok(self.shared.fire())
    }

    fn ensure_timer(&self) -> Result<(), RippleError> {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.is_some() {
            return Ok(());
        }
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(0);
        let shared = Arc::clone(&self.shared);
        let interval = self.interval;
        let thread = thread::Builder::new()
            .name("ripple-rain".into())
            .spawn(move || run_timer(shared, interval, stop_rx))
            .map_err(|e| RippleError::illegal_state(format!("failed to spawn rain timer: {e}")))?;
        *timer = Some(Timer { stop_tx, thread });
        Ok(())
    }

    fn stop_timer(&self) {
        let timer = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            timer.stop();
        }
    }
}

impl RainTouchSourceBuilder {
    /// Drop rate (default 10). Must be finite and > 0.
    pub fn drops_per_second(mut self, rate: f64) -> Self {
        self.drops_per_second = rate;
        self
    }

    /// Seed for drop placement and the default mapper (default 0).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the default [`RainMapper`].
    pub fn mapper(mut self, mapper: impl TouchMapper + 'static) -> Self {
        self.mapper = Some(Box::new(mapper));
        self
    }

    /// Build the source. The timer thread starts on the first
    /// [`start`](TouchSource::start).
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::InvalidArgument`] if `drops_per_second` is
    /// not finite and positive, or so small its period overflows.
    pub fn build(self) -> Result<RainTouchSource, RippleError> {
        let interval = Some(self.drops_per_second)
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .and_then(|rate| Duration::try_from_secs_f64(1.0 / rate).ok())
            .ok_or_else(|| {
                RippleError::invalid_argument(format!(
                    "drops_per_second must be finite, > 0, and give a representable period, got {}",
                    self.drops_per_second
                ))
            })?;
        let mapper = match self.mapper {
            Some(m) => m,
            None => Box::new(
                RainMapper::builder()
                    .seed(self.seed ^ 0x9E37_79B9_7F4A_7C15)
                    .build()?,
            ),
        };
        Ok(RainTouchSource {
            shared: Arc::new(RainShared {
                lifecycle: Lifecycle::new("rain"),
                emitter: Emitter::new(),
                mapper,
                bounds: Mutex::new(None),
                rng: Mutex::new(ChaCha8Rng::seed_from_u64(self.seed)),
            }),
            interval,
            timer: Mutex::new(None),
        })
    }
}

impl TouchSource for RainTouchSource {
    fn state(&self) -> TouchSourceState {
        self.shared.lifecycle.get()
    }

    fn start(&self) -> Result<(), RippleError> {
        self.shared.lifecycle.start()?;
        self.ensure_timer()
    }

    fn pause(&self) -> Result<(), RippleError> {
        self.shared.lifecycle.pause().map(|_| ())
    }

    fn dispose(&self) -> Result<(), RippleError> {
        self.shared.lifecycle.dispose()?;
        self.stop_timer();
        self.shared.emitter.close();
        Ok(())
    }

    fn set_image_size(&self, size: ImageSize) -> Result<(), RippleError> {
        self.shared.lifecycle.ensure_live()?;
        // Fields are public: a hand-built zero size would empty the drop range.
        let size = ImageSize::new(size.width, size.height)?;
        *self
            .shared
            .bounds
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(size);
        Ok(())
    }

    fn touches(&self) -> Result<Receiver<Touch>, RippleError> {
        self.shared.lifecycle.ensure_live()?;
        Ok(self.shared.emitter.subscribe())
    }
}

impl Drop for RainTouchSource {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::SinglePixel;

    fn manual(seed: u64) -> RainTouchSource {
        RainTouchSource::builder()
            .drops_per_second(0.001)
            .seed(seed)
            .mapper(SinglePixel::new(1.0).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn builder_rejects_bad_rate() {
        assert!(RainTouchSource::builder().drops_per_second(0.0).build().is_err());
        assert!(RainTouchSource::builder().drops_per_second(-1.0).build().is_err());
        assert!(RainTouchSource::builder()
            .drops_per_second(f64::NAN)
            .build()
            .is_err());
        // The period would overflow Duration.
        assert!(matches!(
            RainTouchSource::builder().drops_per_second(1e-20).build(),
            Err(RippleError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn zero_sized_bounds_rejected() {
        let s = manual(2);
        s.start().unwrap();
        let bad = ImageSize {
            width: 0,
            height: 5,
        };
        assert!(matches!(
            s.set_image_size(bad),
            Err(RippleError::InvalidArgument { .. })
        ));
        // The previous (degenerate) bounds are still in force.
        let rx = s.touches().unwrap();
        assert!(s.fire_now().unwrap());
        let t = rx.try_recv().unwrap();
        assert_eq!((t.points()[0].x(), t.points()[0].y()), (0, 0));
    }

    #[test]
    fn interval_matches_rate() {
        let s = RainTouchSource::builder().drops_per_second(50.0).build().unwrap();
        assert_eq!(s.interval(), Duration::from_millis(20));
    }

    #[test]
    fn drops_before_bounds_land_on_origin() {
        let s = manual(1);
        let rx = s.touches().unwrap();
        s.start().unwrap();
        assert!(s.fire_now().unwrap());
        let t = rx.try_recv().unwrap();
        assert_eq!((t.points()[0].x(), t.points()[0].y()), (0, 0));
        s.dispose().unwrap();
    }

    #[test]
    fn drops_spread_over_bounds() {
        let s = manual(2);
        let rx = s.touches().unwrap();
        s.set_image_size(ImageSize::new(16, 16).unwrap()).unwrap();
        s.start().unwrap();
        for _ in 0..64 {
            s.fire_now().unwrap();
        }
        let pts: Vec<(u32, u32)> = rx
            .try_iter()
            .map(|t| (t.points()[0].x(), t.points()[0].y()))
            .collect();
        assert!(pts.len() >= 64);
        assert!(pts.iter().all(|&(x, y)| x < 16 && y < 16));
        assert!(pts.iter().any(|&p| p != pts[0]));
        s.dispose().unwrap();
    }

    #[test]
    fn same_seed_same_drops() {
        let run = |seed| {
            let s = manual(seed);
            let rx = s.touches().unwrap();
            s.set_image_size(ImageSize::new(32, 32).unwrap()).unwrap();
            s.start().unwrap();
            for _ in 0..10 {
                s.fire_now().unwrap();
            }
            s.pause().unwrap();
            rx.try_iter()
                .map(|t| (t.points()[0].x(), t.points()[0].y()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn paused_rain_is_silent() {
        let s = manual(3);
        let rx = s.touches().unwrap();
        s.start().unwrap();
        s.pause().unwrap();
        assert!(!s.fire_now().unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn timer_emits_and_dispose_closes_stream() {
        let s = RainTouchSource::builder()
            .drops_per_second(200.0)
            .mapper(SinglePixel::new(0.5).unwrap())
            .build()
            .unwrap();
        s.set_image_size(ImageSize::new(8, 8).unwrap()).unwrap();
        let rx = s.touches().unwrap();
        s.start().unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        s.dispose().unwrap();
        // Remaining queued drops drain, then the stream disconnects.
        while rx.recv_timeout(Duration::from_secs(2)).is_ok() {}
        assert!(rx.try_recv().is_err());
        assert!(matches!(s.fire_now(), Err(RippleError::IllegalState { .. })));
    }
}
