//! Pointer-driven touch source.
//!
//! The host UI forwards pointer events already translated into image
//! coordinates. While the source is active and knows the image bounds,
//! each event is mapped through the configured [`TouchMapper`] and the
//! resulting touch is emitted.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::Receiver;
use ripple_core::{ImageSize, RippleError, Touch};

use crate::mapper::TouchMapper;
use crate::source::{Emitter, Lifecycle, TouchSource, TouchSourceState};

/// Kind of pointer event reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerEvent {
    /// Pointer entered the image.
    Entered,
    /// Pointer moved over the image.
    Moved,
    /// Pointer left the image.
    Exited,
    /// Button pressed.
    Pressed,
    /// Button released.
    Released,
}

/// Emits a touch for every pointer event over the image.
pub struct PointerTouchSource {
    lifecycle: Lifecycle,
    emitter: Emitter,
    mapper: Box<dyn TouchMapper>,
    bounds: Mutex<Option<ImageSize>>,
    require_pointer_down: bool,
}

impl PointerTouchSource {
    /// A source that emits on every event, pressed or not.
    pub fn new(mapper: impl TouchMapper + 'static) -> Self {
        Self {
            lifecycle: Lifecycle::new("pointer"),
            emitter: Emitter::new(),
            mapper: Box::new(mapper),
            bounds: Mutex::new(None),
            require_pointer_down: false,
        }
    }

    /// Only emit while the pointer button is held.
    pub fn pressed_only(mut self) -> Self {
        self.require_pointer_down = true;
        self
    }

    /// Handle one pointer event at image coordinates `(x, y)`.
    ///
    /// Returns `Ok(true)` if a touch was emitted. Events while created,
    /// paused, before the image size is known, or mapping to no pixels
    /// emit nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::IllegalState`] once disposed.
    pub fn handle(
        &self,
        event: PointerEvent,
        x: u32,
        y: u32,
        pointer_down: bool,
    ) -> Result<bool, RippleError> {
        self.lifecycle.ensure_live()?;
        if !self.lifecycle.is_active() {
            return Ok(false);
        }
        if self.require_pointer_down && !pointer_down {
            return Ok(false);
        }
        let Some(bounds) = *self.bounds.lock().unwrap_or_else(PoisonError::into_inner) else {
            log::trace!("pointer {event:?} at ({x}, {y}) before image size is known");
            return Ok(false);
        };
        Ok(self.emitter.emit(self.mapper.map((x, y), bounds)))
    }

    /// Pointer moved over the image.
    pub fn on_pointer_over_image(&self, x: u32, y: u32, pointer_down: bool) -> Result<bool, RippleError> {
        self.handle(PointerEvent::Moved, x, y, pointer_down)
    }

    /// Pointer entered the image.
    pub fn on_pointer_entered(&self, x: u32, y: u32, pointer_down: bool) -> Result<bool, RippleError> {
        self.handle(PointerEvent::Entered, x, y, pointer_down)
    }

    /// Pointer left the image.
    pub fn on_pointer_exited(&self, x: u32, y: u32, pointer_down: bool) -> Result<bool, RippleError> {
        self.handle(PointerEvent::Exited, x, y, pointer_down)
    }

    /// Button pressed over the image.
    pub fn on_pointer_pressed(&self, x: u32, y: u32) -> Result<bool, RippleError> {
        self.handle(PointerEvent::Pressed, x, y, true)
    }

    /// Button released over the image.
    pub fn on_pointer_released(&self, x: u32, y: u32) -> Result<bool, RippleError> {
        self.handle(PointerEvent::Released, x, y, false)
    }
}

impl TouchSource for PointerTouchSource {
    fn state(&self) -> TouchSourceState {
        self.lifecycle.get()
    }

    fn start(&self) -> Result<(), RippleError> {
        self.lifecycle.start().map(|_| ())
    }

    fn pause(&self) -> Result<(), RippleError> {
        self.lifecycle.pause().map(|_| ())
    }

    fn dispose(&self) -> Result<(), RippleError> {
        self.lifecycle.dispose()?;
        self.emitter.close();
        Ok(())
    }

    fn set_image_size(&self, size: ImageSize) -> Result<(), RippleError> {
        self.lifecycle.ensure_live()?;
        let size = ImageSize::new(size.width, size.height)?;
        *self.bounds.lock().unwrap_or_else(PoisonError::into_inner) = Some(size);
        Ok(())
    }

    fn touches(&self) -> Result<Receiver<Touch>, RippleError> {
        self.lifecycle.ensure_live()?;
        Ok(self.emitter.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{SinglePixel, SolidCircle};

    fn source() -> PointerTouchSource {
        let s = PointerTouchSource::new(SinglePixel::new(1.0).unwrap());
        s.set_image_size(ImageSize::new(8, 8).unwrap()).unwrap();
        s
    }

    #[test]
    fn silent_until_started() {
        let s = source();
        let rx = s.touches().unwrap();
        assert!(!s.on_pointer_over_image(1, 1, false).unwrap());
        s.start().unwrap();
        assert!(s.on_pointer_over_image(1, 1, false).unwrap());
        let t = rx.try_recv().unwrap();
        assert_eq!((t.points()[0].x(), t.points()[0].y()), (1, 1));
    }

    #[test]
    fn every_event_kind_emits() {
        let s = source();
        let rx = s.touches().unwrap();
        s.start().unwrap();
        s.on_pointer_entered(0, 0, false).unwrap();
        s.on_pointer_over_image(1, 0, false).unwrap();
        s.on_pointer_pressed(2, 0).unwrap();
        s.on_pointer_released(3, 0).unwrap();
        s.on_pointer_exited(4, 0, false).unwrap();
        let xs: Vec<u32> = rx.try_iter().map(|t| t.points()[0].x()).collect();
        assert_eq!(xs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn paused_source_is_silent() {
        let s = source();
        let rx = s.touches().unwrap();
        s.start().unwrap();
        s.pause().unwrap();
        assert!(!s.on_pointer_over_image(1, 1, true).unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn zero_sized_bounds_rejected() {
        let s = PointerTouchSource::new(SinglePixel::new(1.0).unwrap());
        s.start().unwrap();
        let bad = ImageSize {
            width: 3,
            height: 0,
        };
        assert!(matches!(
            s.set_image_size(bad),
            Err(RippleError::InvalidArgument { .. })
        ));
        assert!(!s.on_pointer_over_image(0, 0, true).unwrap());
    }

    #[test]
    fn no_emission_before_bounds() {
        let s = PointerTouchSource::new(SolidCircle::new(3, 1.0).unwrap());
        s.start().unwrap();
        assert!(!s.on_pointer_over_image(1, 1, true).unwrap());
    }

    #[test]
    fn pressed_only_ignores_hover() {
        let s = PointerTouchSource::new(SinglePixel::new(1.0).unwrap()).pressed_only();
        s.set_image_size(ImageSize::new(4, 4).unwrap()).unwrap();
        s.start().unwrap();
        assert!(!s.on_pointer_over_image(1, 1, false).unwrap());
        assert!(s.on_pointer_over_image(1, 1, true).unwrap());
    }

    #[test]
    fn dispose_closes_stream_and_rejects_events() {
        let s = source();
        let rx = s.touches().unwrap();
        s.start().unwrap();
        s.on_pointer_over_image(1, 1, false).unwrap();
        s.dispose().unwrap();
        assert!(rx.recv().is_ok());
        assert!(rx.recv().is_err());
        assert!(matches!(
            s.on_pointer_over_image(1, 1, false),
            Err(RippleError::IllegalState { .. })
        ));
        assert!(s.touches().is_err());
        assert!(s.dispose().is_err());
    }
}
