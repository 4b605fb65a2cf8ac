//! The source-image seam.
//!
//! The engine pulls the image to ripple from a [`SourceImageSupplier`] once
//! per step (or once per lifetime for static images). Capturing a screen
//! region or decoding a camera frame lives behind this trait.

use crossbeam_channel::{Receiver, TryRecvError};

use crate::pixel::PixelBuffer;

/// Supplies the pixel buffer that the ripple effect displaces.
pub trait SourceImageSupplier: Send {
    /// Whether successive fetches may return different content.
    ///
    /// Read once when the engine is constructed. A supplier that answers
    /// `false` is fetched only until the first buffer arrives.
    fn may_change_over_time(&self) -> bool;

    /// The current image, or `None` if nothing is available this tick.
    fn fetch(&mut self) -> Option<PixelBuffer>;
}

impl<S: SourceImageSupplier + ?Sized> SourceImageSupplier for Box<S> {
    fn may_change_over_time(&self) -> bool {
        (**self).may_change_over_time()
    }

    fn fetch(&mut self) -> Option<PixelBuffer> {
        (**self).fetch()
    }
}

/// A fixed image that never changes.
#[derive(Clone, Debug)]
pub struct StaticImageSupplier {
    image: PixelBuffer,
}

impl StaticImageSupplier {
    /// Supply `image` forever.
    pub fn new(image: PixelBuffer) -> Self {
        Self { image }
    }
}

impl SourceImageSupplier for StaticImageSupplier {
    fn may_change_over_time(&self) -> bool {
        false
    }

    fn fetch(&mut self) -> Option<PixelBuffer> {
        Some(self.image.clone())
    }
}

/// Supplies the most recent buffer pushed through a channel.
///
/// Producers (a capture thread, a decoder) send frames at their own pace;
/// each fetch drains the channel and keeps only the newest buffer. When
/// nothing new arrived since the previous fetch the supplier reports
/// `None` and the engine keeps rippling the image it already has.
#[derive(Debug)]
pub struct ChannelImageSupplier {
    rx: Receiver<PixelBuffer>,
    disconnected: bool,
}

impl ChannelImageSupplier {
    /// Wrap a receiving end.
    pub fn new(rx: Receiver<PixelBuffer>) -> Self {
        Self {
            rx,
            disconnected: false,
        }
    }

    /// Whether every sender has been dropped.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl SourceImageSupplier for ChannelImageSupplier {
    fn may_change_over_time(&self) -> bool {
        true
    }

    fn fetch(&mut self) -> Option<PixelBuffer> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(buf) => latest = Some(buf),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        log::debug!("image channel disconnected; holding last frame");
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::ImageSize;

    fn solid(color: u32) -> PixelBuffer {
        PixelBuffer::filled(ImageSize::new(2, 2).unwrap(), color)
    }

    #[test]
    fn static_supplier_repeats_image() {
        let mut s = StaticImageSupplier::new(solid(7));
        assert!(!s.may_change_over_time());
        assert_eq!(s.fetch(), Some(solid(7)));
        assert_eq!(s.fetch(), Some(solid(7)));
    }

    #[test]
    fn channel_supplier_keeps_latest() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut s = ChannelImageSupplier::new(rx);
        assert!(s.may_change_over_time());
        assert_eq!(s.fetch(), None);

        tx.send(solid(1)).unwrap();
        tx.send(solid(2)).unwrap();
        assert_eq!(s.fetch(), Some(solid(2)));
        assert_eq!(s.fetch(), None);

        drop(tx);
        assert_eq!(s.fetch(), None);
        assert!(s.is_disconnected());
    }

    #[test]
    fn boxed_supplier_delegates() {
        let mut s: Box<dyn SourceImageSupplier> = Box::new(StaticImageSupplier::new(solid(3)));
        assert!(!s.may_change_over_time());
        assert_eq!(s.fetch(), Some(solid(3)));
    }
}
