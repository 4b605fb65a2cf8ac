//! Test images and mock image suppliers for ripple development.
//!
//! Provides deterministic source images ([`gradient_image`],
//! [`solid_image`]) and [`SourceImageSupplier`] mocks that count, script,
//! or withhold fetches.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ripple_core::{pack_rgba, ImageSize, PixelBuffer, SourceImageSupplier};

// ── Images ──────────────────────────────────────────────────────

/// An image where every pixel has a distinct colour.
///
/// Red and green encode the column and row (mod 256), blue the upper
/// bits of the flat index, so any displacement changes the output.
///
/// Panics if either dimension is zero.
pub fn gradient_image(width: u32, height: u32) -> PixelBuffer {
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let i = y as usize * width as usize + x as usize;
                pack_rgba(x as u8, y as u8, (i >> 8) as u8, 0xFF)
            })
        })
        .collect();
    PixelBuffer::new(width, height, pixels).expect("gradient dimensions must be non-zero")
}

/// A single-colour image. Panics if either dimension is zero.
pub fn solid_image(width: u32, height: u32, color: u32) -> PixelBuffer {
    let size = ImageSize::new(width, height).expect("solid image dimensions must be non-zero");
    PixelBuffer::filled(size, color)
}

// ── Suppliers ───────────────────────────────────────────────────

/// Shared fetch counter handed out by [`CountingSupplier::counter`].
#[derive(Clone, Debug, Default)]
pub struct FetchCounter(Arc<AtomicUsize>);

impl FetchCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Always returns the same image and counts how often it was asked.
#[derive(Debug)]
pub struct CountingSupplier {
    image: PixelBuffer,
    dynamic: bool,
    fetches: FetchCounter,
}

impl CountingSupplier {
    /// A supplier that declares its image static.
    pub fn fixed(image: PixelBuffer) -> Self {
        Self {
            image,
            dynamic: false,
            fetches: FetchCounter::default(),
        }
    }

    /// A supplier that declares its image may change every frame.
    pub fn changing(image: PixelBuffer) -> Self {
        Self {
            dynamic: true,
            ..Self::fixed(image)
        }
    }

    pub fn counter(&self) -> FetchCounter {
        self.fetches.clone()
    }
}

impl SourceImageSupplier for CountingSupplier {
    fn may_change_over_time(&self) -> bool {
        self.dynamic
    }

    fn fetch(&mut self) -> Option<PixelBuffer> {
        self.fetches.0.fetch_add(1, Ordering::SeqCst);
        Some(self.image.clone())
    }
}

/// Replays a fixed script of fetch results, then returns `None` forever.
///
/// Always reports itself as dynamic.
#[derive(Debug)]
pub struct ScriptedSupplier {
    script: VecDeque<Option<PixelBuffer>>,
}

impl ScriptedSupplier {
    pub fn new(script: Vec<Option<PixelBuffer>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl SourceImageSupplier for ScriptedSupplier {
    fn may_change_over_time(&self) -> bool {
        true
    }

    fn fetch(&mut self) -> Option<PixelBuffer> {
        self.script.pop_front().flatten()
    }
}

/// Never has an image.
#[derive(Debug)]
pub struct EmptySupplier {
    dynamic: bool,
}

impl EmptySupplier {
    pub fn dynamic() -> Self {
        Self { dynamic: true }
    }

    pub fn fixed() -> Self {
        Self { dynamic: false }
    }
}

impl SourceImageSupplier for EmptySupplier {
    fn may_change_over_time(&self) -> bool {
        self.dynamic
    }

    fn fetch(&mut self) -> Option<PixelBuffer> {
        None
    }
}
