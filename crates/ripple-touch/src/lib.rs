//! Touch mappers and touch sources.
//!
//! A [`TouchMapper`] turns one origin point into a [`Touch`](ripple_core::Touch)
//! shape. A [`TouchSource`] emits touches over time on a crossbeam channel:
//! from pointer events ([`PointerTouchSource`]), from an internal timer
//! ([`RainTouchSource`]), or by merging other sources
//! ([`CompoundTouchSource`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod compound;
pub mod mapper;
pub mod pointer;
pub mod rain;
pub mod source;

pub use compound::CompoundTouchSource;
pub use mapper::{CompoundMapper, RainMapper, SinglePixel, SolidCircle, SolidRect, TouchMapper};
pub use pointer::{PointerEvent, PointerTouchSource};
pub use rain::{RainTouchSource, RainTouchSourceBuilder};
pub use source::{TouchSource, TouchSourceState};
