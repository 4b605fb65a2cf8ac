//! Core types for the ripple simulation workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the touch and engine crates: packed RGBA pixel
//! buffers, touch points, barriers, the image supplier seam, and the
//! error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod barrier;
pub mod error;
pub mod pixel;
pub mod supplier;
pub mod touch;

pub use barrier::{Barrier, BarrierKind, BarrierSet, BarrierShape, BlockPurpose};
pub use error::RippleError;
pub use pixel::{pack_rgba, unpack_rgba, ImageSize, PixelBuffer};
pub use supplier::{ChannelImageSupplier, SourceImageSupplier, StaticImageSupplier};
pub use touch::{Touch, TouchPoint};

/// Semantic bound on height-field values.
///
/// A full-strength touch adds half of this to the height grid, and the
/// refraction step measures perspective relative to it.
pub const MAX_RIPPLE_HEIGHT: i32 = 1024;
