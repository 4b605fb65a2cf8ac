//! Ripple: a real-time water ripple and refraction effect.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the ripple sub-crates. Touching the image perturbs a height field that
//! spreads outward and displaces the pixels underneath.
//!
//! # Quick start
//!
//! ```rust
//! use ripple::prelude::*;
//!
//! let image = PixelBuffer::filled(ImageSize::new(32, 32).unwrap(), 0x336699FF);
//! let config = RippleConfig::sized(32, 32).unwrap();
//! let mut ripple = LockstepRipple::new(config, StaticImageSupplier::new(image.clone())).unwrap();
//!
//! // Unperturbed water shows the source image.
//! assert_eq!(ripple.step_sync().unwrap().frame, &image);
//!
//! ripple
//!     .submit_touch(Touch::single(TouchPoint::new(16, 16, 1.0).unwrap()))
//!     .unwrap();
//! let result = ripple.step_sync().unwrap();
//! assert_eq!(result.metrics.touches_applied, 1);
//! assert_eq!(result.frame_index, 1);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ripple-core` | Pixel buffers, touches, barriers, suppliers, errors |
//! | [`touch`] | `ripple-touch` | Touch mappers and touch sources |
//! | [`engine`] | `ripple-engine` | Height field, engine, lockstep and realtime clocks |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`ripple-core`).
///
/// Pixel buffers, touch points, barriers, the
/// [`types::SourceImageSupplier`] seam, and [`types::RippleError`].
pub use ripple_core as types;

/// Touch mappers and sources (`ripple-touch`).
///
/// [`touch::PointerTouchSource`] for pointer input,
/// [`touch::RainTouchSource`] for periodic random drops, and
/// [`touch::CompoundTouchSource`] to merge several sources.
pub use ripple_touch as touch;

/// Ripple engine and frame clocks (`ripple-engine`).
///
/// [`engine::LockstepRipple`] for caller-driven stepping,
/// [`engine::RealtimeRipple`] for a background tick thread.
pub use ripple_engine as engine;

/// Common imports for typical ripple usage.
///
/// ```rust
/// use ripple::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use ripple_core::{
        Barrier, BarrierKind, BarrierSet, BarrierShape, ImageSize, PixelBuffer, Touch,
        TouchPoint, MAX_RIPPLE_HEIGHT,
    };

    // Suppliers
    pub use ripple_core::{ChannelImageSupplier, SourceImageSupplier, StaticImageSupplier};

    // Errors
    pub use ripple_core::RippleError;
    pub use ripple_engine::{ConfigError, SubmitError};

    // Touch
    pub use ripple_touch::{
        CompoundMapper, CompoundTouchSource, PointerTouchSource, RainMapper, RainTouchSource,
        SinglePixel, SolidCircle, SolidRect, TouchMapper, TouchSource, TouchSourceState,
    };

    // Engine
    pub use ripple_engine::{
        Frame, LockstepRipple, RealtimeRipple, RippleConfig, RippleEngine, StepMetrics,
        StepResult,
    };
}
