//! The ripple simulation engine and its frame clocks.
//!
//! [`RippleEngine`] owns the double-buffered height field and the colour
//! buffers. Each [`step`](RippleEngine::step) diffuses and damps the
//! heights, then refracts the source image through them into one output
//! frame.
//!
//! Two clocks drive the engine:
//! - [`LockstepRipple`]: the caller steps explicitly.
//! - [`RealtimeRipple`]: a background tick thread steps at a fixed rate
//!   and publishes frames on a channel.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod height;
pub mod ingress;
pub mod lockstep;
pub mod metrics;
pub mod realtime;
pub(crate) mod refract;
pub(crate) mod tick_thread;

pub use config::{ConfigError, RippleConfig};
pub use engine::RippleEngine;
pub use height::HeightField;
pub use ingress::SubmitError;
pub use lockstep::{LockstepRipple, StepResult};
pub use metrics::StepMetrics;
pub use realtime::{Frame, RealtimeRipple, ShutdownReport};
