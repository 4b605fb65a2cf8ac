//! Engine configuration, validation, and error types.
//!
//! [`RippleConfig`] is the construction-time input for [`RippleEngine`]
//! and both frame clocks. [`validate()`](RippleConfig::validate) checks
//! its invariants before anything is allocated or spawned.
//!
//! [`RippleEngine`]: crate::engine::RippleEngine

use std::error::Error;
use std::fmt;
use std::time::Duration;

use ripple_core::{BarrierSet, ImageSize, RippleError};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building an engine or a frame clock.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// tick_rate_hz is NaN, infinite, zero, negative, or so small its
    /// period overflows `Duration`.
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// Touch queue capacity is zero.
    TouchQueueZero,
    /// A core operation (sizing, validation) failed.
    Ripple(RippleError),
    /// A background thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTickRate { value } => {
                write!(f, "tick_rate_hz must be finite and positive, got {value}")
            }
            Self::TouchQueueZero => write!(f, "touch_queue_capacity must be at least 1"),
            Self::Ripple(e) => write!(f, "ripple: {e}"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ripple(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RippleError> for ConfigError {
    fn from(e: RippleError) -> Self {
        Self::Ripple(e)
    }
}

// ── RippleConfig ───────────────────────────────────────────────────

/// Construction-time configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct RippleConfig {
    /// Barriers installed at construction. Toggle them later through the
    /// engine or clock.
    pub barriers: BarrierSet,
    /// Whether the engine accepts touches from the start. Default: true.
    pub initially_active: bool,
    /// Size to establish at construction. `None` sizes the engine from
    /// the first image the supplier produces.
    pub image_size: Option<ImageSize>,
    /// Frame rate of [`RealtimeRipple`](crate::realtime::RealtimeRipple).
    /// Default: 60.
    pub tick_rate_hz: f64,
    /// Capacity of the submitted-touch queue. Default: 1024.
    pub touch_queue_capacity: usize,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            barriers: BarrierSet::new(),
            initially_active: true,
            image_size: None,
            tick_rate_hz: 60.0,
            touch_queue_capacity: 1024,
        }
    }
}

impl RippleConfig {
    /// Default configuration with an explicit image size.
    pub fn sized(width: u32, height: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            image_size: Some(ImageSize::new(width, height)?),
            ..Self::default()
        })
    }

    /// Time allotted to one realtime tick.
    ///
    /// Fails for rates that are not finite and positive, or so small the
    /// period does not fit in a [`Duration`].
    pub fn tick_budget(&self) -> Result<Duration, ConfigError> {
        let hz = self.tick_rate_hz;
        Some(hz)
            .filter(|hz| hz.is_finite() && *hz > 0.0)
            .and_then(|hz| Duration::try_from_secs_f64(1.0 / hz).ok())
            .ok_or(ConfigError::InvalidTickRate { value: hz })
    }

    /// Check every invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tick_budget()?;
        if self.touch_queue_capacity == 0 {
            return Err(ConfigError::TouchQueueZero);
        }
        if let Some(size) = self.image_size {
            // Fields are public, so the non-zero guarantee of ImageSize::new
            // may have been bypassed.
            ImageSize::new(size.width, size.height)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = RippleConfig::default();
        assert!(cfg.initially_active);
        assert_eq!(cfg.tick_rate_hz, 60.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn sized_rejects_zero() {
        assert!(matches!(
            RippleConfig::sized(0, 4),
            Err(ConfigError::Ripple(RippleError::InvalidArgument { .. }))
        ));
        assert_eq!(
            RippleConfig::sized(4, 3).unwrap().image_size,
            Some(ImageSize::new(4, 3).unwrap())
        );
    }

    #[test]
    fn bad_tick_rates_rejected() {
        for hz in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::from_bits(1), 1e-20] {
            let cfg = RippleConfig {
                tick_rate_hz: hz,
                ..RippleConfig::default()
            };
            assert!(
                matches!(cfg.validate(), Err(ConfigError::InvalidTickRate { .. })),
                "{hz} should be rejected"
            );
        }
    }

    #[test]
    fn tick_budget_matches_rate() {
        let cfg = RippleConfig {
            tick_rate_hz: 50.0,
            ..RippleConfig::default()
        };
        assert_eq!(cfg.tick_budget(), Ok(Duration::from_millis(20)));
    }

    #[test]
    fn zero_queue_rejected() {
        let cfg = RippleConfig {
            touch_queue_capacity: 0,
            ..RippleConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::TouchQueueZero));
    }

    #[test]
    fn hand_built_zero_size_rejected() {
        let cfg = RippleConfig {
            image_size: Some(ImageSize {
                width: 0,
                height: 5,
            }),
            ..RippleConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Ripple(_))));
    }

    #[test]
    fn error_source_chains_ripple_error() {
        let err = ConfigError::from(RippleError::SupplierUnavailable);
        assert!(err.source().is_some());
        assert!(format!("{err}").contains("no initial buffer"));
        let spawn = ConfigError::ThreadSpawnFailed {
            reason: "tick thread: resource limit".to_string(),
        };
        assert!(spawn.source().is_none());
        assert!(format!("{spawn}").contains("thread spawn failed"));
    }
}
