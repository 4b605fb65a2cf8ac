//! Per-step metrics for the ripple engine.
//!
//! [`StepMetrics`] captures timing and counters for a single step. The
//! engine fills them in at the end of every [`step`](crate::RippleEngine::step);
//! clocks hand out a copy of the most recent one.

/// Timing and counters collected during a single step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the whole step, in microseconds.
    pub total_us: u64,
    /// Touch points added to the height field since the previous step.
    pub touches_applied: u32,
    /// Touch points swallowed by touch-blocking barriers since the
    /// previous step.
    pub touches_blocked: u32,
    /// Pixels held flat by ripple-blocking barriers this step.
    pub blocked_pixels: u32,
    /// Whether a new source image was fetched this step.
    pub source_refreshed: bool,
    /// Cumulative number of fetches that returned nothing after the
    /// first image had been loaded.
    pub fetch_misses: u64,
    /// Whether the fetched image was rescaled to the established size.
    pub rescaled: bool,
}
