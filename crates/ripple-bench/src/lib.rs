//! Benchmark profiles for the ripple simulation.
//!
//! - [`reference_profile`]: 320x240 (76.8K pixels), static source
//! - [`stress_profile`]: 1280x720 (~920K pixels), static source
//! - [`barrier_profile`]: reference size with an active ripple-blocking frame
//! - [`warm_up`]: seed a field with deterministic drops so steps do real work

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ripple_core::{
    Barrier, BarrierKind, BarrierSet, BarrierShape, RippleError, StaticImageSupplier, Touch,
};
use ripple_engine::{ConfigError, LockstepRipple, RippleConfig};
use ripple_test_utils::gradient_image;
use ripple_touch::{RainMapper, TouchMapper};

/// 320x240 ripple over a gradient image.
pub fn reference_profile() -> Result<LockstepRipple, ConfigError> {
    profile(320, 240, BarrierSet::new())
}

/// 1280x720 ripple over a gradient image.
pub fn stress_profile() -> Result<LockstepRipple, ConfigError> {
    profile(1280, 720, BarrierSet::new())
}

/// Reference size with a 16-pixel ripple-blocking border, so every step
/// evaluates barriers.
pub fn barrier_profile() -> Result<LockstepRipple, ConfigError> {
    let barriers = BarrierSet::new().with(Barrier::new(
        BarrierKind::RippleBlock,
        BarrierShape::uniform_padding(16)?,
    ));
    profile(320, 240, barriers)
}

fn profile(width: u32, height: u32, barriers: BarrierSet) -> Result<LockstepRipple, ConfigError> {
    let config = RippleConfig {
        barriers,
        ..RippleConfig::sized(width, height)?
    };
    LockstepRipple::new(config, StaticImageSupplier::new(gradient_image(width, height)))
}

/// Generate `n` deterministic rain drops over the ripple's bounds.
pub fn rain_drops(ripple: &LockstepRipple, n: usize, seed: u64) -> Result<Vec<Touch>, RippleError> {
    let size = ripple
        .engine()
        .size()
        .ok_or_else(|| RippleError::illegal_state("ripple not sized"))?;
    let mapper = RainMapper::builder().seed(seed).build()?;
    Ok((0..n as u32)
        .map(|i| {
            // Spread origins with a multiplicative hash over the pixel count.
            let flat = (u64::from(i) * 2_654_435_761) % size.pixel_count() as u64;
            let x = (flat % u64::from(size.width)) as u32;
            let y = (flat / u64::from(size.width)) as u32;
            mapper.map((x, y), size)
        })
        .collect())
}

/// Drop `n` seeded rain drops and run `steps` steps.
pub fn warm_up(ripple: &mut LockstepRipple, n: usize, steps: usize) -> Result<(), RippleError> {
    for drop in rain_drops(ripple, n, 42)? {
        ripple.engine_mut().apply_touch(&drop)?;
    }
    for _ in 0..steps {
        ripple.step_sync()?;
    }
    Ok(())
}
