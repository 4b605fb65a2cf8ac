//! Integration test: observable properties of the ripple step.
//!
//! Drives [`RippleEngine`] and [`LockstepRipple`] through their public API
//! only: fixed point at rest, touch arithmetic, barrier containment, decay,
//! and output size under source resampling.

use proptest::prelude::*;

use ripple_core::{
    Barrier, BarrierKind, BarrierShape, ImageSize, PixelBuffer, RippleError,
    StaticImageSupplier, Touch, TouchPoint, MAX_RIPPLE_HEIGHT,
};
use ripple_engine::{LockstepRipple, RippleConfig, RippleEngine};
use ripple_test_utils::{gradient_image, ScriptedSupplier};

fn engine_over(image: PixelBuffer) -> RippleEngine {
    let size = image.size();
    RippleEngine::new(
        &RippleConfig::sized(size.width, size.height).unwrap(),
        StaticImageSupplier::new(image),
    )
    .unwrap()
}

fn touch(x: u32, y: u32, strength: f32) -> Touch {
    Touch::single(TouchPoint::new(x, y, strength).unwrap())
}

// ── Arithmetic ──────────────────────────────────────────────────────

#[test]
fn centre_touch_first_step() {
    let mut e = engine_over(gradient_image(9, 9));
    e.apply_touch(&touch(4, 4, 1.0)).unwrap();
    e.step().unwrap();
    let hf = e.heights().unwrap();

    // The pre-step source now plays the sink role.
    let centre = 4 * 9 + 4;
    for (i, &v) in hf.sink().iter().enumerate() {
        assert_eq!(v, if i == centre { 512 } else { 0 }, "sink[{i}]");
    }

    // The new source holds the diffused ring.
    for (x, y) in [(3, 4), (5, 4), (4, 3), (4, 5)] {
        assert_eq!(hf.get(x, y), Some(248), "ring at ({x}, {y})");
    }
    assert_eq!(hf.get(4, 4), Some(0));
    assert_eq!(hf.get(3, 3), Some(0));
}

#[test]
fn four_by_four_touch_at_one_one() {
    let mut e = engine_over(gradient_image(4, 4));
    e.apply_touch(&touch(1, 1, 1.0)).unwrap();
    assert_eq!(e.heights().unwrap().source()[5], 512);

    e.step().unwrap();
    let hf = e.heights().unwrap();
    assert_eq!(hf.sink()[5], 512);
    let expected: [i16; 16] = [0, 248, 0, 0, 248, 0, 248, 0, 0, 248, 0, 0, 0, 0, 0, 0];
    assert_eq!(hf.source(), &expected);
}

#[test]
fn touch_strength_scales_added_height() {
    let mut e = engine_over(gradient_image(3, 3));
    e.apply_touch(&touch(0, 0, 0.5)).unwrap();
    e.apply_touch(&touch(2, 2, 0.0)).unwrap();
    let hf = e.heights().unwrap();
    assert_eq!(hf.get(0, 0), Some((MAX_RIPPLE_HEIGHT / 4) as i16));
    assert_eq!(hf.get(2, 2), Some(0));
}

#[test]
fn strength_bounds() {
    assert!(TouchPoint::new(0, 0, -0.1).is_err());
    assert!(TouchPoint::new(0, 0, 1.1).is_err());
    assert!(TouchPoint::new(0, 0, f32::NAN).is_err());
    assert!(TouchPoint::new(0, 0, 0.0).is_ok());
    assert!(TouchPoint::new(0, 0, 1.0).is_ok());
}

#[test]
fn out_of_bounds_touch_applies_nothing() {
    let mut e = engine_over(gradient_image(4, 4));
    let t = Touch::from_points([
        TouchPoint::new(1, 1, 1.0).unwrap(),
        TouchPoint::new(4, 0, 1.0).unwrap(),
    ]);
    assert!(matches!(
        e.apply_touch(&t),
        Err(RippleError::InvalidArgument { .. })
    ));
    assert!(e.heights().unwrap().is_at_rest());
}

// ── Decay ───────────────────────────────────────────────────────────

#[test]
fn rain_of_touches_settles_back_to_source() {
    let img = gradient_image(24, 16);
    let mut r = LockstepRipple::new(
        RippleConfig::sized(24, 16).unwrap(),
        StaticImageSupplier::new(img.clone()),
    )
    .unwrap();
    for i in 0..12u32 {
        r.submit_touch(touch((i * 7) % 24, (i * 5) % 16, 1.0)).unwrap();
    }
    let first_peak = {
        r.step_sync().unwrap();
        r.engine().heights().unwrap().max_magnitude()
    };
    assert!(first_peak > 0);
    for _ in 0..3000 {
        r.step_sync().unwrap();
    }
    assert!(r.engine().heights().unwrap().is_at_rest());
    assert_eq!(r.step_sync().unwrap().frame, &img);
}

// ── Barriers ────────────────────────────────────────────────────────

#[test]
fn touch_barrier_shields_source_grid() {
    let mut e = engine_over(gradient_image(8, 8));
    e.barriers_mut().push(Barrier::new(
        BarrierKind::TouchBlock,
        BarrierShape::circle(2.0, 2.0, 1.5).unwrap(),
    ));
    let t = Touch::from_points([
        TouchPoint::new(2, 2, 1.0).unwrap(),
        TouchPoint::new(6, 6, 1.0).unwrap(),
    ]);
    assert_eq!(e.apply_touch(&t).unwrap(), 1);
    let hf = e.heights().unwrap();
    assert_eq!(hf.get(2, 2), Some(0));
    assert_eq!(hf.get(6, 6), Some(512));

    e.step().unwrap();
    assert_eq!(e.last_metrics().touches_blocked, 1);
    assert_eq!(e.last_metrics().touches_applied, 1);
}

#[test]
fn inactive_barrier_never_matches() {
    let mut e = engine_over(gradient_image(6, 6));
    e.barriers_mut().push(
        Barrier::new(BarrierKind::Both, BarrierShape::uniform_padding(3).unwrap())
            .with_active(false),
    );
    assert_eq!(e.apply_touch(&touch(0, 0, 1.0)).unwrap(), 1);
    e.step().unwrap();
    assert_eq!(e.last_metrics().blocked_pixels, 0);
}

// ── Properties ──────────────────────────────────────────────────────

fn arb_image() -> impl Strategy<Value = PixelBuffer> {
    (1u32..20, 1u32..20).prop_flat_map(|(w, h)| {
        proptest::collection::vec(any::<u32>(), (w * h) as usize)
            .prop_map(move |pixels| PixelBuffer::new(w, h, pixels).unwrap())
    })
}

proptest! {
    #[test]
    fn untouched_water_is_a_fixed_point(img in arb_image(), steps in 1usize..40) {
        let mut e = engine_over(img.clone());
        for _ in 0..steps {
            let out = e.step().unwrap();
            prop_assert_eq!(out, &img);
        }
        prop_assert!(e.heights().unwrap().is_at_rest());
    }

    #[test]
    fn ripple_barrier_contains_pixels(
        w in 4u32..20,
        h in 4u32..20,
        bx in 0u32..8,
        by in 0u32..8,
        bw in 1u32..8,
        bh in 1u32..8,
        touches in proptest::collection::vec((0u32..20, 0u32..20, 0.0f32..=1.0), 1..12),
        steps in 1usize..12,
    ) {
        let img = gradient_image(w, h);
        let mut e = engine_over(img.clone());
        let barrier = Barrier::new(
            BarrierKind::RippleBlock,
            BarrierShape::rect(bx, by, bw, bh).unwrap(),
        );
        e.barriers_mut().push(barrier);
        for (x, y, s) in touches {
            e.apply_touch(&touch(x % w, y % h, s)).unwrap();
        }
        for _ in 0..steps {
            let out = e.step().unwrap().clone();
            let hf = e.heights().unwrap();
            for y in 0..h {
                for x in 0..w {
                    if barrier.contains_point(x, y, w, h) {
                        let i = (y * w + x) as usize;
                        prop_assert_eq!(out.pixels()[i], img.pixels()[i]);
                        prop_assert_eq!(hf.source()[i], 0);
                    }
                }
            }
        }
    }

    #[test]
    fn corner_touches_never_escape(
        w in 1u32..12,
        h in 1u32..12,
        steps in 1usize..30,
    ) {
        let mut e = engine_over(gradient_image(w, h));
        for (x, y) in [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)] {
            e.apply_touch(&touch(x, y, 1.0)).unwrap();
        }
        for _ in 0..steps {
            prop_assert_eq!(e.step().unwrap().size(), ImageSize::new(w, h).unwrap());
        }
    }

    #[test]
    fn resampled_source_matches_engine_size(
        src in arb_image(),
        w in 1u32..20,
        h in 1u32..20,
    ) {
        let mut e = RippleEngine::new(
            &RippleConfig::sized(w, h).unwrap(),
            ScriptedSupplier::new(vec![Some(src.clone())]),
        )
        .unwrap();
        let out = e.step().unwrap().clone();
        prop_assert_eq!(out.size(), ImageSize::new(w, h).unwrap());
        prop_assert_eq!(e.last_metrics().rescaled, src.size() != out.size());
    }
}
