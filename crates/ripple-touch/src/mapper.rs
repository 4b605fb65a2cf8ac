//! Touch mappers: origin point + image bounds → [`Touch`].
//!
//! Every built-in mapper clips its shape to the image bounds, so the
//! touches it produces can be applied to an engine of the same size
//! without further checks. Parameters are validated at construction.

use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ripple_core::{ImageSize, RippleError, Touch, TouchPoint};

/// Maps a single origin point to the set of pixels it disturbs.
pub trait TouchMapper: Send + Sync {
    /// Produce the touch for `origin` on an image of size `bounds`.
    ///
    /// Points outside `bounds` are never returned; an origin that maps
    /// entirely outside yields an empty touch.
    fn map(&self, origin: (u32, u32), bounds: ImageSize) -> Touch;
}

fn check_strength(strength: f32) -> Result<(), RippleError> {
    TouchPoint::new(0, 0, strength).map(|_| ())
}

/// Exactly the origin pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SinglePixel {
    strength: f32,
}

impl SinglePixel {
    /// A single-pixel mapper with the given strength.
    pub fn new(strength: f32) -> Result<Self, RippleError> {
        check_strength(strength)?;
        Ok(Self { strength })
    }
}

impl TouchMapper for SinglePixel {
    fn map(&self, (x, y): (u32, u32), bounds: ImageSize) -> Touch {
        if !bounds.contains(x, y) {
            return Touch::empty();
        }
        TouchPoint::new(x, y, self.strength)
            .map(Touch::single)
            .unwrap_or_default()
    }
}

/// Every integer point within `diameter` of the origin, constant strength.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidCircle {
    diameter: u32,
    strength: f32,
}

impl SolidCircle {
    /// A solid disc. `diameter` must be at least 1.
    pub fn new(diameter: u32, strength: f32) -> Result<Self, RippleError> {
        if diameter == 0 {
            return Err(RippleError::invalid_argument("circle diameter must be >= 1"));
        }
        check_strength(strength)?;
        Ok(Self { diameter, strength })
    }

    /// Diameter in pixels.
    pub fn diameter(&self) -> u32 {
        self.diameter
    }
}

impl TouchMapper for SolidCircle {
    fn map(&self, (ox, oy): (u32, u32), bounds: ImageSize) -> Touch {
        let (ox, oy) = (ox as i64, oy as i64);
        let radius = self.diameter as f32 / 2.0;
        let r2 = radius * radius;
        let reach = (self.diameter / 2) as i64;
        let (w, h) = (bounds.width as i64, bounds.height as i64);
        let strength = self.strength;

        Touch::from_points(
            (oy - reach..=oy + reach)
                .flat_map(|y| (ox - reach..=ox + reach).map(move |x| (x, y)))
                .filter(|&(x, y)| {
                    let dx = (x - ox) as f32;
                    let dy = (y - oy) as f32;
                    dx * dx + dy * dy <= r2
                })
                .filter(|&(x, y)| x >= 0 && y >= 0 && x < w && y < h)
                .filter_map(|(x, y)| TouchPoint::new(x as u32, y as u32, strength).ok()),
        )
    }
}

/// An axis-aligned box centred on the origin, constant strength.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidRect {
    width: u32,
    height: u32,
    strength: f32,
}

impl SolidRect {
    /// A solid box of `width × height` pixels.
    pub fn new(width: u32, height: u32, strength: f32) -> Result<Self, RippleError> {
        if width == 0 || height == 0 {
            return Err(RippleError::invalid_argument(format!(
                "rect touch must have non-zero area, got {width}x{height}"
            )));
        }
        check_strength(strength)?;
        Ok(Self {
            width,
            height,
            strength,
        })
    }
}

impl TouchMapper for SolidRect {
    fn map(&self, (ox, oy): (u32, u32), bounds: ImageSize) -> Touch {
        let x0 = ox as i64 - (self.width / 2) as i64;
        let y0 = oy as i64 - (self.height / 2) as i64;
        let x_lo = x0.max(0);
        let y_lo = y0.max(0);
        let x_hi = (x0 + self.width as i64).min(bounds.width as i64);
        let y_hi = (y0 + self.height as i64).min(bounds.height as i64);
        let strength = self.strength;

        Touch::from_points(
            (y_lo..y_hi)
                .flat_map(|y| (x_lo..x_hi).map(move |x| (x, y)))
                .filter_map(|(x, y)| TouchPoint::new(x as u32, y as u32, strength).ok()),
        )
    }
}

/// A raindrop: a solid circle whose strength is drawn at random on every
/// call, with a diameter that grows with the strength.
///
/// `diameter = max(1, round(strength * max_diameter))`, so heavier drops
/// splash wider. The RNG is a seeded ChaCha8 stream, giving identical drop
/// sequences for identical seeds.
pub struct RainMapper {
    min_strength: f32,
    max_strength: f32,
    max_diameter: u32,
    rng: Mutex<ChaCha8Rng>,
}

/// Builder for [`RainMapper`].
pub struct RainMapperBuilder {
    min_strength: f32,
    max_strength: f32,
    max_diameter: u32,
    seed: u64,
}

impl RainMapper {
    /// Create a builder with defaults: strength in `[0.2, 1.0]`,
    /// maximum diameter 9, seed 0.
    pub fn builder() -> RainMapperBuilder {
        RainMapperBuilder {
            min_strength: 0.2,
            max_strength: 1.0,
            max_diameter: 9,
            seed: 0,
        }
    }

    fn draw_strength(&self) -> f32 {
        if self.min_strength == self.max_strength {
            return self.min_strength;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(self.min_strength..=self.max_strength)
    }

    fn diameter_for(&self, strength: f32) -> u32 {
        ((strength * self.max_diameter as f32).round() as u32).max(1)
    }
}

impl RainMapperBuilder {
    /// Lower bound of the random strength (default 0.2).
    pub fn min_strength(mut self, strength: f32) -> Self {
        self.min_strength = strength;
        self
    }

    /// Upper bound of the random strength (default 1.0).
    pub fn max_strength(mut self, strength: f32) -> Self {
        self.max_strength = strength;
        self
    }

    /// Diameter of a full-strength drop (default 9).
    pub fn max_diameter(mut self, diameter: u32) -> Self {
        self.max_diameter = diameter;
        self
    }

    /// Seed for the strength RNG (default 0).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the mapper, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::InvalidArgument`] if either strength bound is
    /// outside `[0, 1]`, `min_strength > max_strength`, or
    /// `max_diameter` is zero.
    pub fn build(self) -> Result<RainMapper, RippleError> {
        check_strength(self.min_strength)?;
        check_strength(self.max_strength)?;
        if self.min_strength > self.max_strength {
            return Err(RippleError::invalid_argument(format!(
                "min_strength {} exceeds max_strength {}",
                self.min_strength, self.max_strength
            )));
        }
        if self.max_diameter == 0 {
            return Err(RippleError::invalid_argument("max_diameter must be >= 1"));
        }
        Ok(RainMapper {
            min_strength: self.min_strength,
            max_strength: self.max_strength,
            max_diameter: self.max_diameter,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(self.seed)),
        })
    }
}

impl TouchMapper for RainMapper {
    fn map(&self, origin: (u32, u32), bounds: ImageSize) -> Touch {
        let strength = self.draw_strength();
        let drop = SolidCircle {
            diameter: self.diameter_for(strength),
            strength,
        };
        drop.map(origin, bounds)
    }
}

/// Union of the touches of several mappers for the same origin.
#[derive(Default)]
pub struct CompoundMapper {
    mappers: Vec<Box<dyn TouchMapper>>,
}

impl CompoundMapper {
    /// Combine `mappers`.
    pub fn new(mappers: Vec<Box<dyn TouchMapper>>) -> Self {
        Self { mappers }
    }

    /// Builder-style append.
    pub fn with(mut self, mapper: impl TouchMapper + 'static) -> Self {
        self.mappers.push(Box::new(mapper));
        self
    }
}

impl TouchMapper for CompoundMapper {
    fn map(&self, origin: (u32, u32), bounds: ImageSize) -> Touch {
        Touch::compound(self.mappers.iter().map(|m| m.map(origin, bounds)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn size(w: u32, h: u32) -> ImageSize {
        ImageSize::new(w, h).unwrap()
    }

    fn coords(t: &Touch) -> Vec<(u32, u32)> {
        t.iter().map(|p| (p.x(), p.y())).collect()
    }

    #[test]
    fn single_pixel_maps_origin() {
        let m = SinglePixel::new(0.5).unwrap();
        let t = m.map((3, 4), size(10, 10));
        assert_eq!(coords(&t), vec![(3, 4)]);
        assert_eq!(t.points()[0].strength(), 0.5);
        assert!(m.map((10, 4), size(10, 10)).is_empty());
    }

    #[test]
    fn invalid_strength_rejected() {
        assert!(SinglePixel::new(1.5).is_err());
        assert!(SolidCircle::new(3, -0.1).is_err());
        assert!(SolidRect::new(2, 2, f32::NAN).is_err());
        assert!(SolidCircle::new(0, 0.5).is_err());
        assert!(SolidRect::new(0, 2, 0.5).is_err());
    }

    #[test]
    fn circle_diameter_one_is_single_pixel() {
        let t = SolidCircle::new(1, 1.0).unwrap().map((5, 5), size(10, 10));
        assert_eq!(coords(&t), vec![(5, 5)]);
    }

    #[test]
    fn circle_diameter_three_is_full_block() {
        let t = SolidCircle::new(3, 1.0).unwrap().map((5, 5), size(10, 10));
        assert_eq!(t.len(), 9);
    }

    #[test]
    fn circle_diameter_four_is_rounded() {
        let t = SolidCircle::new(4, 1.0).unwrap().map((5, 5), size(20, 20));
        let pts = coords(&t);
        assert!(pts.contains(&(7, 5)));
        assert!(pts.contains(&(5, 3)));
        assert!(!pts.contains(&(7, 7)));
        assert!(pts.contains(&(6, 6)));
    }

    #[test]
    fn circle_clips_at_corner() {
        let t = SolidCircle::new(3, 1.0).unwrap().map((0, 0), size(10, 10));
        let mut pts = coords(&t);
        pts.sort();
        assert_eq!(pts, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn rect_is_centred_and_clipped() {
        let m = SolidRect::new(3, 2, 0.25).unwrap();
        let t = m.map((5, 5), size(10, 10));
        let mut pts = coords(&t);
        pts.sort();
        assert_eq!(pts, vec![(4, 4), (4, 5), (5, 4), (5, 5), (6, 4), (6, 5)]);

        let edge = m.map((9, 0), size(10, 10));
        let mut pts = coords(&edge);
        pts.sort();
        assert_eq!(pts, vec![(8, 0), (9, 0)]);
    }

    #[test]
    fn rain_builder_validates() {
        assert!(RainMapper::builder().min_strength(-0.5).build().is_err());
        assert!(RainMapper::builder().max_strength(2.0).build().is_err());
        assert!(RainMapper::builder()
            .min_strength(0.8)
            .max_strength(0.2)
            .build()
            .is_err());
        assert!(RainMapper::builder().max_diameter(0).build().is_err());
    }

    #[test]
    fn rain_fixed_strength_sets_diameter() {
        let m = RainMapper::builder()
            .min_strength(1.0)
            .max_strength(1.0)
            .max_diameter(3)
            .build()
            .unwrap();
        let t = m.map((5, 5), size(10, 10));
        assert_eq!(t.len(), 9);
        assert!(t.iter().all(|p| p.strength() == 1.0));
    }

    #[test]
    fn rain_is_deterministic_per_seed() {
        let a = RainMapper::builder().seed(7).build().unwrap();
        let b = RainMapper::builder().seed(7).build().unwrap();
        for _ in 0..20 {
            assert_eq!(a.map((8, 8), size(16, 16)), b.map((8, 8), size(16, 16)));
        }
    }

    #[test]
    fn compound_mapper_unions_shapes() {
        let m = CompoundMapper::default()
            .with(SinglePixel::new(1.0).unwrap())
            .with(SolidRect::new(3, 1, 1.0).unwrap());
        let t = m.map((5, 5), size(10, 10));
        let mut pts = coords(&t);
        pts.sort();
        assert_eq!(pts, vec![(4, 5), (5, 5), (6, 5)]);
    }

    proptest! {
        #[test]
        fn rain_points_stay_in_bounds(
            seed in any::<u64>(), x in 0u32..12, y in 0u32..12,
        ) {
            let m = RainMapper::builder().seed(seed).max_diameter(15).build().unwrap();
            let bounds = size(12, 12);
            let t = m.map((x, y), bounds);
            prop_assert!(!t.is_empty());
            for p in t.iter() {
                prop_assert!(bounds.contains(p.x(), p.y()));
                prop_assert!((0.2..=1.0).contains(&p.strength()));
            }
        }

        #[test]
        fn heavier_drops_are_not_smaller(seed in any::<u64>()) {
            let light = RainMapper::builder().min_strength(0.2).max_strength(0.2).seed(seed).build().unwrap();
            let heavy = RainMapper::builder().min_strength(1.0).max_strength(1.0).seed(seed).build().unwrap();
            let bounds = size(64, 64);
            prop_assert!(heavy.map((32, 32), bounds).len() >= light.map((32, 32), bounds).len());
        }
    }
}
