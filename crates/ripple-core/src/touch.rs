//! Touch points and touches.
//!
//! A [`TouchPoint`] is one disturbed pixel with a strength in `[0, 1]`.
//! A [`Touch`] is a de-duplicated set of points applied together. A
//! compound touch keeps its parts and merges their points on first
//! access.

use std::sync::OnceLock;

use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::error::RippleError;
use crate::MAX_RIPPLE_HEIGHT;

/// A single perturbed pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    x: u32,
    y: u32,
    strength: f32,
}

impl TouchPoint {
    /// Create a touch point.
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::InvalidArgument`] if `strength` is outside
    /// `[0, 1]` or NaN.
    pub fn new(x: u32, y: u32, strength: f32) -> Result<Self, RippleError> {
        if !(0.0..=1.0).contains(&strength) {
            return Err(RippleError::invalid_argument(format!(
                "touch strength must be within [0, 1], got {strength}"
            )));
        }
        Ok(Self { x, y, strength })
    }

    /// Column of the point.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row of the point.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Strength in `[0, 1]`.
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Height added to the source grid when this point is applied:
    /// `strength * MAX_RIPPLE_HEIGHT / 2`, integer division.
    pub fn added_height(&self) -> i32 {
        (self.strength * MAX_RIPPLE_HEIGHT as f32) as i32 / 2
    }

    fn key(&self) -> (u32, u32, u32) {
        (self.x, self.y, self.strength.to_bits())
    }
}

type PointVec = SmallVec<[TouchPoint; 4]>;

#[derive(Clone, Debug)]
enum Points {
    Simple(PointVec),
    Compound {
        parts: Vec<Touch>,
        merged: OnceLock<Vec<TouchPoint>>,
    },
}

/// A set of touch points applied to the height field in one go.
#[derive(Clone, Debug)]
pub struct Touch {
    points: Points,
}

impl Touch {
    /// A touch with no points.
    pub fn empty() -> Self {
        Self {
            points: Points::Simple(PointVec::new()),
        }
    }

    /// A touch consisting of exactly one point.
    pub fn single(point: TouchPoint) -> Self {
        let mut points = PointVec::new();
        points.push(point);
        Self {
            points: Points::Simple(points),
        }
    }

    /// A touch from a sequence of points. Duplicate points are dropped,
    /// first occurrence wins.
    pub fn from_points(points: impl IntoIterator<Item = TouchPoint>) -> Self {
        Self {
            points: Points::Simple(dedup(points).collect()),
        }
    }

    /// The union of several touches. Points are merged lazily.
    pub fn compound(parts: Vec<Touch>) -> Self {
        Self {
            points: Points::Compound {
                parts,
                merged: OnceLock::new(),
            },
        }
    }

    /// All points in this touch, without duplicates.
    pub fn points(&self) -> &[TouchPoint] {
        match &self.points {
            Points::Simple(points) => points.as_slice(),
            Points::Compound { parts, merged } => merged
                .get_or_init(|| {
                    dedup(parts.iter().flat_map(|t| t.points().iter().copied())).collect()
                })
                .as_slice(),
        }
    }

    /// Iterate over the points.
    pub fn iter(&self) -> std::slice::Iter<'_, TouchPoint> {
        self.points().iter()
    }

    /// Number of distinct points.
    pub fn len(&self) -> usize {
        self.points().len()
    }

    /// Whether the touch has no points.
    pub fn is_empty(&self) -> bool {
        self.points().is_empty()
    }
}

fn dedup(points: impl IntoIterator<Item = TouchPoint>) -> impl Iterator<Item = TouchPoint> {
    let mut seen = IndexSet::new();
    points.into_iter().filter(move |p| seen.insert(p.key()))
}

impl Default for Touch {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Touch {
    fn eq(&self, other: &Self) -> bool {
        self.points() == other.points()
    }
}

impl From<TouchPoint> for Touch {
    fn from(point: TouchPoint) -> Self {
        Self::single(point)
    }
}

impl<'a> IntoIterator for &'a Touch {
    type Item = &'a TouchPoint;
    type IntoIter = std::slice::Iter<'a, TouchPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
