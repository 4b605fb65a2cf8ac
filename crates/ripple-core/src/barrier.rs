//! Barriers: regions that block ripple propagation, touch injection, or both.
//!
//! Every shape test is O(1) and allocation-free, since the engine evaluates
//! the ripple-blocking predicate once per pixel per step.

use crate::error::RippleError;

/// What a barrier suppresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BarrierKind {
    /// Heights inside the shape are forced to zero and the true image
    /// shows through. Touches inside still inject energy.
    RippleBlock,
    /// New disturbances originating inside the shape are dropped.
    TouchBlock,
    /// Full occlusion: both of the above.
    Both,
}

impl BarrierKind {
    /// Whether this kind suppresses ripple propagation.
    pub fn blocks_ripples(self) -> bool {
        matches!(self, Self::RippleBlock | Self::Both)
    }

    /// Whether this kind suppresses touch injection.
    pub fn blocks_touches(self) -> bool {
        matches!(self, Self::TouchBlock | Self::Both)
    }

    /// Whether this kind applies to `purpose`.
    pub fn blocks(self, purpose: BlockPurpose) -> bool {
        match purpose {
            BlockPurpose::Ripple => self.blocks_ripples(),
            BlockPurpose::Touch => self.blocks_touches(),
        }
    }
}

/// The question a containment test answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockPurpose {
    /// Is propagation blocked here?
    Ripple,
    /// Is touch injection blocked here?
    Touch,
}

/// Geometry of a barrier in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BarrierShape {
    /// Axis-aligned rectangle, `[x, x + width) × [y, y + height)`.
    Rect {
        /// Left edge (inclusive).
        x: u32,
        /// Top edge (inclusive).
        y: u32,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Disc of `radius` around `(cx, cy)`, boundary included.
    Circle {
        /// Centre column.
        cx: f32,
        /// Centre row.
        cy: f32,
        /// Radius in pixels.
        radius: f32,
    },
    /// Axis-aligned ellipse around `(cx, cy)`, boundary included.
    Ellipse {
        /// Centre column.
        cx: f32,
        /// Centre row.
        cy: f32,
        /// Horizontal semi-axis.
        rx: f32,
        /// Vertical semi-axis.
        ry: f32,
    },
    /// Band along the image edges: every pixel within the given inset of
    /// the matching edge.
    Padding {
        /// Rows blocked from the top edge.
        top: u32,
        /// Columns blocked from the right edge.
        right: u32,
        /// Rows blocked from the bottom edge.
        bottom: u32,
        /// Columns blocked from the left edge.
        left: u32,
    },
}

fn positive(name: &str, v: f32) -> Result<(), RippleError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(RippleError::invalid_argument(format!(
            "{name} must be finite and > 0, got {v}"
        )))
    }
}

fn finite(name: &str, v: f32) -> Result<(), RippleError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(RippleError::invalid_argument(format!(
            "{name} must be finite, got {v}"
        )))
    }
}

impl BarrierShape {
    /// Rectangle with top-left `(x, y)`. Zero-area rectangles are rejected.
    pub fn rect(x: u32, y: u32, width: u32, height: u32) -> Result<Self, RippleError> {
        if width == 0 || height == 0 {
            return Err(RippleError::invalid_argument(format!(
                "rect must have non-zero area, got {width}x{height}"
            )));
        }
        Ok(Self::Rect {
            x,
            y,
            width,
            height,
        })
    }

    /// Circle centred on `(cx, cy)`.
    pub fn circle(cx: f32, cy: f32, radius: f32) -> Result<Self, RippleError> {
        finite("cx", cx)?;
        finite("cy", cy)?;
        positive("radius", radius)?;
        Ok(Self::Circle { cx, cy, radius })
    }

    /// Ellipse centred on `(cx, cy)` with semi-axes `rx`, `ry`.
    pub fn ellipse(cx: f32, cy: f32, rx: f32, ry: f32) -> Result<Self, RippleError> {
        finite("cx", cx)?;
        finite("cy", cy)?;
        positive("rx", rx)?;
        positive("ry", ry)?;
        Ok(Self::Ellipse { cx, cy, rx, ry })
    }

    /// Edge band with per-side insets. At least one inset must be non-zero.
    pub fn padding(top: u32, right: u32, bottom: u32, left: u32) -> Result<Self, RippleError> {
        if top == 0 && right == 0 && bottom == 0 && left == 0 {
            return Err(RippleError::invalid_argument(
                "padding must block at least one edge",
            ));
        }
        Ok(Self::Padding {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Same inset on every side.
    pub fn uniform_padding(inset: u32) -> Result<Self, RippleError> {
        Self::padding(inset, inset, inset, inset)
    }

    /// Whether `(x, y)` lies inside the shape on a `width × height` image.
    #[inline]
    pub fn contains(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        match *self {
            Self::Rect {
                x: rx,
                y: ry,
                width: rw,
                height: rh,
            } => {
                let (x, y) = (x as u64, y as u64);
                x >= rx as u64
                    && x < rx as u64 + rw as u64
                    && y >= ry as u64
                    && y < ry as u64 + rh as u64
            }
            Self::Circle { cx, cy, radius } => {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                dx * dx + dy * dy <= radius * radius
            }
            Self::Ellipse { cx, cy, rx, ry } => {
                let nx = (x as f32 - cx) / rx;
                let ny = (y as f32 - cy) / ry;
                nx * nx + ny * ny <= 1.0
            }
            Self::Padding {
                top,
                right,
                bottom,
                left,
            } => {
                x < left
                    || y < top
                    || x >= width.saturating_sub(right)
                    || y >= height.saturating_sub(bottom)
            }
        }
    }
}

/// A shape with a kind and an on/off switch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Barrier {
    kind: BarrierKind,
    active: bool,
    shape: BarrierShape,
}

impl Barrier {
    /// An active barrier.
    pub fn new(kind: BarrierKind, shape: BarrierShape) -> Self {
        Self {
            kind,
            active: true,
            shape,
        }
    }

    /// Builder-style activation flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// The barrier's kind.
    pub fn kind(&self) -> BarrierKind {
        self.kind
    }

    /// The barrier's shape.
    pub fn shape(&self) -> &BarrierShape {
        &self.shape
    }

    /// Whether the barrier currently participates in containment tests.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Turn the barrier on or off.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether an active barrier covers `(x, y)`. Inactive barriers never
    /// contain anything.
    #[inline]
    pub fn contains_point(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        self.active && self.shape.contains(x, y, width, height)
    }

    /// Whether this barrier blocks `purpose` at `(x, y)`.
    #[inline]
    pub fn blocks(&self, purpose: BlockPurpose, x: u32, y: u32, width: u32, height: u32) -> bool {
        self.kind.blocks(purpose) && self.contains_point(x, y, width, height)
    }
}

/// Any-of group of barriers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BarrierSet {
    barriers: Vec<Barrier>,
}

impl BarrierSet {
    /// An empty set; blocks nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a barrier, returning its index.
    pub fn push(&mut self, barrier: Barrier) -> usize {
        self.barriers.push(barrier);
        self.barriers.len() - 1
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, barrier: Barrier) -> Self {
        self.barriers.push(barrier);
        self
    }

    /// Number of barriers, active or not.
    pub fn len(&self) -> usize {
        self.barriers.len()
    }

    /// Whether the set has no barriers.
    pub fn is_empty(&self) -> bool {
        self.barriers.is_empty()
    }

    /// Iterate over the barriers.
    pub fn iter(&self) -> std::slice::Iter<'_, Barrier> {
        self.barriers.iter()
    }

    /// Barrier at `index`.
    pub fn get(&self, index: usize) -> Option<&Barrier> {
        self.barriers.get(index)
    }

    /// Mutable barrier at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Barrier> {
        self.barriers.get_mut(index)
    }

    /// Toggle the barrier at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::InvalidArgument`] if `index` is out of range.
    pub fn set_active(&mut self, index: usize, active: bool) -> Result<(), RippleError> {
        let len = self.barriers.len();
        let barrier = self.barriers.get_mut(index).ok_or_else(|| {
            RippleError::invalid_argument(format!("barrier index {index} out of range ({len})"))
        })?;
        barrier.set_active(active);
        Ok(())
    }

    /// Whether any active barrier covers `(x, y)`, regardless of kind.
    pub fn contains_point(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        self.barriers
            .iter()
            .any(|b| b.contains_point(x, y, width, height))
    }

    /// Whether any active barrier of a matching kind blocks `purpose` at `(x, y)`.
    #[inline]
    pub fn blocks(&self, purpose: BlockPurpose, x: u32, y: u32, width: u32, height: u32) -> bool {
        self.barriers
            .iter()
            .any(|b| b.blocks(purpose, x, y, width, height))
    }

    /// Whether any active barrier applies to `purpose` at all. Lets the
    /// engine skip the per-pixel test when nothing can match.
    pub fn any_active(&self, purpose: BlockPurpose) -> bool {
        self.barriers
            .iter()
            .any(|b| b.is_active() && b.kind().blocks(purpose))
    }
}

impl FromIterator<Barrier> for BarrierSet {
    fn from_iter<I: IntoIterator<Item = Barrier>>(iter: I) -> Self {
        Self {
            barriers: iter.into_iter().collect(),
        }
    }
}
