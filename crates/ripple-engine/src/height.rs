//! Double-buffered `i16` height field.
//!
//! Two grids of identical size alternate between the "source" role (read
//! for diffusion, target of touches) and the "sink" role (written by the
//! current step). [`swap`](HeightField::swap) flips an index; grids are
//! never copied or reallocated after construction.
//!
//! ```text
//! grids[0]  ←── source (even generations) / sink (odd)
//! grids[1]  ←── sink   (even generations) / source (odd)
//! ```

use ripple_core::ImageSize;

/// Two same-size height grids with swappable roles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightField {
    size: ImageSize,
    grids: [Vec<i16>; 2],
    source: usize,
}

impl HeightField {
    /// Zero-filled grids for an image of `size`.
    pub fn new(size: ImageSize) -> Self {
        let n = size.pixel_count();
        Self {
            size,
            grids: [vec![0; n], vec![0; n]],
            source: 0,
        }
    }

    /// Dimensions of both grids.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The grid read by the next step.
    pub fn source(&self) -> &[i16] {
        &self.grids[self.source]
    }

    /// The grid the next step writes.
    pub fn sink(&self) -> &[i16] {
        &self.grids[self.source ^ 1]
    }

    /// Which grid is currently the source (0 or 1).
    pub fn source_index(&self) -> usize {
        self.source
    }

    /// Source height at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<i16> {
        if !self.size.contains(x, y) {
            return None;
        }
        Some(self.source()[self.size.index(x, y)])
    }

    /// Borrow the source immutably and the sink mutably.
    pub(crate) fn split_mut(&mut self) -> (&[i16], &mut [i16]) {
        let (a, b) = self.grids.split_at_mut(1);
        if self.source == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    /// Exchange source and sink roles.
    pub(crate) fn swap(&mut self) {
        self.source ^= 1;
    }

    /// Add `delta` to the source cell at `index`, wrapping on overflow.
    pub(crate) fn add_to_source(&mut self, index: usize, delta: i32) {
        let cell = &mut self.grids[self.source][index];
        *cell = (i32::from(*cell)).wrapping_add(delta) as i16;
    }

    /// Largest absolute height across both grids.
    pub fn max_magnitude(&self) -> u16 {
        self.grids
            .iter()
            .flat_map(|g| g.iter())
            .map(|h| h.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Whether every cell of both grids is zero.
    pub fn is_at_rest(&self) -> bool {
        self.grids.iter().all(|g| g.iter().all(|&h| h == 0))
    }
}
