//! The per-pixel diffusion and refraction pass.
//!
//! Diffusion reads only the source grid (pre-step values) and the sink's
//! previous contents; refraction samples the source image at a position
//! displaced toward or away from the image centre by the new height.
//! Neighbours outside the image contribute nothing (fixed shoreline).

use ripple_core::{BarrierSet, BlockPurpose, ImageSize, MAX_RIPPLE_HEIGHT};
use smallvec::SmallVec;

use crate::height::HeightField;

/// Flat indices of the 4-connected in-bounds neighbours of `(x, y)`.
pub(crate) fn neighbours_flat(x: u32, y: u32, size: ImageSize) -> SmallVec<[usize; 4]> {
    let (w, h) = (size.width as i64, size.height as i64);
    let offsets: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
    let mut result = SmallVec::new();
    for (dx, dy) in offsets {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx >= 0 && ny >= 0 && nx < w && ny < h {
            result.push(ny as usize * w as usize + nx as usize);
        }
    }
    result
}

/// New height from the neighbour sum and the cell's previous sink value.
///
/// Shifts are arithmetic, so negative values floor. The final store wraps
/// to `i16`.
#[inline]
pub(crate) fn diffuse(neighbour_sum: i32, previous: i16) -> i16 {
    let base = (neighbour_sum >> 1) - i32::from(previous);
    (base - (base >> 5)) as i16
}

/// Refracted coordinate along one axis of length `len`.
#[inline]
pub(crate) fn refract_axis(coord: u32, len: u32, height: i16) -> u32 {
    let half = (len / 2) as f32;
    let perspective = (MAX_RIPPLE_HEIGHT - i32::from(height)) as f32;
    let shifted = half + (coord as f32 - half) * perspective / MAX_RIPPLE_HEIGHT as f32;
    shifted.round().clamp(0.0, (len - 1) as f32) as u32
}

/// Run one pass over every pixel: write new heights into the sink and the
/// refracted colours into `out`. Does not swap roles.
///
/// Returns the number of ripple-blocked pixels.
pub(crate) fn run_pass(
    heights: &mut HeightField,
    src_color: &[u32],
    out: &mut [u32],
    barriers: &BarrierSet,
) -> u32 {
    let size = heights.size();
    let (w, h) = (size.width, size.height);
    let check_barriers = barriers.any_active(BlockPurpose::Ripple);
    let (source, sink) = heights.split_mut();
    let mut blocked = 0;

    for y in 0..h {
        for x in 0..w {
            let i = size.index(x, y);
            if check_barriers && barriers.blocks(BlockPurpose::Ripple, x, y, w, h) {
                sink[i] = 0;
                out[i] = src_color[i];
                blocked += 1;
                continue;
            }
            let sum: i32 = neighbours_flat(x, y, size)
                .iter()
                .map(|&ni| i32::from(source[ni]))
                .sum();
            let new = diffuse(sum, sink[i]);
            sink[i] = new;

            let sx = refract_axis(x, w, new);
            let sy = refract_axis(y, h, new);
            out[i] = src_color[size.index(sx, sy)];
        }
    }
    blocked
}
