//! Laplacian-style pyramid of successively blurred luminance.
//!
//! Level 0 is the luminance plane itself; every further level is the
//! previous one convolved with the 5x5 outer product of [`PYRAMID_KERNEL`].
//! Levels are never downsampled, so all of them share level 0's dimensions.
//!
//! Boundary handling reflects an out-of-range coordinate around zero first
//! (`abs`) and then around the far edge (`2 * dim - idx - 1`). This differs
//! from clamping and from plain mirroring near the edges, and the numbers
//! depend on it.
//!
//! Interior columns are computed four at a time with `f64x4`. Each lane adds
//! the same `(kx * ky) * v` products in the same order as the scalar path,
//! so both paths produce identical bits.

use rayon::prelude::*;
use wide::f64x4;

use crate::consts::{MAX_PYR_LEVELS, PYRAMID_KERNEL, PYRAMID_KERNEL_RADIUS};
use crate::image::PlaneF64;

const TAPS: usize = 2 * PYRAMID_KERNEL_RADIUS + 1;

/// Successively blurred copies of one luminance plane.
#[derive(Debug, Clone)]
pub struct Pyramid {
    width: usize,
    height: usize,
    levels: Vec<PlaneF64>,
}

impl Pyramid {
    /// Builds all [`MAX_PYR_LEVELS`] levels, taking ownership of `base` as
    /// level 0.
    ///
    /// Images with at most one pixel have nothing to blur; their levels are
    /// copies of level 0.
    #[must_use]
    pub fn build(base: PlaneF64) -> Self {
        let width = base.width();
        let height = base.height();

        let mut levels = Vec::with_capacity(MAX_PYR_LEVELS);
        levels.push(base);
        for i in 1..MAX_PYR_LEVELS {
            let next = if width * height <= 1 {
                levels[i - 1].clone()
            } else {
                convolve(&levels[i - 1])
            };
            levels.push(next);
        }

        Self {
            width,
            height,
            levels,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Value at `(x, y)` of `level`. Coordinates and level are trusted.
    #[inline]
    #[must_use]
    pub fn get_value(&self, x: usize, y: usize, level: usize) -> f64 {
        self.level(level).get(x, y)
    }

    /// Returns one level as a plane.
    #[inline]
    #[must_use]
    pub fn level(&self, level: usize) -> &PlaneF64 {
        &self.levels[level]
    }
}

/// Maps a possibly out-of-range coordinate back into `[0, dim)`.
///
/// For `dim == 1` the far-edge reflection of offset 2 would land at -1; it
/// saturates to 0, the only valid index.
#[inline]
fn reflect(coord: isize, dim: usize) -> usize {
    let c = coord.unsigned_abs();
    if c < dim {
        c
    } else {
        (2 * dim).saturating_sub(c + 1)
    }
}

/// One 5x5 blur step over a whole plane, rows in parallel.
fn convolve(src: &PlaneF64) -> PlaneF64 {
    let width = src.width();
    let mut out = PlaneF64::new(width, src.height());
    if src.is_empty() {
        return out;
    }

    out.data_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row_out)| convolve_row(src, y, row_out));

    out
}

fn convolve_row(src: &PlaneF64, y: usize, out: &mut [f64]) {
    let width = src.width();
    let height = src.height();

    let rows: [&[f64]; TAPS] = std::array::from_fn(|j| {
        let ny = reflect(y as isize + j as isize - PYRAMID_KERNEL_RADIUS as isize, height);
        src.row(ny)
    });

    // Columns whose whole horizontal footprint is inside the row.
    let (start, end) = if width > 2 * PYRAMID_KERNEL_RADIUS {
        (PYRAMID_KERNEL_RADIUS, width - PYRAMID_KERNEL_RADIUS)
    } else {
        (width, width)
    };

    for x in (0..start).chain(end..width) {
        out[x] = convolve_pixel(&rows, x, width);
    }
    if start < end {
        convolve_interior(&rows, start, end, width, out);
    }
}

/// Scalar 5x5 tap sum at column `x`; x offset outer, y offset inner.
#[inline]
fn convolve_pixel(rows: &[&[f64]; TAPS], x: usize, width: usize) -> f64 {
    let mut result = 0.0;
    for i in 0..TAPS {
        let nx = reflect(x as isize + i as isize - PYRAMID_KERNEL_RADIUS as isize, width);
        for j in 0..TAPS {
            result += PYRAMID_KERNEL[i] * PYRAMID_KERNEL[j] * rows[j][nx];
        }
    }
    result
}

/// Interior columns `start..end`, four lanes at a time.
#[multiversion::multiversion(targets(
    "x86_64+avx+avx2+fma",
    "x86_64+sse4.1",
    "aarch64+neon",
))]
fn convolve_interior(
    rows: &[&[f64]; TAPS],
    start: usize,
    end: usize,
    width: usize,
    out: &mut [f64],
) {
    let mut x = start;
    while x + 4 <= end {
        let mut acc = f64x4::splat(0.0);
        for i in 0..TAPS {
            let base = x + i - PYRAMID_KERNEL_RADIUS;
            for j in 0..TAPS {
                let coef = f64x4::splat(PYRAMID_KERNEL[i] * PYRAMID_KERNEL[j]);
                let s = &rows[j][base..base + 4];
                acc += coef * f64x4::new([s[0], s[1], s[2], s[3]]);
            }
        }
        out[x..x + 4].copy_from_slice(&acc.to_array());
        x += 4;
    }

    for x in x..end {
        out[x] = convolve_pixel(rows, x, width);
    }
}
