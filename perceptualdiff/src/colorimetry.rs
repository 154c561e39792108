//! Colorimetry: gamma-encoded Adobe RGB (1998) to CIE XYZ and L*a*b*.
//!
//! Every pixel is linearized with the configured display gamma, mapped to
//! XYZ through the Adobe RGB matrix and then to L*a*b* relative to the
//! XYZ of RGB white. The luminance channel handed to the pyramid is the
//! linear Y scaled to cd/m^2, not L*.

use std::sync::LazyLock;

use rayon::prelude::*;
use rgb::RGBA;

use crate::consts::{ADOBE_RGB_TO_XYZ, LAB_EPSILON, LAB_KAPPA, MAX_CHANNEL_VALUE};
use crate::grid::PixelGrid;
use crate::image::ColorPlanes;

/// XYZ of Adobe RGB white, `(1, 1, 1)` through [`ADOBE_RGB_TO_XYZ`].
///
/// Computed once per process and shared by every Lab conversion.
pub static REFERENCE_WHITE: LazyLock<[f64; 3]> =
    LazyLock::new(|| adobe_rgb_to_xyz(1.0, 1.0, 1.0));

/// Converts linear Adobe RGB (1998), D65 white, to CIE XYZ.
#[inline]
#[must_use]
pub fn adobe_rgb_to_xyz(r: f64, g: f64, b: f64) -> [f64; 3] {
    let m = &ADOBE_RGB_TO_XYZ;
    [
        r * m[0][0] + g * m[0][1] + b * m[0][2],
        r * m[1][0] + g * m[1][1] + b * m[1][2],
        r * m[2][0] + g * m[2][1] + b * m[2][2],
    ]
}

/// Converts CIE XYZ to CIE L*a*b* relative to [`REFERENCE_WHITE`].
///
/// Returns `[L, a, b]`.
#[must_use]
pub fn xyz_to_lab(xyz: [f64; 3]) -> [f64; 3] {
    let white = &*REFERENCE_WHITE;
    let mut f = [0.0; 3];
    for i in 0..3 {
        let r = xyz[i] / white[i];
        f[i] = if r > LAB_EPSILON {
            r.powf(1.0 / 3.0)
        } else {
            (LAB_KAPPA * r + 16.0) / 116.0
        };
    }
    [
        116.0 * f[1] - 16.0,
        500.0 * (f[0] - f[1]),
        200.0 * (f[1] - f[2]),
    ]
}

/// Normalizes a 16-bit channel to [0, 1] and removes display gamma.
#[inline]
#[must_use]
pub fn linearize(channel: u16, gamma: f64) -> f64 {
    (f64::from(channel) / MAX_CHANNEL_VALUE).powf(gamma)
}

/// Premultiplies a straight-alpha channel, matching 16-bit integer compositing
/// over black.
#[inline]
#[must_use]
pub fn premultiply(channel: u16, alpha: u16) -> u16 {
    (u32::from(channel) * u32::from(alpha) / 0xffff) as u16
}

/// Premultiplies the color channels of a straight-alpha sample; alpha is
/// kept as is.
///
/// This is the form both the identity check and the color conversion see,
/// so color hidden under zero alpha never counts.
#[inline]
#[must_use]
pub fn premultiplied(px: RGBA<u16>) -> RGBA<u16> {
    RGBA::new(
        premultiply(px.r, px.a),
        premultiply(px.g, px.a),
        premultiply(px.b, px.a),
        px.a,
    )
}

/// Converts one pixel to `(luminance, a, b)`.
///
/// `luminance` is CIE Y multiplied by `white_luminance` (cd/m^2); `a` and `b`
/// are the L*a*b* chroma coordinates.
#[inline]
#[must_use]
pub fn convert_pixel(px: RGBA<u16>, gamma: f64, white_luminance: f64) -> (f64, f64, f64) {
    let px = premultiplied(px);
    let xyz = adobe_rgb_to_xyz(
        linearize(px.r, gamma),
        linearize(px.g, gamma),
        linearize(px.b, gamma),
    );
    let [_, a, b] = xyz_to_lab(xyz);
    (xyz[1] * white_luminance, a, b)
}

/// Converts a whole image into luminance and chroma planes.
///
/// Rows are converted in parallel; each task owns a disjoint row of every
/// output plane.
#[must_use]
pub fn convert_image<G: PixelGrid + ?Sized>(
    grid: &G,
    gamma: f64,
    white_luminance: f64,
) -> ColorPlanes {
    let width = grid.width();
    let height = grid.height();
    let mut planes = ColorPlanes::new(width, height);
    if width == 0 || height == 0 {
        return planes;
    }

    let ColorPlanes { lum, a, b } = &mut planes;
    lum.data_mut()
        .par_chunks_mut(width)
        .zip(a.data_mut().par_chunks_mut(width))
        .zip(b.data_mut().par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, ((lum_row, a_row), b_row))| {
            for x in 0..width {
                let (l, ca, cb) = convert_pixel(grid.rgba16(x, y), gamma, white_luminance);
                lum_row[x] = l;
                a_row[x] = ca;
                b_row[x] = cb;
            }
        });

    planes
}
