//! Psychophysical model of contrast detection.
//!
//! Pure functions, no shared state:
//! - `csf`: contrast sensitivity vs. spatial frequency (Barten, SPIE 1989)
//! - `mask`: visual masking (Daly 1993)
//! - `tvi`: threshold vs. intensity (Ward Larson, Siggraph 1997)
//! - `adaptation_level`: pyramid level standing in for adapted luminance

use std::f64::consts::PI;

use crate::consts::MAX_PYR_LEVELS;

/// Degrees to radians, as `deg * PI / 180`.
#[inline]
#[must_use]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Radians to degrees, as `rad * 180 / PI`.
#[inline]
#[must_use]
pub fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / PI
}

/// Width, in pixel-degrees, subtended by the field of view.
///
/// `pixels_per_degree = image_width / one_degree_pixels(fov)`.
#[inline]
#[must_use]
pub fn one_degree_pixels(field_of_view: f64) -> f64 {
    to_degrees(2.0 * (field_of_view * to_radians(0.5)).tan())
}

/// Threshold of visibility in cd/m^2 for a given adaptation luminance.
///
/// Five-branch piecewise fit in `log10(adaptation_luminance)`.
#[must_use]
pub fn tvi(adaptation_luminance: f64) -> f64 {
    let log_a = adaptation_luminance.log10();

    let r = if log_a < -3.94 {
        -2.86
    } else if log_a < -1.44 {
        (0.405 * log_a + 1.6).powf(2.18) - 2.86
    } else if log_a < -0.0184 {
        log_a - 0.395
    } else if log_a < 1.9 {
        (0.249 * log_a + 0.65).powf(2.7) - 0.72
    } else {
        log_a - 1.255
    };

    10.0_f64.powf(r)
}

/// Contrast sensitivity at `cpd` cycles per degree and luminance `lum`.
#[must_use]
pub fn csf(cpd: f64, lum: f64) -> f64 {
    let a = 440.0 * (1.0 + 0.7 / lum).powf(-0.2);
    let b = 0.3 * (1.0 + 100.0 / lum).powf(0.15);

    a * cpd * (-b * cpd).exp() * (1.0 + 0.06 * (b * cpd).exp()).sqrt()
}

/// Threshold elevation caused by masking at the given normalized contrast.
#[must_use]
pub fn mask(contrast: f64) -> f64 {
    let a = (392.498 * contrast).powf(0.7);
    let b = (0.0153 * a).powf(4.0);
    (1.0 + b).powf(0.25)
}

/// Picks the pyramid level treated as the adaptation luminance.
///
/// Returns the first level at which a pixel count doubling from 1 exceeds
/// `num_one_degree_pixels`, or the coarsest level if it never does.
#[must_use]
pub fn adaptation_level(num_one_degree_pixels: f64) -> usize {
    let mut num_pixels = 1.0;
    let mut level = 0;
    for i in 0..MAX_PYR_LEVELS {
        level = i;
        if num_pixels > num_one_degree_pixels {
            break;
        }
        num_pixels *= 2.0;
    }
    level
}
