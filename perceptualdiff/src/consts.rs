//! Constants for the perceptual difference metric.
//!
//! Values are the calibrated figures from Yee's "A Perceptual Metric for
//! Production Testing" (Journal of Graphics Tools, 2004) and the models it
//! cites. They must not be rounded or re-derived.

// ============================================================================
// Colorimetry
// ============================================================================

/// Adobe RGB (1998) to CIE XYZ matrix, D65 reference white, row-major.
///
/// From <http://www.brucelindbloom.com/>.
pub const ADOBE_RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.576700, 0.185556, 0.188212],
    [0.297361, 0.627355, 0.0752847],
    [0.0270328, 0.0706879, 0.991248],
];

/// CIE L*a*b* linear/cube-root branch threshold (216/24389).
pub const LAB_EPSILON: f64 = 216.0 / 24389.0;

/// CIE L*a*b* linear branch slope (24389/27).
pub const LAB_KAPPA: f64 = 24389.0 / 27.0;

/// Largest 16-bit channel value; normalizes raw samples to [0, 1].
pub const MAX_CHANNEL_VALUE: f64 = 65535.0;

// ============================================================================
// Laplacian pyramid
// ============================================================================

/// Number of pyramid levels built per image.
pub const MAX_PYR_LEVELS: usize = 8;

/// Separable low-pass kernel; the 5x5 filter is its outer product.
pub const PYRAMID_KERNEL: [f64; 5] = [0.05, 0.25, 0.4, 0.25, 0.05];

/// Half-width of [`PYRAMID_KERNEL`].
pub const PYRAMID_KERNEL_RADIUS: usize = 2;

// ============================================================================
// Psychophysical model
// ============================================================================

/// Spatial frequency (cycles per degree) at which the CSF normalizer is taken.
pub const CSF_PEAK_CPD: f64 = 3.248;

/// Luminance (cd/m^2) used for the CSF normalizer and frequency weights.
pub const CSF_REFERENCE_LUMINANCE: f64 = 100.0;

/// Floor for adaptation luminance and contrast denominators.
pub const MIN_LUMINANCE: f64 = 1e-5;

/// Lower bound of the per-pixel elevation factor.
pub const MIN_FACTOR: f64 = 1.0;

/// Upper bound of the per-pixel elevation factor.
pub const MAX_FACTOR: f64 = 10.0;

/// Adaptation luminance below which vision is scotopic and the color test is off.
pub const SCOTOPIC_LUMINANCE: f64 = 10.0;

// ============================================================================
// Defaults
// ============================================================================

/// Default field of view in degrees.
pub const DEFAULT_FIELD_OF_VIEW: f64 = 45.0;

/// Default display gamma.
pub const DEFAULT_GAMMA: f64 = 2.2;

/// Default white luminance in cd/m^2.
pub const DEFAULT_LUMINANCE: f64 = 100.0;

/// Default number of failing pixels tolerated.
pub const DEFAULT_THRESHOLD_PIXELS: u64 = 100;

/// Default strength of the color test.
pub const DEFAULT_COLOR_FACTOR: f64 = 1.0;

/// Smallest accepted field of view in degrees.
pub const MIN_FIELD_OF_VIEW: f64 = 0.1;

/// Largest accepted field of view in degrees.
pub const MAX_FIELD_OF_VIEW: f64 = 89.9;

// ============================================================================
// Difference bitmap
// ============================================================================

/// Diff pixel for a pixel that passed: opaque black.
pub const PASS_COLOR: rgb::RGBA8 = rgb::RGBA8 {
    r: 0,
    g: 0,
    b: 0,
    a: 255,
};

/// Diff pixel for a pixel that failed: opaque blue.
pub const FAIL_COLOR: rgb::RGBA8 = rgb::RGBA8 {
    r: 0,
    g: 0,
    b: 255,
    a: 255,
};
