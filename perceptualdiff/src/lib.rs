//! # perceptualdiff
//!
//! Perceptual image comparison after Hector Yee's metric: two images are
//! judged the same when a human viewer, under the configured viewing
//! conditions, would not notice the difference. Binary-different images can
//! still pass.
//!
//! The metric models:
//! - Colorimetry: gamma-encoded Adobe RGB to CIE XYZ and L*a*b*
//! - Multi-scale analysis: an 8-level blur pyramid of luminance
//! - Contrast sensitivity (Barten) and visual masking (Daly)
//! - Threshold vs. intensity (Ward Larson) for the luminance test
//! - A CIE delta-E test on chroma, disabled in scotopic light
//!
//! ## Verdicts
//!
//! - [`Reason::BinaryIdentical`]: every raw sample matches
//! - [`Reason::Indistinguishable`]: fewer than `threshold_pixels` pixels fail
//! - [`Reason::VisiblyDifferent`]: at least `threshold_pixels` pixels fail
//! - [`Reason::DimensionMismatch`]: the images cannot be compared
//!
//! ## Example
//!
//! ```rust
//! use perceptualdiff::{compare, Img, Parameters, Reason, RGB8};
//!
//! let width = 8;
//! let height = 8;
//! let pixels: Vec<RGB8> = vec![RGB8::new(128, 128, 128); width * height];
//! let mut brighter = pixels.clone();
//! brighter[3 * width + 3] = RGB8::new(140, 140, 140);
//!
//! let img1 = Img::new(pixels, width, height);
//! let img2 = Img::new(brighter, width, height);
//!
//! let result = compare(&img1, &img2, &Parameters::default());
//! assert!(result.identical);
//! assert_eq!(result.reason, Reason::Indistinguishable);
//! assert_eq!(result.num_pixels_failed, 0);
//! ```
//!
//! ## Features
//!
//! - **`serde`**: `Serialize`/`Deserialize` for [`Parameters`], [`Reason`]
//!   and the scalar fields of [`CompareResult`]
//! - **`internals`**: Expose internal modules for testing/benchmarking (unstable API)
//!
//! ## References
//!
//! - Yee, "A Perceptual Metric for Production Testing", Journal of Graphics
//!   Tools, 2004
//! - <https://pdiff.sourceforge.net/>

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Published model constants keep their original digits
#![allow(clippy::unreadable_literal)]
#![allow(clippy::excessive_precision)]
// mul_add changes rounding and the numbers depend on it
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::imprecise_flops)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::float_cmp)]

// Internal modules - exposed with "internals" feature for testing/benchmarking
#[cfg(feature = "internals")]
pub mod colorimetry;
#[cfg(not(feature = "internals"))]
pub(crate) mod colorimetry;

#[cfg(feature = "internals")]
pub mod consts;
#[cfg(not(feature = "internals"))]
pub(crate) mod consts;

mod diff;

pub mod grid;

#[cfg(feature = "internals")]
pub mod image;
#[cfg(not(feature = "internals"))]
pub(crate) mod image;

#[cfg(feature = "internals")]
pub mod psycho;
#[cfg(not(feature = "internals"))]
pub(crate) mod psycho;

#[cfg(feature = "internals")]
pub mod pyramid;
#[cfg(not(feature = "internals"))]
pub(crate) mod pyramid;

use std::fmt;
use std::io::Write;

pub use consts::MAX_PYR_LEVELS;
pub use grid::{downsample_2x, PixelGrid, Rgba16};

// Re-export imgref and rgb types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::{RGB, RGB8, RGBA, RGBA8};

use consts::{
    DEFAULT_COLOR_FACTOR, DEFAULT_FIELD_OF_VIEW, DEFAULT_GAMMA, DEFAULT_LUMINANCE,
    DEFAULT_THRESHOLD_PIXELS, MAX_FIELD_OF_VIEW, MIN_FIELD_OF_VIEW,
};

/// Error type for parameter validation.
///
/// Comparing never fails; a size mismatch is reported as
/// [`Reason::DimensionMismatch`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum PerceptualDiffError {
    /// Field of view outside `[0.1, 89.9]` degrees.
    #[error("field of view {value} is outside [0.1, 89.9] degrees")]
    InvalidFieldOfView {
        /// Value provided.
        value: f64,
    },
    /// Gamma is not a positive finite number.
    #[error("gamma {value} must be a positive finite number")]
    InvalidGamma {
        /// Value provided.
        value: f64,
    },
    /// White luminance is not a positive finite number.
    #[error("luminance {value} must be a positive finite number of cd/m^2")]
    InvalidLuminance {
        /// Value provided.
        value: f64,
    },
    /// Color factor outside `[0, 1]`.
    #[error("color factor {value} is outside [0, 1]")]
    InvalidColorFactor {
        /// Value provided.
        value: f64,
    },
}

/// Viewing conditions and decision threshold for a comparison.
///
/// Use the builder pattern to construct:
/// ```rust
/// use perceptualdiff::Parameters;
///
/// let params = Parameters::new()
///     .with_field_of_view(60.0)    // wider viewing angle
///     .with_luminance(250.0)       // brighter display
///     .with_threshold_pixels(10);  // fail on fewer pixels
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Parameters {
    luminance_only: bool,
    field_of_view: f64,
    gamma: f64,
    luminance: f64,
    threshold_pixels: u64,
    color_factor: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            luminance_only: false,
            field_of_view: DEFAULT_FIELD_OF_VIEW,
            gamma: DEFAULT_GAMMA,
            luminance: DEFAULT_LUMINANCE,
            threshold_pixels: DEFAULT_THRESHOLD_PIXELS,
            color_factor: DEFAULT_COLOR_FACTOR,
        }
    }
}

impl Parameters {
    /// Creates `Parameters` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips the chroma test; only luminance differences can fail a pixel.
    #[must_use]
    pub fn with_luminance_only(mut self, luminance_only: bool) -> Self {
        self.luminance_only = luminance_only;
        self
    }

    /// Sets the horizontal field of view in degrees.
    #[must_use]
    pub fn with_field_of_view(mut self, field_of_view: f64) -> Self {
        self.field_of_view = field_of_view;
        self
    }

    /// Sets the display gamma used to linearize samples.
    #[must_use]
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the luminance of display white in cd/m^2.
    #[must_use]
    pub fn with_luminance(mut self, luminance: f64) -> Self {
        self.luminance = luminance;
        self
    }

    /// Sets the number of failed pixels at which images count as different.
    #[must_use]
    pub fn with_threshold_pixels(mut self, threshold_pixels: u64) -> Self {
        self.threshold_pixels = threshold_pixels;
        self
    }

    /// Sets the weight of the chroma test, in `[0, 1]`.
    #[must_use]
    pub fn with_color_factor(mut self, color_factor: f64) -> Self {
        self.color_factor = color_factor;
        self
    }

    #[must_use]
    pub fn luminance_only(&self) -> bool {
        self.luminance_only
    }

    /// Returns the field of view in degrees.
    #[must_use]
    pub fn field_of_view(&self) -> f64 {
        self.field_of_view
    }

    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Returns the white luminance in cd/m^2.
    #[must_use]
    pub fn luminance(&self) -> f64 {
        self.luminance
    }

    #[must_use]
    pub fn threshold_pixels(&self) -> u64 {
        self.threshold_pixels
    }

    #[must_use]
    pub fn color_factor(&self) -> f64 {
        self.color_factor
    }

    /// Checks every value against its documented range.
    ///
    /// [`compare`] does not call this; out-of-range values give
    /// meaningless results rather than errors.
    ///
    /// # Errors
    /// Returns the first parameter found out of range.
    pub fn validate(&self) -> Result<(), PerceptualDiffError> {
        let fov = self.field_of_view;
        if !(MIN_FIELD_OF_VIEW..=MAX_FIELD_OF_VIEW).contains(&fov) {
            return Err(PerceptualDiffError::InvalidFieldOfView { value: fov });
        }
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(PerceptualDiffError::InvalidGamma { value: self.gamma });
        }
        if !self.luminance.is_finite() || self.luminance <= 0.0 {
            return Err(PerceptualDiffError::InvalidLuminance {
                value: self.luminance,
            });
        }
        if !(0.0..=1.0).contains(&self.color_factor) {
            return Err(PerceptualDiffError::InvalidColorFactor {
                value: self.color_factor,
            });
        }
        Ok(())
    }
}

/// Why a comparison ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Reason {
    DimensionMismatch,
    BinaryIdentical,
    Indistinguishable,
    VisiblyDifferent,
}

impl Reason {
    /// Human-readable description, stable across releases.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DimensionMismatch => "Image dimensions do not match",
            Self::BinaryIdentical => "Images are binary identical",
            Self::Indistinguishable => "Images are perceptually indistinguishable",
            Self::VisiblyDifferent => "Images are visibly different",
        }
    }

    /// True for the two outcomes that count as "the same image".
    #[must_use]
    pub fn is_pass(self) -> bool {
        matches!(self, Self::BinaryIdentical | Self::Indistinguishable)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a comparison.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompareResult {
    /// True when the images count as the same (see [`Reason::is_pass`]).
    pub identical: bool,
    pub reason: Reason,
    /// Pixels failing the luminance or color test. Zero unless the full
    /// pixel pass ran.
    pub num_pixels_failed: u64,
    /// Sum of luminance deltas and weighted delta-E over all pixels.
    ///
    /// Summation order follows the parallel reduction, so the last few bits
    /// may vary between runs.
    pub error_sum: f64,
    /// Opaque black where a pixel passed, opaque blue where it failed.
    /// `None` when the comparison short-circuited.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub image_difference: Option<ImgVec<RGBA8>>,
}

impl CompareResult {
    pub(crate) fn short_circuit(reason: Reason) -> Self {
        Self {
            identical: reason.is_pass(),
            reason,
            num_pixels_failed: 0,
            error_sum: 0.0,
            image_difference: None,
        }
    }
}

/// Compares two images under the given viewing conditions.
///
/// Equivalent to [`compare_with_log`] without a progress sink.
///
/// # Example
/// ```rust
/// use perceptualdiff::{compare, Img, Parameters, Reason, RGBA8};
///
/// let white = Img::new(vec![RGBA8::new(255, 255, 255, 255); 4], 2, 2);
/// let black = Img::new(vec![RGBA8::new(0, 0, 0, 255); 4], 2, 2);
///
/// let strict = Parameters::default().with_threshold_pixels(1);
/// let result = compare(&white, &black, &strict);
/// assert_eq!(result.reason, Reason::VisiblyDifferent);
/// assert_eq!(result.num_pixels_failed, 4);
/// ```
pub fn compare<A, B>(image_a: &A, image_b: &B, params: &Parameters) -> CompareResult
where
    A: PixelGrid + ?Sized,
    B: PixelGrid + ?Sized,
{
    compare_with_log(image_a, image_b, params, None)
}

/// Compares two images, writing progress lines to `log`.
///
/// When the full comparison runs, the sink receives
/// `"Converting RGB to XYZ\n"`, `"Performing test\n"` and
/// `"Constructing Laplacian Pyramids\n"`, in that order. Write errors on the
/// sink are ignored.
pub fn compare_with_log<A, B>(
    image_a: &A,
    image_b: &B,
    params: &Parameters,
    log: Option<&mut dyn Write>,
) -> CompareResult
where
    A: PixelGrid + ?Sized,
    B: PixelGrid + ?Sized,
{
    match log {
        Some(sink) => diff::run(image_a, image_b, params, sink),
        None => diff::run(image_a, image_b, params, &mut std::io::sink()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let params = Parameters::default();
        assert!(!params.luminance_only());
        assert_eq!(params.field_of_view(), 45.0);
        assert_eq!(params.gamma(), 2.2);
        assert_eq!(params.luminance(), 100.0);
        assert_eq!(params.threshold_pixels(), 100);
        assert_eq!(params.color_factor(), 1.0);
        assert_eq!(Parameters::new(), params);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_builder_sets_fields() {
        let params = Parameters::new()
            .with_luminance_only(true)
            .with_field_of_view(30.0)
            .with_gamma(1.8)
            .with_luminance(80.0)
            .with_threshold_pixels(7)
            .with_color_factor(0.5);
        assert!(params.luminance_only());
        assert_eq!(params.field_of_view(), 30.0);
        assert_eq!(params.gamma(), 1.8);
        assert_eq!(params.luminance(), 80.0);
        assert_eq!(params.threshold_pixels(), 7);
        assert_eq!(params.color_factor(), 0.5);
    }

    #[test]
    fn test_validate_field_of_view_bounds() {
        for fov in [0.1, 45.0, 89.9] {
            assert!(Parameters::new().with_field_of_view(fov).validate().is_ok());
        }
        for fov in [0.0, 0.09, 90.0, -5.0, f64::NAN] {
            let err = Parameters::new()
                .with_field_of_view(fov)
                .validate()
                .unwrap_err();
            assert!(matches!(err, PerceptualDiffError::InvalidFieldOfView { .. }));
        }
    }

    #[test]
    fn test_validate_other_parameters() {
        assert!(matches!(
            Parameters::new().with_gamma(0.0).validate(),
            Err(PerceptualDiffError::InvalidGamma { .. })
        ));
        assert!(matches!(
            Parameters::new().with_luminance(f64::INFINITY).validate(),
            Err(PerceptualDiffError::InvalidLuminance { .. })
        ));
        assert!(matches!(
            Parameters::new().with_color_factor(1.5).validate(),
            Err(PerceptualDiffError::InvalidColorFactor { .. })
        ));
        assert!(Parameters::new().with_color_factor(0.0).validate().is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = PerceptualDiffError::InvalidFieldOfView { value: 95.0 };
        assert_eq!(
            err.to_string(),
            "field of view 95 is outside [0.1, 89.9] degrees"
        );
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(
            Reason::DimensionMismatch.to_string(),
            "Image dimensions do not match"
        );
        assert_eq!(
            Reason::BinaryIdentical.as_str(),
            "Images are binary identical"
        );
        assert_eq!(
            Reason::Indistinguishable.as_str(),
            "Images are perceptually indistinguishable"
        );
        assert_eq!(
            Reason::VisiblyDifferent.as_str(),
            "Images are visibly different"
        );
    }

    #[test]
    fn test_reason_is_pass() {
        assert!(Reason::BinaryIdentical.is_pass());
        assert!(Reason::Indistinguishable.is_pass());
        assert!(!Reason::VisiblyDifferent.is_pass());
        assert!(!Reason::DimensionMismatch.is_pass());
    }

    #[test]
    fn test_short_circuit_results() {
        let result = CompareResult::short_circuit(Reason::DimensionMismatch);
        assert!(!result.identical);
        assert_eq!(result.num_pixels_failed, 0);
        assert!(result.image_difference.is_none());

        let result = CompareResult::short_circuit(Reason::BinaryIdentical);
        assert!(result.identical);
        assert_eq!(result.error_sum, 0.0);
    }
}
