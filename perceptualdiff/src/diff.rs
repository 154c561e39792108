//! Comparison pipeline.
//!
//! Stages run in a fixed order and the first two may end the comparison
//! early:
//!
//! 1. dimension check
//! 2. binary identity scan
//! 3. color conversion of both images
//! 4. pyramid construction
//! 5. per-pixel fusion of the luminance and color tests
//! 6. aggregation into a verdict

use std::io::Write;

use imgref::{Img, ImgVec};
use rayon::prelude::*;
use rgb::RGBA8;
use tracing::{debug, debug_span, trace};

use crate::colorimetry::{convert_image, premultiplied};
use crate::consts::{
    CSF_PEAK_CPD, CSF_REFERENCE_LUMINANCE, FAIL_COLOR, MAX_FACTOR, MAX_PYR_LEVELS, MIN_FACTOR,
    MIN_LUMINANCE, PASS_COLOR, SCOTOPIC_LUMINANCE,
};
use crate::grid::PixelGrid;
use crate::image::{ColorPlanes, PlaneF64};
use crate::psycho::{adaptation_level, csf, mask, one_degree_pixels, tvi};
use crate::pyramid::Pyramid;
use crate::{CompareResult, Parameters, Reason};

/// Number of band-pass levels; each needs two coarser levels above it.
const BANDS: usize = MAX_PYR_LEVELS - 2;

/// Viewing geometry shared by every pixel of one comparison.
#[derive(Debug, Clone)]
pub(crate) struct FrequencyModel {
    adaptation_level: usize,
    cpd: [f64; MAX_PYR_LEVELS],
    freq_weight: [f64; BANDS],
}

impl FrequencyModel {
    pub(crate) fn new(width: usize, field_of_view: f64) -> Self {
        let num_one_degree_pixels = one_degree_pixels(field_of_view);
        let pixels_per_degree = width as f64 / num_one_degree_pixels;
        let adaptation_level = adaptation_level(num_one_degree_pixels);

        let mut cpd = [0.0; MAX_PYR_LEVELS];
        cpd[0] = 0.5 * pixels_per_degree;
        for i in 1..MAX_PYR_LEVELS {
            cpd[i] = 0.5 * cpd[i - 1];
        }

        let csf_max = csf(CSF_PEAK_CPD, CSF_REFERENCE_LUMINANCE);
        let freq_weight = std::array::from_fn(|i| csf_max / csf(cpd[i], CSF_REFERENCE_LUMINANCE));

        debug!(
            num_one_degree_pixels,
            pixels_per_degree, adaptation_level, "frequency model"
        );
        for (level, cpd) in cpd.iter().enumerate() {
            trace!(level, cpd, "cycles per degree");
        }

        Self {
            adaptation_level,
            cpd,
            freq_weight,
        }
    }
}

/// Everything the fusion step reads from one image.
struct Side {
    pyramid: Pyramid,
    a: PlaneF64,
    b: PlaneF64,
}

impl Side {
    fn build(planes: ColorPlanes) -> Self {
        let ColorPlanes { lum, a, b } = planes;
        Self {
            pyramid: Pyramid::build(lum),
            a,
            b,
        }
    }
}

/// Running totals of one row, or of several rows after a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Tally {
    failed: u64,
    error_sum: f64,
}

impl Tally {
    fn merge(self, other: Self) -> Self {
        Self {
            failed: self.failed.saturating_add(other.failed),
            error_sum: self.error_sum + other.error_sum,
        }
    }
}

/// Outcome of the two tests at one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PixelVerdict {
    pass: bool,
    luminance_error: f64,
    color_error: f64,
}

/// Writes one progress line; a failing sink never aborts the comparison.
fn progress(log: &mut dyn Write, line: &str) {
    let _ = log.write_all(line.as_bytes());
    debug!("{}", line.trim_end());
}

pub(crate) fn run<A, B>(
    image_a: &A,
    image_b: &B,
    params: &Parameters,
    log: &mut dyn Write,
) -> CompareResult
where
    A: PixelGrid + ?Sized,
    B: PixelGrid + ?Sized,
{
    let width = image_a.width();
    let height = image_a.height();
    let _span = debug_span!("compare", width, height).entered();

    if width != image_b.width() || height != image_b.height() {
        debug!(
            width_b = image_b.width(),
            height_b = image_b.height(),
            "dimensions differ"
        );
        return CompareResult::short_circuit(Reason::DimensionMismatch);
    }

    if binary_identical(image_a, image_b) {
        debug!("premultiplied samples identical");
        return CompareResult::short_circuit(Reason::BinaryIdentical);
    }

    progress(log, "Converting RGB to XYZ\n");
    let gamma = params.gamma();
    let luminance = params.luminance();
    let (planes_a, planes_b) = rayon::join(
        || convert_image(image_a, gamma, luminance),
        || convert_image(image_b, gamma, luminance),
    );

    progress(log, "Performing test\n");
    let model = FrequencyModel::new(width, params.field_of_view());

    progress(log, "Constructing Laplacian Pyramids\n");
    let (side_a, side_b) = rayon::join(|| Side::build(planes_a), || Side::build(planes_b));

    let (image_difference, tally) = fuse(&side_a, &side_b, &model, params);

    let reason = if tally.failed < params.threshold_pixels() {
        Reason::Indistinguishable
    } else {
        Reason::VisiblyDifferent
    };
    debug!(
        failed = tally.failed,
        error_sum = tally.error_sum,
        %reason,
        "comparison finished"
    );

    CompareResult {
        identical: reason.is_pass(),
        reason,
        num_pixels_failed: tally.failed,
        error_sum: tally.error_sum,
        image_difference: Some(image_difference),
    }
}

/// True when every premultiplied 16-bit quadruple matches. Empty images are
/// identical.
fn binary_identical<A, B>(image_a: &A, image_b: &B) -> bool
where
    A: PixelGrid + ?Sized,
    B: PixelGrid + ?Sized,
{
    let width = image_a.width();
    (0..image_a.height()).into_par_iter().all(|y| {
        (0..width).all(|x| {
            premultiplied(image_a.rgba16(x, y)) == premultiplied(image_b.rgba16(x, y))
        })
    })
}

/// Tests every pixel, rows in parallel, and paints the difference bitmap.
fn fuse(
    side_a: &Side,
    side_b: &Side,
    model: &FrequencyModel,
    params: &Parameters,
) -> (ImgVec<RGBA8>, Tally) {
    let width = side_a.pyramid.width();
    let height = side_a.pyramid.height();
    let mut diff = vec![PASS_COLOR; width * height];
    if diff.is_empty() {
        return (Img::new(diff, width, height), Tally::default());
    }

    let tally = diff
        .par_chunks_mut(width)
        .enumerate()
        .map(|(y, row)| {
            let mut tally = Tally::default();
            for (x, out) in row.iter_mut().enumerate() {
                let verdict = test_pixel(side_a, side_b, model, params, x, y);
                tally.error_sum += verdict.luminance_error;
                tally.error_sum += verdict.color_error;
                if !verdict.pass {
                    *out = FAIL_COLOR;
                    tally.failed += 1;
                }
            }
            tally
        })
        .reduce(Tally::default, Tally::merge);

    (Img::new(diff, width, height), tally)
}

fn test_pixel(
    side_a: &Side,
    side_b: &Side,
    model: &FrequencyModel,
    params: &Parameters,
    x: usize,
    y: usize,
) -> PixelVerdict {
    let la = &side_a.pyramid;
    let lb = &side_b.pyramid;
    let level = model.adaptation_level;

    let adapt =
        ((la.get_value(x, y, level) + lb.get_value(x, y, level)) * 0.5).max(MIN_LUMINANCE);

    let mut sum_contrast = 0.0;
    let mut factor = 0.0;
    for i in 0..BANDS {
        let n1 = (la.get_value(x, y, i) - la.get_value(x, y, i + 1)).abs();
        let n2 = (lb.get_value(x, y, i) - lb.get_value(x, y, i + 1)).abs();
        let numerator = n1.max(n2);
        let d1 = la.get_value(x, y, i + 2).abs();
        let d2 = lb.get_value(x, y, i + 2).abs();
        let denominator = d1.max(d2).max(MIN_LUMINANCE);
        let contrast = numerator / denominator;
        let f_mask = mask(contrast * csf(model.cpd[i], adapt));
        factor += contrast * model.freq_weight[i] * f_mask;
        sum_contrast += contrast;
    }
    let sum_contrast = f64::max(sum_contrast, MIN_LUMINANCE);
    let factor = (factor / sum_contrast).clamp(MIN_FACTOR, MAX_FACTOR);

    let delta = (la.get_value(x, y, 0) - lb.get_value(x, y, 0)).abs();
    let mut pass = delta <= factor * tvi(adapt);

    let mut color_error = 0.0;
    if !params.luminance_only() {
        // Color vision fades in scotopic light.
        let color_scale = if adapt < SCOTOPIC_LUMINANCE {
            0.0
        } else {
            params.color_factor()
        };
        let da = side_a.a.get(x, y) - side_b.a.get(x, y);
        let db = side_a.b.get(x, y) - side_b.b.get(x, y);
        color_error = (da * da + db * db) * color_scale;
        if color_error > factor {
            pass = false;
        }
    }

    PixelVerdict {
        pass,
        luminance_error: delta,
        color_error,
    }
}
