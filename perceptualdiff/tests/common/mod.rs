//! Common test utilities for perceptualdiff tests.
//!
//! Everything here is synthetic and deterministic; no test data files are
//! needed.

#![allow(dead_code)]

pub mod generators;

use perceptualdiff::{ImgVec, RGBA8};

/// Counts the pixels of a difference bitmap painted in `color`.
pub fn count_color(diff: &ImgVec<RGBA8>, color: RGBA8) -> usize {
    diff.buf().iter().filter(|&&p| p == color).count()
}

/// Asserts two floats agree to a relative tolerance.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64, rel: f64) {
    let tol = expected.abs().max(1.0) * rel;
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual} (tolerance {tol})"
    );
}
