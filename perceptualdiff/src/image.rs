//! Channel buffers for the comparison pipeline.
//!
//! A channel buffer holds one `f64` per pixel, row-major with no padding,
//! so `index = x + y * width` addresses a pixel directly.

/// Single-channel `f64` image.
///
/// Used for luminance, chroma and every pyramid level.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneF64 {
    data: Vec<f64>,
    width: usize,
    height: usize,
}

impl PlaneF64 {
    /// Creates a new plane filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    /// Creates a plane filled with a constant value.
    #[must_use]
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
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

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a reference to a row.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[f64] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Gets a pixel value.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[x + y * self.width]
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// The three channels one image contributes to a comparison.
///
/// `lum` is CIE Y scaled to cd/m^2 and feeds the pyramid; `a` and `b` are the
/// L*a*b* color-opponent channels used by the color test.
#[derive(Debug, Clone)]
pub struct ColorPlanes {
    pub lum: PlaneF64,
    pub a: PlaneF64,
    pub b: PlaneF64,
}

impl ColorPlanes {
    /// Creates zeroed planes.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            lum: PlaneF64::new(width, height),
            a: PlaneF64::new(width, height),
            b: PlaneF64::new(width, height),
        }
    }
}
