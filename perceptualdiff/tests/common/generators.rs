//! Shared image generation functions for perceptualdiff tests.
//!
//! These produce deterministic synthetic images using an LCG PRNG,
//! ensuring identical test inputs across all platforms.

use perceptualdiff::{Img, ImgVec, RGB8, RGBA8};

// ============================================================================
// LCG PRNG
// ============================================================================

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }

    pub fn next_u8_range(&mut self, min: u8, max: u8) -> u8 {
        let range = (max - min) as u64 + 1;
        let val = self.next_u8() as u64;
        (min as u64 + (val * range / 256)) as u8
    }
}

// ============================================================================
// Image Generation Functions
// ============================================================================

/// Uniform opaque color image.
pub fn gen_uniform(width: usize, height: usize, r: u8, g: u8, b: u8) -> ImgVec<RGBA8> {
    Img::new(vec![RGBA8::new(r, g, b, 255); width * height], width, height)
}

/// Uniform gray image without alpha.
pub fn gen_gray(width: usize, height: usize, v: u8) -> ImgVec<RGB8> {
    Img::new(vec![RGB8::new(v, v, v); width * height], width, height)
}

/// Horizontal grayscale gradient.
pub fn gen_gradient_h(width: usize, height: usize) -> ImgVec<RGBA8> {
    let mut pixels = Vec::with_capacity(width * height);
    for _y in 0..height {
        for x in 0..width {
            let val = if width > 1 {
                (x * 255 / (width - 1)) as u8
            } else {
                128
            };
            pixels.push(RGBA8::new(val, val, val, 255));
        }
    }
    Img::new(pixels, width, height)
}

/// Opaque random noise in `[min, max]` per channel.
pub fn gen_noise(width: usize, height: usize, seed: u64, min: u8, max: u8) -> ImgVec<RGBA8> {
    let mut rng = Lcg::new(seed);
    let pixels = (0..width * height)
        .map(|_| {
            RGBA8::new(
                rng.next_u8_range(min, max),
                rng.next_u8_range(min, max),
                rng.next_u8_range(min, max),
                255,
            )
        })
        .collect();
    Img::new(pixels, width, height)
}

// ============================================================================
// Distortions
// ============================================================================

/// Replaces one pixel.
pub fn with_pixel(img: &ImgVec<RGBA8>, x: usize, y: usize, px: RGBA8) -> ImgVec<RGBA8> {
    let mut out = img.clone();
    out[(x, y)] = px;
    out
}

/// Adds `amount` to every channel of every pixel, saturating.
pub fn brighten(img: &ImgVec<RGBA8>, amount: u8) -> ImgVec<RGBA8> {
    let pixels = img
        .buf()
        .iter()
        .map(|p| {
            RGBA8::new(
                p.r.saturating_add(amount),
                p.g.saturating_add(amount),
                p.b.saturating_add(amount),
                p.a,
            )
        })
        .collect();
    Img::new(pixels, img.width(), img.height())
}
