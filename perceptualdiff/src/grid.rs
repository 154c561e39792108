//! Pixel grids: the read-only image abstraction the comparison consumes.
//!
//! The core never decodes files. Anything that can report its dimensions and
//! hand out four 16-bit channels per pixel can be compared; `imgref` images
//! of the common `rgb` pixel types work out of the box.

use imgref::{Img, ImgRef, ImgVec};
use rgb::{RGB, RGB8, RGBA, RGBA8};

/// A pixel type that can be widened to four 16-bit channels.
///
/// Channels are straight (not premultiplied) alpha. 8-bit values are
/// widened by replicating the byte (`v * 257`), so 255 maps to 65535.
pub trait Rgba16: Copy {
    fn to_rgba16(self) -> RGBA<u16>;
}

#[inline]
fn widen(v: u8) -> u16 {
    u16::from(v) * 257
}

impl Rgba16 for RGBA<u16> {
    #[inline]
    fn to_rgba16(self) -> RGBA<u16> {
        self
    }
}

impl Rgba16 for RGB<u16> {
    #[inline]
    fn to_rgba16(self) -> RGBA<u16> {
        RGBA::new(self.r, self.g, self.b, u16::MAX)
    }
}

impl Rgba16 for RGBA8 {
    #[inline]
    fn to_rgba16(self) -> RGBA<u16> {
        RGBA::new(widen(self.r), widen(self.g), widen(self.b), widen(self.a))
    }
}

impl Rgba16 for RGB8 {
    #[inline]
    fn to_rgba16(self) -> RGBA<u16> {
        RGBA::new(widen(self.r), widen(self.g), widen(self.b), u16::MAX)
    }
}

/// Immutable, randomly addressable 2D array of RGBA samples.
///
/// Implementations must be `Sync`: rows are read from several threads at
/// once. Callers never pass coordinates outside `width() x height()`.
pub trait PixelGrid: Sync {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Returns the straight-alpha 16-bit sample at `(x, y)`.
    fn rgba16(&self, x: usize, y: usize) -> RGBA<u16>;
}

impl<P: Rgba16 + Sync> PixelGrid for ImgRef<'_, P> {
    #[inline]
    fn width(&self) -> usize {
        Img::width(self)
    }

    #[inline]
    fn height(&self) -> usize {
        Img::height(self)
    }

    #[inline]
    fn rgba16(&self, x: usize, y: usize) -> RGBA<u16> {
        self.buf()[y * self.stride() + x].to_rgba16()
    }
}

impl<P: Rgba16 + Sync> PixelGrid for ImgVec<P> {
    #[inline]
    fn width(&self) -> usize {
        Img::width(self)
    }

    #[inline]
    fn height(&self) -> usize {
        Img::height(self)
    }

    #[inline]
    fn rgba16(&self, x: usize, y: usize) -> RGBA<u16> {
        self.buf()[y * self.stride() + x].to_rgba16()
    }
}

impl<G: PixelGrid + ?Sized> PixelGrid for &G {
    #[inline]
    fn width(&self) -> usize {
        (**self).width()
    }

    #[inline]
    fn height(&self) -> usize {
        (**self).height()
    }

    #[inline]
    fn rgba16(&self, x: usize, y: usize) -> RGBA<u16> {
        (**self).rgba16(x, y)
    }
}

/// Halves both dimensions by averaging each 2x2 block.
///
/// Output dimensions are `width / 2` by `height / 2`; a trailing odd row or
/// column is dropped. Returns `None` when either dimension is 1 or less.
pub fn downsample_2x<G: PixelGrid + ?Sized>(grid: &G) -> Option<ImgVec<RGBA<u16>>> {
    let width = grid.width();
    let height = grid.height();
    if width <= 1 || height <= 1 {
        return None;
    }

    let out_width = width / 2;
    let out_height = height / 2;
    let mut out = Vec::with_capacity(out_width * out_height);

    for oy in 0..out_height {
        for ox in 0..out_width {
            let mut sum = [0u32; 4];
            for dy in 0..2 {
                for dx in 0..2 {
                    let px = grid.rgba16(ox * 2 + dx, oy * 2 + dy);
                    sum[0] += u32::from(px.r);
                    sum[1] += u32::from(px.g);
                    sum[2] += u32::from(px.b);
                    sum[3] += u32::from(px.a);
                }
            }
            out.push(RGBA::new(
                (sum[0] / 4) as u16,
                (sum[1] / 4) as u16,
                (sum[2] / 4) as u16,
                (sum[3] / 4) as u16,
            ));
        }
    }

    Some(Img::new(out, out_width, out_height))
}
