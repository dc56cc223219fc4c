//! Square sampling windows centered on a pixel.
//!
//! A window of odd size `m` covers offsets `-m/2..=m/2` in both axes.
//! Sampling wraps toroidally at the image borders so every pixel owns a
//! full window and the fit never sees a truncated neighborhood.

use crate::buffer::ImageBuffer;
use crate::error::{DenoiseError, DenoiseResult};

/// One sampled pixel of a window.
#[derive(Clone, Copy, Debug)]
pub struct WindowSample {
    /// Horizontal offset from the window center.
    pub offset_x: i32,
    /// Vertical offset from the window center.
    pub offset_y: i32,
    /// Absolute column after wrapping.
    pub x: usize,
    /// Absolute row after wrapping.
    pub y: usize,
    /// Image value at the wrapped position.
    pub value: f64,
}

/// Offset layout of a square odd-sized window, computed once per size and
/// shared by every per-pixel fit.
#[derive(Clone, Debug)]
pub struct WindowGeometry {
    size: usize,
    offsets: Vec<(i32, i32)>,
}

impl WindowGeometry {
    /// Build the offset table for a window of odd size `size >= 5`.
    pub fn new(size: usize) -> DenoiseResult<Self> {
        if size < 5 || size % 2 == 0 {
            return Err(DenoiseError::InvalidWindowSize { size });
        }
        let half = (size / 2) as i32;
        let mut offsets = Vec::with_capacity(size * size);
        for offset_y in -half..=half {
            for offset_x in -half..=half {
                offsets.push((offset_x, offset_y));
            }
        }
        Ok(Self { size, offsets })
    }

    /// Window side length in pixels.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of samples per window.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Scale constant keeping the fitted monomials comparable in magnitude.
    /// Equal to the window side length.
    #[inline]
    pub fn f_zero(&self) -> f64 {
        self.size as f64
    }

    /// Row-major window offsets, vertical axis outermost.
    #[inline]
    pub fn offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }

    /// Sample the window centered on `(cx, cy)` into `out`, wrapping at the
    /// image borders. `out` is cleared first so it can be reused across
    /// pixels.
    pub fn fill(&self, image: &ImageBuffer, cx: usize, cy: usize, out: &mut Vec<WindowSample>) {
        let width = image.width() as isize;
        let height = image.height() as isize;
        out.clear();
        out.reserve(self.offsets.len());
        for &(offset_x, offset_y) in &self.offsets {
            let x = (cx as isize + offset_x as isize).rem_euclid(width) as usize;
            let y = (cy as isize + offset_y as isize).rem_euclid(height) as usize;
            out.push(WindowSample {
                offset_x,
                offset_y,
                x,
                y,
                value: image.get(x, y),
            });
        }
    }

    /// Allocating variant of [`fill`](Self::fill).
    pub fn samples(&self, image: &ImageBuffer, cx: usize, cy: usize) -> Vec<WindowSample> {
        let mut out = Vec::with_capacity(self.offsets.len());
        self.fill(image, cx, cy, &mut out);
        out
    }
}
