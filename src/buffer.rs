//! Owned image buffers used by the denoising pipeline.
//!
//! [`ImageBuffer`] stores one `f64` channel in row-major layout (stride ==
//! width) together with a value-range cache computed at construction.
//! [`NormalBuffer`] stores one surface normal per pixel with the same
//! layout. Both are immutable once built: producers assemble the backing
//! vector first and construct the buffer from it.

use crate::error::{DenoiseError, DenoiseResult};
use nalgebra::Vector3;

/// Owned single-channel `f64` image in row-major layout.
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    data: Vec<f64>,
    min_value: f64,
    max_value: f64,
}

impl ImageBuffer {
    /// Wrap an existing row-major vector of `width x height` values.
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> DenoiseResult<Self> {
        if width == 0 || height == 0 {
            return Err(DenoiseError::EmptyImage { width, height });
        }
        if data.len() != width * height {
            return Err(DenoiseError::BufferSizeMismatch {
                width,
                height,
                len: data.len(),
            });
        }
        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;
        for &value in &data {
            if value < min_value {
                min_value = value;
            }
            if value > max_value {
                max_value = value;
            }
        }
        Ok(Self {
            width,
            height,
            data,
            min_value,
            max_value,
        })
    }

    /// Build a buffer by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> f64,
    ) -> DenoiseResult<Self> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::from_vec(width, height, data)
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Convert (x, y) to a linear index into the backing storage.
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Get the pixel value at (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[self.idx(x, y)]
    }

    /// Borrow row `y` as a slice.
    #[inline]
    pub fn row(&self, y: usize) -> &[f64] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Borrow the full backing storage in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Smallest value in the buffer, cached at construction.
    #[inline]
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Largest value in the buffer, cached at construction.
    #[inline]
    pub fn max_value(&self) -> f64 {
        self.max_value
    }
}

/// Per-pixel surface normals recovered alongside the denoised values.
#[derive(Clone, Debug)]
pub struct NormalBuffer {
    width: usize,
    height: usize,
    data: Vec<Vector3<f64>>,
}

impl NormalBuffer {
    /// Wrap an existing row-major vector of `width x height` normals.
    pub fn from_vec(width: usize, height: usize, data: Vec<Vector3<f64>>) -> DenoiseResult<Self> {
        if width == 0 || height == 0 {
            return Err(DenoiseError::EmptyImage { width, height });
        }
        if data.len() != width * height {
            return Err(DenoiseError::BufferSizeMismatch {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the normal at (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Vector3<f64> {
        self.data[y * self.width + x]
    }

    /// Borrow the full backing storage in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[Vector3<f64>] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_checks_dimensions() {
        let err = ImageBuffer::from_vec(0, 4, vec![]).unwrap_err();
        assert!(matches!(err, DenoiseError::EmptyImage { .. }));

        let err = ImageBuffer::from_vec(3, 2, vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, DenoiseError::BufferSizeMismatch { len: 5, .. }));
    }

    #[test]
    fn caches_the_value_range() {
        let image = ImageBuffer::from_vec(2, 2, vec![-3.5, 0.0, 7.25, 1.0]).unwrap();
        assert_eq!(image.min_value(), -3.5);
        assert_eq!(image.max_value(), 7.25);
    }

    #[test]
    fn from_fn_lays_out_rows_first() {
        let image = ImageBuffer::from_fn(3, 2, |x, y| (y * 3 + x) as f64).unwrap();
        assert_eq!(image.pixel_count(), 6);
        assert_eq!(image.get(2, 0), 2.0);
        assert_eq!(image.get(0, 1), 3.0);
        assert_eq!(image.row(1), &[3.0, 4.0, 5.0][..]);
    }

    #[test]
    fn normal_buffer_checks_length_and_returns_stored_normals() {
        let err = NormalBuffer::from_vec(2, 2, vec![Vector3::z(); 3]).unwrap_err();
        assert!(matches!(err, DenoiseError::BufferSizeMismatch { len: 3, .. }));

        let normals = vec![Vector3::z(), Vector3::x(), Vector3::y(), Vector3::z()];
        let buffer = NormalBuffer::from_vec(2, 2, normals).unwrap();
        assert_eq!(buffer.get(1, 0), Vector3::x());
        assert_eq!(buffer.get(0, 1), Vector3::y());
        assert_eq!(buffer.as_slice().len(), 4);
    }
}
