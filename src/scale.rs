//! Linear value-range remapping of image buffers.
//!
//! The conic fits behave best on inputs confined to a small range, so
//! callers normalize to `[0, 1]` before denoising and stretch back after.
//! All arithmetic goes through the stabilized helpers in
//! [`numeric`](crate::numeric) to keep nearly-cancelling endpoints exact.

use crate::buffer::ImageBuffer;
use crate::error::{DenoiseError, DenoiseResult};
use crate::numeric::{precise_add, precise_sub};

const RANGE_EPS: f64 = 1e-12;

/// Remap every value linearly from `[old_min, old_max]` onto
/// `[new_min, new_max]`.
///
/// Values are normalized to `[0, 1]` first and then stretched onto the new
/// range; inputs outside the old range extrapolate linearly. An old range
/// narrower than `1e-12` is rejected as `DegenerateScaleRange`.
pub fn rescale(
    image: &ImageBuffer,
    old_min: f64,
    old_max: f64,
    new_min: f64,
    new_max: f64,
) -> DenoiseResult<ImageBuffer> {
    let old_range = old_max - old_min;
    if old_range.abs() < RANGE_EPS {
        return Err(DenoiseError::DegenerateScaleRange {
            min: old_min,
            max: old_max,
        });
    }
    let new_range = new_max - new_min;
    let data = image
        .as_slice()
        .iter()
        .map(|&value| {
            let normalized = precise_sub(value, old_min) / old_range;
            precise_add(normalized * new_range, new_min)
        })
        .collect();
    ImageBuffer::from_vec(image.width(), image.height(), data)
}

/// Remap with the buffer's own cached minimum and maximum as the old range.
pub fn normalize(image: &ImageBuffer, new_min: f64, new_max: f64) -> DenoiseResult<ImageBuffer> {
    rescale(image, image.min_value(), image.max_value(), new_min, new_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageBuffer {
        ImageBuffer::from_vec(2, 2, vec![0.0, 2.0, 5.0, 10.0]).unwrap()
    }

    #[test]
    fn maps_endpoints_onto_the_new_range() {
        let scaled = normalize(&image(), 0.0, 1.0).unwrap();
        assert_eq!(scaled.get(0, 0), 0.0);
        assert!((scaled.get(1, 0) - 0.2).abs() < 1e-15);
        assert!((scaled.get(0, 1) - 0.5).abs() < 1e-15);
        assert!((scaled.get(1, 1) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn round_trip_restores_values() {
        let original = image();
        let forward = rescale(&original, 0.0, 10.0, -1.0, 1.0).unwrap();
        let back = rescale(&forward, -1.0, 1.0, 0.0, 10.0).unwrap();
        for (restored, expected) in back.as_slice().iter().zip(original.as_slice()) {
            assert!((restored - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn flat_range_is_rejected() {
        let flat = ImageBuffer::from_vec(2, 2, vec![3.0; 4]).unwrap();
        let err = normalize(&flat, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, DenoiseError::DegenerateScaleRange { .. }));
    }
}
