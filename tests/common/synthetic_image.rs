use surface_denoise::ImageBuffer;

/// Exact plane `offset + slope_x * x + slope_y * y`.
pub fn plane_image(
    width: usize,
    height: usize,
    offset: f64,
    slope_x: f64,
    slope_y: f64,
) -> ImageBuffer {
    ImageBuffer::from_fn(width, height, |x, y| {
        offset + slope_x * x as f64 + slope_y * y as f64
    })
    .expect("plane dimensions must be positive")
}

/// Image with every pixel at `value`.
pub fn constant_image(width: usize, height: usize, value: f64) -> ImageBuffer {
    ImageBuffer::from_fn(width, height, |_, _| value)
        .expect("constant image dimensions must be positive")
}
