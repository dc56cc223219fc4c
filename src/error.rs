//! Error types for the denoising pipeline.
//!
//! Only configuration-level problems surface as [`DenoiseError`]. A fit that
//! fails on an individual pixel is not an error: it is reported as a
//! non-converged outcome and counted in the aggregate report.

use thiserror::Error;

/// Errors raised while validating configuration or constructing buffers.
#[derive(Debug, Error)]
pub enum DenoiseError {
    /// Window sides must be odd and at least 5.
    #[error("window size must be odd and at least 5, got {size}")]
    InvalidWindowSize { size: usize },

    /// Zero-area images cannot be processed.
    #[error("image dimensions must be positive, got {width}x{height}")]
    EmptyImage { width: usize, height: usize },

    /// Backing storage length does not match the requested dimensions.
    #[error("buffer of length {len} does not match a {width}x{height} image")]
    BufferSizeMismatch {
        width: usize,
        height: usize,
        len: usize,
    },

    /// Source value range too narrow to rescale from.
    #[error("scale range [{min}, {max}] is too narrow to rescale")]
    DegenerateScaleRange { min: f64, max: f64 },
}

/// Result alias used across the crate.
pub type DenoiseResult<T> = Result<T, DenoiseError>;
