#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod buffer;
pub mod denoise;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod progress;
pub mod scale;
pub mod window;

// Numeric internals. Public for reuse, unstable in detail.
pub mod linalg;
pub mod numeric;

// --- High-level re-exports -------------------------------------------------

// Main entry points: driver + buffers.
pub use crate::buffer::{ImageBuffer, NormalBuffer};
pub use crate::denoise::{DenoiseOutput, DenoiseParams, Denoiser};

// Run diagnostics and error taxonomy.
pub use crate::diagnostics::DenoiseReport;
pub use crate::error::{DenoiseError, DenoiseResult};

// Model selection and per-pixel outcomes.
pub use crate::models::{FitOutcome, RenormalizationParams, SurfaceModel};
pub use crate::progress::{ProgressCounter, ProgressSnapshot};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use surface_denoise::prelude::*;
///
/// # fn main() -> Result<(), DenoiseError> {
/// let image = ImageBuffer::from_fn(64, 64, |x, y| (x + y) as f64 / 128.0)?;
///
/// let denoiser = Denoiser::new(DenoiseParams {
///     model: SurfaceModel::HyperEllipse,
///     ..Default::default()
/// })?;
///
/// let output = denoiser.process(&image)?;
/// println!(
///     "error pixels {} mean fitting error {:.6}",
///     output.report.error_pixels, output.report.mean_fitting_error
/// );
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::buffer::{ImageBuffer, NormalBuffer};
    pub use crate::denoise::{DenoiseOutput, DenoiseParams, Denoiser};
    pub use crate::error::{DenoiseError, DenoiseResult};
    pub use crate::models::SurfaceModel;
}
