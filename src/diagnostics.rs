//! Serializable run reports.

use serde::{Deserialize, Serialize};

use crate::models::SurfaceModel;

/// Aggregate diagnostics of one denoising run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenoiseReport {
    pub width: usize,
    pub height: usize,
    pub window_size: usize,
    pub model: SurfaceModel,
    /// Pixels whose fit did not converge and kept their raw value.
    pub error_pixels: usize,
    /// Sum of per-window absolute residuals over all pixels.
    pub total_fitting_error: f64,
    /// `total_fitting_error` divided by the pixel count.
    pub mean_fitting_error: f64,
    pub elapsed_ms: f64,
}
