//! Local surface models fitted to each sampling window.
//!
//! Two families exist: a separable paraboloid solved directly from normal
//! equations ([`circle::CircleFit`]) and an implicit conic solved by
//! iterative renormalization ([`conic::ConicFit`]), optionally with a
//! hyper-accurate bias correction. The set is closed and selected once at
//! configuration time through [`SurfaceModel`].

pub mod circle;
pub mod conic;

pub use circle::CircleFit;
pub use conic::{BiasCorrection, ConicFit, RenormalizationParams};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::window::WindowSample;

/// Which surface family to fit in every window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceModel {
    /// Separable paraboloid, non-iterative.
    Circle,
    /// Implicit conic via renormalization.
    Ellipse,
    /// Implicit conic via hyper-renormalization.
    HyperEllipse,
}

impl Default for SurfaceModel {
    fn default() -> Self {
        SurfaceModel::Circle
    }
}

/// Result of fitting one window.
///
/// A fit that cannot converge is not an error: the pixel keeps its raw
/// value with an upright normal and is flagged through `converged`.
#[derive(Clone, Copy, Debug)]
pub struct FitOutcome {
    /// Denoised value at the window center.
    pub value: f64,
    /// Unit surface normal at the window center.
    pub normal: Vector3<f64>,
    /// Window sum of absolute residuals between observed and fitted values.
    pub fitting_error: f64,
    /// False when the fit fell back to the raw center value.
    pub converged: bool,
}

impl FitOutcome {
    /// Fallback outcome for a window whose fit failed.
    pub fn fallback(raw_center: f64) -> Self {
        Self {
            value: raw_center,
            normal: Vector3::new(0.0, 0.0, 1.0),
            fitting_error: 0.0,
            converged: false,
        }
    }
}

/// Raw value at the window center, offset (0, 0).
///
/// Windows are odd-sized and scanned in row-major order, which puts the
/// center at the middle index.
pub(crate) fn center_value(samples: &[WindowSample]) -> f64 {
    samples[samples.len() / 2].value
}
