//! Separable paraboloid fit `a x^2 + b x + c y^2 + d y + e`.
//!
//! The least-squares normal equations split into a 3x3 system for
//! `(a, c, e)` plus two scalar averages for `b` and `d`, because odd
//! powers of the centered offsets sum to zero over the window. The 3x3
//! matrix depends only on the window geometry and is factored once; per
//! pixel only the right-hand side changes.

use nalgebra::{Const, FullPivLU, Matrix3, Vector3};

use crate::models::{center_value, FitOutcome};
use crate::numeric::precise_sub;
use crate::window::{WindowGeometry, WindowSample};

/// Direct paraboloid fit with precomputed geometry moments.
#[derive(Clone, Debug)]
pub struct CircleFit {
    lu: FullPivLU<f64, Const<3>, Const<3>>,
    sum_x2: f64,
    sum_y2: f64,
}

impl CircleFit {
    /// Precompute the moment matrix of `geometry` and factor it.
    pub fn new(geometry: &WindowGeometry) -> Self {
        let mut sum_x4 = 0.0;
        let mut sum_x2y2 = 0.0;
        let mut sum_x2 = 0.0;
        let mut sum_y4 = 0.0;
        let mut sum_y2 = 0.0;
        for &(offset_x, offset_y) in geometry.offsets() {
            let x2 = f64::from(offset_x) * f64::from(offset_x);
            let y2 = f64::from(offset_y) * f64::from(offset_y);
            sum_x4 += x2 * x2;
            sum_x2y2 += x2 * y2;
            sum_x2 += x2;
            sum_y4 += y2 * y2;
            sum_y2 += y2;
        }
        let moments = Matrix3::new(
            sum_x4,
            sum_x2y2,
            sum_x2,
            sum_x2y2,
            sum_y4,
            sum_y2,
            sum_x2,
            sum_y2,
            geometry.len() as f64,
        );
        Self {
            lu: moments.full_piv_lu(),
            sum_x2,
            sum_y2,
        }
    }

    /// Fit the paraboloid to one window of samples.
    pub fn fit(&self, samples: &[WindowSample]) -> FitOutcome {
        let mut sum_x2v = 0.0;
        let mut sum_y2v = 0.0;
        let mut sum_v = 0.0;
        let mut sum_xv = 0.0;
        let mut sum_yv = 0.0;
        for s in samples {
            let x = f64::from(s.offset_x);
            let y = f64::from(s.offset_y);
            sum_x2v += x * x * s.value;
            sum_y2v += y * y * s.value;
            sum_v += s.value;
            sum_xv += x * s.value;
            sum_yv += y * s.value;
        }
        let rhs = Vector3::new(sum_x2v, sum_y2v, sum_v);
        let Some(ace) = self.lu.solve(&rhs) else {
            return FitOutcome::fallback(center_value(samples));
        };
        let (a, c, e) = (ace[0], ace[1], ace[2]);
        let b = sum_xv / self.sum_x2;
        let d = sum_yv / self.sum_y2;

        let mut fitting_error = 0.0;
        for s in samples {
            let x = f64::from(s.offset_x);
            let y = f64::from(s.offset_y);
            let estimate = a * x * x + b * x + c * y * y + d * y + e;
            fitting_error += precise_sub(s.value, estimate).abs();
        }
        FitOutcome {
            value: e,
            normal: Vector3::new(-b, -d, 1.0).normalize(),
            fitting_error,
            converged: true,
        }
    }
}
