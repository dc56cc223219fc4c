//! Implicit conic fit by iterative renormalization.
//!
//! Window samples (x, y, value) are treated as points on the quadric
//! `A x^2 + B 2xy + C y^2 + D 2f0 x + E 2f0 y + F f0^2 - G 2f0 z = 0`
//! with `theta = [A, B, C, D, E, F, G]` determined up to scale. Every
//! round solves a generalized symmetric eigenproblem for theta, then
//! reweights each sample by the inverse of its fitted noise variance.
//! The hyper-accurate mode replaces the constraint matrix with a
//! second-order bias-corrected one.
//!
//! Weights start at one, so the first round is an unweighted fit and
//! convergence is only ever declared from the second round on.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::linalg::{
    l1_distance, max_generalized_eigenvector, pseudo_inverse_rank6, symmetrize, Matrix7, Vector7,
};
use crate::models::{center_value, FitOutcome};
use crate::numeric::precise_sub;
use crate::window::{WindowGeometry, WindowSample};

/// Iteration controls of the renormalization loop.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RenormalizationParams {
    /// Upper bound on reweighting rounds before the fit gives up.
    pub max_iterations: usize,
    /// L1 threshold on the parameter change between consecutive rounds.
    pub convergence_threshold: f64,
}

impl Default for RenormalizationParams {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            convergence_threshold: 1e-4,
        }
    }
}

/// Bias handling of the renormalization scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BiasCorrection {
    /// Plain renormalization.
    None,
    /// Hyper-renormalization with the second-order bias term removed.
    HyperAccurate,
}

/// Conic fit with the geometry-derived parts precomputed.
///
/// The feature vector `zeta = [x^2, 2xy, y^2, 2f0 x, 2f0 y, f0^2, -2f0 z]`
/// and its noise covariance depend on the window coordinates only through
/// the first six slots, so both are built once per geometry; per pixel only
/// the value slot is refreshed.
#[derive(Clone, Debug)]
pub struct ConicFit {
    f_zero: f64,
    zeta_base: Vec<Vector7>,
    covariances: Vec<Matrix7>,
    correction: BiasCorrection,
    params: RenormalizationParams,
}

impl ConicFit {
    pub fn new(
        geometry: &WindowGeometry,
        correction: BiasCorrection,
        params: RenormalizationParams,
    ) -> Self {
        let f_zero = geometry.f_zero();
        let mut zeta_base = Vec::with_capacity(geometry.len());
        let mut covariances = Vec::with_capacity(geometry.len());
        for &(offset_x, offset_y) in geometry.offsets() {
            let x = f64::from(offset_x);
            let y = f64::from(offset_y);
            zeta_base.push(Vector7::from_row_slice(&[
                x * x,
                2.0 * x * y,
                y * y,
                2.0 * f_zero * x,
                2.0 * f_zero * y,
                f_zero * f_zero,
                0.0,
            ]));
            covariances.push(covariance(x, y, f_zero));
        }
        Self {
            f_zero,
            zeta_base,
            covariances,
            correction,
            params,
        }
    }

    /// Fit the conic to one window of samples. The slice must come from the
    /// geometry this fit was built for.
    pub fn fit(&self, samples: &[WindowSample]) -> FitOutcome {
        debug_assert_eq!(samples.len(), self.zeta_base.len());
        let count = samples.len() as f64;
        let raw_center = center_value(samples);

        let zetas: Vec<Vector7> = samples
            .iter()
            .zip(&self.zeta_base)
            .map(|(s, base)| {
                let mut zeta = *base;
                zeta[6] = -2.0 * self.f_zero * s.value;
                zeta
            })
            .collect();
        let outer_products: Vec<Matrix7> = zetas.iter().map(|z| z * z.transpose()).collect();
        let bias_terms = match self.correction {
            BiasCorrection::None => Vec::new(),
            BiasCorrection::HyperAccurate => {
                let e = noise_channels();
                zetas
                    .iter()
                    .zip(&self.covariances)
                    .map(|(zeta, cov)| cov + 2.0 * symmetrize(&(zeta * e.transpose())))
                    .collect()
            }
        };

        let mut weights = vec![1.0; samples.len()];
        let mut theta_prev = Vector7::zeros();
        let mut solution = None;

        for _ in 0..self.params.max_iterations {
            let mut moment = Matrix7::zeros();
            for (w, outer) in weights.iter().zip(&outer_products) {
                moment += *w * outer;
            }
            moment /= count;

            let constraint = match self.correction {
                BiasCorrection::None => {
                    let mut sum = Matrix7::zeros();
                    for (w, cov) in weights.iter().zip(&self.covariances) {
                        sum += *w * cov;
                    }
                    sum / count
                }
                BiasCorrection::HyperAccurate => self.corrected_constraint(
                    &weights,
                    &zetas,
                    &outer_products,
                    &bias_terms,
                    &moment,
                    count,
                ),
            };

            let Some(theta) = max_generalized_eigenvector(&constraint, &moment) else {
                break;
            };
            if l1_distance(&theta_prev, &theta) <= self.params.convergence_threshold {
                solution = Some(theta);
                break;
            }
            theta_prev = theta;
            for (w, cov) in weights.iter_mut().zip(&self.covariances) {
                *w = 1.0 / (cov * theta).dot(&theta);
            }
        }

        match solution {
            Some(theta) => self.recover(&theta, samples),
            None => FitOutcome::fallback(raw_center),
        }
    }

    /// Bias-corrected constraint matrix of the hyper-accurate scheme.
    ///
    /// `sum(W_i (cov_i + 2 S(zeta_i e^T))) / n` minus the second-order term
    /// `sum(W_i^2 (zeta^T M+ zeta cov_i + 2 S(cov_i M+ zeta zeta^T))) / n^2`,
    /// where `M+` is the rank-6 pseudo-inverse of the current moment matrix.
    fn corrected_constraint(
        &self,
        weights: &[f64],
        zetas: &[Vector7],
        outer_products: &[Matrix7],
        bias_terms: &[Matrix7],
        moment: &Matrix7,
        count: f64,
    ) -> Matrix7 {
        let pseudo = pseudo_inverse_rank6(moment);
        let mut first = Matrix7::zeros();
        let mut second = Matrix7::zeros();
        for i in 0..zetas.len() {
            first += weights[i] * bias_terms[i];
            let projected = (pseudo * zetas[i]).dot(&zetas[i]);
            second += weights[i]
                * weights[i]
                * (projected * self.covariances[i]
                    + 2.0 * symmetrize(&(self.covariances[i] * pseudo * outer_products[i])));
        }
        first / count - second / (count * count)
    }

    /// Denoised value, normal and residual from a converged parameter
    /// vector. All three are invariant under the sign ambiguity of theta.
    fn recover(&self, theta: &Vector7, samples: &[WindowSample]) -> FitOutcome {
        let f = self.f_zero;
        let g = theta[6];
        let value = theta[5] * f / (2.0 * g);
        let normal = Vector3::new(-theta[3] / g, -theta[4] / g, 1.0).normalize();

        let mut fitting_error = 0.0;
        for s in samples {
            let x = f64::from(s.offset_x);
            let y = f64::from(s.offset_y);
            let estimate = (theta[0] * x * x
                + theta[1] * x * y
                + theta[2] * y * y
                + theta[3] * 2.0 * f * x
                + theta[4] * 2.0 * f * y
                + theta[5] * f * f)
                / (g * 2.0 * f);
            fitting_error += precise_sub(s.value, estimate).abs();
        }
        FitOutcome {
            value,
            normal,
            fitting_error,
            converged: true,
        }
    }
}

/// Indicator of the zeta channels whose second-order noise moment survives.
fn noise_channels() -> Vector7 {
    Vector7::from_row_slice(&[1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0])
}

/// Noise covariance of zeta under unit value noise. Depends only on the
/// window coordinates and the scale constant, never on the value itself.
fn covariance(x: f64, y: f64, f_zero: f64) -> Matrix7 {
    let f = f_zero;
    let mut cov = Matrix7::zeros();
    cov[(0, 0)] = x * x;
    cov[(0, 1)] = x * y;
    cov[(0, 3)] = f * x;
    cov[(1, 0)] = x * y;
    cov[(1, 1)] = x * x + y * y;
    cov[(1, 2)] = x * y;
    cov[(1, 3)] = f * y;
    cov[(1, 4)] = f * x;
    cov[(2, 1)] = x * y;
    cov[(2, 2)] = y * y;
    cov[(2, 4)] = f * y;
    cov[(3, 0)] = f * x;
    cov[(3, 1)] = f * y;
    cov[(3, 3)] = f * f;
    cov[(4, 1)] = f * x;
    cov[(4, 2)] = f * y;
    cov[(4, 4)] = f * f;
    cov[(6, 6)] = f * f;
    cov * 4.0
}
