//! Dense 7x7 linear algebra for the surface fits.
//!
//! The renormalization loop needs the dominant eigenpair of a generalized
//! symmetric problem and a rank-truncated inverse of the scatter matrix.
//! nalgebra has no generalized eigensolver, so the problem is reduced to a
//! standard symmetric one through a Cholesky factor.

use nalgebra::{Cholesky, SymmetricEigen};

pub type Vector7 = nalgebra::SVector<f64, 7>;
pub type Matrix7 = nalgebra::SMatrix<f64, 7, 7>;

/// Symmetric part `(a + a^T) / 2`.
#[inline]
pub fn symmetrize(a: &Matrix7) -> Matrix7 {
    (a + a.transpose()) * 0.5
}

/// Sum of absolute component differences, the renormalization
/// convergence metric.
#[inline]
pub fn l1_distance(a: &Vector7, b: &Vector7) -> f64 {
    (a - b).abs().sum()
}

/// Solve `n * theta = mu * m * theta` for the eigenvector with the largest
/// `mu`, returned unit-normalized.
///
/// `m` must be symmetric positive definite; the problem is reduced with
/// `m = L L^T` to `L^-1 n L^-T y = mu y` and the result mapped back through
/// `theta = L^-T y`. Returns `None` when the factorization or a triangular
/// solve fails, which the callers treat as a degenerate window.
pub fn max_generalized_eigenvector(n: &Matrix7, m: &Matrix7) -> Option<Vector7> {
    let chol = Cholesky::new(*m)?;
    let l = chol.l();
    let half = l.solve_lower_triangular(n)?;
    let reduced = symmetrize(&l.solve_lower_triangular(&half.transpose())?);
    let eigen = SymmetricEigen::new(reduced);
    // nalgebra does not order the eigenvalues.
    let mut best = 0;
    for i in 1..eigen.eigenvalues.len() {
        if eigen.eigenvalues[i] > eigen.eigenvalues[best] {
            best = i;
        }
    }
    let y = eigen.eigenvectors.column(best).into_owned();
    let theta = l.transpose().solve_upper_triangular(&y)?;
    Some(theta.normalize())
}

/// Pseudo-inverse of a symmetric matrix truncated to rank 6.
///
/// The eigenvalue closest to zero is dropped and the inverse assembled from
/// the remaining six eigenpairs. Assumes exactly one near-null direction;
/// feeding a matrix with more leaves the result meaningless.
pub fn pseudo_inverse_rank6(m: &Matrix7) -> Matrix7 {
    let eigen = SymmetricEigen::new(*m);
    let mut skip = 0;
    for i in 1..eigen.eigenvalues.len() {
        if eigen.eigenvalues[i].abs() < eigen.eigenvalues[skip].abs() {
            skip = i;
        }
    }
    let mut inv = Matrix7::zeros();
    for i in 0..eigen.eigenvalues.len() {
        if i == skip {
            continue;
        }
        let v = eigen.eigenvectors.column(i);
        inv += v * v.transpose() / eigen.eigenvalues[i];
    }
    inv
}
