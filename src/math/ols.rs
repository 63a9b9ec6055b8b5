//! Ordinary least squares on small design matrices.
//!
//! The causality engine repeatedly solves lagged autoregressions of the form:
//!
//! ```text
//! minimize Σ (y_t - x_t^T β)^2
//! ```
//!
//! with at most `1 + 2 * max_lag = 9` columns, so we use SVD to solve the
//! least-squares problem robustly for tall matrices. (Nalgebra's `QR::solve`
//! is intended for square systems and will panic for non-square matrices.)
//! Lagged copies of slow-moving quarterly series are often close to collinear,
//! hence the progressively looser tolerances.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y ~ X β` and return the residual sum of squares.
///
/// Returns `None` when the solve fails or produces a non-finite SSR.
pub fn residual_sum_of_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<f64> {
    let beta = solve_least_squares(x, y)?;
    let residuals = y - x * beta;
    let ssr = residuals.iter().map(|r| r * r).sum::<f64>();
    if ssr.is_finite() { Some(ssr) } else { None }
}
