//! Linear least squares.
//!
//! Two linear subproblems show up around the nonlinear fit:
//!
//! ```text
//! minimize Σ (u_i - x_i^T β)^2
//! ```
//!
//! - the straight-line regression of `u` on `ln z` (linearized estimate)
//! - the single-column regression for `u_star` at a fixed `z_o` (grid seeding)
//!
//! We use SVD so that tall design matrices (more rows than columns) are handled
//! directly; nalgebra's `QR::solve` is intended for square systems.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // A rank-deficient design (e.g. every height equal) has a zero singular
    // value; refuse it rather than returning the minimum-norm solution.
    let s_max = svd.singular_values.max();
    let s_min = svd.singular_values.min();
    if !(s_max.is_finite() && s_max > 0.0) || s_min <= s_max * 1e-12 {
        return None;
    }

    let beta = svd.solve(y, 1e-12).ok()?;
    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}

/// Residual sum of squares `Σ (y_i - x_i^T β)^2`.
pub fn residual_sum_of_squares(x: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> f64 {
    (y - x * beta).norm_squared()
}
