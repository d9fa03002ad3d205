//! Hand-fit estimate from a straight line in `ln z`.
//!
//! The law of the wall is a line in `ln z`:
//!
//! ```text
//! u = b ln z + a,   b = u_star / κ,   a = -b ln z_o
//! ```
//!
//! Regressing `u` on `ln z` and inverting gives `u_star = κ b` and
//! `z_o = exp(-a / b)`. Because this is an invertible reparameterization
//! (for `u_star ≠ 0`), it is also the minimizer of the nonlinear problem.

use nalgebra::{DMatrix, DVector};

use crate::domain::{LogLawParams, Observations};
use crate::error::FitError;
use crate::math::solve_least_squares;
use crate::models::KAPPA;

/// Estimate `(u_star, z_o)` by ordinary least squares of `u` on `ln z`.
pub fn linearized_estimate(obs: &Observations) -> Result<LogLawParams, FitError> {
    let n = obs.len();
    let mut x = DMatrix::<f64>::zeros(n, 2);
    for (i, &z) in obs.heights().iter().enumerate() {
        x[(i, 0)] = 1.0;
        x[(i, 1)] = z.ln();
    }
    let y = DVector::from_column_slice(obs.velocities());

    let beta = solve_least_squares(&x, &y)
        .ok_or_else(|| FitError::Singular("u vs ln z regression is ill-conditioned".to_string()))?;
    let (intercept, slope) = (beta[0], beta[1]);
    if slope == 0.0 {
        return Err(FitError::Singular(
            "zero slope in u vs ln z; z_o is undefined".to_string(),
        ));
    }

    let z_o = (-intercept / slope).exp();
    if !(z_o.is_finite() && z_o > 0.0) {
        return Err(FitError::Domain(format!(
            "linearized roughness length z_o={z_o} is out of range"
        )));
    }
    Ok(LogLawParams::new(KAPPA * slope, z_o))
}
