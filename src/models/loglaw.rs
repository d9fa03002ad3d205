//! Law-of-the-wall velocity profile.
//!
//! ```text
//! u(z) = (u_star / κ) · ln(z / z_o)
//! ```
//!
//! The fitter relies on two primitive operations:
//! - evaluate `u(z)` for given parameters (residuals, exports)
//! - evaluate the Jacobian row `∂u/∂(u_star, z_o)` (Levenberg–Marquardt)
//!
//! The checked entry points (`model`, `model_profile`) reject heights and
//! roughness lengths outside the logarithm's domain. The solver validates its
//! iterates once and then uses the unchecked forms.

use crate::domain::LogLawParams;
use crate::error::FitError;

/// von Kármán constant.
pub const KAPPA: f64 = 0.41;

/// Modeled velocity at height `z`.
pub fn model(z: f64, u_star: f64, z_o: f64) -> Result<f64, FitError> {
    check_domain(z, z_o)?;
    Ok(log_law(z, u_star, z_o))
}

/// Modeled velocity at each height, same length and order as `heights`.
pub fn model_profile(heights: &[f64], u_star: f64, z_o: f64) -> Result<Vec<f64>, FitError> {
    heights.iter().map(|&z| model(z, u_star, z_o)).collect()
}

/// Height at which the profile reaches velocity `u` (inverse of `model`).
///
/// Fails when `u_star` is zero, since the profile is then flat.
pub fn height_at_velocity(u: f64, params: LogLawParams) -> Result<f64, FitError> {
    if !(params.z_o.is_finite() && params.z_o > 0.0) {
        return Err(FitError::Domain(format!(
            "roughness length z_o={} must be finite and > 0",
            params.z_o
        )));
    }
    if params.u_star == 0.0 || !params.u_star.is_finite() {
        return Err(FitError::Domain(format!(
            "u_star={} has no inverse profile",
            params.u_star
        )));
    }
    Ok(params.z_o * (KAPPA * u / params.u_star).exp())
}

pub(crate) fn check_domain(z: f64, z_o: f64) -> Result<(), FitError> {
    if !(z.is_finite() && z > 0.0) {
        return Err(FitError::Domain(format!("height z={z} must be finite and > 0")));
    }
    if !(z_o.is_finite() && z_o > 0.0) {
        return Err(FitError::Domain(format!(
            "roughness length z_o={z_o} must be finite and > 0"
        )));
    }
    Ok(())
}

/// Unchecked evaluation; callers guarantee `z > 0` and `z_o > 0`.
#[inline]
pub(crate) fn log_law(z: f64, u_star: f64, z_o: f64) -> f64 {
    (u_star / KAPPA) * (z / z_o).ln()
}

/// Partial derivatives `[∂u/∂u_star, ∂u/∂z_o]` at height `z`.
#[inline]
pub fn jacobian(z: f64, u_star: f64, z_o: f64) -> [f64; 2] {
    [(z / z_o).ln() / KAPPA, -u_star / (KAPPA * z_o)]
}
