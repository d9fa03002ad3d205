//! Reporting utilities: residuals, reference comparison, and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::domain::{FitResult, LogLawParams, Observations};
use crate::error::FitError;
use crate::models::model;

/// Fitted value and residual at one observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileResidual {
    pub z: f64,
    pub u_obs: f64,
    pub u_fit: f64,
    pub residual: f64,
}

/// Difference between the fit and a reference estimate, per parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamComparison {
    pub fitted: f64,
    pub reference: f64,
    pub delta: f64,
    /// `delta / standard_error`; infinite when the standard error is zero or
    /// not estimable.
    pub in_std_errors: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceComparison {
    pub u_star: ParamComparison,
    pub z_o: ParamComparison,
}

impl ReferenceComparison {
    /// Whether both parameters lie within `k` standard errors of the reference.
    pub fn within(&self, k: f64) -> bool {
        self.u_star.in_std_errors.abs() <= k && self.z_o.in_std_errors.abs() <= k
    }
}

/// Compute fitted values and residuals for each observation.
pub fn compute_residuals(obs: &Observations, fit: &FitResult) -> Result<Vec<ProfileResidual>, FitError> {
    let mut out = Vec::with_capacity(obs.len());
    for (z, u_obs) in obs.iter() {
        let u_fit = model(z, fit.u_star, fit.z_o)?;
        out.push(ProfileResidual {
            z,
            u_obs,
            u_fit,
            residual: u_obs - u_fit,
        });
    }
    Ok(out)
}

/// Compare fitted parameters against a reference estimate.
pub fn compare_to_reference(fit: &FitResult, reference: LogLawParams) -> ReferenceComparison {
    ReferenceComparison {
        u_star: compare_param(fit.u_star, reference.u_star, fit.se_u_star),
        z_o: compare_param(fit.z_o, reference.z_o, fit.se_z_o),
    }
}

fn compare_param(fitted: f64, reference: f64, se: f64) -> ParamComparison {
    let delta = fitted - reference;
    let in_std_errors = if se.is_finite() && se > 0.0 {
        delta / se
    } else if delta == 0.0 {
        0.0
    } else {
        f64::INFINITY.copysign(delta)
    };
    ParamComparison {
        fitted,
        reference,
        delta,
        in_std_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HAND_ESTIMATE, reference_observations};
    use crate::domain::FitQuality;
    use crate::fit::fit;

    fn fixed_fit(u_star: f64, z_o: f64, se_u_star: f64, se_z_o: f64) -> FitResult {
        FitResult {
            u_star,
            z_o,
            se_u_star,
            se_z_o,
            n_observations: 2,
            covariance: [[se_u_star * se_u_star, 0.0], [0.0, se_z_o * se_z_o]],
            quality: FitQuality { sse: 0.0, rmse: 0.0, dof: 0, iterations: 1 },
        }
    }

    #[test]
    fn compute_residuals_basic() {
        let obs = Observations::new(vec![1.0, std::f64::consts::E], vec![0.0, 2.0]).unwrap();
        // u = (0.41/0.41) ln(z/1) = ln z
        let fit = fixed_fit(0.41, 1.0, 0.1, 0.1);
        let residuals = compute_residuals(&obs, &fit).unwrap();
        assert_eq!(residuals.len(), 2);
        assert!(residuals[0].residual.abs() < 1e-12);
        assert!((residuals[1].u_fit - 1.0).abs() < 1e-12);
        assert!((residuals[1].residual - 1.0).abs() < 1e-12);
    }

    #[test]
    fn comparison_in_standard_errors() {
        let fit = fixed_fit(4.0, 0.25, 0.01, 0.05);
        let cmp = compare_to_reference(&fit, LogLawParams::new(3.98, 0.30));
        assert!((cmp.u_star.delta - 0.02).abs() < 1e-12);
        assert!((cmp.u_star.in_std_errors - 2.0).abs() < 1e-9);
        assert!((cmp.z_o.in_std_errors + 1.0).abs() < 1e-9);
        assert!(cmp.within(2.0 + 1e-9));
        assert!(!cmp.within(1.5));
    }

    #[test]
    fn comparison_with_unestimable_errors_is_infinite() {
        let fit = fixed_fit(4.0, 0.30, f64::INFINITY, f64::INFINITY);
        let cmp = compare_to_reference(&fit, LogLawParams::new(3.98, 0.30));
        assert_eq!(cmp.u_star.in_std_errors, f64::INFINITY);
        assert_eq!(cmp.z_o.in_std_errors, 0.0);
    }

    #[test]
    fn reference_fit_residuals_sum_to_reported_sse() {
        let obs = reference_observations().unwrap();
        let fit = fit(&obs, HAND_ESTIMATE).unwrap();
        let residuals = compute_residuals(&obs, &fit).unwrap();
        let sse: f64 = residuals.iter().map(|r| r.residual * r.residual).sum();
        assert!((sse - fit.quality.sse).abs() < 1e-9);
        assert!(compare_to_reference(&fit, HAND_ESTIMATE).within(3.0));
    }
}
