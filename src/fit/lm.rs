//! Levenberg–Marquardt fit of the law-of-the-wall profile.
//!
//! Given:
//! - heights `z_i`
//! - observed velocities `u_i`
//! - an initial guess `(u_star0, z_o0)`
//!
//! we minimize `Σ (u_i - (u_star/κ) ln(z_i/z_o))^2` by damped Gauss–Newton steps
//!
//! ```text
//! (JᵀJ + λ diag(JᵀJ)) δ = Jᵀr
//! ```
//!
//! with the damping `λ` adapted from the gain ratio (actual vs predicted
//! reduction). Standard errors come from `σ² (JᵀJ)⁻¹` at the solution.
//!
//! The bounded search iterates on `(u_star, ln z_o)`, so every iterate has
//! `z_o > 0`. The unbounded search iterates on `(u_star, z_o)` directly and
//! fails with a domain error once a step leaves `z_o > 0`.
//!
//! Both stopping rules are scale-aware: the step test uses the Marquardt
//! scaling `D = sqrt(diag(JᵀJ))`, and the reduction test requires the gain
//! ratio to be sane (`ρ ≤ 2`), as in MINPACK's `lmder`.

use nalgebra::{Matrix2, Vector2};
use tracing::{debug, info, trace, warn};

use crate::domain::{FitQuality, FitResult, LogLawParams, Observations, SolverConfig};
use crate::error::FitError;
use crate::models::{check_domain, jacobian, log_law};

/// Number of fitted parameters.
const N_PARAMS: usize = 2;

/// Relative floor applied to the scaling diagonal, so a vanishing column
/// (e.g. `u_star = 0`) still yields a solvable damped system.
const DIAG_FLOOR: f64 = 1e-12;

/// Coordinates the solver iterates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coordinates {
    /// `(u_star, ln z_o)`.
    LogRoughness,
    /// `(u_star, z_o)`.
    Direct,
}

impl Coordinates {
    fn for_config(config: &SolverConfig) -> Self {
        if config.bounded {
            Self::LogRoughness
        } else {
            Self::Direct
        }
    }

    fn to_internal(self, params: LogLawParams) -> Vector2<f64> {
        match self {
            Self::LogRoughness => Vector2::new(params.u_star, params.z_o.ln()),
            Self::Direct => Vector2::new(params.u_star, params.z_o),
        }
    }

    fn z_o(self, q: &Vector2<f64>) -> f64 {
        match self {
            Self::LogRoughness => q[1].exp(),
            Self::Direct => q[1],
        }
    }

    fn to_params(self, q: &Vector2<f64>) -> LogLawParams {
        LogLawParams::new(q[0], self.z_o(q))
    }

    /// Jacobian row in solver coordinates (`∂u/∂ln z_o = z_o ∂u/∂z_o`).
    fn jacobian_row(self, z: f64, q: &Vector2<f64>) -> Vector2<f64> {
        let z_o = self.z_o(q);
        let [du, dz] = jacobian(z, q[0], z_o);
        match self {
            Self::LogRoughness => Vector2::new(du, dz * z_o),
            Self::Direct => Vector2::new(du, dz),
        }
    }
}

/// Fit with default solver settings.
pub fn fit(obs: &Observations, initial_guess: LogLawParams) -> Result<FitResult, FitError> {
    fit_with(obs, initial_guess, &SolverConfig::default())
}

/// Fit with explicit solver settings.
pub fn fit_with(
    obs: &Observations,
    initial_guess: LogLawParams,
    config: &SolverConfig,
) -> Result<FitResult, FitError> {
    config.validate()?;
    if !initial_guess.u_star.is_finite() {
        return Err(FitError::Domain(format!(
            "initial u_star={} must be finite",
            initial_guess.u_star
        )));
    }
    if !(initial_guess.z_o.is_finite() && initial_guess.z_o > 0.0) {
        return Err(FitError::Domain(format!(
            "initial z_o={} must be finite and > 0",
            initial_guess.z_o
        )));
    }
    for &z in obs.heights() {
        check_domain(z, initial_guess.z_o)?;
    }

    let z = obs.heights();
    let u = obs.velocities();
    let coords = Coordinates::for_config(config);

    let mut q = coords.to_internal(initial_guess);
    let mut r = residuals(z, u, coords.to_params(&q));
    let mut sse = r.iter().map(|v| v * v).sum::<f64>();
    let mut lambda = config.lambda_init;
    let mut nu = 2.0;
    let mut iterations = 0usize;

    debug!(
        u_star = initial_guess.u_star,
        z_o = initial_guess.z_o,
        sse,
        ?coords,
        "starting Levenberg-Marquardt"
    );

    let outcome: Result<(), FitError> = 'outer: loop {
        if sse == 0.0 {
            break Ok(());
        }

        let (jtj, g) = normal_equations(coords, z, &r, &q);
        if g.amax() <= config.gtol {
            debug!(gradient = g.amax(), "gradient tolerance met");
            break Ok(());
        }

        let d_max = jtj[(0, 0)].max(jtj[(1, 1)]);
        if !(d_max.is_finite() && d_max > 0.0) {
            return Err(FitError::Singular(
                "Jacobian has no usable columns at the current iterate".to_string(),
            ));
        }
        let diag = Vector2::new(
            jtj[(0, 0)].max(d_max * DIAG_FLOOR),
            jtj[(1, 1)].max(d_max * DIAG_FLOOR),
        );
        let scale = diag.map(f64::sqrt);

        // Inner loop: raise the damping until a step reduces the objective.
        loop {
            if iterations >= config.max_iter {
                break 'outer Err(FitError::NoConvergence { iterations, sse });
            }
            iterations += 1;

            let damped = jtj + Matrix2::from_diagonal(&(diag * lambda));
            let Some(delta) = damped.cholesky().map(|c| c.solve(&g)) else {
                return Err(FitError::Singular(format!(
                    "damped normal matrix not positive definite (λ={lambda:.3e})"
                )));
            };
            let trial = q + delta;
            let trial_params = coords.to_params(&trial);

            if !(trial_params.z_o.is_finite() && trial_params.z_o > 0.0) {
                if coords == Coordinates::Direct {
                    return Err(FitError::Domain(format!(
                        "iterate {iterations} drove z_o to {} (search is unbounded)",
                        trial_params.z_o
                    )));
                }
                // exp(ln z_o) under- or overflowed.
                trace!(iterations, ln_z_o = trial[1], "z_o not representable; increasing damping");
                lambda *= nu;
                nu *= 2.0;
                continue;
            }

            let r_trial = residuals(z, u, trial_params);
            let sse_trial = r_trial.iter().map(|v| v * v).sum::<f64>();

            // Predicted reduction of the linearized model: δᵀ(λ D δ + g).
            let predicted = delta.dot(&(diag.component_mul(&delta) * lambda + g));
            let actual = sse - sse_trial;
            let rho = if predicted > 0.0 && sse_trial.is_finite() {
                actual / predicted
            } else {
                -1.0
            };

            if rho <= 0.0 {
                trace!(iterations, sse_trial, lambda, "step rejected");
                lambda *= nu;
                nu *= 2.0;
                continue;
            }

            let scaled_step = scale.component_mul(&delta).norm();
            let scaled_params = scale.component_mul(&q).norm();
            let rel_actual = actual / sse;
            let rel_predicted = predicted / sse;

            q = trial;
            r = r_trial;
            sse = sse_trial;
            lambda *= (1.0 - (2.0 * rho - 1.0).powi(3)).max(1.0 / 3.0);
            nu = 2.0;

            debug!(
                iterations,
                u_star = trial_params.u_star,
                z_o = trial_params.z_o,
                sse,
                lambda,
                "step accepted"
            );

            let converged = sse == 0.0
                || (rel_actual <= config.ftol && rel_predicted <= config.ftol && 0.5 * rho <= 1.0)
                || scaled_step <= config.xtol * scaled_params;
            if converged {
                break 'outer Ok(());
            }
            break;
        }
    };
    outcome?;

    let params = coords.to_params(&q);
    let n = obs.len();
    let dof = n.saturating_sub(N_PARAMS);
    let covariance = covariance(z, params, sse, dof);
    let se_u_star = covariance[0][0].sqrt();
    let se_z_o = covariance[1][1].sqrt();

    info!(
        u_star = params.u_star,
        z_o = params.z_o,
        se_u_star,
        se_z_o,
        sse,
        iterations,
        "fit converged"
    );

    Ok(FitResult {
        u_star: params.u_star,
        z_o: params.z_o,
        se_u_star,
        se_z_o,
        n_observations: n,
        covariance,
        quality: FitQuality {
            sse,
            rmse: (sse / n as f64).sqrt(),
            dof,
            iterations,
        },
    })
}

fn residuals(z: &[f64], u: &[f64], params: LogLawParams) -> Vec<f64> {
    z.iter()
        .zip(u.iter())
        .map(|(&zi, &ui)| ui - log_law(zi, params.u_star, params.z_o))
        .collect()
}

/// `JᵀJ` and `Jᵀr` accumulated row by row.
fn normal_equations(
    coords: Coordinates,
    z: &[f64],
    r: &[f64],
    q: &Vector2<f64>,
) -> (Matrix2<f64>, Vector2<f64>) {
    let mut jtj = Matrix2::zeros();
    let mut g = Vector2::zeros();
    for (&zi, &ri) in z.iter().zip(r.iter()) {
        let row = coords.jacobian_row(zi, q);
        jtj += row * row.transpose();
        g += row * ri;
    }
    (jtj, g)
}

/// Covariance of `(u_star, z_o)`, whatever coordinates the search used.
fn covariance(z: &[f64], params: LogLawParams, sse: f64, dof: usize) -> [[f64; 2]; 2] {
    let unestimable = [[f64::INFINITY; 2]; 2];
    if dof == 0 {
        warn!("zero degrees of freedom; covariance is not estimable");
        return unestimable;
    }

    let mut jtj = Matrix2::<f64>::zeros();
    for &zi in z {
        let row = Vector2::from(jacobian(zi, params.u_star, params.z_o));
        jtj += row * row.transpose();
    }
    let Some(inv) = jtj.try_inverse() else {
        warn!("singular JᵀJ at the solution; covariance is not estimable");
        return unestimable;
    };

    let sigma2 = sse / dof as f64;
    let cov = inv * sigma2;
    if cov[(0, 0)] < 0.0 || cov[(1, 1)] < 0.0 || cov.iter().any(|v| !v.is_finite()) {
        warn!("invalid covariance diagonal; reporting infinite standard errors");
        return unestimable;
    }
    [[cov[(0, 0)], cov[(0, 1)]], [cov[(1, 0)], cov[(1, 1)]]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HAND_ESTIMATE, reference_observations};
    use crate::fit::linearized_estimate;
    use crate::models::model_profile;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const WIDE_HEIGHTS: [f64; 6] = [2.0, 5.0, 13.0, 40.0, 100.0, 300.0];

    fn synthetic(heights: &[f64], u_star: f64, z_o: f64) -> Observations {
        let u = model_profile(heights, u_star, z_o).unwrap();
        Observations::new(heights.to_vec(), u).unwrap()
    }

    #[test]
    fn recovers_parameters_from_noiseless_profile() {
        let obs = synthetic(&[5.0, 10.0, 20.0, 50.0, 100.0], 2.5, 0.05);
        for guess in [(1.0, 1.0), (2.0, 0.1), (5.0, 0.5)] {
            let fit = fit(&obs, LogLawParams::new(guess.0, guess.1)).unwrap();
            assert_relative_eq!(fit.u_star, 2.5, max_relative = 1e-6);
            assert_relative_eq!(fit.z_o, 0.05, max_relative = 1e-6);
            assert!(fit.quality.sse < 1e-12);
            assert_eq!(fit.n_observations, 5);
        }
    }

    #[test]
    fn recovers_roughness_decades_below_the_guess() {
        let obs = synthetic(&WIDE_HEIGHTS, 7.8, 1e-4);
        let fit = fit(&obs, LogLawParams::new(1.0, 1.0)).unwrap();
        let expected = linearized_estimate(&obs).unwrap();

        assert_relative_eq!(fit.u_star, expected.u_star, max_relative = 1e-6);
        assert_relative_eq!(fit.z_o, expected.z_o, max_relative = 1e-6);
        assert_relative_eq!(fit.z_o, 1e-4, max_relative = 1e-6);
        assert!(fit.quality.sse < 1e-12, "sse={}", fit.quality.sse);
    }

    #[test]
    fn bounded_and_unbounded_searches_agree_near_the_optimum() {
        let obs = reference_observations().unwrap();
        let unbounded = SolverConfig {
            bounded: false,
            ..SolverConfig::default()
        };
        let a = fit(&obs, HAND_ESTIMATE).unwrap();
        let b = fit_with(&obs, HAND_ESTIMATE, &unbounded).unwrap();
        assert_relative_eq!(a.u_star, b.u_star, max_relative = 1e-6);
        assert_relative_eq!(a.z_o, b.z_o, max_relative = 1e-6);
        assert_relative_eq!(a.se_z_o, b.se_z_o, max_relative = 1e-4);
    }

    #[test]
    fn reference_fit_agrees_with_hand_estimate() {
        let obs = reference_observations().unwrap();
        let fit = fit(&obs, LogLawParams::new(4.0, 0.3)).unwrap();

        assert!((fit.u_star - 3.93325).abs() < 1e-4, "u_star={}", fit.u_star);
        assert!((fit.z_o - 0.28419).abs() < 1e-4, "z_o={}", fit.z_o);
        assert!((fit.se_u_star - 0.05615).abs() < 1e-3, "se_u_star={}", fit.se_u_star);
        assert!((fit.se_z_o - 0.02190).abs() < 1e-3, "se_z_o={}", fit.se_z_o);

        assert!((fit.u_star - HAND_ESTIMATE.u_star).abs() < 3.0 * fit.se_u_star);
        assert!((fit.z_o - HAND_ESTIMATE.z_o).abs() < 3.0 * fit.se_z_o);
        assert_eq!(fit.quality.dof, 2);
    }

    #[test]
    fn converges_from_distant_guesses() {
        let obs = reference_observations().unwrap();
        for guess in [(1.0, 1.0), (1.0, 0.01), (10.0, 5.0), (0.1, 0.1), (1.0, 100.0), (-1.0, 1.0)] {
            let fit = fit(&obs, LogLawParams::new(guess.0, guess.1)).unwrap();
            assert_relative_eq!(fit.u_star, 3.93325, max_relative = 1e-5);
            assert_relative_eq!(fit.z_o, 0.284190, max_relative = 1e-4);
        }
    }

    #[test]
    fn covariance_is_symmetric_with_matching_standard_errors() {
        let fit = fit(&reference_observations().unwrap(), LogLawParams::new(4.0, 0.3)).unwrap();
        let c = fit.covariance;
        assert_relative_eq!(c[0][1], c[1][0], max_relative = 1e-12);
        assert_relative_eq!(c[0][0].sqrt(), fit.se_u_star);
        assert_relative_eq!(c[1][1].sqrt(), fit.se_z_o);
    }

    #[test]
    fn non_positive_initial_roughness_is_a_domain_error() {
        let obs = reference_observations().unwrap();
        for z_o0 in [0.0, -0.3, f64::NAN] {
            let err = fit(&obs, LogLawParams::new(4.0, z_o0)).unwrap_err();
            assert!(matches!(err, FitError::Domain(_)), "{err:?}");
        }
        let err = fit(&obs, LogLawParams::new(f64::INFINITY, 0.3)).unwrap_err();
        assert!(matches!(err, FitError::Domain(_)));
    }

    #[test]
    fn unbounded_search_reports_domain_error_when_z_o_goes_negative() {
        let obs = reference_observations().unwrap();
        let config = SolverConfig {
            bounded: false,
            ..SolverConfig::default()
        };
        let err = fit_with(&obs, LogLawParams::new(1.0, 1.0), &config).unwrap_err();
        assert!(matches!(err, FitError::Domain(_)), "{err:?}");

        // The bounded search from the same start stays in the domain.
        let fit = fit(&obs, LogLawParams::new(1.0, 1.0)).unwrap();
        assert!(fit.z_o > 0.0);
    }

    #[test]
    fn exhausted_budget_is_a_convergence_error() {
        let obs = reference_observations().unwrap();
        let config = SolverConfig {
            max_iter: 2,
            ..SolverConfig::default()
        };
        let err = fit_with(&obs, LogLawParams::new(1.0, 1.0), &config).unwrap_err();
        match err {
            FitError::NoConvergence { iterations, sse } => {
                assert_eq!(iterations, 2);
                assert!(sse.is_finite());
            }
            other => panic!("expected NoConvergence, got {other:?}"),
        }
    }

    #[test]
    fn two_points_fit_exactly_with_unestimable_errors() {
        let obs = Observations::new(vec![10.0, 100.0], vec![20.0, 40.0]).unwrap();
        let fit = fit(&obs, LogLawParams::new(1.0, 1.0)).unwrap();
        assert!(fit.quality.sse < 1e-12);
        assert_eq!(fit.quality.dof, 0);
        assert!(fit.se_u_star.is_infinite());
        assert!(fit.se_z_o.is_infinite());
        // Slope 20 / ln(10) in u vs ln z, zero crossing at z = 1.
        assert_relative_eq!(fit.u_star, 0.41 * 20.0 / 10f64.ln(), max_relative = 1e-6);
        assert_relative_eq!(fit.z_o, 1.0, max_relative = 1e-6);
    }

    #[test]
    fn invalid_solver_config_is_rejected_before_iterating() {
        let obs = reference_observations().unwrap();
        let config = SolverConfig {
            ftol: -1.0,
            ..SolverConfig::default()
        };
        let err = fit_with(&obs, LogLawParams::new(4.0, 0.3), &config).unwrap_err();
        assert!(matches!(err, FitError::InvalidConfig(_)));
    }

    proptest! {
        #[test]
        fn noiseless_fit_is_the_closed_form_optimum_or_an_error(
            u_star in 0.5f64..10.0,
            log10_z_o in -5.0f64..0.0,
        ) {
            let z_o = 10f64.powf(log10_z_o);
            let obs = synthetic(&WIDE_HEIGHTS, u_star, z_o);
            let expected = linearized_estimate(&obs).unwrap();
            if let Ok(fit) = fit(&obs, LogLawParams::new(1.0, 1.0)) {
                prop_assert!(
                    (fit.u_star - expected.u_star).abs() <= 1e-6 * expected.u_star.abs(),
                    "u_star {} vs {}", fit.u_star, expected.u_star
                );
                prop_assert!(
                    (fit.z_o - expected.z_o).abs() <= 1e-6 * expected.z_o,
                    "z_o {} vs {}", fit.z_o, expected.z_o
                );
            }
        }
    }
}
