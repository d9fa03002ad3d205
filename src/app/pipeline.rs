//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place keeps the CLI focused on presentation:
//! observations -> initial guess -> fit -> residuals -> comparisons

use tracing::{debug, warn};

use crate::domain::{FitConfig, FitResult, GuessSource, LogLawParams, Observations, SeedGrid};
use crate::error::AppError;
use crate::fit::{fit_with, linearized_estimate, seed_from_grid};
use crate::report::{ProfileResidual, ReferenceComparison, compare_to_reference, compute_residuals};

/// All computed outputs of a single `logfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub observations: Observations,
    pub initial_guess: LogLawParams,
    pub fit: FitResult,
    pub residuals: Vec<ProfileResidual>,
    /// Straight-line estimate in `ln z`, when the regression is defined.
    pub linearized: Option<LogLawParams>,
    pub comparison: Option<ReferenceComparison>,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    // 1) Validate observations.
    let observations = Observations::new(config.heights.clone(), config.velocities.clone())?;

    // 2) Resolve the initial guess.
    let initial_guess = match config.guess {
        GuessSource::Explicit(guess) => guess,
        GuessSource::Grid => seed_from_grid(&observations, &SeedGrid::for_observations(&observations))?,
    };
    debug!(u_star0 = initial_guess.u_star, z_o0 = initial_guess.z_o, "initial guess");

    // 3) Fit.
    let fit = fit_with(&observations, initial_guess, &config.solver)?;

    // 4) Residuals and comparisons.
    let residuals = compute_residuals(&observations, &fit)?;
    let linearized = match linearized_estimate(&observations) {
        Ok(est) => Some(est),
        Err(e) => {
            warn!("linearized estimate unavailable: {e}");
            None
        }
    };
    let comparison = config.reference.map(|r| compare_to_reference(&fit, r));

    Ok(RunOutput {
        observations,
        initial_guess,
        fit,
        residuals,
        linearized,
        comparison,
    })
}
