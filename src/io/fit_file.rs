//! Write fit JSON files.
//!
//! The fit JSON is the "portable" representation of a fitted profile:
//! - the observations the fit was computed from
//! - parameters, standard errors, covariance, and fit quality
//! - a precomputed fitted grid from `z_o` up to the highest observation
//!
//! The schema is defined by `domain::FitFile`. JSON has no infinity, so
//! unestimable covariance entries are written as `null`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{FitFile, FitResult, Observations, ProfileGrid};
use crate::error::AppError;
use crate::fit::log_space;
use crate::models::{KAPPA, log_law};

/// Number of heights in the exported profile grid.
const GRID_POINTS: usize = 101;

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, obs: &Observations, fit: &FitResult) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display())))?;

    let doc = build_fit_file(obs, fit)?;
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;

    Ok(())
}

/// Assemble the JSON document for a fit.
pub fn build_fit_file(obs: &Observations, fit: &FitResult) -> Result<FitFile, AppError> {
    let (_, z_max) = obs.height_range();
    let grid = build_grid(fit, z_max, GRID_POINTS)?;
    Ok(FitFile {
        tool: "logfit".to_string(),
        generated: Utc::now(),
        kappa: KAPPA,
        observations: obs.iter().collect(),
        fit: fit.clone(),
        grid,
    })
}

/// Log-spaced heights from `z_o` (where the profile crosses zero) to `z_max`.
fn build_grid(fit: &FitResult, z_max: f64, n: usize) -> Result<ProfileGrid, AppError> {
    let z_lo = fit.z_o;
    let z_hi = if z_max > z_lo { z_max } else { z_lo * 10.0 };
    let heights = log_space(z_lo, z_hi, n.max(2))
        .map_err(|e| AppError::new(4, format!("Failed to build profile grid: {e}")))?;
    let velocities = heights
        .iter()
        .map(|&z| log_law(z, fit.u_star, fit.z_o))
        .collect();
    Ok(ProfileGrid { heights, velocities })
}
