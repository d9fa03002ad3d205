//! Initial-guess generation by grid search over `z_o`.
//!
//! For a fixed roughness length the model is linear in `u_star`:
//!
//! ```text
//! u_i = u_star · x_i,   x_i = ln(z_i / z_o) / κ
//! ```
//!
//! so each grid point costs one single-column least-squares solve. We evaluate
//! a log-spaced `z_o` grid (in parallel) and keep the lowest-SSE candidate.
//! The result is deterministic and always lies inside `z_o > 0`, which makes it
//! a safe starting point for Levenberg–Marquardt.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::debug;

use crate::domain::{LogLawParams, Observations, SeedGrid};
use crate::error::FitError;
use crate::math::{residual_sum_of_squares, solve_least_squares};
use crate::models::KAPPA;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, FitError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(FitError::InvalidConfig(format!(
            "invalid grid range: min={min}, max={max} (must be finite, >0, and max>min)"
        )));
    }
    if steps < 2 {
        return Err(FitError::InvalidConfig("grid steps must be >= 2".to_string()));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    // Pin the endpoints exactly.
    out[0] = min;
    out[steps - 1] = max;
    Ok(out)
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    params: LogLawParams,
    sse: f64,
}

/// Pick an initial guess from a log-spaced `z_o` grid.
pub fn seed_from_grid(obs: &Observations, grid: &SeedGrid) -> Result<LogLawParams, FitError> {
    let z_o_values = log_space(grid.z_o_min, grid.z_o_max, grid.steps)?;
    let y = DVector::from_column_slice(obs.velocities());

    let candidates: Vec<Candidate> = z_o_values
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &z_o)| evaluate_candidate(obs, &y, z_o).map(|(u_star, sse)| Candidate {
            idx,
            params: LogLawParams::new(u_star, z_o),
            sse,
        }))
        .collect();

    // Deterministic selection: pick the minimum SSE; break ties by grid index.
    let best = candidates
        .iter()
        .min_by(|a, b| a.sse.total_cmp(&b.sse).then(a.idx.cmp(&b.idx)))
        .ok_or_else(|| FitError::Singular("no usable seed on the z_o grid".to_string()))?;

    debug!(
        u_star = best.params.u_star,
        z_o = best.params.z_o,
        sse = best.sse,
        grid_index = best.idx,
        "grid seed selected"
    );
    Ok(best.params)
}

fn evaluate_candidate(obs: &Observations, y: &DVector<f64>, z_o: f64) -> Option<(f64, f64)> {
    let x = DMatrix::from_iterator(
        obs.len(),
        1,
        obs.heights().iter().map(|&z| (z / z_o).ln() / KAPPA),
    );
    let beta = solve_least_squares(&x, y)?;
    let sse = residual_sum_of_squares(&x, y, &beta);
    if sse.is_finite() { Some((beta[0], sse)) } else { None }
}
