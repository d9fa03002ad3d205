//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - printed by the report module

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// An immutable set of paired `(z, u)` observations.
///
/// Heights are in centimeters and velocities in centimeters per second, but
/// nothing in the fitting code depends on the unit system as long as it is
/// consistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observations {
    heights: Vec<f64>,
    velocities: Vec<f64>,
}

impl Observations {
    /// Validate and build an observation set.
    ///
    /// Requirements:
    /// - equal lengths and at least two points
    /// - every height finite and strictly positive
    /// - every velocity finite
    /// - at least two distinct heights
    pub fn new(heights: Vec<f64>, velocities: Vec<f64>) -> Result<Self, FitError> {
        if heights.len() != velocities.len() {
            return Err(FitError::InvalidObservations(format!(
                "length mismatch: {} heights vs {} velocities",
                heights.len(),
                velocities.len()
            )));
        }
        if heights.len() < 2 {
            return Err(FitError::InvalidObservations(format!(
                "need at least 2 observations, got {}",
                heights.len()
            )));
        }
        if let Some((i, z)) = heights
            .iter()
            .enumerate()
            .find(|(_, z)| !(z.is_finite() && **z > 0.0))
        {
            return Err(FitError::Domain(format!(
                "height z[{i}]={z} must be finite and > 0"
            )));
        }
        if let Some((i, u)) = velocities.iter().enumerate().find(|(_, u)| !u.is_finite()) {
            return Err(FitError::InvalidObservations(format!(
                "velocity u[{i}]={u} is not finite"
            )));
        }
        let first = heights[0];
        if heights.iter().all(|&z| z == first) {
            return Err(FitError::InvalidObservations(
                "all heights are equal; u_star and z_o are not identifiable".to_string(),
            ));
        }

        Ok(Self {
            heights,
            velocities,
        })
    }

    /// Build from `(z, u)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, FitError> {
        let (heights, velocities) = pairs.iter().copied().unzip();
        Self::new(heights, velocities)
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn velocities(&self) -> &[f64] {
        &self.velocities
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Always false for a validated set; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.heights
            .iter()
            .copied()
            .zip(self.velocities.iter().copied())
    }

    /// Smallest and largest observed height.
    pub fn height_range(&self) -> (f64, f64) {
        self.heights
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| {
                (lo.min(z), hi.max(z))
            })
    }
}

/// Law-of-the-wall parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogLawParams {
    /// Friction velocity.
    pub u_star: f64,
    /// Roughness length.
    pub z_o: f64,
}

impl LogLawParams {
    pub fn new(u_star: f64, z_o: f64) -> Self {
        Self { u_star, z_o }
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    /// Degrees of freedom `n - 2`.
    pub dof: usize,
    /// Solver iterations (trial steps) used.
    pub iterations: usize,
}

/// Output of a single fit.
///
/// Serialize-only: unestimable entries are infinite and JSON writes them as
/// `null`, which `f64` cannot read back.
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    pub u_star: f64,
    pub z_o: f64,
    pub se_u_star: f64,
    pub se_z_o: f64,
    pub n_observations: usize,
    /// Parameter covariance, row-major over `(u_star, z_o)`.
    ///
    /// Entries are `+inf` when the covariance is not estimable (zero degrees
    /// of freedom or a singular normal matrix).
    pub covariance: [[f64; 2]; 2],
    pub quality: FitQuality,
}

impl FitResult {
    pub fn params(&self) -> LogLawParams {
        LogLawParams::new(self.u_star, self.z_o)
    }
}

/// Levenberg–Marquardt settings.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum number of trial steps.
    pub max_iter: usize,
    /// Relative tolerance on the reduction of the sum of squares.
    pub ftol: f64,
    /// Relative tolerance on the parameter step.
    pub xtol: f64,
    /// Absolute tolerance on the gradient infinity norm.
    pub gtol: f64,
    /// Initial damping factor (relative to the scaled normal matrix).
    pub lambda_init: f64,
    /// Keep every iterate inside `z_o > 0` by rejecting steps that leave it.
    pub bounded: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 200,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
            lambda_init: 1e-3,
            bounded: true,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), FitError> {
        if self.max_iter == 0 {
            return Err(FitError::InvalidConfig("max_iter must be >= 1".to_string()));
        }
        for (name, v) in [("ftol", self.ftol), ("xtol", self.xtol), ("gtol", self.gtol)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(FitError::InvalidConfig(format!(
                    "{name}={v} must be finite and >= 0"
                )));
            }
        }
        if !(self.lambda_init.is_finite() && self.lambda_init > 0.0) {
            return Err(FitError::InvalidConfig(format!(
                "lambda_init={} must be finite and > 0",
                self.lambda_init
            )));
        }
        Ok(())
    }
}

/// Log-spaced roughness-length grid used to seed the solver.
#[derive(Debug, Clone, Copy)]
pub struct SeedGrid {
    pub z_o_min: f64,
    pub z_o_max: f64,
    pub steps: usize,
}

impl SeedGrid {
    /// Grid spanning six decades below the lowest observation height.
    pub fn for_observations(obs: &Observations) -> Self {
        let (z_min, _) = obs.height_range();
        Self {
            z_o_min: z_min * 1e-6,
            z_o_max: z_min,
            steps: 61,
        }
    }
}

/// How the initial guess is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuessSource {
    /// Explicit `(u_star0, z_o0)`.
    Explicit(LogLawParams),
    /// Log-spaced grid search over `z_o` with closed-form `u_star`.
    Grid,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and environment).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub heights: Vec<f64>,
    pub velocities: Vec<f64>,
    pub guess: GuessSource,
    pub solver: SolverConfig,
    /// Reference estimate to compare the fit against.
    pub reference: Option<LogLawParams>,
    pub export_residuals: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
}

/// A fitted profile evaluated on a height grid.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileGrid {
    pub heights: Vec<f64>,
    pub velocities: Vec<f64>,
}

/// A saved fit file (JSON).
#[derive(Debug, Clone, Serialize)]
pub struct FitFile {
    pub tool: String,
    pub generated: DateTime<Utc>,
    pub kappa: f64,
    pub observations: Vec<(f64, f64)>,
    pub fit: FitResult,
    pub grid: ProfileGrid,
}
