//! Command-line parsing for the law-of-the-wall fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::{REFERENCE_HEIGHTS_CM, REFERENCE_VELOCITIES_CM_S};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "logfit", version, about = "Law-of-the-wall velocity profile fitter")]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit (u*, z_o) to a velocity profile and print estimates with standard errors.
    Fit(FitArgs),
    /// Generate a synthetic profile from known parameters, optionally fitting it.
    Simulate(SimulateArgs),
}

/// Levenberg–Marquardt knobs shared by `fit` and `simulate`.
#[derive(Debug, Args, Clone)]
pub struct SolverArgs {
    /// Maximum number of solver iterations.
    #[arg(long, env = "LOGFIT_MAX_ITER", default_value_t = 200)]
    pub max_iter: usize,

    /// Relative tolerance on the sum-of-squares reduction.
    #[arg(long, env = "LOGFIT_FTOL", default_value_t = 1.49012e-8)]
    pub ftol: f64,

    /// Relative tolerance on the parameter step.
    #[arg(long, env = "LOGFIT_XTOL", default_value_t = 1.49012e-8)]
    pub xtol: f64,

    /// Allow iterates with z_o <= 0 to surface as a domain error instead of
    /// being rejected by the search.
    #[arg(long)]
    pub unbounded: bool,
}

/// Options for fitting an inline profile.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Observation heights (comma-separated). Defaults to the reference profile.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = REFERENCE_HEIGHTS_CM)]
    pub z: Vec<f64>,

    /// Observed velocities (comma-separated), same order as --z.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = REFERENCE_VELOCITIES_CM_S)]
    pub u: Vec<f64>,

    /// Initial guess for the friction velocity.
    #[arg(long = "u-star0", default_value_t = 1.0, allow_negative_numbers = true)]
    pub u_star0: f64,

    /// Initial guess for the roughness length.
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub z0: f64,

    /// Seed the solver from a log-spaced z_o grid instead of --u-star0/--z0.
    #[arg(long)]
    pub auto_seed: bool,

    /// Compare the fit with the hand-derived estimate (u*=3.98, z_o=0.30).
    #[arg(long)]
    pub compare_hand: bool,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Export per-point residuals to CSV.
    #[arg(long = "export-residuals")]
    pub export_residuals: Option<PathBuf>,

    /// Export the fit (parameters + covariance + fitted grid) to JSON.
    #[arg(long = "export-fit")]
    pub export_fit: Option<PathBuf>,
}

/// Options for generating a synthetic profile.
#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// True friction velocity.
    #[arg(long = "u-star", allow_negative_numbers = true)]
    pub u_star: f64,

    /// True roughness length.
    #[arg(long = "z-o", allow_negative_numbers = true)]
    pub z_o: f64,

    /// Heights to sample (comma-separated).
    #[arg(long, value_delimiter = ',', default_values_t = REFERENCE_HEIGHTS_CM)]
    pub z: Vec<f64>,

    /// Standard deviation of the Gaussian velocity noise.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fit the generated profile (seeded from the z_o grid).
    #[arg(long)]
    pub fit: bool,

    #[command(flatten)]
    pub solver: SolverArgs,
}
