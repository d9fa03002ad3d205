//! `loglayer-fit` library crate.
//!
//! Fits the law-of-the-wall profile `u = (u*/κ) ln(z/z_o)` to velocity
//! observations and reports `(u*, z_o)` with standard errors.
//!
//! The binary (`logfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the model and fitter are reusable from other crates

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;

pub use domain::{FitResult, LogLawParams, Observations, SolverConfig};
pub use error::FitError;
pub use fit::{fit, fit_with};
pub use models::{KAPPA, model};
