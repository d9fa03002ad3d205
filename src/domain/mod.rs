//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the validated observation set (`Observations`)
//! - model parameters (`LogLawParams`) and fit outputs (`FitResult`, `FitQuality`)
//! - solver and run configuration (`SolverConfig`, `SeedGrid`, `FitConfig`)
//! - the JSON export schema (`FitFile`)

pub mod types;

pub use types::*;
