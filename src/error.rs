//! Error types.
//!
//! - `FitError` is returned by the library (model evaluation, fitting, seeding).
//! - `AppError` is what the `logfit` binary reports: a message plus the process
//!   exit code.

use thiserror::Error;

/// Library error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// The observation set is malformed (length mismatch, too few points, NaNs).
    #[error("Invalid observations: {0}")]
    InvalidObservations(String),

    /// A height or roughness length outside the logarithm's domain.
    #[error("Domain error: {0}")]
    Domain(String),

    /// The solver ran out of iterations before meeting its tolerances.
    #[error("No convergence after {iterations} iterations (SSE={sse:.6e})")]
    NoConvergence { iterations: usize, sse: f64 },

    /// A linear system in the solver could not be solved.
    #[error("Singular system: {0}")]
    Singular(String),

    /// Solver or seed-grid settings are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FitError {
    /// Whether re-running the fit from a different initial guess may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FitError::Domain(_) | FitError::NoConvergence { .. } | FitError::Singular(_)
        )
    }

    /// Process exit code used by the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::InvalidObservations(_) | FitError::InvalidConfig(_) => 2,
            FitError::Domain(_) => 3,
            FitError::NoConvergence { .. } | FitError::Singular(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let mut message = err.to_string();
        if err.is_retryable() {
            message.push_str(" (try a different initial guess, e.g. --auto-seed)");
        }
        AppError::new(err.exit_code(), message)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
