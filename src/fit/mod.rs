//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - fit `(u_star, z_o)` by Levenberg–Marquardt (`lm`)
//! - seed the solver from a log-spaced `z_o` grid (`seed`)
//! - compute the straight-line hand-fit estimate (`linearized`)

pub mod linearized;
pub mod lm;
pub mod seed;

pub use linearized::*;
pub use lm::*;
pub use seed::*;
