//! Output helpers.
//!
//! - per-point residual CSV (`export`)
//! - fit JSON with a fitted profile grid (`fit_file`)

pub mod export;
pub mod fit_file;

pub use export::*;
pub use fit_file::*;
