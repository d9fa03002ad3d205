//! Velocity profile model.
//!
//! The model is implemented as small, pure functions so that fitting/search code can
//! stay generic.

pub mod loglaw;

pub use loglaw::*;
