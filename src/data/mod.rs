//! Observation sources: the inline reference profile and synthetic profiles.

pub mod reference;
pub mod sample;

pub use reference::*;
pub use sample::*;
