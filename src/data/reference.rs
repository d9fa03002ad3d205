//! Reference velocity profile and its hand-derived fit.
//!
//! Heights in cm, velocities in cm/s.

use crate::domain::{LogLawParams, Observations};
use crate::error::FitError;

pub const REFERENCE_HEIGHTS_CM: [f64; 4] = [22.0, 55.0, 89.0, 123.0];
pub const REFERENCE_VELOCITIES_CM_S: [f64; 4] = [41.8, 50.4, 55.0, 58.4];

/// Estimate read off a hand-drawn line through `u` vs `ln z`.
pub const HAND_ESTIMATE: LogLawParams = LogLawParams {
    u_star: 3.98,
    z_o: 0.30,
};

/// The reference observation set.
pub fn reference_observations() -> Result<Observations, FitError> {
    Observations::from_pairs(&reference_pairs())
}

fn reference_pairs() -> [(f64, f64); 4] {
    std::array::from_fn(|i| (REFERENCE_HEIGHTS_CM[i], REFERENCE_VELOCITIES_CM_S[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_set_is_ordered_and_complete() {
        let obs = reference_observations().unwrap();
        assert_eq!(obs.len(), 4);
        assert_eq!(obs.heights(), &REFERENCE_HEIGHTS_CM);
        assert_eq!(obs.velocities(), &REFERENCE_VELOCITIES_CM_S);
        assert!(obs.heights().windows(2).all(|w| w[0] < w[1]));
    }
}
