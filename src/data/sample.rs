//! Synthetic velocity profiles.
//!
//! Velocities are drawn from the law of the wall at the requested heights plus
//! independent Gaussian noise. The generator is seeded, so the same inputs always
//! give the same observation set.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{LogLawParams, Observations};
use crate::error::FitError;
use crate::models::model_profile;

/// Generate a reproducible observation set from known parameters.
///
/// `noise_sd = 0` yields the exact model profile.
pub fn generate_profile(
    params: LogLawParams,
    heights: &[f64],
    noise_sd: f64,
    seed: u64,
) -> Result<Observations, FitError> {
    if !(noise_sd.is_finite() && noise_sd >= 0.0) {
        return Err(FitError::InvalidConfig(format!(
            "noise standard deviation {noise_sd} must be finite and >= 0"
        )));
    }

    let clean = model_profile(heights, params.u_star, params.z_o)?;
    if noise_sd == 0.0 {
        return Observations::new(heights.to_vec(), clean);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, noise_sd)
        .map_err(|e| FitError::InvalidConfig(format!("noise distribution error: {e}")))?;

    let noisy = clean
        .into_iter()
        .map(|u| u + normal.sample(&mut rng))
        .collect();
    Observations::new(heights.to_vec(), noisy)
}
