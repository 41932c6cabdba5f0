//! Synthetic two-segment samples with Gaussian noise.
//!
//! x values are evenly spaced over `[x_min, x_max]`; y values are the model at
//! known parameters plus `N(0, noise_sd)`. The RNG is seeded, so the same spec
//! always produces the same dataset.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{Dataset, SampleSet, SampleSpec};
use crate::error::AppError;
use crate::math::linspace;
use crate::models::evaluate;

pub fn generate_sample(spec: &SampleSpec) -> Result<Dataset, AppError> {
    if spec.n == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    if !(spec.x_min.is_finite() && spec.x_max.is_finite() && spec.x_max > spec.x_min) {
        return Err(AppError::new(
            2,
            format!("Invalid x range: min={}, max={} (must be finite and max>min).", spec.x_min, spec.x_max),
        ));
    }
    if !(spec.noise_sd.is_finite() && spec.noise_sd >= 0.0) {
        return Err(AppError::new(2, "Noise standard deviation must be finite and >= 0."));
    }
    if !spec.params.is_finite() {
        return Err(AppError::new(2, "Model parameters must be finite."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, spec.noise_sd)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let x = linspace(spec.x_min, spec.x_max, spec.n);
    let y: Vec<f64> = evaluate(&x, &spec.params)
        .into_iter()
        .map(|v| v + normal.sample(&mut rng))
        .collect();

    Ok(Dataset::new(spec.labels.clone(), SampleSet::new(x, y)))
}
