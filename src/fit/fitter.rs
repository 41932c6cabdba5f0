//! Nonlinear least-squares fit of the two-segment model.
//!
//! Given observed `(x_i, y_i)` we minimize
//!
//! ```text
//! Σ (y(x_i; x0, y0, k1, k2) - y_i)²
//! ```
//!
//! over all four parameters with Levenberg–Marquardt, starting from
//! `[mean(x), mean(y), 1, 1]`. There are no parameter bounds.
//!
//! The covariance estimate follows the usual curve-fitting convention:
//! `pinv(JᵀJ) · SSE / (n - 4)`, with `+inf` entries when `n == 4`.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{FitOutcome, PiecewiseParams, SolverOptions};
use crate::error::FitError;
use crate::math::{LeastSquaresProblem, levenberg_marquardt, mean, min_max, pinv_gram};
use crate::models::{fill_jacobian_row, predict};

/// Fewest samples that can determine four parameters.
pub const MIN_SAMPLES: usize = PiecewiseParams::LEN;

/// Residual problem over borrowed samples.
struct PiecewiseProblem<'a> {
    x: &'a [f64],
    y: &'a [f64],
}

impl LeastSquaresProblem for PiecewiseProblem<'_> {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let p = to_params(params);
        DVector::from_iterator(
            self.x.len(),
            self.x.iter().zip(self.y).map(|(&x, &y)| predict(x, &p) - y),
        )
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let p = to_params(params);
        let mut jac = DMatrix::<f64>::zeros(self.x.len(), PiecewiseParams::LEN);
        let mut row = [0.0; 4];
        for (i, &x) in self.x.iter().enumerate() {
            fill_jacobian_row(x, &p, &mut row);
            for (j, &v) in row.iter().enumerate() {
                jac[(i, j)] = v;
            }
        }
        jac
    }
}

/// Fit with default solver options.
pub fn fit(x: &[f64], y: &[f64]) -> Result<FitOutcome, FitError> {
    fit_with(x, y, &SolverOptions::default())
}

/// Fit with explicit solver options.
pub fn fit_with(x: &[f64], y: &[f64], opts: &SolverOptions) -> Result<FitOutcome, FitError> {
    validate_samples(x, y)?;

    let guess = initial_guess(x, y)?;
    debug!(
        n = x.len(),
        x0 = guess.x0,
        y0 = guess.y0,
        "starting piecewise fit"
    );

    let problem = PiecewiseProblem { x, y };
    let report = levenberg_marquardt(&problem, DVector::from_row_slice(&guess.to_array()), opts)?;

    let params = to_params(&report.params);
    if !params.is_finite() {
        return Err(FitError::divergence("solver produced non-finite parameters"));
    }

    let sse = 2.0 * report.cost;
    let covariance = covariance(&report.jacobian, sse, x.len());

    debug!(
        iterations = report.iterations,
        termination = ?report.termination,
        sse,
        "piecewise fit converged"
    );

    Ok(FitOutcome {
        params,
        covariance,
        iterations: report.iterations,
        sse,
    })
}

/// Check lengths, finiteness, sample count and x variation, in that order.
pub fn validate_samples(x: &[f64], y: &[f64]) -> Result<(), FitError> {
    if x.len() != y.len() {
        return Err(FitError::malformed(format!(
            "x has {} values but y has {}",
            x.len(),
            y.len()
        )));
    }
    if let Some(i) = x.iter().position(|v| !v.is_finite()) {
        return Err(FitError::malformed(format!("x[{i}] is not a finite number")));
    }
    if let Some(i) = y.iter().position(|v| !v.is_finite()) {
        return Err(FitError::malformed(format!("y[{i}] is not a finite number")));
    }
    if x.len() < MIN_SAMPLES {
        return Err(FitError::insufficient(format!(
            "{} samples; at least {MIN_SAMPLES} are required",
            x.len()
        )));
    }
    match min_max(x) {
        Some((lo, hi)) if hi > lo => Ok(()),
        _ => Err(FitError::insufficient("all x values are identical")),
    }
}

/// Starting point: breakpoint at the data's centre, neutral unit slopes.
pub fn initial_guess(x: &[f64], y: &[f64]) -> Result<PiecewiseParams, FitError> {
    let (Some(x_mean), Some(y_mean)) = (mean(x), mean(y)) else {
        return Err(FitError::insufficient("no samples"));
    };
    Ok(PiecewiseParams::new(x_mean, y_mean, 1.0, 1.0))
}

fn covariance(jac: &DMatrix<f64>, sse: f64, n: usize) -> [[f64; 4]; 4] {
    let dof = n.saturating_sub(PiecewiseParams::LEN);
    let pinv = if dof > 0 { pinv_gram(jac) } else { None };

    let mut out = [[f64::INFINITY; 4]; 4];
    if let Some(pinv) = pinv {
        let scale = sse / dof as f64;
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = pinv[(i, j)] * scale;
            }
        }
    }
    out
}

fn to_params(v: &DVector<f64>) -> PiecewiseParams {
    PiecewiseParams::new(v[0], v[1], v[2], v[3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    use crate::models::evaluate;

    #[test]
    fn recovers_clear_slope_change() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0];

        let fit = fit(&x, &y).unwrap();
        let p = fit.params;
        assert!((p.x0 - 5.0).abs() <= 1.0, "x0 = {}", p.x0);
        assert!((p.k1 - 1.0).abs() <= 0.3, "k1 = {}", p.k1);
        assert!((p.k2 - 5.0).abs() <= 1.0, "k2 = {}", p.k2);
        assert!(fit.sse < 1e-12);
    }

    #[test]
    fn linear_data_gives_equal_slopes() {
        let x: Vec<f64> = (0..=10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();

        let fit = fit(&x, &y).unwrap();
        assert!((fit.params.k1 - 2.0).abs() <= 0.1, "k1 = {}", fit.params.k1);
        assert!((fit.params.k2 - 2.0).abs() <= 0.1, "k2 = {}", fit.params.k2);
        // x0 and y0 are not separately identifiable here; the covariance still exists.
        assert!(fit.covariance.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn recovers_known_parameters_from_noisy_data() {
        let truth = PiecewiseParams::new(7.0, 10.0, 0.5, 3.0);
        let x: Vec<f64> = (0..81).map(|i| i as f64 * 0.25).collect();
        let mut rng = StdRng::seed_from_u64(17);
        let noise = Normal::new(0.0, 0.05).unwrap();
        let y: Vec<f64> = evaluate(&x, &truth)
            .into_iter()
            .map(|v| v + noise.sample(&mut rng))
            .collect();

        let p = fit(&x, &y).unwrap().params;
        for (got, want) in p.to_array().iter().zip(truth.to_array()) {
            assert!((got - want).abs() <= 0.05 * want.abs(), "got {got}, want {want}");
        }
    }

    #[test]
    fn fitting_twice_is_identical() {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&v| {
                let trend = if v < 12.0 { 0.3 * v } else { 3.6 - 1.2 * (v - 12.0) };
                trend + (v * 1.7).sin() * 0.05
            })
            .collect();

        let a = fit(&x, &y).unwrap();
        let b = fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn too_few_points_is_insufficient() {
        let err = fit(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, FitError::InsufficientData { .. }));
    }

    #[test]
    fn constant_x_is_rejected() {
        let err = fit(&[2.0; 6], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap_err();
        assert!(matches!(
            err,
            FitError::InsufficientData { .. } | FitError::FitDivergence { .. }
        ));
    }

    #[test]
    fn mismatched_or_non_finite_input_is_malformed() {
        let err = fit(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, FitError::MalformedInput { .. }));

        let err = fit(&[1.0, 2.0, f64::NAN, 4.0], &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, FitError::MalformedInput { .. }));
    }

    #[test]
    fn four_points_have_no_covariance_dof() {
        let fit = fit(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 4.0, 6.0]).unwrap();
        assert!(fit.covariance.iter().flatten().all(|v| v.is_infinite()));
    }

    #[test]
    fn exhausted_budget_is_divergence() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0];
        let opts = SolverOptions {
            max_iterations: 1,
            ..SolverOptions::default()
        };
        let err = fit_with(&x, &y, &opts).unwrap_err();
        assert!(matches!(err, FitError::FitDivergence { .. }));
    }

    #[test]
    fn initial_guess_uses_means_and_unit_slopes() {
        let p = initial_guess(&[0.0, 2.0, 4.0, 6.0], &[1.0, 1.0, 3.0, 3.0]).unwrap();
        assert_eq!(p, PiecewiseParams::new(3.0, 2.0, 1.0, 1.0));
    }
}
