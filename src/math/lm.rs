//! Levenberg–Marquardt driver for small nonlinear least-squares problems.
//!
//! We minimize `cost(p) = ½ Σ r_i(p)²` starting from an initial guess.
//!
//! Each iteration solves the damped Gauss–Newton system
//!
//! ```text
//! (JᵀJ + λ D) δ = -Jᵀ r
//! ```
//!
//! where `D = diag(JᵀJ)` (Marquardt scaling, floored so empty columns stay
//! solvable). `λ` follows Nielsen's update: shrink by the gain ratio on success,
//! double-and-double-again on failure.
//!
//! The driver is deterministic: the same problem and initial guess always produce
//! the same iterates.

use nalgebra::{DMatrix, DVector};

use crate::domain::SolverOptions;
use crate::error::FitError;
use crate::math::solve_least_squares;

/// Smallest diagonal scaling entry. Keeps the damped system positive definite
/// when a parameter has no influence on any residual.
const DIAG_FLOOR: f64 = 1e-12;

/// Initial damping relative to the largest diagonal entry of `JᵀJ`.
const INITIAL_DAMPING: f64 = 1e-3;

/// A residual vector and its Jacobian, both as functions of the parameters.
pub trait LeastSquaresProblem {
    /// Residuals `r(p)`.
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// Jacobian `∂r_i / ∂p_j` (rows = residuals, columns = parameters).
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

/// Why the solver stopped successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// All residuals are exactly zero.
    ExactFit,
    /// The gradient vanished.
    Gradient,
    /// An accepted step reduced the cost by less than `ftol` (relative).
    CostReduction,
    /// The step became shorter than `xtol` (relative to the parameters).
    StepSize,
}

/// Converged solver state.
#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    /// `½ Σ r_i²` at `params`.
    pub cost: f64,
    /// Jacobian at `params`.
    pub jacobian: DMatrix<f64>,
    pub iterations: usize,
    pub termination: Termination,
}

/// Minimize `½‖r(p)‖²` from `initial`.
pub fn levenberg_marquardt<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    opts: &SolverOptions,
) -> Result<LmReport, FitError> {
    let mut params = initial;
    let mut residuals = problem.residuals(&params);
    let mut cost = half_norm_squared(&residuals);
    if !cost.is_finite() {
        return Err(FitError::divergence("non-finite cost at the initial guess"));
    }

    let mut lambda: Option<f64> = None;
    let mut nu = 2.0_f64;
    let mut iterations = 0usize;

    loop {
        if cost == 0.0 {
            return Ok(finish(problem, params, cost, iterations, Termination::ExactFit));
        }

        let jac = problem.jacobian(&params);
        let grad = jac.transpose() * &residuals;
        if !grad.iter().all(|v| v.is_finite()) {
            return Err(FitError::divergence("non-finite gradient"));
        }
        if grad.amax() <= opts.gtol * cost.max(1.0) {
            return Ok(finish(problem, params, cost, iterations, Termination::Gradient));
        }

        let diag: Vec<f64> = (0..jac.ncols())
            .map(|k| jac.column(k).norm_squared().max(DIAG_FLOOR))
            .collect();
        let lam = lambda.get_or_insert_with(|| {
            INITIAL_DAMPING * diag.iter().cloned().fold(DIAG_FLOOR, f64::max)
        });

        // Inner loop: raise damping until a step reduces the cost.
        loop {
            if iterations >= opts.max_iterations {
                return Err(FitError::divergence(format!(
                    "no convergence within {} iterations",
                    opts.max_iterations
                )));
            }
            iterations += 1;

            let step = damped_step(&jac, &residuals, &diag, *lam)
                .ok_or_else(|| FitError::divergence("singular damped system"))?;

            let candidate = &params + &step;
            let trial = problem.residuals(&candidate);
            let trial_cost = half_norm_squared(&trial);

            let small_step = step.norm() <= opts.xtol * (params.norm() + opts.xtol);

            if trial_cost.is_finite() && trial_cost < cost {
                // Predicted reduction of the damped quadratic model: ½ δᵀ(λDδ - g).
                let predicted: f64 = (0..step.len())
                    .map(|k| 0.5 * step[k] * (*lam * diag[k] * step[k] - grad[k]))
                    .sum();
                let rho = if predicted > 0.0 {
                    (cost - trial_cost) / predicted
                } else {
                    1.0
                };
                *lam *= (1.0 / 3.0_f64).max(1.0 - (2.0 * rho - 1.0).powi(3));
                nu = 2.0;

                let small_reduction = cost - trial_cost <= opts.ftol * cost;
                params = candidate;
                residuals = trial;
                cost = trial_cost;

                if small_reduction {
                    return Ok(finish(problem, params, cost, iterations, Termination::CostReduction));
                }
                if small_step {
                    return Ok(finish(problem, params, cost, iterations, Termination::StepSize));
                }
                break;
            }

            if small_step {
                return Ok(finish(problem, params, cost, iterations, Termination::StepSize));
            }

            *lam *= nu;
            nu *= 2.0;
            if !lam.is_finite() {
                return Err(FitError::divergence("damping grew without bound"));
            }
        }
    }
}

/// Solve `[J; sqrt(λ D)] δ = [-r; 0]` in the least-squares sense.
fn damped_step(
    jac: &DMatrix<f64>,
    residuals: &DVector<f64>,
    diag: &[f64],
    lambda: f64,
) -> Option<DVector<f64>> {
    let m = jac.nrows();
    let n = jac.ncols();

    let mut a = DMatrix::<f64>::zeros(m + n, n);
    a.view_mut((0, 0), (m, n)).copy_from(jac);
    for k in 0..n {
        a[(m + k, k)] = (lambda * diag[k]).sqrt();
    }

    let mut b = DVector::<f64>::zeros(m + n);
    for i in 0..m {
        b[i] = -residuals[i];
    }

    solve_least_squares(&a, &b)
}

fn finish<P: LeastSquaresProblem>(
    problem: &P,
    params: DVector<f64>,
    cost: f64,
    iterations: usize,
    termination: Termination,
) -> LmReport {
    let jacobian = problem.jacobian(&params);
    LmReport {
        params,
        cost,
        jacobian,
        iterations,
        termination,
    }
}

fn half_norm_squared(r: &DVector<f64>) -> f64 {
    0.5 * r.norm_squared()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `y = a + b x` as a residual problem.
    struct Line {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Line {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x.iter().zip(&self.y).map(|(&x, &y)| p[0] + p[1] * x - y),
            )
        }

        fn jacobian(&self, _p: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_fn(self.x.len(), 2, |i, j| if j == 0 { 1.0 } else { self.x[i] })
        }
    }

    /// Rosenbrock's valley written as two residuals.
    struct Rosenbrock;

    impl LeastSquaresProblem for Rosenbrock {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_vec(vec![10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]])
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_row_slice(2, 2, &[-20.0 * p[0], 10.0, -1.0, 0.0])
        }
    }

    #[test]
    fn solves_linear_problem() {
        let problem = Line {
            x: vec![0.0, 1.0, 2.0, 3.0],
            y: vec![1.0, 3.1, 4.9, 7.0],
        };
        let report = levenberg_marquardt(
            &problem,
            DVector::from_vec(vec![0.0, 0.0]),
            &SolverOptions::default(),
        )
        .unwrap();
        // Closed form: b = 1.98, a = 1.03.
        assert!((report.params[0] - 1.03).abs() < 1e-8);
        assert!((report.params[1] - 1.98).abs() < 1e-8);
        assert_eq!(report.jacobian.shape(), (4, 2));
    }

    #[test]
    fn solves_rosenbrock() {
        let report = levenberg_marquardt(
            &Rosenbrock,
            DVector::from_vec(vec![-1.2, 1.0]),
            &SolverOptions::default(),
        )
        .unwrap();
        assert!((report.params[0] - 1.0).abs() < 1e-6);
        assert!((report.params[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn exact_start_stops_immediately() {
        let problem = Line {
            x: vec![0.0, 1.0, 2.0],
            y: vec![1.0, 2.0, 3.0],
        };
        let report = levenberg_marquardt(
            &problem,
            DVector::from_vec(vec![1.0, 1.0]),
            &SolverOptions::default(),
        )
        .unwrap();
        assert_eq!(report.termination, Termination::ExactFit);
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn exhausted_budget_is_divergence() {
        let opts = SolverOptions {
            max_iterations: 1,
            ..SolverOptions::default()
        };
        let err = levenberg_marquardt(&Rosenbrock, DVector::from_vec(vec![-1.2, 1.0]), &opts)
            .unwrap_err();
        assert!(matches!(err, FitError::FitDivergence { .. }));
    }
}
