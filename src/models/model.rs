//! Model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - predict `y(x)` given the parameters (for residuals/plots)
//! - fill a Jacobian row `∂y/∂(x0, y0, k1, k2)` at a given `x` (for the solver)
//!
//! Both segments pass through `(x0, y0)`, so the model is continuous at the
//! breakpoint by construction. `x == x0` belongs to the right segment.

use crate::domain::PiecewiseParams;

/// Predict `y(x)`.
pub fn predict(x: f64, p: &PiecewiseParams) -> f64 {
    let k = if x < p.x0 { p.k1 } else { p.k2 };
    k * x + (p.y0 - k * p.x0)
}

/// Evaluate the model elementwise. `xs` need not be sorted.
pub fn evaluate(xs: &[f64], p: &PiecewiseParams) -> Vec<f64> {
    xs.iter().map(|&x| predict(x, p)).collect()
}

/// Fill the partial derivatives of `y(x)` with respect to `(x0, y0, k1, k2)`.
///
/// With `y = k * (x - x0) + y0`:
/// - left of `x0`:  `[-k1, 1, x - x0, 0]`
/// - right of `x0`: `[-k2, 1, 0, x - x0]`
pub fn fill_jacobian_row(x: f64, p: &PiecewiseParams, out: &mut [f64; 4]) {
    let dx = x - p.x0;
    if x < p.x0 {
        *out = [-p.k1, 1.0, dx, 0.0];
    } else {
        *out = [-p.k2, 1.0, 0.0, dx];
    }
}
