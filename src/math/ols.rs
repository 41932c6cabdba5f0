//! Linear least squares via SVD.
//!
//! Each Levenberg–Marquardt step is a small linear least-squares problem of the form:
//!
//! ```text
//! minimize ‖J δ + r‖² + λ ‖D^½ δ‖²
//! ```
//!
//! which we solve as the stacked system `[J; sqrt(λ D)] δ = [-r; 0]`.
//!
//! Implementation choices:
//! - SVD handles tall systems and near-collinear columns without forming `JᵀJ`.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter dimension is tiny (4 columns), so SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Moore–Penrose pseudo-inverse of `JᵀJ`, computed from the SVD of `J`.
///
/// Singular values below `ε · max(rows, cols) · s_max` are treated as zero, so a
/// rank-deficient Jacobian still yields a (pseudo-)covariance instead of failing.
pub fn pinv_gram(j: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let cols = j.ncols();
    let svd = j.clone().svd(false, true);
    let v_t = svd.v_t?;

    let s_max = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let threshold = f64::EPSILON * j.nrows().max(cols) as f64 * s_max;

    let mut out = DMatrix::<f64>::zeros(cols, cols);
    for (k, &s) in svd.singular_values.iter().enumerate() {
        if s <= threshold {
            continue;
        }
        let v = v_t.row(k).transpose();
        out += (&v * v.transpose()) / (s * s);
    }

    if out.iter().all(|v| v.is_finite()) {
        Some(out)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn pinv_gram_inverts_full_rank() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let gram = j.transpose() * &j;
        let inv = pinv_gram(&j).unwrap();
        let eye = gram * inv;
        assert!((eye[(0, 0)] - 1.0).abs() < 1e-10);
        assert!((eye[(1, 1)] - 1.0).abs() < 1e-10);
        assert!(eye[(0, 1)].abs() < 1e-10);
        assert!(eye[(1, 0)].abs() < 1e-10);
    }

    #[test]
    fn pinv_gram_tolerates_collinear_columns() {
        // Second column is -2x the first.
        let j = DMatrix::from_row_slice(3, 2, &[1.0, -2.0, 1.0, -2.0, 1.0, -2.0]);
        let inv = pinv_gram(&j).unwrap();
        assert!(inv.iter().all(|v| v.is_finite()));
    }
}
