//! Least squares solver.
//!
//! Every band curve is the solution of a small, tall regression problem:
//!
//! ```text
//! minimize Σ (y_i - v_i^T c)^2
//! ```
//!
//! where `v_i` is a Vandermonde row `[1, u_i, u_i^2, ..., u_i^5]`.
//!
//! We solve with SVD because the design matrix is tall (many reference rows,
//! six coefficients) and `QR::solve` in nalgebra only accepts square systems.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() < x.ncols() {
        return None;
    }

    let svd = x.clone().svd(true, true);

    // Tighten first, then relax if the solve is rejected.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(coeffs) = svd.solve(y, tol) {
            if coeffs.iter().all(|v| v.is_finite()) {
                return Some(coeffs);
            }
        }
    }

    None
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
    fn underdetermined_system_is_rejected() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 0.0]);
        let y = DVector::from_row_slice(&[2.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
