//! Least-squares polynomials.
//!
//! A `Polynomial` is stored in a rescaled variable `u = (x - center) / scale`
//! that maps the fitted x-range onto `[-1, 1]`. Reference tables use x-values
//! up to ~120 (cm), where raw powers up to `x^5` would make the Vandermonde
//! matrix badly conditioned. The rescaling is affine, so the result is still a
//! polynomial of the same degree in `x`.

use nalgebra::{DMatrix, DVector};

use crate::math::solve_least_squares;

#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Coefficients in `u`, constant term first.
    coeffs: Vec<f64>,
    center: f64,
    scale: f64,
}

impl Polynomial {
    /// Least-squares fit of the given degree through `(x, y)`.
    ///
    /// Returns `None` when there are fewer points than coefficients, the inputs
    /// are not finite, or the solve fails.
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Option<Self> {
        let n = x.len();
        let p = degree + 1;
        if n != y.len() || n < p {
            return None;
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return None;
        }

        let (lo, hi) = x
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let center = 0.5 * (lo + hi);
        let half = 0.5 * (hi - lo);
        let scale = if half > 0.0 { half } else { 1.0 };

        let mut design = DMatrix::<f64>::zeros(n, p);
        for (i, &xi) in x.iter().enumerate() {
            let u = (xi - center) / scale;
            let mut pow = 1.0;
            for j in 0..p {
                design[(i, j)] = pow;
                pow *= u;
            }
        }
        let rhs = DVector::from_column_slice(y);

        let coeffs = solve_least_squares(&design, &rhs)?;
        Some(Self {
            coeffs: coeffs.iter().copied().collect(),
            center,
            scale,
        })
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Evaluate at `x` (Horner's scheme in the rescaled variable).
    pub fn eval(&self, x: f64) -> f64 {
        let u = (x - self.center) / self.scale;
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * u + c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_quintic() {
        let f = |x: f64| 1.0 - 0.5 * x + 0.02 * x.powi(2) + 1e-3 * x.powi(3) - 2e-5 * x.powi(4) + 1e-7 * x.powi(5);
        let xs: Vec<f64> = (0..=60).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();

        let poly = Polynomial::fit(&xs, &ys, 5).unwrap();
        assert_eq!(poly.degree(), 5);
        for &x in &[0.0, 7.5, 30.0, 59.0] {
            assert!((poly.eval(x) - f(x)).abs() < 1e-8, "x={x}");
        }
    }

    #[test]
    fn large_x_values_stay_well_conditioned() {
        // Height-based tables run from 45 to 120 cm.
        let xs: Vec<f64> = (0..=150).map(|i| 45.0 + i as f64 * 0.5).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 0.002 * x * x - 0.1 * x + 4.0).collect();

        let poly = Polynomial::fit(&xs, &ys, 5).unwrap();
        assert!((poly.eval(87.0) - (0.002 * 87.0 * 87.0 - 0.1 * 87.0 + 4.0)).abs() < 1e-8);
    }

    #[test]
    fn too_few_points_is_none() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(Polynomial::fit(&xs, &ys, 5).is_none());
    }

    #[test]
    fn non_finite_input_is_none() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0];
        assert!(Polynomial::fit(&xs, &ys, 5).is_none());
    }
}
