//! Linear least squares helpers on top of nalgebra's SVD.
//!
//! Levenberg–Marquardt repeatedly solves a tiny damped linear problem
//!
//! ```text
//! minimize ‖J δ + r‖² + λ ‖D δ‖²
//! ```
//!
//! which is the ordinary least squares problem on the stacked system
//! `[J; √λ D] δ = [−r; 0]`. The Jacobian is tall (one row per measurement, one
//! column per parameter), so we solve with SVD rather than QR.

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

/// `(AᵀA)⁻¹` via the pseudo-inverse of the normal matrix.
///
/// Returns `None` when the normal matrix is numerically rank deficient
/// (a parameter has no influence on the residuals).
pub fn normal_inverse(a: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let ata = a.transpose() * a;
    let svd = ata.svd(true, true);
    let s_max = svd.singular_values.max();
    if !(s_max.is_finite() && s_max > 0.0) {
        return None;
    }
    let s_min = svd.singular_values.min();
    if s_min <= s_max * 1e-14 {
        return None;
    }
    let inv = svd.pseudo_inverse(s_max * 1e-14).ok()?;
    inv.iter().all(|v| v.is_finite()).then_some(inv)
}
