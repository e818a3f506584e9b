//! Breit–Wigner cross-section for `e⁺e⁻ → Z → f f̄`.
//!
//! ```text
//! σ(E) = (12π / M²) · E² Γee² / ((E² − M²)² + M² Γ²) · 0.3894e6
//! ```
//!
//! `E`, `M`, `Γ`, `Γee` are in GeV; the trailing factor converts GeV⁻² to nb.
//! The denominator is a sum of squares, so the only degenerate input is
//! `M = 0`. Keeping parameters positive is the caller's job.

use std::f64::consts::PI;

use crate::domain::ResonanceParams;

/// Partial width `Γ(Z → e⁺e⁻)` in GeV.
pub const PARTIAL_WIDTH_EE: f64 = 0.08391;

/// GeV⁻² to nanobarn.
pub const GEV2_TO_NB: f64 = 0.3894e6;

/// Cross-section (nb) at `energy` for the given mass and width.
pub fn predict(energy: f64, mass: f64, width: f64) -> f64 {
    let e2 = energy * energy;
    let m2 = mass * mass;
    let g2 = width * width;
    let detuning = e2 - m2;

    let numerator = 12.0 * PI / m2 * e2 * PARTIAL_WIDTH_EE * PARTIAL_WIDTH_EE;
    numerator / (detuning * detuning + m2 * g2) * GEV2_TO_NB
}

/// [`predict`] with bundled parameters.
pub fn predict_with(energy: f64, params: &ResonanceParams) -> f64 {
    predict(energy, params.mass, params.width)
}

/// Closed-form value on resonance (`E = M`).
pub fn peak_cross_section(mass: f64, width: f64) -> f64 {
    let m2 = mass * mass;
    12.0 * PI / m2 * PARTIAL_WIDTH_EE * PARTIAL_WIDTH_EE / (width * width) * GEV2_TO_NB
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_close(a: f64, b: f64, tol: f64) -> bool {
        ((a - b) / b).abs() < tol
    }

    #[test]
    fn on_resonance_matches_closed_form() {
        for &(m, g) in &[(91.19, 2.5), (90.0, 3.0), (50.0, 0.5)] {
            let y = predict(m, m, g);
            // E = M: σ = 12π Γee² / (M² Γ²).
            let expected = 12.0 * PI * PARTIAL_WIDTH_EE.powi(2) / (m * m * g * g) * GEV2_TO_NB;
            assert!(rel_close(y, expected, 1e-12), "{y} vs {expected}");
            assert!(rel_close(y, peak_cross_section(m, g), 1e-12));
        }
    }

    #[test]
    fn z_peak_is_about_two_nanobarn() {
        let y = peak_cross_section(91.1876, 2.4952);
        assert!(y > 1.9 && y < 2.1, "got {y}");
    }

    #[test]
    fn depends_only_on_energy_squared() {
        for &e in &[0.0, 1.0, 88.0, 91.19, 95.5] {
            assert_eq!(predict(e, 91.19, 2.5), predict(-e, 91.19, 2.5));
        }
    }

    #[test]
    fn finite_and_non_negative_for_physical_inputs() {
        for i in 0..=200 {
            let e = i as f64;
            let y = predict(e, 91.19, 2.5);
            assert!(y.is_finite() && y >= 0.0, "E={e} gave {y}");
        }
        assert_eq!(predict(0.0, 91.19, 2.5), 0.0);
    }

    #[test]
    fn peak_is_the_maximum_near_resonance() {
        let peak = predict(91.19, 91.19, 2.5);
        assert!(predict(89.0, 91.19, 2.5) < peak);
        assert!(predict(93.0, 91.19, 2.5) < peak);
    }
}
