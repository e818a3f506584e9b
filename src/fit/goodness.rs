//! Chi-squared goodness of fit.
//!
//! The reduced value divides by `n − 1`, not by `n − k − 1` for the `k = 2`
//! fitted parameters. Results are compared against numbers produced that way,
//! so the divisor is kept as is.

use crate::domain::{Dataset, GoodnessOfFit, ResonanceParams};
use crate::models::predict_with;

/// `Σ ((prediction − observed) / uncertainty)²`.
pub fn chi_squared(params: &ResonanceParams, dataset: &Dataset) -> f64 {
    dataset
        .iter()
        .map(|m| ((predict_with(m.energy, params) - m.cross_section) / m.uncertainty).powi(2))
        .sum()
}

/// `chi_squared / (n − 1)`; NaN when `n ≤ 1`.
pub fn reduced_chi_squared(params: &ResonanceParams, dataset: &Dataset) -> f64 {
    reduce(chi_squared(params, dataset), dataset.len())
}

/// Both values plus the sample size, computing chi-squared once.
pub fn goodness_of_fit(params: &ResonanceParams, dataset: &Dataset) -> GoodnessOfFit {
    let chi2 = chi_squared(params, dataset);
    GoodnessOfFit {
        chi_squared: chi2,
        reduced_chi_squared: reduce(chi2, dataset.len()),
        n_points: dataset.len(),
    }
}

pub(crate) fn reduce(chi2: f64, n: usize) -> f64 {
    if n <= 1 {
        return f64::NAN;
    }
    chi2 / (n as f64 - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Measurement;
    use crate::models::predict;

    fn exact_dataset(params: &ResonanceParams, n: usize) -> Dataset {
        Dataset::new(
            (0..n)
                .map(|i| {
                    let e = 87.0 + i as f64 * 0.4;
                    let y = predict(e, params.mass, params.width);
                    Measurement::new(e, y, 0.02 * y + 0.01)
                })
                .collect(),
        )
    }

    #[test]
    fn perfect_fit_has_zero_chi_squared() {
        let params = ResonanceParams::new(91.19, 2.5);
        let ds = exact_dataset(&params, 20);
        assert!(chi_squared(&params, &ds) < 1e-20);
        assert!(reduced_chi_squared(&params, &ds) < 1e-20);
    }

    #[test]
    fn known_pulls_sum_up() {
        let params = ResonanceParams::new(91.19, 2.5);
        let base = predict(91.0, 91.19, 2.5);
        let ds = Dataset::new(vec![
            Measurement::new(91.0, base + 0.2, 0.1),
            Measurement::new(91.0, base - 0.1, 0.1),
            Measurement::new(91.0, base, 0.5),
        ]);
        // Pulls 2, -1, 0.
        let gof = goodness_of_fit(&params, &ds);
        assert!((gof.chi_squared - 5.0).abs() < 1e-9);
        assert!((gof.reduced_chi_squared - 2.5).abs() < 1e-9);
        assert_eq!(gof.n_points, 3);
    }

    #[test]
    fn reduced_is_undefined_for_single_point() {
        let params = ResonanceParams::new(91.19, 2.5);
        let ds = exact_dataset(&params, 1);
        assert!(reduced_chi_squared(&params, &ds).is_nan());
    }
}
