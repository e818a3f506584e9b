//! Reduced chi-squared over a `(mass, width)` grid around a fit.
//!
//! Rows (one per width) are evaluated in parallel; each cell is independent.

use rayon::prelude::*;

use crate::domain::{Dataset, ResonanceParams};
use crate::fit::goodness::{chi_squared, reduce};

/// Grid of reduced chi-squared values.
#[derive(Debug, Clone)]
pub struct ChiSquaredLandscape {
    /// Mass axis (GeV), ascending.
    pub masses: Vec<f64>,
    /// Width axis (GeV), ascending.
    pub widths: Vec<f64>,
    /// `values[j][i]` is the reduced chi-squared at `(masses[i], widths[j])`.
    pub values: Vec<Vec<f64>>,
}

impl ChiSquaredLandscape {
    /// Smallest finite cell as `(params, value)`.
    pub fn minimum(&self) -> Option<(ResonanceParams, f64)> {
        let mut best: Option<(ResonanceParams, f64)> = None;
        for (j, row) in self.values.iter().enumerate() {
            for (i, &v) in row.iter().enumerate() {
                if !v.is_finite() {
                    continue;
                }
                if best.is_none_or(|(_, b)| v < b) {
                    best = Some((ResonanceParams::new(self.masses[i], self.widths[j]), v));
                }
            }
        }
        best
    }

    /// `(min, max)` over finite cells.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in self.values.iter().flatten() {
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
    }
}

/// Evaluate `steps × steps` cells spanning `centre ± span` on both axes.
pub fn chi_squared_landscape(
    dataset: &Dataset,
    centre: &ResonanceParams,
    span: f64,
    steps: usize,
) -> ChiSquaredLandscape {
    let masses = linspace(centre.mass - span, centre.mass + span, steps);
    let widths = linspace(centre.width - span, centre.width + span, steps);
    let n = dataset.len();

    let values = widths
        .par_iter()
        .map(|&width| {
            masses
                .iter()
                .map(|&mass| reduce(chi_squared(&ResonanceParams::new(mass, width), dataset), n))
                .collect()
        })
        .collect();

    ChiSquaredLandscape {
        masses,
        widths,
        values,
    }
}

fn linspace(lo: f64, hi: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![(lo + hi) / 2.0],
        _ => (0..steps)
            .map(|i| lo + (hi - lo) * i as f64 / (steps as f64 - 1.0))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Measurement;
    use crate::models::predict;

    fn exact(params: &ResonanceParams) -> Dataset {
        Dataset::new(
            (0..25)
                .map(|i| {
                    let e = 87.0 + i as f64 * 0.33;
                    let y = predict(e, params.mass, params.width);
                    Measurement::new(e, y, 0.05 * y)
                })
                .collect(),
        )
    }

    #[test]
    fn grid_has_requested_shape() {
        let p = ResonanceParams::new(91.19, 2.5);
        let land = chi_squared_landscape(&exact(&p), &p, 0.2, 11);
        assert_eq!(land.masses.len(), 11);
        assert_eq!(land.widths.len(), 11);
        assert_eq!(land.values.len(), 11);
        assert!(land.values.iter().all(|row| row.len() == 11));
        assert!((land.masses[0] - 90.99).abs() < 1e-12);
        assert!((land.widths[10] - 2.7).abs() < 1e-12);
    }

    #[test]
    fn minimum_sits_on_the_true_parameters() {
        let p = ResonanceParams::new(91.19, 2.5);
        // Odd step count puts the centre exactly on the grid.
        let land = chi_squared_landscape(&exact(&p), &p, 0.2, 21);
        let (best, value) = land.minimum().unwrap();
        assert!((best.mass - p.mass).abs() < 1e-9);
        assert!((best.width - p.width).abs() < 1e-9);
        assert!(value < 1e-20);

        let (lo, hi) = land.value_range().unwrap();
        assert_eq!(lo, value);
        assert!(hi > 1.0);
    }

    #[test]
    fn empty_grid_has_no_minimum() {
        let p = ResonanceParams::new(91.19, 2.5);
        let land = chi_squared_landscape(&exact(&p), &p, 0.2, 0);
        assert!(land.minimum().is_none());
        assert!(land.value_range().is_none());
    }
}
