//! Sigma-threshold outlier rejection against a model prediction.

use crate::domain::{Dataset, ResonanceParams};
use crate::models::predict_with;

/// Keep measurements whose deviation from the model is within
/// `sigma × uncertainty`.
///
/// Relative order is preserved. A non-finite prediction never passes.
pub fn filter_outliers(dataset: &Dataset, params: &ResonanceParams, sigma: f64) -> Dataset {
    let kept = dataset
        .iter()
        .filter(|m| {
            let deviation = (predict_with(m.energy, params) - m.cross_section).abs();
            deviation.is_finite() && deviation <= sigma * m.uncertainty
        })
        .copied()
        .collect();

    Dataset::new(kept)
}
