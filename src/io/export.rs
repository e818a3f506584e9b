//! Export per-measurement fit results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{Dataset, ResonanceParams};
use crate::error::AppError;
use crate::models::predict_with;

/// Write one row per measurement with the model prediction, residual and pull.
pub fn write_points_csv(
    path: &Path,
    dataset: &Dataset,
    params: &ResonanceParams,
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "energy_gev,cross_section_nb,uncertainty_nb,predicted_nb,residual_nb,pull")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for m in dataset {
        let predicted = predict_with(m.energy, params);
        let residual = m.cross_section - predicted;
        writeln!(
            file,
            "{:.6},{:.6},{:.6},{:.6},{:.6},{:.4}",
            m.energy,
            m.cross_section,
            m.uncertainty,
            predicted,
            residual,
            residual / m.uncertainty,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
