//! Read/write fit JSON files.
//!
//! Fit JSON is the "portable" representation of a run:
//! - final parameters, uncertainties, goodness of fit and lifetime
//! - a per-stage summary
//! - the final dataset and a precomputed curve grid for quick plotting
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::path::Path;

use crate::app::pipeline::PipelineOutput;
use crate::domain::{CurveGrid, FitFile, ResonanceParams, StageSummary};
use crate::error::AppError;
use crate::models::predict_with;

/// Points in the exported curve grid.
const GRID_POINTS: usize = 201;

/// Build the JSON document for a finished run.
pub fn fit_file_from_run(run: &PipelineOutput) -> FitFile {
    let staged = &run.staged;
    let final_fit = &staged.final_fit;
    let (e_min, e_max) = final_fit
        .dataset
        .energy_range()
        .or_else(|| run.ingest.dataset.energy_range())
        .unwrap_or((final_fit.params.mass - 5.0, final_fit.params.mass + 5.0));

    FitFile {
        tool: "zfit".to_string(),
        generated_at: chrono::Utc::now(),
        params: final_fit.params,
        uncertainty: final_fit.uncertainty,
        goodness: staged.goodness,
        lifetime: run.lifetime,
        stages: staged.fits().into_iter().map(StageSummary::from).collect(),
        points: final_fit.dataset.as_slice().to_vec(),
        grid: build_grid(&final_fit.params, e_min, e_max, GRID_POINTS),
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fit: &FitFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display()))
    })?;

    serde_json::to_writer_pretty(file, fit)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;

    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display()))
    })?;
    let fit: FitFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

/// Evenly spaced model curve over `[e_min, e_max]`.
pub fn build_grid(params: &ResonanceParams, e_min: f64, e_max: f64, n: usize) -> CurveGrid {
    let n = n.max(2);
    let mut e0 = e_min;
    let mut e1 = e_max;
    if !(e0.is_finite() && e1.is_finite()) || e1 <= e0 {
        e0 = params.mass - 5.0;
        e1 = params.mass + 5.0;
    }

    let mut energy_gev = Vec::with_capacity(n);
    let mut cross_section_nb = Vec::with_capacity(n);

    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let e = e0 + u * (e1 - e0);
        energy_gev.push(e);
        cross_section_nb.push(predict_with(e, params));
    }

    CurveGrid {
        energy_gev,
        cross_section_nb,
    }
}
