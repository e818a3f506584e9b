//! Shared "fit pipeline" logic used by the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> validate -> staged fit -> goodness of fit -> landscape
//!
//! Presentation (printing, plots, exports) only reads the returned value and
//! never refits.

use crate::domain::{FitConfig, Lifetime};
use crate::error::FitError;
use crate::fit::{ChiSquaredLandscape, StagedFit, chi_squared_landscape, estimate_parameters};
use crate::io::ingest::{IngestedData, load_measurements};

/// All computed outputs of a single `zfit fit` run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub ingest: IngestedData,
    pub staged: StagedFit,
    pub lifetime: Lifetime,
    pub landscape: ChiSquaredLandscape,
}

/// Execute the full pipeline from the configured input files.
pub fn run_pipeline(config: &FitConfig) -> Result<PipelineOutput, FitError> {
    // 1) Load and validate both files.
    let ingest = load_measurements(&config.input_a, &config.input_b)?;

    run_pipeline_with_data(config, ingest)
}

/// Execute the pipeline on already loaded data.
pub fn run_pipeline_with_data(
    config: &FitConfig,
    ingest: IngestedData,
) -> Result<PipelineOutput, FitError> {
    // 2) Fit / filter / refit.
    let staged = estimate_parameters(&ingest.dataset, config)?;

    // 3) Derived quantities.
    let final_fit = &staged.final_fit;
    let lifetime = Lifetime::from_width(final_fit.params.width, final_fit.uncertainty.width);
    let landscape = chi_squared_landscape(
        &staged.fine_filtered,
        &final_fit.params,
        config.grid_span,
        config.grid_steps,
    );

    Ok(PipelineOutput {
        ingest,
        staged,
        lifetime,
        landscape,
    })
}
