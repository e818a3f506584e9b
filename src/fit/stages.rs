//! Five-stage fit / filter / refit estimator.
//!
//! ```text
//! validated ──fit(guess)──────────────▶ coarse
//! validated ──filter(coarse, 30σ)─────▶ coarse_filtered
//! coarse_filtered ──fit(coarse)───────▶ refit
//! coarse_filtered ──filter(refit, 3σ)─▶ fine_filtered
//! fine_filtered ──fit(coarse, δ-weighted, absolute)─▶ final
//! ```
//!
//! The coarse pass only removes gross anomalies, so a poor initial guess
//! cannot throw away good data. The refit is then close enough to the truth
//! for the 3σ cut to be meaningful. Only the final fit weights by uncertainty.

use crate::domain::{Dataset, FitConfig, FitResult, FitStage, GoodnessOfFit, Weighting};
use crate::error::FitError;
use crate::fit::filter::filter_outliers;
use crate::fit::fitter::fit_resonance;
use crate::fit::goodness::goodness_of_fit;

/// Every intermediate product of one estimator run.
#[derive(Debug, Clone)]
pub struct StagedFit {
    pub coarse: FitResult,
    pub coarse_filtered: Dataset,
    pub refit: FitResult,
    pub fine_filtered: Dataset,
    pub final_fit: FitResult,
    /// Chi-squared of `final_fit` against `fine_filtered`.
    pub goodness: GoodnessOfFit,
}

impl StagedFit {
    /// The three fits in pipeline order.
    pub fn fits(&self) -> [&FitResult; 3] {
        [&self.coarse, &self.refit, &self.final_fit]
    }
}

/// Run all stages on an already validated dataset.
pub fn estimate_parameters(validated: &Dataset, config: &FitConfig) -> Result<StagedFit, FitError> {
    log::info!(
        "coarse fit on {} points from M={}, Γ={}",
        validated.len(),
        config.initial_guess.mass,
        config.initial_guess.width
    );
    let coarse = fit_resonance(
        FitStage::Coarse,
        validated,
        config.initial_guess,
        Weighting::Unweighted,
        config.max_evals,
    )?;

    let coarse_filtered = filter_outliers(validated, &coarse.params, config.coarse_sigma);
    log::info!(
        "{}σ filter kept {}/{} points",
        config.coarse_sigma,
        coarse_filtered.len(),
        validated.len()
    );

    let refit = fit_resonance(
        FitStage::Refit,
        &coarse_filtered,
        coarse.params,
        Weighting::Unweighted,
        config.max_evals,
    )?;

    let fine_filtered = filter_outliers(&coarse_filtered, &refit.params, config.fine_sigma);
    log::info!(
        "{}σ filter kept {}/{} points",
        config.fine_sigma,
        fine_filtered.len(),
        coarse_filtered.len()
    );

    let final_fit = fit_resonance(
        FitStage::Final,
        &fine_filtered,
        coarse.params,
        Weighting::AbsoluteSigma,
        config.max_evals,
    )?;

    let goodness = goodness_of_fit(&final_fit.params, &fine_filtered);
    log::info!(
        "final fit: M={:.4}±{:.2e} Γ={:.4}±{:.2e} χ²/(n-1)={:.3}",
        final_fit.params.mass,
        final_fit.uncertainty.mass,
        final_fit.params.width,
        final_fit.uncertainty.width,
        goodness.reduced_chi_squared
    );

    Ok(StagedFit {
        coarse,
        coarse_filtered,
        refit,
        fine_filtered,
        final_fit,
        goodness,
    })
}
