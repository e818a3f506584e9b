//! Single-stage nonlinear fit of the resonance model.
//!
//! Given:
//! - a dataset `(E_i, σ_i, δ_i)`
//! - a starting `(M, Γ)`
//! - a weighting mode
//!
//! we minimize `Σ ((σ(E_i; M, Γ) − σ_i) / w_i)²` with Levenberg–Marquardt,
//! where `w_i = 1` (unweighted) or `w_i = δ_i` (absolute sigma), and derive
//! one-sigma parameter uncertainties from the covariance at the optimum.

use nalgebra::DVector;

use crate::domain::{
    Dataset, FitResult, FitStage, FREE_PARAMS, ParamUncertainty, ResonanceParams, Weighting,
};
use crate::error::FitError;
use crate::math::{LmOptions, levenberg_marquardt, normal_inverse};
use crate::models::predict;

/// Fit `(mass, width)` to `dataset` for one pipeline stage.
pub fn fit_resonance(
    stage: FitStage,
    dataset: &Dataset,
    seed: ResonanceParams,
    weighting: Weighting,
    max_evals: usize,
) -> Result<FitResult, FitError> {
    let n = dataset.len();
    if n < FREE_PARAMS {
        return Err(FitError::DataExhaustion {
            stage: stage.display_name(),
            remaining: n,
            required: FREE_PARAMS,
        });
    }

    let energies = dataset.energies();
    let observed = dataset.cross_sections();
    let scales: Vec<f64> = match weighting {
        Weighting::Unweighted => vec![1.0; n],
        Weighting::AbsoluteSigma => dataset.uncertainties(),
    };

    let residuals = |p: &[f64]| {
        DVector::from_iterator(
            n,
            (0..n).map(|i| (predict(energies[i], p[0], p[1]) - observed[i]) / scales[i]),
        )
    };

    let opts = LmOptions {
        max_evals,
        ..LmOptions::default()
    };

    let solution = levenberg_marquardt(residuals, &[seed.mass, seed.width], &opts).map_err(|e| {
        FitError::FitConvergence {
            stage: stage.display_name(),
            reason: e.to_string(),
        }
    })?;

    // The model only sees M² and Γ², so report magnitudes.
    let params = ResonanceParams::new(solution.params[0].abs(), solution.params[1].abs());
    if !(params.mass.is_finite() && params.width.is_finite() && params.mass > 0.0) {
        return Err(FitError::FitConvergence {
            stage: stage.display_name(),
            reason: format!("non-physical optimum M={}, Γ={}", params.mass, params.width),
        });
    }

    let uncertainty = uncertainty_from_jacobian(&solution.jacobian, solution.cost, n, weighting);

    log::debug!(
        "{}: n={n} M={:.5} Γ={:.5} cost={:.4e} evals={} iters={}",
        stage.display_name(),
        params.mass,
        params.width,
        solution.cost,
        solution.evaluations,
        solution.iterations,
    );

    Ok(FitResult {
        stage,
        dataset: dataset.clone(),
        params,
        uncertainty,
        evaluations: solution.evaluations,
        cost: solution.cost,
    })
}

/// `sqrt(diag(cov))` with `cov = (JᵀJ)⁻¹`, rescaled by the residual variance
/// unless the residuals were already divided by true standard deviations.
fn uncertainty_from_jacobian(
    jacobian: &nalgebra::DMatrix<f64>,
    cost: f64,
    n: usize,
    weighting: Weighting,
) -> ParamUncertainty {
    let Some(cov) = normal_inverse(jacobian) else {
        return ParamUncertainty {
            mass: f64::INFINITY,
            width: f64::INFINITY,
        };
    };

    let factor = match weighting {
        Weighting::AbsoluteSigma => 1.0,
        Weighting::Unweighted if n > FREE_PARAMS => cost / (n - FREE_PARAMS) as f64,
        Weighting::Unweighted => f64::INFINITY,
    };

    ParamUncertainty {
        mass: (cov[(0, 0)] * factor).abs().sqrt(),
        width: (cov[(1, 1)] * factor).abs().sqrt(),
    }
}
