//! Shared domain types.
//!
//! These types are intentionally kept small and immutable so they can be:
//!
//! - passed between pipeline stages by value
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Reduced Planck constant (J·s).
pub const HBAR_J_S: f64 = 1.054_571_817e-34;

/// Elementary charge (C).
pub const ELEMENTARY_CHARGE_C: f64 = 1.602_176_634e-19;

/// Number of free parameters in the resonance model (mass, width).
pub const FREE_PARAMS: usize = 2;

/// One row of detector data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Centre-of-mass energy (GeV).
    pub energy: f64,
    /// Observed cross-section (nb).
    pub cross_section: f64,
    /// One-sigma uncertainty on the cross-section (nb).
    pub uncertainty: f64,
}

impl Measurement {
    pub fn new(energy: f64, cross_section: f64, uncertainty: f64) -> Self {
        Self {
            energy,
            cross_section,
            uncertainty,
        }
    }

    /// All three fields finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.energy, self.cross_section, self.uncertainty]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// An ordered, read-only collection of measurements.
///
/// Filtering and loading always build a new `Dataset`; nothing mutates one
/// after construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    measurements: Vec<Measurement>,
}

impl Dataset {
    /// Wrap measurements as given (no sorting, no validation).
    pub fn new(measurements: Vec<Measurement>) -> Self {
        Self { measurements }
    }

    /// Wrap measurements sorted ascending by energy.
    ///
    /// The sort is stable, so equal energies keep their input order.
    pub fn sorted_by_energy(mut measurements: Vec<Measurement>) -> Self {
        measurements.sort_by(|a, b| a.energy.total_cmp(&b.energy));
        Self { measurements }
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn as_slice(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.measurements.iter()
    }

    pub fn energies(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.energy).collect()
    }

    pub fn cross_sections(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.cross_section).collect()
    }

    pub fn uncertainties(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.uncertainty).collect()
    }

    /// `(min, max)` energy, or `None` for an empty dataset.
    pub fn energy_range(&self) -> Option<(f64, f64)> {
        let first = self.measurements.first()?;
        let (min, max) = self
            .measurements
            .iter()
            .fold((first.energy, first.energy), |(lo, hi), m| {
                (lo.min(m.energy), hi.max(m.energy))
            });
        Some((min, max))
    }

    /// Measurements of `self` that are not in `kept` (by value, order preserved).
    ///
    /// Used by the presentation layer to show what a filter stage removed.
    pub fn difference(&self, kept: &Dataset) -> Dataset {
        let rejected = self
            .measurements
            .iter()
            .filter(|m| !kept.measurements.contains(m))
            .copied()
            .collect();
        Dataset::new(rejected)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.measurements.iter()
    }
}

/// The two free parameters of the resonance model (GeV).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResonanceParams {
    pub mass: f64,
    pub width: f64,
}

impl ResonanceParams {
    pub fn new(mass: f64, width: f64) -> Self {
        Self { mass, width }
    }
}

/// One-sigma parameter uncertainties from the fit covariance (GeV).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamUncertainty {
    #[serde(with = "crate::domain::nonfinite::unbounded")]
    pub mass: f64,
    #[serde(with = "crate::domain::nonfinite::unbounded")]
    pub width: f64,
}

/// Pipeline stage that produced a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitStage {
    Coarse,
    Refit,
    Final,
}

impl FitStage {
    /// Human-readable label for terminal output and error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            FitStage::Coarse => "coarse fit",
            FitStage::Refit => "refit",
            FitStage::Final => "final fit",
        }
    }
}

/// How residuals are scaled in the least-squares objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    /// Plain residuals; covariance scaled by the residual variance.
    Unweighted,
    /// Residuals divided by each point's uncertainty, taken as a true standard
    /// deviation (no covariance rescaling).
    AbsoluteSigma,
}

/// Output of one fitting stage.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub stage: FitStage,
    /// The data this stage was fitted on.
    pub dataset: Dataset,
    pub params: ResonanceParams,
    pub uncertainty: ParamUncertainty,
    /// Objective evaluations spent by the optimizer.
    pub evaluations: usize,
    /// Final objective value (sum of squared, possibly weighted, residuals).
    pub cost: f64,
}

/// Chi-squared summary for a parameter set against a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFit {
    #[serde(with = "crate::domain::nonfinite::undefined")]
    pub chi_squared: f64,
    /// `chi_squared / (n - 1)`; NaN for a single point.
    #[serde(with = "crate::domain::nonfinite::undefined")]
    pub reduced_chi_squared: f64,
    pub n_points: usize,
}

/// Mean lifetime implied by a resonance width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    pub seconds: f64,
    #[serde(with = "crate::domain::nonfinite::unbounded")]
    pub uncertainty_seconds: f64,
}

impl Lifetime {
    /// `τ = ħ / Γ`, with `Γ` converted from GeV to joules.
    pub fn from_width(width_gev: f64, width_uncertainty_gev: f64) -> Self {
        let seconds = HBAR_J_S / (width_gev * ELEMENTARY_CHARGE_C * 1e9);
        let uncertainty_seconds = width_uncertainty_gev * seconds / width_gev;
        Self {
            seconds,
            uncertainty_seconds,
        }
    }
}

/// A full run’s configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub input_a: PathBuf,
    pub input_b: PathBuf,

    /// Seed for the coarse fit.
    pub initial_guess: ResonanceParams,
    /// Sigma threshold of the first (gross anomaly) filter.
    pub coarse_sigma: f64,
    /// Sigma threshold of the second (statistical) filter.
    pub fine_sigma: f64,
    /// Objective evaluation budget per fit.
    pub max_evals: usize,

    /// Half-width (GeV) of the chi-squared landscape around the best fit.
    pub grid_span: f64,
    /// Grid points per axis.
    pub grid_steps: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub svg_dir: Option<PathBuf>,
    pub export_points: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            input_a: PathBuf::from("z_boson_data_1.csv"),
            input_b: PathBuf::from("z_boson_data_2.csv"),
            initial_guess: ResonanceParams::new(90.0, 3.0),
            coarse_sigma: 30.0,
            fine_sigma: 3.0,
            max_evals: 1000,
            grid_span: 0.2,
            grid_steps: 100,
            plot: true,
            plot_width: 100,
            plot_height: 25,
            svg_dir: None,
            export_points: None,
            export_fit: None,
            report_dir: None,
        }
    }
}

/// Compact per-stage record for exports and reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: FitStage,
    pub n_points: usize,
    pub params: ResonanceParams,
    pub uncertainty: ParamUncertainty,
    pub evaluations: usize,
}

impl From<&FitResult> for StageSummary {
    fn from(fit: &FitResult) -> Self {
        Self {
            stage: fit.stage,
            n_points: fit.dataset.len(),
            params: fit.params,
            uncertainty: fit.uncertainty,
            evaluations: fit.evaluations,
        }
    }
}

/// A saved fit (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub params: ResonanceParams,
    pub uncertainty: ParamUncertainty,
    pub goodness: GoodnessOfFit,
    pub lifetime: Lifetime,
    pub stages: Vec<StageSummary>,
    /// Final dataset, for re-plotting.
    pub points: Vec<Measurement>,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub energy_gev: Vec<f64>,
    pub cross_section_nb: Vec<f64>,
}
