//! Command-line parsing for the Z resonance fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "zfit", version, about = "Z boson mass and width from e+e- cross-section scans")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load both data files, run the staged fit, print results, and optionally plot/export.
    Fit(FitArgs),
    /// Write two synthetic input files in the loader's format.
    Generate(GenerateArgs),
    /// Plot a previously exported fit JSON.
    Plot(PlotArgs),
}

/// Options for the fit pipeline.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// First input file (energy, cross-section, uncertainty).
    #[arg(default_value = "z_boson_data_1.csv")]
    pub file_a: PathBuf,

    /// Second input file.
    #[arg(default_value = "z_boson_data_2.csv")]
    pub file_b: PathBuf,

    /// Initial guess for the mass (GeV).
    #[arg(long, default_value_t = 90.0)]
    pub guess_mass: f64,

    /// Initial guess for the width (GeV).
    #[arg(long, default_value_t = 3.0)]
    pub guess_width: f64,

    /// Sigma threshold of the first outlier filter.
    #[arg(long, default_value_t = 30.0)]
    pub coarse_sigma: f64,

    /// Sigma threshold of the second outlier filter.
    #[arg(long, default_value_t = 3.0)]
    pub fine_sigma: f64,

    /// Objective evaluation budget per fit.
    #[arg(long, default_value_t = 1000)]
    pub max_evals: usize,

    /// Half-width (GeV) of the chi-squared grid around the best fit.
    #[arg(long, default_value_t = 0.2)]
    pub grid_span: f64,

    /// Chi-squared grid points per axis.
    #[arg(long, default_value_t = 100)]
    pub grid_steps: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write SVG charts into this directory.
    #[arg(long)]
    pub svg_dir: Option<PathBuf>,

    /// Export the final dataset with predictions and pulls to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fit (params + uncertainties + stages + curve grid) to JSON.
    #[arg(long = "export-fit")]
    pub export_fit: Option<PathBuf>,

    /// Write a timestamped markdown run report into this directory.
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Directory to write `z_boson_data_1.csv` and `z_boson_data_2.csv` into.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Number of rows across both files.
    #[arg(short = 'n', long, default_value_t = 40)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// True mass (GeV).
    #[arg(long, default_value_t = 91.1876)]
    pub mass: f64,

    /// True width (GeV).
    #[arg(long, default_value_t = 2.4952)]
    pub width: f64,

    /// Lowest energy (GeV).
    #[arg(long, default_value_t = 86.0)]
    pub energy_min: f64,

    /// Highest energy (GeV).
    #[arg(long, default_value_t = 96.0)]
    pub energy_max: f64,

    /// Uncertainty as a fraction of the true cross-section.
    #[arg(long, default_value_t = 0.05)]
    pub relative_uncertainty: f64,

    /// Uncertainty floor (nb).
    #[arg(long, default_value_t = 0.02)]
    pub uncertainty_floor: f64,

    /// Probability that a row is a gross anomaly.
    #[arg(long, default_value_t = 0.05)]
    pub anomaly_prob: f64,

    /// Anomaly size in units of the row's uncertainty.
    #[arg(long, default_value_t = 50.0)]
    pub anomaly_sigmas: f64,

    /// Probability that a row is written with an invalid field.
    #[arg(long, default_value_t = 0.05)]
    pub invalid_prob: f64,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Options for plotting a saved fit.
#[derive(Debug, Parser, Clone)]
pub struct PlotArgs {
    /// Fit JSON file (from `zfit fit --export-fit ...`).
    #[arg(long)]
    pub fit: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
