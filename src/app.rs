//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - runs the staged fit pipeline
//! - generates synthetic input files
//! - prints reports/plots
//! - writes optional SVG charts, exports and run reports

use clap::Parser;

use crate::cli::{Command, FitArgs, GenerateArgs, PlotArgs};
use crate::data::sample::SampleConfig;
use crate::domain::{FitConfig, ResonanceParams};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `zfit` binary.
pub fn run() -> Result<(), AppError> {
    // `zfit`, `zfit a.csv b.csv` and `zfit --no-plot` should all behave like
    // `zfit fit ...`. Clap requires a subcommand name, so rewrite argv first.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => {
            init_logging(args.verbose);
            handle_fit(args)
        }
        Command::Generate(args) => {
            init_logging(args.verbose);
            handle_generate(args)
        }
        Command::Plot(args) => {
            init_logging(0);
            handle_plot(args)
        }
    }
}

/// `RUST_LOG` wins; otherwise `-v` picks the default filter.
fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // Ignore a second initialization (tests, embedding).
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_pipeline(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));

    if config.plot {
        let staged = &run.staged;
        let rejected = staged.coarse_filtered.difference(&staged.fine_filtered);
        let plot = crate::plot::render_ascii_plot(
            &staged.final_fit.dataset,
            &rejected,
            &staged.final_fit.params,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional outputs.
    if let Some(dir) = &config.svg_dir {
        crate::plot::svg::write_svg_charts(dir, &run, &config)?;
    }
    if let Some(path) = &config.export_points {
        let final_fit = &run.staged.final_fit;
        crate::io::export::write_points_csv(path, &final_fit.dataset, &final_fit.params)?;
    }
    if let Some(path) = &config.export_fit {
        let fit = crate::io::curve::fit_file_from_run(&run);
        crate::io::curve::write_fit_json(path, &fit)?;
    }
    if let Some(dir) = &config.report_dir {
        let path = crate::report::bundle::write_run_report(dir, &run, &config)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(&args);
    let sample = crate::data::sample::generate_sample(&config)?;
    let (a, b) = crate::data::sample::write_sample_csvs(&sample, &args.out_dir)?;

    println!(
        "Wrote {} rows ({} clean, {} anomalies, {} invalid) to {} and {}",
        sample.rows.len(),
        sample.count_clean(),
        sample.count_anomalies(),
        sample.count_invalid(),
        a.display(),
        b.display()
    );
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let fit = crate::io::curve::read_fit_json(&args.fit)?;

    let plot = crate::plot::render_ascii_plot_from_fit_file(&fit, args.width, args.height);

    println!(
        "M = {:.4} ± {:.2e} GeV, Γ = {:.4} ± {:.2e} GeV (saved {})",
        fit.params.mass,
        fit.uncertainty.mass,
        fit.params.width,
        fit.uncertainty.width,
        fit.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{plot}");
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        input_a: args.file_a.clone(),
        input_b: args.file_b.clone(),
        initial_guess: ResonanceParams::new(args.guess_mass, args.guess_width),
        coarse_sigma: args.coarse_sigma,
        fine_sigma: args.fine_sigma,
        max_evals: args.max_evals,
        grid_span: args.grid_span,
        grid_steps: args.grid_steps,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        svg_dir: args.svg_dir.clone(),
        export_points: args.export.clone(),
        export_fit: args.export_fit.clone(),
        report_dir: args.report_dir.clone(),
    }
}

pub fn sample_config_from_args(args: &GenerateArgs) -> SampleConfig {
    SampleConfig {
        count: args.count,
        seed: args.seed,
        mass: args.mass,
        width: args.width,
        energy_min: args.energy_min,
        energy_max: args.energy_max,
        relative_uncertainty: args.relative_uncertainty,
        uncertainty_floor: args.uncertainty_floor,
        anomaly_probability: args.anomaly_prob,
        anomaly_sigmas: args.anomaly_sigmas,
        invalid_probability: args.invalid_prob,
    }
}

/// Rewrite argv so `zfit` defaults to `zfit fit`.
///
/// Rules:
/// - `zfit`                        -> `zfit fit`
/// - `zfit a.csv b.csv ...`        -> `zfit fit a.csv b.csv ...`
/// - `zfit --no-plot ...`          -> `zfit fit --no-plot ...`
/// - `zfit --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "generate" | "plot");
    if is_subcommand {
        return argv;
    }

    // Flags or file paths: treat them as fit arguments.
    argv.insert(1, "fit".to_string());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_becomes_fit() {
        assert_eq!(rewrite_args(argv(&["zfit"])), argv(&["zfit", "fit"]));
    }

    #[test]
    fn leading_files_and_flags_become_fit() {
        assert_eq!(
            rewrite_args(argv(&["zfit", "a.csv", "b.csv"])),
            argv(&["zfit", "fit", "a.csv", "b.csv"])
        );
        assert_eq!(
            rewrite_args(argv(&["zfit", "--no-plot"])),
            argv(&["zfit", "fit", "--no-plot"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            &["zfit", "plot", "--fit", "f.json"][..],
            &["zfit", "generate"][..],
            &["zfit", "--help"][..],
            &["zfit", "-V"][..],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn fit_args_map_onto_config() {
        let cli = crate::cli::Cli::parse_from(rewrite_args(argv(&[
            "zfit",
            "x.csv",
            "y.csv",
            "--guess-mass",
            "91",
            "--fine-sigma",
            "2.5",
            "--no-plot",
            "--export-fit",
            "fit.json",
        ])));
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let config = fit_config_from_args(&args);
        assert_eq!(config.input_a, PathBuf::from("x.csv"));
        assert_eq!(config.input_b, PathBuf::from("y.csv"));
        assert_eq!(config.initial_guess, ResonanceParams::new(91.0, 3.0));
        assert_eq!(config.fine_sigma, 2.5);
        assert_eq!(config.coarse_sigma, 30.0);
        assert!(!config.plot);
        assert_eq!(config.export_fit, Some(PathBuf::from("fit.json")));
        assert_eq!(config.svg_dir, None);
    }

    #[test]
    fn generate_args_map_onto_sample_config() {
        let cli = crate::cli::Cli::parse_from([
            "zfit", "generate", "--out-dir", "out", "-n", "12", "--seed", "3",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let config = sample_config_from_args(&args);
        assert_eq!(config.count, 12);
        assert_eq!(config.seed, 3);
        assert_eq!(config.mass, SampleConfig::default().mass);
        assert_eq!(args.out_dir, PathBuf::from("out"));
    }
}
