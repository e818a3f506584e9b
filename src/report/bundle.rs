//! Markdown run report for archiving a fit alongside its inputs.

use std::fmt::Write as _;
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::PipelineOutput;
use crate::domain::FitConfig;
use crate::error::AppError;
use crate::report::format::{fmt_sig, format_stage_table};

/// Write `zfit_report_<timestamp>.md` into `dir` and return its path.
pub fn write_run_report(
    dir: &Path,
    run: &PipelineOutput,
    config: &FitConfig,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create report dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("zfit_report_{ts}.md"));

    write(&path, render_run_report(run, config)).map_err(|e| {
        AppError::new(2, format!("Failed to write report '{}': {e}", path.display()))
    })?;

    Ok(path)
}

/// Report body. Writing into a `String` cannot fail, so `fmt::Result`s are ignored.
pub fn render_run_report(run: &PipelineOutput, config: &FitConfig) -> String {
    let mut out = String::new();
    let staged = &run.staged;
    let fit = &staged.final_fit;

    let _ = writeln!(out, "# zfit run report");
    let _ = writeln!(out, "- generated: {}", Local::now().to_rfc3339());
    let _ = writeln!(
        out,
        "- inputs: `{}`, `{}`",
        config.input_a.display(),
        config.input_b.display()
    );
    let _ = writeln!(
        out,
        "- initial guess: M={} GeV, Γ={} GeV",
        config.initial_guess.mass, config.initial_guess.width
    );
    let _ = writeln!(
        out,
        "- filters: coarse {}σ, fine {}σ | max evaluations {}",
        config.coarse_sigma, config.fine_sigma, config.max_evals
    );

    let _ = writeln!(out, "\n## Inputs");
    let _ = writeln!(out, "| file | rows | kept | non-numeric | non-positive |");
    let _ = writeln!(out, "| - | - | - | - | - |");
    for f in &run.ingest.files {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            f.path,
            f.rows_read,
            f.rows_used(),
            f.rows_dropped_nan,
            f.rows_dropped_non_positive
        );
    }

    let _ = writeln!(out, "\n## Stages");
    let _ = writeln!(out, "```text");
    out.push_str(&format_stage_table(&staged.fits()));
    let _ = writeln!(out, "```");

    let _ = writeln!(out, "\n## Result");
    let _ = writeln!(
        out,
        "- mass: {} ± {} GeV/c²",
        fmt_sig(fit.params.mass, 4),
        fmt_sig(fit.uncertainty.mass, 1)
    );
    let _ = writeln!(
        out,
        "- width: {} ± {} GeV",
        fmt_sig(fit.params.width, 4),
        fmt_sig(fit.uncertainty.width, 2)
    );
    let _ = writeln!(
        out,
        "- lifetime: {} ± {} s",
        fmt_sig(run.lifetime.seconds, 3),
        fmt_sig(run.lifetime.uncertainty_seconds, 3)
    );
    let _ = writeln!(
        out,
        "- χ²: {} (n={}), reduced χ² = {} (divisor n−1)",
        fmt_sig(staged.goodness.chi_squared, 3),
        staged.goodness.n_points,
        fmt_sig(staged.goodness.reduced_chi_squared, 3)
    );

    let rejected = staged.coarse_filtered.difference(&staged.fine_filtered);
    let gross = run.ingest.dataset.difference(&staged.coarse_filtered);
    let _ = writeln!(out, "\n## Rejected points");
    let _ = writeln!(out, "| filter | energy (GeV) | σ (nb) | δ (nb) |");
    let _ = writeln!(out, "| - | - | - | - |");
    for (label, set) in [("coarse", &gross), ("fine", &rejected)] {
        for m in set {
            let _ = writeln!(
                out,
                "| {label} | {:.4} | {:.4} | {:.4} |",
                m.energy, m.cross_section, m.uncertainty
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_pipeline_with_data;
    use crate::data::sample::{SampleConfig, generate_sample};
    use crate::domain::Dataset;
    use crate::io::ingest::{FileSummary, IngestedData};

    fn small_run() -> (PipelineOutput, FitConfig) {
        let sample = generate_sample(&SampleConfig {
            count: 40,
            seed: 9,
            anomaly_probability: 0.0,
            invalid_probability: 0.0,
            ..SampleConfig::default()
        })
        .unwrap();
        let rows: Vec<_> = sample.rows.iter().filter_map(|r| r.as_measurement()).collect();
        let ingest = IngestedData {
            files: vec![FileSummary {
                path: "synthetic.csv".to_string(),
                rows_read: rows.len(),
                ..FileSummary::default()
            }],
            dataset: Dataset::sorted_by_energy(rows),
        };
        let config = FitConfig {
            grid_steps: 5,
            ..FitConfig::default()
        };
        (run_pipeline_with_data(&config, ingest).unwrap(), config)
    }

    #[test]
    fn report_contains_every_section() {
        let (run, config) = small_run();
        let text = render_run_report(&run, &config);
        assert!(text.starts_with("# zfit run report\n"));
        for section in ["## Inputs", "## Stages", "## Result", "## Rejected points"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("| synthetic.csv | 40 | 40 | 0 | 0 |"));
        assert!(text.contains("final fit"));
        assert!(text.contains("divisor n−1"));
    }

    #[test]
    fn report_is_written_to_disk() {
        let (run, config) = small_run();
        let dir = std::env::temp_dir().join(format!("zfit_report_{}", std::process::id()));
        let path = write_run_report(&dir, &run, &config).unwrap();
        assert!(path.starts_with(&dir));
        assert!(std::fs::read_to_string(&path).unwrap().contains("## Result"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
