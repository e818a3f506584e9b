//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::PipelineOutput;
use crate::domain::{FitConfig, FitResult};
use crate::io::ingest::IngestedData;

/// Format the full run summary (inputs + per-stage fits + final result).
pub fn format_run_summary(run: &PipelineOutput, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== zfit - Z boson line-shape fit ===\n");
    out.push_str(&format_ingest(&run.ingest));
    out.push('\n');

    out.push_str(&format!(
        "Filters: coarse {}σ kept {}/{} | fine {}σ kept {}/{}\n",
        config.coarse_sigma,
        run.staged.coarse_filtered.len(),
        run.ingest.dataset.len(),
        config.fine_sigma,
        run.staged.fine_filtered.len(),
        run.staged.coarse_filtered.len(),
    ));
    out.push('\n');

    out.push_str("Stages:\n");
    out.push_str(&format_stage_table(&run.staged.fits()));
    out.push('\n');

    let fit = &run.staged.final_fit;
    let gof = &run.staged.goodness;
    out.push_str("Result:\n");
    out.push_str(&format!(
        "- mass     : {} ± {} GeV/c²\n",
        fmt_sig(fit.params.mass, 4),
        fmt_sig(fit.uncertainty.mass, 1)
    ));
    out.push_str(&format!(
        "- width    : {} ± {} GeV\n",
        fmt_sig(fit.params.width, 4),
        fmt_sig(fit.uncertainty.width, 2)
    ));
    out.push_str(&format!(
        "- lifetime : {} ± {} s\n",
        fmt_sig(run.lifetime.seconds, 3),
        fmt_sig(run.lifetime.uncertainty_seconds, 3)
    ));
    out.push_str(&format!(
        "- χ²       : {} for n={} points, reduced χ² = {}\n",
        fmt_sig(gof.chi_squared, 3),
        gof.n_points,
        fmt_sig(gof.reduced_chi_squared, 3)
    ));

    if let Some((best, value)) = run.landscape.minimum() {
        out.push_str(&format!(
            "- χ² grid  : min reduced χ² = {} at M={:.4}, Γ={:.4} ({}×{} cells)\n",
            fmt_sig(value, 3),
            best.mass,
            best.width,
            run.landscape.masses.len(),
            run.landscape.widths.len(),
        ));
    }

    out
}

/// Per-file loader summary.
pub fn format_ingest(ingest: &IngestedData) -> String {
    let mut out = String::new();
    for f in &ingest.files {
        out.push_str(&format!(
            "Input: {} | rows={} kept={} non-numeric={} non-positive={}\n",
            f.path,
            f.rows_read,
            f.rows_used(),
            f.rows_dropped_nan,
            f.rows_dropped_non_positive
        ));
    }
    match ingest.dataset.energy_range() {
        Some((lo, hi)) => out.push_str(&format!(
            "Dataset: n={} | E=[{lo:.3}, {hi:.3}] GeV\n",
            ingest.dataset.len()
        )),
        None => out.push_str("Dataset: n=0\n"),
    }
    out
}

/// Fixed-width table of stage results.
pub fn format_stage_table(fits: &[&FitResult]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:>6} {:>10} {:>10} {:>10} {:>10} {:>6}\n",
            "stage", "n", "mass", "±", "width", "±", "evals"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<12} {:-<6} {:-<10} {:-<10} {:-<10} {:-<10} {:-<6}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for fit in fits {
        out.push_str(
            format!(
                "{:<12} {:>6} {:>10.4} {:>10.2e} {:>10.4} {:>10.2e} {:>6}\n",
                fit.stage.display_name(),
                fit.dataset.len(),
                fit.params.mass,
                fit.uncertainty.mass,
                fit.params.width,
                fit.uncertainty.width,
                fit.evaluations,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format `v` with `sig` significant figures, keeping trailing zeros.
///
/// Uses scientific notation, with a signed two-digit exponent, for exponents
/// below −4 or at/above `sig`.
pub fn fmt_sig(v: f64, sig: usize) -> String {
    let sig = sig.max(1);
    if !v.is_finite() || v == 0.0 {
        return format!("{v}");
    }

    // Round first, then read the exponent back so 9.9996 → "10.00" works.
    let sci = format!("{:.*e}", sig - 1, v);
    let (mantissa, exp) = match sci.rsplit_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= sig as i32 {
        // Signed, at least two exponent digits: 1.23e+03, 2.64e-25.
        format!("{mantissa}e{exp:+03}")
    } else {
        let decimals = (sig as i32 - 1 - exp).max(0) as usize;
        format!("{v:.decimals$}")
    }
}
