//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - kept measurements: `o`
//! - rejected measurements: `x`
//! - fitted curve: `-` line

use crate::domain::{Dataset, FitFile, ResonanceParams};
use crate::models::predict_with;

/// Render a plot for an in-memory fit result.
pub fn render_ascii_plot(
    kept: &Dataset,
    rejected: &Dataset,
    params: &ResonanceParams,
    width: usize,
    height: usize,
) -> String {
    let (e_min, e_max) =
        energy_range(&[kept, rejected]).unwrap_or((params.mass - 5.0, params.mass + 5.0));
    let curve = sample_curve(params, e_min, e_max, width.max(2));
    render_plot(kept, rejected, &curve, e_min, e_max, width, height)
}

/// Render a plot from a saved fit JSON file (stored points + stored curve grid).
pub fn render_ascii_plot_from_fit_file(fit: &FitFile, width: usize, height: usize) -> String {
    let kept = Dataset::new(fit.points.clone());
    let curve: Vec<(f64, f64)> = fit
        .grid
        .energy_gev
        .iter()
        .zip(fit.grid.cross_section_nb.iter())
        .map(|(&e, &y)| (e, y))
        .collect();
    let (e_min, e_max) = curve_range(&curve)
        .or_else(|| kept.energy_range())
        .unwrap_or((fit.params.mass - 5.0, fit.params.mass + 5.0));

    render_plot(&kept, &Dataset::default(), &curve, e_min, e_max, width, height)
}

fn render_plot(
    kept: &Dataset,
    rejected: &Dataset,
    curve: &[(f64, f64)],
    e_min: f64,
    e_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    // Rejected points can be far off the curve; keep the y-range on the kept
    // data and the curve, and clamp the rest to the border.
    let (y_min, y_max) = y_range(kept, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    draw_curve(&mut grid, curve, e_min, e_max, y_min, y_max);

    for (set, ch) in [(rejected, 'x'), (kept, 'o')] {
        for m in set {
            let x = map_x(m.energy, e_min, e_max, width);
            let y = map_y(m.cross_section, y_min, y_max, height);
            grid[y][x] = ch;
        }
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: E=[{e_min:.3}, {e_max:.3}] GeV | σ=[{y_min:.3}, {y_max:.3}] nb\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn energy_range(sets: &[&Dataset]) -> Option<(f64, f64)> {
    let mut min_e = f64::INFINITY;
    let mut max_e = f64::NEG_INFINITY;
    for (lo, hi) in sets.iter().filter_map(|d| d.energy_range()) {
        min_e = min_e.min(lo);
        max_e = max_e.max(hi);
    }
    if min_e.is_finite() && max_e.is_finite() && max_e > min_e {
        Some((min_e, max_e))
    } else {
        None
    }
}

fn curve_range(curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_e = f64::INFINITY;
    let mut max_e = f64::NEG_INFINITY;
    for &(e, _) in curve {
        min_e = min_e.min(e);
        max_e = max_e.max(e);
    }
    if min_e.is_finite() && max_e.is_finite() && max_e > min_e {
        Some((min_e, max_e))
    } else {
        None
    }
}

fn sample_curve(params: &ResonanceParams, e_min: f64, e_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let e = e_min + u * (e_max - e_min);
        out.push((e, predict_with(e, params)));
    }
    out
}

fn y_range(kept: &Dataset, curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for m in kept {
        min_y = min_y.min(m.cross_section);
        max_y = max_y.max(m.cross_section);
    }
    for &(_, y) in curve {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(e: f64, e_min: f64, e_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((e - e_min) / (e_max - e_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    e_min: f64,
    e_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(e, y) in curve {
        let x = map_x(e, e_min, e_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveGrid, GoodnessOfFit, Lifetime, Measurement, ParamUncertainty};

    #[test]
    fn plot_golden_snapshot_flat_curve() {
        // A curve grid from a saved file is drawn as-is, so a flat grid gives a
        // predictable picture.
        let params = ResonanceParams::new(91.0, 2.5);
        let fit = FitFile {
            tool: "zfit".to_string(),
            generated_at: chrono::Utc::now(),
            params,
            uncertainty: ParamUncertainty { mass: 0.0, width: 0.0 },
            goodness: GoodnessOfFit {
                chi_squared: 0.0,
                reduced_chi_squared: 0.0,
                n_points: 2,
            },
            lifetime: Lifetime::from_width(2.5, 0.0),
            stages: Vec::new(),
            points: vec![Measurement::new(90.0, 1.0, 0.1), Measurement::new(99.0, 2.0, 0.1)],
            grid: CurveGrid {
                energy_gev: vec![90.0, 99.0],
                cross_section_nb: vec![1.0, 1.0],
            },
        };

        let txt = render_ascii_plot_from_fit_file(&fit, 10, 5);
        let expected = concat!(
            "Plot: E=[90.000, 99.000] GeV | σ=[0.950, 2.050] nb\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn rejected_points_are_marked_and_clamped() {
        let params = ResonanceParams::new(91.19, 2.5);
        let kept = Dataset::new(vec![
            Measurement::new(88.0, predict_with(88.0, &params), 0.05),
            Measurement::new(91.0, predict_with(91.0, &params), 0.05),
            Measurement::new(94.0, predict_with(94.0, &params), 0.05),
        ]);
        let rejected = Dataset::new(vec![Measurement::new(90.0, 40.0, 0.05)]);

        let txt = render_ascii_plot(&kept, &rejected, &params, 40, 12);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.chars().count() == 40));
        // Far-off reject is clamped onto the top row.
        assert!(rows[0].contains('x'));
        let kept_marks: usize = rows.iter().map(|r| r.matches('o').count()).sum();
        assert_eq!(kept_marks, 3);
    }
}
