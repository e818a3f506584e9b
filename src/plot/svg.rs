//! SVG charts via Plotters.
//!
//! Four files are written into the chosen directory:
//! - `initial_fit.svg`: coarse-filtered data against the initial-guess model
//! - `final_fit.svg`: final data against the best fit
//! - `chi2_contour.svg`: filled contour map of the reduced chi-squared landscape
//! - `chi2_surface.svg`: the same landscape as a 3D surface
//!
//! Error bars are drawn at 3σ so that they are visible at the Z peak scale.

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::app::pipeline::PipelineOutput;
use crate::domain::{Dataset, FitConfig, ResonanceParams};
use crate::error::AppError;
use crate::fit::ChiSquaredLandscape;
use crate::models::predict_with;

type DrawResult = Result<(), Box<dyn Error>>;

const CHART_SIZE: (u32, u32) = (1000, 700);

/// Error bar half-length in units of the measurement uncertainty.
const ERROR_BAR_SIGMAS: f64 = 3.0;

/// Samples along the model curve.
const CURVE_POINTS: usize = 400;

/// Band edges of the contour map (reduced chi-squared).
pub const CONTOUR_LEVELS: [f64; 9] = [0.0, 1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];

/// One colour per band, plus one for everything above the last level.
const BAND_COLORS: [RGBColor; 9] = [
    RGBColor(68, 1, 84),
    RGBColor(72, 40, 120),
    RGBColor(62, 74, 137),
    RGBColor(49, 104, 142),
    RGBColor(38, 130, 142),
    RGBColor(31, 158, 137),
    RGBColor(53, 183, 121),
    RGBColor(109, 205, 89),
    RGBColor(180, 222, 44),
];

const MISSING_COLOR: RGBColor = RGBColor(220, 220, 220);

/// Write every chart for a finished run and return the paths written.
pub fn write_svg_charts(
    dir: &Path,
    run: &PipelineOutput,
    config: &FitConfig,
) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        AppError::new(2, format!("Failed to create SVG directory '{}': {e}", dir.display()))
    })?;

    let staged = &run.staged;
    let mut written = Vec::with_capacity(4);

    let path = dir.join("initial_fit.svg");
    draw_fit_chart(
        &path,
        "Coarse-filtered data and initial guess",
        &staged.coarse_filtered,
        &config.initial_guess,
        "initial guess",
    )
    .map_err(|e| draw_error(&path, e))?;
    written.push(path);

    let path = dir.join("final_fit.svg");
    draw_fit_chart(
        &path,
        "Final data and best fit",
        &staged.final_fit.dataset,
        &staged.final_fit.params,
        "best fit",
    )
    .map_err(|e| draw_error(&path, e))?;
    written.push(path);

    if run.landscape.masses.len() < 2 || run.landscape.widths.len() < 2 {
        log::warn!("chi-squared grid has fewer than 2 steps per axis; skipping landscape charts");
        return Ok(written);
    }

    let path = dir.join("chi2_contour.svg");
    draw_contour(&path, &run.landscape, &staged.final_fit.params)
        .map_err(|e| draw_error(&path, e))?;
    written.push(path);

    let path = dir.join("chi2_surface.svg");
    draw_surface(&path, &run.landscape).map_err(|e| draw_error(&path, e))?;
    written.push(path);

    for p in &written {
        log::info!("wrote {}", p.display());
    }
    Ok(written)
}

fn draw_error(path: &Path, err: Box<dyn Error>) -> AppError {
    AppError::new(2, format!("Failed to draw '{}': {err}", path.display()))
}

fn draw_fit_chart(
    path: &Path,
    title: &str,
    data: &Dataset,
    params: &ResonanceParams,
    curve_label: &str,
) -> DrawResult {
    let (e_min, e_max) = data
        .energy_range()
        .filter(|(lo, hi)| hi > lo)
        .unwrap_or((params.mass - 5.0, params.mass + 5.0));
    let e_pad = 0.02 * (e_max - e_min);
    let (x0, x1) = (e_min - e_pad, e_max + e_pad);

    let curve: Vec<(f64, f64)> = (0..CURVE_POINTS)
        .map(|i| {
            let e = x0 + (x1 - x0) * i as f64 / (CURVE_POINTS as f64 - 1.0);
            (e, predict_with(e, params))
        })
        .collect();

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for m in data {
        y_min = y_min.min(m.cross_section - ERROR_BAR_SIGMAS * m.uncertainty);
        y_max = y_max.max(m.cross_section + ERROR_BAR_SIGMAS * m.uncertainty);
    }
    for &(_, y) in &curve {
        if y.is_finite() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !(y_min.is_finite() && y_max.is_finite()) || y_max <= y_min {
        (y_min, y_max) = (0.0, 1.0);
    }
    let y_pad = 0.05 * (y_max - y_min);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, (y_min - y_pad)..(y_max + y_pad))?;

    chart
        .configure_mesh()
        .x_desc("Centre-of-mass energy (GeV)")
        .y_desc("Cross-section (nb)")
        .draw()?;

    chart
        .draw_series(data.iter().map(|m| {
            let d = ERROR_BAR_SIGMAS * m.uncertainty;
            ErrorBar::new_vertical(
                m.energy,
                m.cross_section - d,
                m.cross_section,
                m.cross_section + d,
                BLACK.mix(0.6).filled(),
                6,
            )
        }))?
        .label(format!("data ({}σ error bars)", ERROR_BAR_SIGMAS))
        .legend(|(x, y)| PathElement::new(vec![(x + 10, y - 6), (x + 10, y + 6)], BLACK));

    chart
        .draw_series(LineSeries::new(curve, RED.stroke_width(2)))?
        .label(format!(
            "{curve_label}: M = {:.4} GeV, Γ = {:.4} GeV",
            params.mass, params.width
        ))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Index of the contour band containing `v`.
fn band_index(v: f64) -> usize {
    CONTOUR_LEVELS.iter().filter(|&&l| v >= l).count().saturating_sub(1)
}

fn band_color(v: f64) -> RGBColor {
    if v.is_finite() { BAND_COLORS[band_index(v)] } else { MISSING_COLOR }
}

fn band_label(idx: usize) -> String {
    match CONTOUR_LEVELS.get(idx + 1) {
        Some(hi) => format!("{} – {}", CONTOUR_LEVELS[idx], hi),
        None => format!("≥ {}", CONTOUR_LEVELS[idx]),
    }
}

fn draw_contour(path: &Path, land: &ChiSquaredLandscape, fitted: &ResonanceParams) -> DrawResult {
    let dm = land.masses[1] - land.masses[0];
    let dw = land.widths[1] - land.widths[0];
    let (m0, m1) = (land.masses[0] - dm / 2.0, land.masses[land.masses.len() - 1] + dm / 2.0);
    let (w0, w1) = (land.widths[0] - dw / 2.0, land.widths[land.widths.len() - 1] + dw / 2.0);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Reduced χ² around the best fit", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(m0..m1, w0..w1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("Mass (GeV)")
        .y_desc("Width (GeV)")
        .draw()?;

    chart.draw_series(land.values.iter().enumerate().flat_map(|(j, row)| {
        let w = land.widths[j];
        row.iter().enumerate().map(move |(i, &v)| {
            let m = land.masses[i];
            Rectangle::new(
                [(m - dm / 2.0, w - dw / 2.0), (m + dm / 2.0, w + dw / 2.0)],
                band_color(v).filled(),
            )
        })
    }))?;

    for (idx, color) in BAND_COLORS.iter().copied().enumerate() {
        chart
            .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
            .label(band_label(idx))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .draw_series(std::iter::once(Cross::new(
            (fitted.mass, fitted.width),
            8,
            WHITE.stroke_width(3),
        )))?
        .label(format!("fit: M = {:.4}, Γ = {:.4}", fitted.mass, fitted.width))
        .legend(|(x, y)| Cross::new((x + 6, y), 5, BLACK.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_surface(path: &Path, land: &ChiSquaredLandscape) -> DrawResult {
    let (lo, hi) = land.value_range().unwrap_or((0.0, 1.0));
    // Clip the surface at the top contour level so the valley stays readable.
    let top = CONTOUR_LEVELS[CONTOUR_LEVELS.len() - 1];
    let z_max = if hi > lo { hi.min(top.max(lo + 1.0)) } else { lo + 1.0 };

    let m0 = land.masses[0];
    let dm = land.masses[1] - m0;
    let w0 = land.widths[0];
    let dw = land.widths[1] - w0;
    let last_m = land.masses.len() - 1;
    let last_w = land.widths.len() - 1;

    // Surface callbacks receive axis values; map them back to grid cells.
    let cell = |m: f64, w: f64| {
        let i = (((m - m0) / dm).round().max(0.0) as usize).min(last_m);
        let j = (((w - w0) / dw).round().max(0.0) as usize).min(last_w);
        let v = land.values[j][i];
        if v.is_finite() { v.min(z_max) } else { z_max }
    };

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Reduced χ² surface", ("sans-serif", 22))
        .margin(20)
        .build_cartesian_3d(
            land.masses[0]..land.masses[last_m],
            lo.min(z_max)..z_max,
            land.widths[0]..land.widths[last_w],
        )?;

    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.4;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.1))
        .max_light_lines(3)
        .draw()?;

    chart.draw_series(
        SurfaceSeries::xoz(land.masses.iter().copied(), land.widths.iter().copied(), cell)
            .style_func(&|&v: &f64| band_color(v).mix(0.8).filled()),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_pipeline_with_data;
    use crate::data::sample::{SampleConfig, generate_sample};
    use crate::io::ingest::{FileSummary, IngestedData};

    #[test]
    fn bands_follow_contour_levels() {
        assert_eq!(band_index(0.2), 0);
        assert_eq!(band_index(1.0), 1);
        assert_eq!(band_index(1.7), 2);
        assert_eq!(band_index(6.5), 7);
        assert_eq!(band_index(40.0), 8);
        assert_eq!(band_label(0), "0 – 1");
        assert_eq!(band_label(8), "≥ 7");
        assert_eq!(band_color(f64::NAN), MISSING_COLOR);
    }

    #[test]
    fn writes_all_four_charts() {
        let sample = generate_sample(&SampleConfig {
            count: 30,
            seed: 4,
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
            grid_steps: 8,
            ..FitConfig::default()
        };
        let run = run_pipeline_with_data(&config, ingest).unwrap();

        let dir = std::env::temp_dir().join(format!("zfit_svg_{}", std::process::id()));
        let written = write_svg_charts(&dir, &run, &config).unwrap();
        let names: Vec<_> = written
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(
            names,
            vec!["initial_fit.svg", "final_fit.svg", "chi2_contour.svg", "chi2_surface.svg"]
        );
        for p in &written {
            let text = std::fs::read_to_string(p).unwrap();
            assert!(text.contains("<svg"), "{} is not an SVG", p.display());
        }

        let _ = std::fs::remove_dir_all(dir);
    }
}
