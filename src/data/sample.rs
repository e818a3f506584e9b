//! Synthetic Z line-shape samples.
//!
//! Each point is the model cross-section at a random energy plus Gaussian noise
//! whose standard deviation is the uncertainty written next to it. Optional
//! gross anomalies and malformed rows mimic real detector dumps so the whole
//! cleaning pipeline can be exercised end to end.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::Measurement;
use crate::error::AppError;
use crate::models::predict;

/// Header written to generated CSV files.
pub const CSV_HEADER: [&str; 3] = ["energy (GeV)", "cross section (nb)", "uncertainty (nb)"];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub count: usize,
    pub seed: u64,
    pub mass: f64,
    pub width: f64,
    pub energy_min: f64,
    pub energy_max: f64,
    /// Uncertainty as a fraction of the true cross-section.
    pub relative_uncertainty: f64,
    /// Constant added to every uncertainty (nb).
    pub uncertainty_floor: f64,
    /// Chance that a valid row is pushed far off the curve.
    pub anomaly_probability: f64,
    /// Size of that push in units of the row's uncertainty.
    pub anomaly_sigmas: f64,
    /// Chance that a row is written malformed (NaN, text, empty, non-positive).
    pub invalid_probability: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            count: 40,
            seed: 42,
            mass: 91.1876,
            width: 2.4952,
            energy_min: 86.0,
            energy_max: 96.0,
            relative_uncertainty: 0.05,
            uncertainty_floor: 0.02,
            anomaly_probability: 0.05,
            anomaly_sigmas: 50.0,
            invalid_probability: 0.05,
        }
    }
}

/// One generated row.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleRow {
    Clean(Measurement),
    /// Valid numbers, but far from the curve.
    Anomaly(Measurement),
    /// Raw fields the loader must drop.
    Invalid([String; 3]),
}

impl SampleRow {
    /// The parsed measurement, if the row is numerically valid.
    pub fn as_measurement(&self) -> Option<Measurement> {
        match self {
            SampleRow::Clean(m) | SampleRow::Anomaly(m) => Some(*m),
            SampleRow::Invalid(_) => None,
        }
    }

    fn fields(&self) -> [String; 3] {
        match self {
            SampleRow::Clean(m) | SampleRow::Anomaly(m) => [
                m.energy.to_string(),
                m.cross_section.to_string(),
                m.uncertainty.to_string(),
            ],
            SampleRow::Invalid(fields) => fields.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub rows: Vec<SampleRow>,
}

impl SampleData {
    pub fn count_clean(&self) -> usize {
        self.rows.iter().filter(|r| matches!(r, SampleRow::Clean(_))).count()
    }

    pub fn count_anomalies(&self) -> usize {
        self.rows.iter().filter(|r| matches!(r, SampleRow::Anomaly(_))).count()
    }

    pub fn count_invalid(&self) -> usize {
        self.rows.iter().filter(|r| matches!(r, SampleRow::Invalid(_))).count()
    }
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    let energies_finite = config.energy_min.is_finite() && config.energy_max.is_finite();
    if !(energies_finite && config.energy_max > config.energy_min) || config.energy_min <= 0.0 {
        return Err(AppError::new(2, "Invalid energy range for sample generation."));
    }
    if !(config.mass > 0.0 && config.width > 0.0) {
        return Err(AppError::new(2, "Sample mass and width must be > 0."));
    }
    if !(config.relative_uncertainty >= 0.0 && config.uncertainty_floor >= 0.0)
        || config.relative_uncertainty + config.uncertainty_floor <= 0.0
    {
        return Err(AppError::new(2, "Invalid uncertainty settings."));
    }
    let probability = 0.0..=1.0;
    if !probability.contains(&config.anomaly_probability)
        || !probability.contains(&config.invalid_probability)
    {
        return Err(AppError::new(2, "Invalid anomaly/invalid-row probability settings."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut rows = Vec::with_capacity(config.count);
    for _ in 0..config.count {
        let energy = rng.gen_range(config.energy_min..=config.energy_max);
        let truth = predict(energy, config.mass, config.width);
        let uncertainty = config.relative_uncertainty * truth + config.uncertainty_floor;
        let cross_section = truth + uncertainty * normal.sample(&mut rng);

        if rng.gen_bool(config.invalid_probability) {
            rows.push(SampleRow::Invalid(corrupt(&mut rng, energy, cross_section, uncertainty)));
            continue;
        }

        if rng.gen_bool(config.anomaly_probability) {
            let shifted = truth + config.anomaly_sigmas * uncertainty;
            rows.push(SampleRow::Anomaly(Measurement::new(energy, shifted, uncertainty)));
            continue;
        }

        // Noise can push a low-energy tail point below zero; the loader would
        // drop it, so keep it positive here and leave invalid rows to `corrupt`.
        let cross_section = if cross_section > 0.0 { cross_section } else { truth };
        rows.push(SampleRow::Clean(Measurement::new(energy, cross_section, uncertainty)));
    }

    Ok(SampleData { rows })
}

fn corrupt(rng: &mut StdRng, energy: f64, cross_section: f64, uncertainty: f64) -> [String; 3] {
    let mut fields = [energy.to_string(), cross_section.to_string(), uncertainty.to_string()];
    let column = rng.gen_range(0..3);
    fields[column] = match rng.gen_range(0..4) {
        0 => "nan".to_string(),
        1 => "fail".to_string(),
        2 => String::new(),
        _ => "-1".to_string(),
    };
    fields
}

/// Write the sample as two CSV files, alternating rows between them.
pub fn write_sample_csvs(
    sample: &SampleData,
    dir: &Path,
) -> Result<(PathBuf, PathBuf), AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::new(2, format!("Failed to create output dir '{}': {e}", dir.display()))
    })?;

    let path_a = dir.join("z_boson_data_1.csv");
    let path_b = dir.join("z_boson_data_2.csv");
    let mut writer_a = open_writer(&path_a)?;
    let mut writer_b = open_writer(&path_b)?;

    for (i, row) in sample.rows.iter().enumerate() {
        let writer = if i % 2 == 0 { &mut writer_a } else { &mut writer_b };
        writer
            .write_record(row.fields())
            .map_err(|e| AppError::new(2, format!("Failed to write sample row: {e}")))?;
    }

    for (writer, path) in [(writer_a, &path_a), (writer_b, &path_b)] {
        writer
            .into_inner()
            .map_err(|e| AppError::new(2, format!("Failed to flush '{}': {e}", path.display())))?;
    }

    Ok((path_a, path_b))
}

fn open_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sample() {
        let config = SampleConfig::default();
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a.rows, b.rows);

        let other = generate_sample(&SampleConfig { seed: 43, ..config }).unwrap();
        assert_ne!(a.rows, other.rows);
    }

    #[test]
    fn clean_rows_are_valid_and_in_range() {
        let config = SampleConfig {
            count: 200,
            anomaly_probability: 0.0,
            invalid_probability: 0.0,
            ..SampleConfig::default()
        };
        let sample = generate_sample(&config).unwrap();
        assert_eq!(sample.count_clean(), 200);
        for m in sample.rows.iter().filter_map(SampleRow::as_measurement) {
            assert!(m.is_valid());
            assert!((86.0..=96.0).contains(&m.energy));
        }
    }

    #[test]
    fn every_row_is_accounted_for() {
        let config = SampleConfig {
            count: 500,
            anomaly_probability: 0.1,
            invalid_probability: 0.1,
            ..SampleConfig::default()
        };
        let sample = generate_sample(&config).unwrap();
        assert_eq!(
            sample.count_clean() + sample.count_anomalies() + sample.count_invalid(),
            500
        );
        assert!(sample.count_anomalies() > 0);
        assert!(sample.count_invalid() > 0);
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(generate_sample(&SampleConfig { count: 0, ..SampleConfig::default() }).is_err());
        assert!(
            generate_sample(&SampleConfig {
                energy_min: 96.0,
                energy_max: 86.0,
                ..SampleConfig::default()
            })
            .is_err()
        );
        assert!(
            generate_sample(&SampleConfig {
                invalid_probability: 1.5,
                ..SampleConfig::default()
            })
            .is_err()
        );
    }
}
