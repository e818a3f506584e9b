//! CSV ingest and validation.
//!
//! This module is responsible for turning the two raw detector dumps into a
//! single clean, energy-sorted `Dataset` that is safe to fit.
//!
//! Design goals:
//! - **Strict file shape** (three columns, clear error otherwise)
//! - **Row-level tolerance** (drop bad rows silently, but count what happened)
//! - **Deterministic behavior** (stable sort, no hidden state)
//! - **Separation of concerns**: no fitting logic here

use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Dataset, Measurement};
use crate::error::FitError;

/// Columns every input file must provide: energy, cross-section, uncertainty.
const REQUIRED_COLUMNS: usize = 3;

/// What happened to the rows of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub path: String,
    pub rows_read: usize,
    /// Missing or non-numeric field (or a record the CSV reader could not split).
    pub rows_dropped_nan: usize,
    /// Numeric, but some field non-finite or ≤ 0.
    pub rows_dropped_non_positive: usize,
}

impl FileSummary {
    pub fn rows_used(&self) -> usize {
        self.rows_read - self.rows_dropped_nan - self.rows_dropped_non_positive
    }
}

/// Loader output: the combined dataset plus per-file bookkeeping.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub files: Vec<FileSummary>,
}

impl IngestedData {
    pub fn rows_read(&self) -> usize {
        self.files.iter().map(|f| f.rows_read).sum()
    }

    pub fn rows_dropped(&self) -> usize {
        self.rows_read() - self.dataset.len()
    }
}

/// Outcome of parsing one row.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RowOutcome {
    Valid(Measurement),
    NotANumber,
    NonPositive,
}

/// Load both files, drop invalid rows, concatenate, and sort by energy.
pub fn load_measurements(path_a: &Path, path_b: &Path) -> Result<IngestedData, FitError> {
    let (rows_a, summary_a) = load_file(path_a)?;
    let (rows_b, summary_b) = load_file(path_b)?;

    let mut rows = rows_a;
    rows.extend(rows_b);
    let dataset = Dataset::sorted_by_energy(rows);

    for s in [&summary_a, &summary_b] {
        log::info!(
            "{}: read {} rows, kept {}, dropped {} non-numeric and {} non-positive",
            s.path,
            s.rows_read,
            s.rows_used(),
            s.rows_dropped_nan,
            s.rows_dropped_non_positive
        );
    }

    Ok(IngestedData {
        dataset,
        files: vec![summary_a, summary_b],
    })
}

/// Read one three-column file, skipping its header row.
pub fn load_file(path: &Path) -> Result<(Vec<Measurement>, FileSummary), FitError> {
    let file_error = |reason: String| FitError::FileFormat {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| file_error(format!("failed to open: {e}")))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| file_error(format!("failed to read header row: {e}")))?
        .clone();
    if headers.len() < REQUIRED_COLUMNS {
        return Err(file_error(format!(
            "expected {REQUIRED_COLUMNS} columns (energy, cross-section, uncertainty), \
             header has {}",
            headers.len()
        )));
    }

    let mut summary = FileSummary {
        path: path.display().to_string(),
        ..FileSummary::default()
    };
    let mut rows = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        summary.rows_read += 1;

        let outcome = match result {
            Ok(record) => parse_row(&record),
            Err(e) if e.is_io_error() => {
                return Err(file_error(format!("read error at line {line}: {e}")));
            }
            Err(e) => {
                log::debug!("{}:{line}: unparseable record ({e})", summary.path);
                RowOutcome::NotANumber
            }
        };

        match outcome {
            RowOutcome::Valid(m) => rows.push(m),
            RowOutcome::NotANumber => {
                log::debug!("{}:{line}: dropped (missing or non-numeric field)", summary.path);
                summary.rows_dropped_nan += 1;
            }
            RowOutcome::NonPositive => {
                log::debug!("{}:{line}: dropped (non-positive value)", summary.path);
                summary.rows_dropped_non_positive += 1;
            }
        }
    }

    Ok((rows, summary))
}

fn parse_row(record: &StringRecord) -> RowOutcome {
    let mut values = [0.0_f64; REQUIRED_COLUMNS];
    for (col, slot) in values.iter_mut().enumerate() {
        match parse_field(record.get(col)) {
            Some(v) => *slot = v,
            None => return RowOutcome::NotANumber,
        }
    }

    let m = Measurement::new(values[0], values[1], values[2]);
    if m.is_valid() {
        RowOutcome::Valid(m)
    } else {
        RowOutcome::NonPositive
    }
}

/// Parse a numeric field; missing, empty, non-numeric and NaN all give `None`.
fn parse_field(s: Option<&str>) -> Option<f64> {
    let s = s?;
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_nan() { None } else { Some(v) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_csv(name: &str, contents: &str) -> PathBuf {
        let file = format!("zfit_ingest_{}_{name}.csv", std::process::id());
        let path = std::env::temp_dir().join(file);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parse_field_rejects_nan_and_text() {
        assert_eq!(parse_field(Some("91.2")), Some(91.2));
        assert_eq!(parse_field(Some("-1")), Some(-1.0));
        assert_eq!(parse_field(Some("nan")), None);
        assert_eq!(parse_field(Some("fail")), None);
        assert_eq!(parse_field(Some("")), None);
        assert_eq!(parse_field(None), None);
    }

    #[test]
    fn drops_invalid_rows_and_sorts_combined_output() {
        let a = temp_csv(
            "drops_a",
            "energy,cross,unc\n\
             91.0,2.0,0.1\n\
             nan,1.0,0.1\n\
             88.0,0.5,0.05\n\
             90.0,,0.1\n\
             89.0,-0.3,0.05\n\
             93.0,1.0,0\n",
        );
        let b = temp_csv(
            "drops_b",
            "energy,cross,unc\n\
             87.0,0.3,0.04\n\
             92.0,fail,0.1\n\
             94.0,0.8\n\
             95.0,0.6,0.05\n",
        );

        let ingest = load_measurements(&a, &b).unwrap();
        assert_eq!(ingest.dataset.energies(), vec![87.0, 88.0, 91.0, 95.0]);
        assert!(ingest.dataset.iter().all(Measurement::is_valid));

        assert_eq!(ingest.files[0].rows_read, 6);
        assert_eq!(ingest.files[0].rows_dropped_nan, 2);
        assert_eq!(ingest.files[0].rows_dropped_non_positive, 2);
        assert_eq!(ingest.files[1].rows_read, 4);
        assert_eq!(ingest.files[1].rows_dropped_nan, 2);
        assert_eq!(ingest.rows_dropped(), 6);

        let _ = std::fs::remove_file(a);
        let _ = std::fs::remove_file(b);
    }

    #[test]
    fn non_overlapping_files_merge_in_order() {
        // Second file holds the low energies, so concatenation alone is unsorted.
        let a = temp_csv("merge_a", "e,s,u\n92.0,1.5,0.1\n93.0,1.0,0.1\n94.0,0.7,0.1\n");
        let b = temp_csv("merge_b", "e,s,u\n86.0,0.2,0.1\n87.0,0.3,0.1\n88.0,0.5,0.1\n");

        let ingest = load_measurements(&a, &b).unwrap();
        let energies = ingest.dataset.energies();
        assert_eq!(energies, vec![86.0, 87.0, 88.0, 92.0, 93.0, 94.0]);
        assert!(energies.windows(2).all(|w| w[0] <= w[1]));

        let _ = std::fs::remove_file(a);
        let _ = std::fs::remove_file(b);
    }

    #[test]
    fn missing_file_is_file_format_error() {
        let ok = temp_csv("missing_ok", "e,s,u\n91.0,2.0,0.1\n");
        let missing = std::env::temp_dir().join("zfit_definitely_missing_input.csv");
        let err = load_measurements(&ok, &missing).unwrap_err();
        assert!(matches!(err, FitError::FileFormat { .. }), "{err}");
        let _ = std::fs::remove_file(ok);
    }

    #[test]
    fn two_column_file_is_file_format_error() {
        let narrow = temp_csv("narrow", "e,s\n91.0,2.0\n");
        let err = load_file(&narrow).unwrap_err();
        match err {
            FitError::FileFormat { reason, .. } => {
                assert!(reason.contains("expected 3 columns"), "{reason}")
            }
            other => panic!("unexpected error: {other}"),
        }
        let _ = std::fs::remove_file(narrow);
    }

    #[test]
    fn generated_sample_loads_back() {
        use crate::data::sample::{SampleConfig, generate_sample, write_sample_csvs};

        let sample = generate_sample(&SampleConfig {
            count: 60,
            anomaly_probability: 0.1,
            invalid_probability: 0.2,
            ..SampleConfig::default()
        })
        .unwrap();
        let dir =
            std::env::temp_dir().join(format!("zfit_ingest_roundtrip_{}", std::process::id()));
        let (a, b) = write_sample_csvs(&sample, &dir).unwrap();

        let ingest = load_measurements(&a, &b).unwrap();
        assert_eq!(ingest.rows_read(), 60);
        assert_eq!(ingest.dataset.len(), sample.count_clean() + sample.count_anomalies());
        assert!(ingest.dataset.iter().all(Measurement::is_valid));

        let _ = std::fs::remove_dir_all(dir);
    }
}
