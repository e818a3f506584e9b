use std::path::PathBuf;

use thiserror::Error;

/// Failures of the fitting core.
///
/// Row-level data problems are not errors: the loader drops those rows and
/// moves on. Everything here is fatal for the run.
#[derive(Debug, Clone, Error)]
pub enum FitError {
    /// Input file missing, unreadable, or not a three-column table.
    #[error("cannot read '{}': {reason}", path.display())]
    FileFormat { path: PathBuf, reason: String },

    /// A stage was left with fewer points than free parameters.
    #[error("{stage}: only {remaining} measurement(s) left, need at least {required} to fit")]
    DataExhaustion {
        stage: &'static str,
        remaining: usize,
        required: usize,
    },

    /// The optimizer gave up (evaluation budget, singular system, non-finite objective).
    #[error("{stage}: fit did not converge ({reason})")]
    FitConvergence { stage: &'static str, reason: String },
}

impl FitError {
    /// Process exit code used by the CLI for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::FileFormat { .. } => 2,
            FitError::DataExhaustion { .. } => 3,
            FitError::FitConvergence { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_errors_map_to_distinct_exit_codes() {
        let file = FitError::FileFormat {
            path: PathBuf::from("a.csv"),
            reason: "missing".to_string(),
        };
        let exhausted = FitError::DataExhaustion {
            stage: "final fit",
            remaining: 1,
            required: 2,
        };
        let diverged = FitError::FitConvergence {
            stage: "coarse fit",
            reason: "budget".to_string(),
        };

        assert_eq!(AppError::from(file).exit_code(), 2);
        assert_eq!(AppError::from(exhausted.clone()).exit_code(), 3);
        assert_eq!(AppError::from(diverged).exit_code(), 4);
        assert_eq!(
            exhausted.to_string(),
            "final fit: only 1 measurement(s) left, need at least 2 to fit"
        );
    }
}
