use std::path::PathBuf;

use thiserror::Error;

use crate::domain::SdBand;

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

/// Failures of the growth-standard fragment (loading, fitting, classifying).
///
/// None of these are fatal to a report: the pipeline turns them into a
/// placeholder chart and keeps going.
#[derive(Debug, Error)]
pub enum GrowthError {
    #[error("reference file not found: {}", path.display())]
    MissingReference { path: PathBuf },

    #[error("failed to read reference file '{}': {source}", path.display())]
    ReadReference {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("reference file '{}' has no `{column}` column", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("reference file '{}' has {rows} usable rows, need at least {needed}", path.display())]
    InsufficientReference {
        path: PathBuf,
        rows: usize,
        needed: usize,
    },

    #[error("least-squares fit failed for band {band}")]
    FitFailed { band: SdBand },

    #[error("data not available: no {what} recorded")]
    NoMeasurement { what: &'static str },

    #[error("no measurement history for this resident")]
    EmptyHistory,

    #[error("measurement on {date} predates the birth date")]
    BeforeBirth { date: chrono::NaiveDate },
}

impl GrowthError {
    pub fn exit_code(&self) -> u8 {
        match self {
            GrowthError::MissingReference { .. }
            | GrowthError::ReadReference { .. }
            | GrowthError::MissingColumn { .. } => 2,
            GrowthError::InsufficientReference { .. }
            | GrowthError::NoMeasurement { .. }
            | GrowthError::EmptyHistory
            | GrowthError::BeforeBirth { .. } => 3,
            GrowthError::FitFailed { .. } => 4,
        }
    }
}

impl From<GrowthError> for AppError {
    fn from(err: GrowthError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_errors_map_to_exit_codes() {
        let missing = GrowthError::MissingReference {
            path: PathBuf::from("who/wfa_boys_0_2.csv"),
        };
        let app: AppError = missing.into();
        assert_eq!(app.exit_code(), 2);
        assert!(app.to_string().contains("wfa_boys_0_2.csv"));

        let app: AppError = GrowthError::EmptyHistory.into();
        assert_eq!(app.exit_code(), 3);
    }
}
