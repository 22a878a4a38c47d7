//! Resolved runtime configuration.
//!
//! Values come from the command line, with `POSYANDU_*` environment variables
//! (optionally loaded from `.env`) as fallbacks; clap handles the precedence.

use std::path::PathBuf;

use crate::cli::GlobalArgs;
use crate::error::AppError;
use crate::io::records::CsvRecordStore;
use crate::io::reference::ReferenceLoader;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding `residents.csv` and `measurements.csv`.
    pub data_dir: PathBuf,
    /// Directory holding the WHO reference CSVs.
    pub reference_dir: PathBuf,
    pub verbose: u8,
}

impl AppConfig {
    pub fn from_args(args: &GlobalArgs) -> Self {
        Self {
            data_dir: args.data_dir.clone(),
            reference_dir: args.reference_dir.clone(),
            verbose: args.verbose,
        }
    }

    pub fn record_store(&self) -> Result<CsvRecordStore, AppError> {
        if !self.data_dir.is_dir() {
            return Err(AppError::new(
                2,
                format!(
                    "Data directory '{}' not found. Set --data-dir or POSYANDU_DATA_DIR.",
                    self.data_dir.display()
                ),
            ));
        }
        Ok(CsvRecordStore::new(&self.data_dir))
    }

    /// A missing reference directory is not an error here: each chart
    /// degrades to a placeholder instead.
    pub fn reference_loader(&self) -> ReferenceLoader {
        ReferenceLoader::new(&self.reference_dir)
    }

    /// Default `EnvFilter` directive for the configured verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "posyandu_kms=info",
            1 => "posyandu_kms=debug",
            _ => "posyandu_kms=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: PathBuf, verbose: u8) -> AppConfig {
        AppConfig {
            reference_dir: dir.join("who"),
            data_dir: dir,
            verbose,
        }
    }

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(config(PathBuf::from("."), 0).log_directive(), "posyandu_kms=info");
        assert_eq!(config(PathBuf::from("."), 1).log_directive(), "posyandu_kms=debug");
        assert_eq!(config(PathBuf::from("."), 3).log_directive(), "posyandu_kms=trace");
    }

    #[test]
    fn missing_data_dir_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("nope"), 0);
        assert_eq!(cfg.record_store().unwrap_err().exit_code(), 2);
        assert!(config(dir.path().to_path_buf(), 0).record_store().is_ok());
    }
}
