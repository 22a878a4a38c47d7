//! WHO reference table loading.
//!
//! One CSV per indicator × sex × age band (see
//! `GrowthIndicator::reference_path`). Each file has an x column and the seven
//! SD columns; header names are matched case-insensitively.
//!
//! Loading is memoized per file path for the lifetime of the loader. Reference
//! data never changes while the process runs, so there is no invalidation.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{AgeBand, GrowthIndicator, ReferenceRow, ReferenceTable, SdBand, Sex};
use crate::error::GrowthError;
use crate::fit::MIN_REFERENCE_ROWS;

/// Header names accepted for the x column, in priority order.
const X_COLUMNS: [&str; 7] = ["x", "month", "months", "age", "length", "height", "lengthheight"];

/// Reads and memoizes reference tables from a directory.
#[derive(Debug)]
pub struct ReferenceLoader {
    dir: PathBuf,
    cache: HashMap<PathBuf, Arc<ReferenceTable>>,
}

impl ReferenceLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing one indicator × sex × band.
    pub fn path_for(&self, indicator: GrowthIndicator, sex: Sex, band: &AgeBand) -> PathBuf {
        indicator.reference_path(&self.dir, sex, band)
    }

    /// Load (or reuse) the table for one indicator × sex × band.
    ///
    /// Failures are returned, not cached: a file added later is picked up on
    /// the next call.
    pub fn load(
        &mut self,
        indicator: GrowthIndicator,
        sex: Sex,
        band: &'static AgeBand,
    ) -> Result<Arc<ReferenceTable>, GrowthError> {
        let path = self.path_for(indicator, sex, band);
        if let Some(table) = self.cache.get(&path) {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(read_reference_table(&path, indicator, sex, band)?);
        self.cache.insert(path, Arc::clone(&table));
        Ok(table)
    }

    /// Number of memoized tables.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Read and normalize one reference CSV (no memoization).
pub fn read_reference_table(
    path: &Path,
    indicator: GrowthIndicator,
    sex: Sex,
    band: &'static AgeBand,
) -> Result<ReferenceTable, GrowthError> {
    if !path.is_file() {
        return Err(GrowthError::MissingReference {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| GrowthError::ReadReference {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| GrowthError::ReadReference {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let header_map = build_header_map(&headers);

    let x_idx = X_COLUMNS
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .unwrap_or(0);

    let mut sd_idx = [0usize; 7];
    for band_col in SdBand::ALL {
        let key = band_col.column().to_ascii_lowercase();
        sd_idx[band_col.index()] = *header_map.get(&key).ok_or_else(|| GrowthError::MissingColumn {
            path: path.to_path_buf(),
            column: band_col.column().to_string(),
        })?;
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (idx, result) in reader.records().enumerate() {
        // +2: header line plus 1-based numbering.
        let line = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), line, "skipping unreadable reference row: {e}");
                skipped += 1;
                continue;
            }
        };

        match parse_row(&record, x_idx, &sd_idx) {
            Some(row) => rows.push(row),
            None => {
                debug!(path = %path.display(), line, "skipping non-numeric reference row");
                skipped += 1;
            }
        }
    }

    let table = ReferenceTable::new(indicator, sex, band, path.to_path_buf(), rows);
    if table.len() < MIN_REFERENCE_ROWS {
        return Err(GrowthError::InsufficientReference {
            path: path.to_path_buf(),
            rows: table.len(),
            needed: MIN_REFERENCE_ROWS,
        });
    }

    debug!(
        path = %path.display(),
        rows = table.len(),
        skipped,
        "loaded reference table"
    );
    Ok(table)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, x_idx: usize, sd_idx: &[usize; 7]) -> Option<ReferenceRow> {
    let x = parse_f64(record.get(x_idx)?)?;
    let mut sd = [0.0; 7];
    for (slot, &idx) in sd.iter_mut().zip(sd_idx.iter()) {
        *slot = parse_f64(record.get(idx)?)?;
    }
    Some(ReferenceRow { x, sd })
}

fn parse_f64(s: &str) -> Option<f64> {
    // Some regional exports use a decimal comma.
    let v = s.trim().replace(',', ".").parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use super::*;

    /// Write a weight-for-age boys 0-2 table into `dir`.
    pub(crate) fn write_wfa_boys_0_2(dir: &Path) -> PathBuf {
        let band = &GrowthIndicator::WeightForAge.bands()[0];
        let path = GrowthIndicator::WeightForAge.reference_path(dir, Sex::Male, band);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Month,SD3neg,SD2neg,SD1neg,SD0,SD1,SD2,SD3").unwrap();
        for m in 0..=24 {
            let x = m as f64;
            let median = 3.3 + 4.2 * (1.0 - (-x / 6.0).exp()) + 0.2 * x;
            let sd = 0.11 * median;
            let cols: Vec<String> = (-3..=3).map(|z| format!("{:.4}", median + z as f64 * sd)).collect();
            writeln!(file, "{m},{}", cols.join(",")).unwrap();
        }
        path
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ReferenceLoader::new(dir.path());
        let band = GrowthIndicator::WeightForAge.route_band(6.0);
        let err = loader.load(GrowthIndicator::WeightForAge, Sex::Male, band).unwrap_err();
        assert!(matches!(err, GrowthError::MissingReference { .. }));
        assert_eq!(loader.cached(), 0);
    }

    #[test]
    fn load_parses_and_memoizes_by_path() {
        let dir = tempfile::tempdir().unwrap();
        write_wfa_boys_0_2(dir.path());
        let mut loader = ReferenceLoader::new(dir.path());
        let band = GrowthIndicator::WeightForAge.route_band(6.0);

        let a = loader.load(GrowthIndicator::WeightForAge, Sex::Male, band).unwrap();
        let b = loader.load(GrowthIndicator::WeightForAge, Sex::Male, band).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(loader.cached(), 1);
        assert_eq!(a.len(), 25);
        assert_eq!(a.x_range(), Some((0.0, 24.0)));
    }

    #[test]
    fn unsorted_duplicate_and_bad_rows_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "\u{feff}Length,sd3neg,sd2neg,sd1neg,sd0,sd1,sd2,sd3").unwrap();
        for x in [50, 48, 46, 45, 47, 49] {
            writeln!(file, "{x},1,2,3,4,5,6,7").unwrap();
        }
        writeln!(file, "47,9,9,9,9,9,9,9").unwrap();
        writeln!(file, "51,1,2,n/a,4,5,6,7").unwrap();

        let band = &GrowthIndicator::WeightForHeight.bands()[0];
        let table = read_reference_table(&path, GrowthIndicator::WeightForHeight, Sex::Female, band).unwrap();
        assert_eq!(table.xs(), vec![45.0, 46.0, 47.0, 48.0, 49.0, 50.0]);
        assert_eq!(table.rows()[2].get(SdBand::Sd0), 4.0);
    }

    #[test]
    fn missing_sd_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Month,SD3neg,SD2neg,SD1neg,SD0,SD1,SD2").unwrap();

        let band = &GrowthIndicator::WeightForAge.bands()[0];
        let err = read_reference_table(&path, GrowthIndicator::WeightForAge, Sex::Male, band).unwrap_err();
        match err {
            GrowthError::MissingColumn { column, .. } => assert_eq!(column, "SD3"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
