//! Resident and measurement record ingest.
//!
//! The record store is the boundary between the loosely-typed tables of the
//! backing store and the typed records used everywhere else:
//!
//! - **Strict schema** for required fields (row rejected with a `RowError`)
//! - **Lenient optional fields**: malformed numbers become `None` ("N/A")
//! - **Aliases**: original column names (`nama_lengkap`, `berat_badan_kg`, ...)
//!   and their English equivalents are both accepted

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{MeasurementRecord, ResidentRecord, Sex};
use crate::error::AppError;

pub const RESIDENTS_FILE: &str = "residents.csv";
pub const MEASUREMENTS_FILE: &str = "measurements.csv";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Typed rows plus everything that was rejected on the way in.
#[derive(Debug, Clone)]
pub struct RecordBatch<T> {
    pub rows: Vec<T>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl<T> RecordBatch<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        let rows_read = rows.len();
        Self {
            rows,
            row_errors: Vec::new(),
            rows_read,
        }
    }
}

/// Source of resident and measurement records.
///
/// Constructed once by the caller and passed down; nothing in the crate
/// reaches for a global connection.
pub trait RecordStore {
    fn residents(&self) -> Result<RecordBatch<ResidentRecord>, AppError>;
    fn measurements(&self) -> Result<RecordBatch<MeasurementRecord>, AppError>;

    fn resident(&self, id: &str) -> Result<ResidentRecord, AppError> {
        self.residents()?
            .rows
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::new(3, format!("No resident with id '{id}'.")))
    }

    /// Measurements for one resident, oldest first.
    fn history(&self, resident_id: &str) -> Result<Vec<MeasurementRecord>, AppError> {
        let mut rows: Vec<MeasurementRecord> = self
            .measurements()?
            .rows
            .into_iter()
            .filter(|m| m.resident_id == resident_id)
            .collect();
        rows.sort_by_key(|m| m.date);
        Ok(rows)
    }
}

/// Records held in memory (fixtures, tests, embedding callers).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub residents: Vec<ResidentRecord>,
    pub measurements: Vec<MeasurementRecord>,
}

impl RecordStore for MemoryStore {
    fn residents(&self) -> Result<RecordBatch<ResidentRecord>, AppError> {
        Ok(RecordBatch::from_rows(self.residents.clone()))
    }

    fn measurements(&self) -> Result<RecordBatch<MeasurementRecord>, AppError> {
        Ok(RecordBatch::from_rows(self.measurements.clone()))
    }
}

/// Records read from `residents.csv` / `measurements.csv` in a directory.
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    dir: PathBuf,
}

impl CsvRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RecordStore for CsvRecordStore {
    fn residents(&self) -> Result<RecordBatch<ResidentRecord>, AppError> {
        let path = self.dir.join(RESIDENTS_FILE);
        let batch = read_batch(&path, &["id"], parse_resident)?;
        info!(
            path = %path.display(),
            rows = batch.rows.len(),
            rejected = batch.row_errors.len(),
            "loaded residents"
        );
        Ok(batch)
    }

    fn measurements(&self) -> Result<RecordBatch<MeasurementRecord>, AppError> {
        let path = self.dir.join(MEASUREMENTS_FILE);
        let batch = read_batch(&path, &["warga_id", "resident_id"], parse_measurement)?;
        info!(
            path = %path.display(),
            rows = batch.rows.len(),
            rejected = batch.row_errors.len(),
            "loaded measurements"
        );
        Ok(batch)
    }
}

type HeaderMap = HashMap<String, usize>;

fn read_batch<T>(
    path: &Path,
    id_columns: &[&str],
    parse: fn(&StringRecord, &HeaderMap) -> Result<T, String>,
) -> Result<RecordBatch<T>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read headers of '{}': {e}", path.display())))?
        .clone();
    let header_map = build_header_map(&headers);

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse(&record, &header_map) {
            Ok(row) => rows.push(row),
            Err(message) => {
                let id = get_optional(&record, &header_map, id_columns).map(str::to_string);
                debug!(path = %path.display(), line, "rejected row: {message}");
                row_errors.push(RowError { line, id, message });
            }
        }
    }

    Ok(RecordBatch {
        rows,
        row_errors,
        rows_read,
    })
}

fn parse_resident(record: &StringRecord, header_map: &HeaderMap) -> Result<ResidentRecord, String> {
    let id = get_required(record, header_map, &["id"])?.to_string();
    let birth_date = parse_date(get_required(record, header_map, &["tanggal_lahir", "birth_date"])?)?;
    let sex_raw = get_required(record, header_map, &["jenis_kelamin", "sex"])?;
    let sex = Sex::from_code(sex_raw).ok_or_else(|| format!("Invalid sex '{sex_raw}' (expected L or P)."))?;

    let resident = ResidentRecord {
        id,
        nik: get_optional(record, header_map, &["nik"]).unwrap_or_default().to_string(),
        full_name: get_optional(record, header_map, &["nama_lengkap", "full_name"])
            .unwrap_or_default()
            .to_string(),
        birth_date,
        sex,
        rt: get_optional(record, header_map, &["rt"]).unwrap_or_default().to_string(),
        block: get_optional(record, header_map, &["blok", "block"]).unwrap_or_default().to_string(),
        address: get_optional(record, header_map, &["alamat", "address"]).map(str::to_string),
        phone: get_optional(record, header_map, &["telepon", "phone"]).map(str::to_string),
    };
    resident.validate()?;
    Ok(resident)
}

fn parse_measurement(record: &StringRecord, header_map: &HeaderMap) -> Result<MeasurementRecord, String> {
    let resident_id = get_required(record, header_map, &["warga_id", "resident_id"])?.to_string();
    let date = parse_date(get_required(record, header_map, &["tanggal_pemeriksaan", "date"])?)?;

    let num = |names: &[&str]| parse_opt_f64(get_optional(record, header_map, names));

    Ok(MeasurementRecord {
        resident_id,
        date,
        weight_kg: num(&["berat_badan_kg", "weight_kg"]),
        height_cm: num(&["tinggi_badan_cm", "height_cm"]),
        head_circumference_cm: num(&["lingkar_kepala_cm", "head_circumference_cm"]),
        arm_circumference_cm: num(&["lingkar_lengan_cm", "arm_circumference_cm"]),
        waist_circumference_cm: num(&["lingkar_perut_cm", "waist_circumference_cm"]),
        systolic: num(&["tensi_sistolik", "systolic"]),
        diastolic: num(&["tensi_diastolik", "diastolic"]),
        blood_glucose: num(&["gula_darah", "blood_glucose"]),
        cholesterol: num(&["kolesterol", "cholesterol"]),
        notes: get_optional(record, header_map, &["catatan", "notes"]).map(str::to_string),
    })
}

fn build_header_map(headers: &StringRecord) -> HeaderMap {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn column_index(header_map: &HeaderMap, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| header_map.get(*name).copied())
}

fn get_required<'a>(record: &'a StringRecord, header_map: &HeaderMap, names: &[&str]) -> Result<&'a str, String> {
    let idx = column_index(header_map, names).ok_or_else(|| format!("Missing required column: `{}`", names[0]))?;
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{}`", names[0]))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HeaderMap, names: &[&str]) -> Option<&'a str> {
    let idx = column_index(header_map, names)?;
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // The hosted table stores ISO dates; exports from spreadsheets often use
    // day-first formats.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    // Timestamps ("2025-03-01T08:00:00") keep only their date part.
    let s = s.split(['T', ' ']).next().unwrap_or(s);
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn residents_reject_rows_missing_required_fields() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            RESIDENTS_FILE,
            "id,nik,nama_lengkap,tanggal_lahir,jenis_kelamin,rt,blok,alamat\n\
             w1,3201,Siti,2023-05-01,P,01,A,Jl. Mawar\n\
             w2,,Budi,2020-01-01,L,02,B,\n\
             w3,3203,Ani,not-a-date,P,01,C,\n\
             w4,3204,Dodi,2019-02-03,X,01,C,\n",
        );

        let batch = CsvRecordStore::new(dir.path()).residents().unwrap();
        assert_eq!(batch.rows_read, 4);
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].display_name(), "Siti (RT-01, BLOK-A)");
        assert_eq!(batch.rows[0].address.as_deref(), Some("Jl. Mawar"));

        let lines: Vec<usize> = batch.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert_eq!(batch.row_errors[0].id.as_deref(), Some("w2"));
        assert!(batch.row_errors[0].message.contains("nik"));
    }

    #[test]
    fn malformed_measurements_become_none() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            MEASUREMENTS_FILE,
            "warga_id,tanggal_pemeriksaan,berat_badan_kg,tinggi_badan_cm,gula_darah\n\
             w1,2024-05-01,abc,75.5,\n\
             w1,2024-04-01T09:30:00,9.1,74,0\n\
             ,2024-04-01,9.1,74,0\n",
        );

        let store = CsvRecordStore::new(dir.path());
        let batch = store.measurements().unwrap();
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.row_errors.len(), 1);
        assert_eq!(batch.rows[0].weight_kg, None);
        assert_eq!(batch.rows[0].height_cm, Some(75.5));

        let history = store.history("w1").unwrap();
        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(history[1].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvRecordStore::new(dir.path()).residents().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unknown_resident_is_reported() {
        let store = MemoryStore::default();
        let err = store.resident("nope").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
