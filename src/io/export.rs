//! Export dashboard rows to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::report::{AttendanceRow, Dashboard};

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    session_date: String,
    status: &'static str,
    resident_id: &'a str,
    name: String,
    sex: &'static str,
    rt: &'a str,
    blok: &'a str,
    age_years: String,
    age_category: &'static str,
    weight_kg: Option<f64>,
    height_cm: Option<f64>,
    systolic: Option<f64>,
    diastolic: Option<f64>,
    blood_glucose: Option<f64>,
    cholesterol: Option<f64>,
    growth_status: Option<&'a str>,
}

/// Write one row per present and absent resident.
pub fn write_dashboard_csv(path: &Path, dashboard: &Dashboard) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let present = dashboard.present.iter().map(|r| ("present", r));
    let absent = dashboard.absent.iter().map(|r| ("absent", r));
    for (status, row) in present.chain(absent) {
        writer
            .serialize(export_row(dashboard, status, row))
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))?;
    Ok(())
}

fn export_row<'a>(dashboard: &Dashboard, status: &'static str, row: &'a AttendanceRow) -> ExportRow<'a> {
    let r = &row.resident;
    let m = row.measurement.as_ref();
    // Zero means "not measured" throughout; leave the cell empty.
    let value = |f: fn(&crate::domain::MeasurementRecord) -> Option<f64>| {
        m.and_then(f).filter(|v| v.is_finite() && *v > 0.0)
    };

    ExportRow {
        session_date: dashboard.date.to_string(),
        status,
        resident_id: &r.id,
        name: r.display_name(),
        sex: r.sex.code(),
        rt: &r.rt,
        blok: &r.block,
        age_years: format!("{:.2}", row.age_years),
        age_category: row.category.label(),
        weight_kg: value(|m| m.weight_kg),
        height_cm: value(|m| m.height_cm),
        systolic: value(|m| m.systolic),
        diastolic: value(|m| m.diastolic),
        blood_glucose: value(|m| m.blood_glucose),
        cholesterol: value(|m| m.cholesterol),
        growth_status: row.growth_status.as_deref(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{MeasurementRecord, Sex};
    use crate::report::{AgeCategory, SexSplit};
    use crate::report::tests::resident;

    #[test]
    fn writes_present_then_absent_rows() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let born = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let row = |id: &str, name: &str, m: Option<MeasurementRecord>| AttendanceRow {
            resident: resident(id, name, born, Sex::Male, "01"),
            age_years: 35.16,
            category: AgeCategory::Adult,
            growth_status: m.as_ref().map(|_| "N/A".to_string()),
            measurement: m,
        };
        let dashboard = Dashboard {
            date,
            total_residents: 2,
            visits: 1,
            participation_pct: 50.0,
            category_counts: Vec::new(),
            residents_by_sex: SexSplit { male: 2, female: 0 },
            visitors_by_sex: SexSplit { male: 1, female: 0 },
            visit_trend: vec![(date, 1)],
            present: vec![row(
                "1",
                "Budi",
                Some(MeasurementRecord {
                    weight_kg: Some(70.5),
                    cholesterol: Some(0.0),
                    ..MeasurementRecord::empty("1", date)
                }),
            )],
            absent: vec![row("2", "Eko", None)],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.csv");
        write_dashboard_csv(&path, &dashboard).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("session_date,status,resident_id,name"));
        assert!(lines[1].starts_with("2025-03-01,present,1,\"Budi (RT-01, BLOK-A)\",L,01,A,35.16"));
        assert!(lines[1].contains(",70.5,"));
        assert!(lines[2].starts_with("2025-03-01,absent,2,"));
    }
}
