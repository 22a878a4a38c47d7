//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of one KMS chart:
//! - indicator, sex, age band and reference file it was fitted from
//! - a precomputed grid of the seven fitted bands for quick plotting
//! - the resident's trajectory and the latest classification
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::app::pipeline::GrowthAssessment;
use crate::domain::{CurveFile, CurveGrid, LatestPoint, SdBand};
use crate::error::AppError;
use crate::fit::FittedCurveSet;

/// Number of grid points written per band.
pub const GRID_POINTS: usize = 101;

/// Build the serializable curve file for an assessment.
pub fn curve_file(assessment: &GrowthAssessment) -> CurveFile {
    let latest = &assessment.latest;
    CurveFile {
        tool: "posyandu".to_string(),
        indicator: assessment.indicator,
        sex: assessment.sex,
        band: assessment.band.id.to_string(),
        source: assessment.table.source.display().to_string(),
        x_axis: assessment.indicator.x_axis(),
        y_unit: assessment.indicator.y_unit().to_string(),
        grid: build_grid(&assessment.curves, GRID_POINTS),
        trajectory: assessment.trajectory.clone(),
        latest: Some(LatestPoint {
            x: latest.observation.x,
            value: latest.observation.value,
            classification: latest.classification,
        }),
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;

    if curve.grid.bands.len() != SdBand::ALL.len()
        || curve.grid.bands.iter().any(|b| b.len() != curve.grid.x.len())
    {
        return Err(AppError::new(
            2,
            format!("Invalid curve JSON '{}': grid must hold 7 bands matching x.", path.display()),
        ));
    }
    Ok(curve)
}

fn build_grid(curves: &FittedCurveSet, n: usize) -> CurveGrid {
    let n = n.max(2);
    let (x0, x1) = (curves.x_min, curves.x_max);

    let x: Vec<f64> = (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            x0 + u * (x1 - x0)
        })
        .collect();

    let bands = SdBand::ALL
        .iter()
        .map(|&band| x.iter().map(|&xi| curves.eval(band, xi)).collect())
        .collect();

    CurveGrid { x, bands }
}
