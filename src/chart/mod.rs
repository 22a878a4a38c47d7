//! SVG chart rendering (Plotters).
//!
//! Drawing functions are generic over the Plotters backend; the public entry
//! points render into an in-memory SVG string.

pub mod kms;
pub mod trend;

use plotters::prelude::*;

use crate::app::pipeline::{GrowthAssessment, KmsOutcome};
use crate::domain::{MeasurementRecord, ResidentRecord};
use crate::error::AppError;

pub const KMS_SIZE: (u32, u32) = (960, 640);
pub const TREND_SIZE: (u32, u32) = (1200, 800);
pub const PLACEHOLDER_SIZE: (u32, u32) = (960, 200);

/// Render a growth chart to SVG.
pub fn render_kms_svg(a: &GrowthAssessment) -> Result<String, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, KMS_SIZE).into_drawing_area();
        kms::draw_kms(root, a).map_err(|e| AppError::new(4, format!("Failed to render KMS chart: {e}")))?;
    }
    Ok(svg)
}

/// Render either the chart or the placeholder of a pipeline outcome.
pub fn render_kms_outcome_svg(outcome: &KmsOutcome) -> Result<String, AppError> {
    match outcome {
        KmsOutcome::Chart(a) => render_kms_svg(a),
        KmsOutcome::Placeholder { message } => render_placeholder_svg(message),
    }
}

/// Render the 2×2 vital-sign trend panel to SVG.
pub fn render_trend_svg(resident: &ResidentRecord, history: &[MeasurementRecord]) -> Result<String, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, TREND_SIZE).into_drawing_area();
        trend::draw_trends(root, resident, history)
            .map_err(|e| AppError::new(4, format!("Failed to render trend charts: {e}")))?;
    }
    Ok(svg)
}

/// A framed message in place of a chart.
pub fn render_placeholder_svg(message: &str) -> Result<String, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PLACEHOLDER_SIZE).into_drawing_area();
        draw_placeholder(&root, message)
            .map_err(|e| AppError::new(4, format!("Failed to render placeholder: {e}")))?;
    }
    Ok(svg)
}

fn draw_placeholder<DB>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = root.dim_in_pixel();
    root.fill(&RGBColor(248, 248, 248))?;
    root.draw(&Rectangle::new(
        [(10, 10), (w as i32 - 10, h as i32 - 10)],
        RGBColor(180, 180, 180).stroke_width(2),
    ))?;
    root.draw(&Text::new(
        message.to_string(),
        (30, h as i32 / 2 - 8),
        ("sans-serif", 18).into_font().color(&RGBColor(90, 90, 90)),
    ))?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::assess_growth;
    use crate::app::pipeline::tests::{boy_born_2024, weighing};
    use crate::domain::GrowthIndicator;
    use crate::io::reference::ReferenceLoader;
    use crate::io::reference::tests::write_wfa_boys_0_2;

    #[test]
    fn kms_svg_contains_status_and_latest_date() {
        let dir = tempfile::tempdir().unwrap();
        write_wfa_boys_0_2(dir.path());
        let mut loader = ReferenceLoader::new(dir.path());
        let history = vec![weighing((2024, 7, 1), 7.9), weighing((2025, 1, 1), 9.6)];
        let outcome = assess_growth(&mut loader, &boy_born_2024(), &history, GrowthIndicator::WeightForAge);

        let svg = render_kms_outcome_svg(&outcome).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Status: normal"));
        assert!(svg.contains("2025-01-01"));
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn placeholder_svg_contains_message() {
        let outcome = KmsOutcome::placeholder("Data not available: no weight recorded");
        let svg = render_kms_outcome_svg(&outcome).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Data not available: no weight recorded"));
    }

    #[test]
    fn trend_svg_renders_all_panels() {
        let history = vec![
            weighing((2024, 7, 1), 7.9),
            crate::domain::MeasurementRecord {
                systolic: Some(100.0),
                diastolic: Some(65.0),
                ..weighing((2025, 1, 1), 9.6)
            },
        ];
        let svg = render_trend_svg(&boy_born_2024(), &history).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Blood pressure"));
        assert!(svg.contains("Cholesterol: no data"));
    }
}
