//! KMS (Kartu Menuju Sehat) growth chart rendered with Plotters.
//!
//! Layers, bottom to top:
//! 1. shaded zones between adjacent SD columns of the reference table
//! 2. the seven fitted band curves
//! 3. the resident's trajectory
//! 4. the latest point in its severity colour, plus an annotation box

use std::error::Error;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::app::pipeline::GrowthAssessment;
use crate::domain::{ReferenceTable, SdBand};

/// Samples per fitted band line.
const CURVE_SAMPLES: usize = 200;

pub(crate) fn draw_kms<DB>(root: DrawingArea<DB, Shift>, a: &GrowthAssessment) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (x0, x1) = a.band.x_range;
    let (y0, y1) = y_window(a);

    let caption = format!(
        "{} - {} ({}, {})",
        a.indicator.display_name(),
        a.resident_name,
        a.sex.display_name(),
        a.band.label
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20).into_font())
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc(a.indicator.x_axis().label())
        .y_desc(format!("{} ({})", a.indicator.display_name(), a.indicator.y_unit()))
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .light_line_style(RGBColor(235, 235, 235))
        .draw()?;

    // 1) Shaded zones from the raw reference rows.
    for (lower, upper) in SdBand::ALL.iter().zip(SdBand::ALL.iter().skip(1)) {
        let outline = zone_outline(&a.table, *lower, *upper, (x0, x1));
        if outline.len() >= 3 {
            chart.draw_series(std::iter::once(Polygon::new(outline, zone_color(*lower).filled())))?;
        }
    }

    // 2) Fitted band lines.
    let (fx0, fx1) = (a.curves.x_min.max(x0), a.curves.x_max.min(x1));
    for band in SdBand::ALL {
        let style = band_style(band);
        chart
            .draw_series(LineSeries::new(a.curves.sample(band, fx0, fx1, CURVE_SAMPLES), style))?
            .label(band.column())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    // 3) Trajectory.
    let visible: Vec<(f64, f64)> = a.trajectory.iter().copied().filter(|(x, _)| *x >= x0 && *x <= x1).collect();
    let path_color = RGBColor(30, 60, 160);
    chart.draw_series(LineSeries::new(visible.iter().copied(), path_color.stroke_width(2)))?;
    chart.draw_series(visible.iter().map(|&p| Circle::new(p, 4, path_color.filled())))?;

    // 4) Latest point.
    let latest = &a.latest;
    let (r, g, b) = latest.classification.severity.rgb();
    let severity_color = RGBColor(r, g, b);
    let point = (latest.observation.x.clamp(x0, x1), latest.observation.value.clamp(y0, y1));
    chart.draw_series(std::iter::once(Circle::new(point, 7, severity_color.filled())))?;
    chart.draw_series(std::iter::once(Circle::new(point, 7, BLACK.stroke_width(1))))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.3))
        .position(SeriesLabelPosition::LowerRight)
        .draw()?;

    // Annotation box in pixel space, top-left of the plot.
    let lines = [
        format!("Latest check-up: {}", a.latest_date),
        format!(
            "{:.1} {} at {:.1} {}",
            latest.observation.value,
            a.indicator.y_unit(),
            latest.observation.x,
            x_unit(a)
        ),
        format!("Status: {}", latest.classification.label()),
    ];
    let origin = (95, 60);
    let box_size = (300, 22 * lines.len() as i32 + 12);
    root.draw(&Rectangle::new(
        [origin, (origin.0 + box_size.0, origin.1 + box_size.1)],
        severity_color.mix(0.2).filled(),
    ))?;
    root.draw(&Rectangle::new(
        [origin, (origin.0 + box_size.0, origin.1 + box_size.1)],
        severity_color.stroke_width(2),
    ))?;
    for (i, line) in lines.iter().enumerate() {
        root.draw(&Text::new(
            line.clone(),
            (origin.0 + 10, origin.1 + 8 + 22 * i as i32),
            ("sans-serif", 16).into_font().color(&BLACK),
        ))?;
    }

    root.present()?;
    Ok(())
}

/// Plot y-window: the band's fixed range, widened to keep the resident visible.
fn y_window(a: &GrowthAssessment) -> (f64, f64) {
    let (mut lo, mut hi) = a.band.y_range;
    let values = a.trajectory.iter().map(|p| p.1).chain(std::iter::once(a.latest.observation.value));
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v - 0.5);
        hi = hi.max(v + 0.5);
    }
    (lo, hi)
}

fn x_unit(a: &GrowthAssessment) -> &'static str {
    match a.indicator.x_axis() {
        crate::domain::XAxis::AgeMonths => "months",
        crate::domain::XAxis::HeightCm => "cm",
    }
}

/// Closed outline of the area between two SD columns within `[x0, x1]`.
fn zone_outline(table: &ReferenceTable, lower: SdBand, upper: SdBand, (x0, x1): (f64, f64)) -> Vec<(f64, f64)> {
    let rows: Vec<_> = table.rows().iter().filter(|r| r.x >= x0 && r.x <= x1).collect();
    let mut outline: Vec<(f64, f64)> = rows.iter().map(|r| (r.x, r.get(lower))).collect();
    outline.extend(rows.iter().rev().map(|r| (r.x, r.get(upper))));
    outline
}

fn zone_color(lower: SdBand) -> RGBColor {
    match lower {
        SdBand::Sd3Neg | SdBand::Sd2 => RGBColor(255, 226, 184),
        SdBand::Sd2Neg | SdBand::Sd1 => RGBColor(232, 244, 200),
        _ => RGBColor(204, 236, 204),
    }
}

fn band_style(band: SdBand) -> ShapeStyle {
    match band {
        SdBand::Sd0 => RGBColor(0, 110, 50).stroke_width(2),
        SdBand::Sd2Neg | SdBand::Sd2 => RGBColor(200, 140, 0).stroke_width(2),
        SdBand::Sd3Neg | SdBand::Sd3 => RGBColor(190, 30, 30).stroke_width(2),
        SdBand::Sd1Neg | SdBand::Sd1 => RGBColor(90, 150, 90).stroke_width(1),
    }
}
