//! Individual health-trend charts: a 2×2 panel of vital signs over time.

use std::error::Error;

use chrono::{NaiveDate, TimeDelta};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::{MeasurementRecord, ResidentRecord, positive};

/// One line in a trend panel.
struct TrendSeries {
    label: &'static str,
    color: RGBColor,
    points: Vec<(f64, f64)>,
}

/// One of the four panels.
struct TrendPanel {
    title: &'static str,
    unit: &'static str,
    series: Vec<TrendSeries>,
}

/// Zero or missing readings mean "not measured" and are left out of the line.
fn series(
    history: &[MeasurementRecord],
    origin: NaiveDate,
    label: &'static str,
    color: RGBColor,
    value: fn(&MeasurementRecord) -> Option<f64>,
) -> TrendSeries {
    let points = history
        .iter()
        .filter_map(|m| {
            let v = positive(value(m))?;
            Some(((m.date - origin).num_days() as f64, v))
        })
        .collect();
    TrendSeries { label, color, points }
}

fn build_panels(history: &[MeasurementRecord], origin: NaiveDate) -> [TrendPanel; 4] {
    [
        TrendPanel {
            title: "Blood pressure",
            unit: "mmHg",
            series: vec![
                series(history, origin, "Systolic", RGBColor(31, 119, 180), |m| m.systolic),
                series(history, origin, "Diastolic", RGBColor(255, 127, 14), |m| m.diastolic),
            ],
        },
        TrendPanel {
            title: "Blood glucose",
            unit: "mg/dL",
            series: vec![series(history, origin, "Glucose", RGBColor(44, 160, 44), |m| m.blood_glucose)],
        },
        TrendPanel {
            title: "Weight",
            unit: "kg",
            series: vec![series(history, origin, "Weight", RGBColor(214, 39, 40), |m| m.weight_kg)],
        },
        TrendPanel {
            title: "Cholesterol",
            unit: "mg/dL",
            series: vec![series(history, origin, "Cholesterol", RGBColor(148, 103, 189), |m| m.cholesterol)],
        },
    ]
}

pub(crate) fn draw_trends<DB>(
    root: DrawingArea<DB, Shift>,
    resident: &ResidentRecord,
    history: &[MeasurementRecord],
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let root = root.titled(
        &format!("Health trends - {}", resident.display_name()),
        ("sans-serif", 22).into_font(),
    )?;

    let mut sorted = history.to_vec();
    sorted.sort_by_key(|m| m.date);
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        root.present()?;
        return Ok(());
    };
    let origin = first.date;
    let span = (last.date - origin).num_days() as f64;
    // A single session still needs a non-empty x-range.
    let (x0, x1) = if span > 0.0 { (0.0, span) } else { (-1.0, 1.0) };

    let panels = build_panels(&sorted, origin);
    for (area, panel) in root.split_evenly((2, 2)).iter().zip(panels.iter()) {
        draw_panel(area, panel, origin, (x0, x1))?;
    }

    root.present()?;
    Ok(())
}

fn draw_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    panel: &TrendPanel,
    origin: NaiveDate,
    (x0, x1): (f64, f64),
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let values = panel.series.iter().flat_map(|s| s.points.iter().map(|p| p.1));
    let Some((y0, y1)) = padded_range(values) else {
        area.draw(&Text::new(
            format!("{}: no data", panel.title),
            (20, 30),
            ("sans-serif", 16).into_font().color(&BLACK),
        ))?;
        return Ok(());
    };

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, ("sans-serif", 16).into_font())
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 35)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .y_desc(panel.unit)
        .x_labels(5)
        .x_label_formatter(&|v| day_label(origin, *v))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .light_line_style(RGBColor(235, 235, 235))
        .draw()?;

    for s in &panel.series {
        let color = s.color;
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
            .label(s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(s.points.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
    }

    if panel.series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()?;
    }
    Ok(())
}

/// Tick label for an x-value measured in days since `origin`.
fn day_label(origin: NaiveDate, days: f64) -> String {
    origin
        .checked_add_signed(TimeDelta::days(days.round() as i64))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn padded_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return None;
    }
    let pad = ((hi - lo) * 0.1).max(1.0);
    Some((lo - pad, hi + pad))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn panels_skip_missing_values() {
        let history = vec![
            MeasurementRecord {
                systolic: Some(130.0),
                diastolic: Some(85.0),
                cholesterol: Some(0.0),
                ..MeasurementRecord::empty("w", date(2025, 1, 1))
            },
            MeasurementRecord {
                systolic: Some(125.0),
                blood_glucose: Some(110.0),
                ..MeasurementRecord::empty("w", date(2025, 1, 31))
            },
        ];
        let panels = build_panels(&history, date(2025, 1, 1));
        assert_eq!(panels[0].series[0].points, vec![(0.0, 130.0), (30.0, 125.0)]);
        assert_eq!(panels[0].series[1].points.len(), 1);
        assert_eq!(panels[1].series[0].points, vec![(30.0, 110.0)]);
        assert!(panels[3].series[0].points.is_empty());
    }

    #[test]
    fn day_labels_round_trip_dates() {
        assert_eq!(day_label(date(2025, 1, 1), 30.0), "2025-01-31");
        assert_eq!(day_label(date(2025, 1, 1), 0.4), "2025-01-01");
    }

    #[test]
    fn single_value_range_is_padded() {
        assert_eq!(padded_range([120.0].into_iter()), Some((119.0, 121.0)));
        assert_eq!(padded_range(std::iter::empty()), None);
    }
}
