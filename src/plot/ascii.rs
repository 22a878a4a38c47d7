//! ASCII plotting of the KMS chart for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - SD3/SD3neg bands: `:`; SD2/SD2neg: `-`; SD1/SD1neg: `.`; median: `=`
//! - trajectory points: `o`, joined by `+`
//! - latest measurement: `X`

use crate::app::pipeline::GrowthAssessment;
use crate::domain::{CurveFile, SdBand};

/// One fitted band sampled for plotting.
struct BandSeries<'a> {
    band: SdBand,
    points: &'a [(f64, f64)],
}

/// Render the chart for an in-memory assessment.
pub fn render_kms_ascii(a: &GrowthAssessment, width: usize, height: usize) -> String {
    let (x0, x1) = (a.curves.x_min, a.curves.x_max);
    let samples: Vec<Vec<(f64, f64)>> = SdBand::ALL
        .iter()
        .map(|&band| a.curves.sample(band, x0, x1, width.max(2)))
        .collect();
    let series: Vec<BandSeries<'_>> = SdBand::ALL
        .iter()
        .zip(samples.iter())
        .map(|(&band, points)| BandSeries { band, points })
        .collect();

    let latest = (a.latest.observation.x, a.latest.observation.value);
    let title = format!(
        "{} | {} | {}",
        a.indicator.display_name(),
        a.resident_name,
        a.latest.classification.label()
    );
    render_plot(&title, &series, &a.trajectory, Some(latest), (x0, x1), width, height)
}

/// Render a plot from a saved curve JSON file.
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let samples: Vec<Vec<(f64, f64)>> = curve
        .grid
        .bands
        .iter()
        .map(|ys| curve.grid.x.iter().copied().zip(ys.iter().copied()).collect())
        .collect();
    let series: Vec<BandSeries<'_>> = SdBand::ALL
        .iter()
        .zip(samples.iter())
        .map(|(&band, points)| BandSeries { band, points })
        .collect();

    let x_range = finite_range(curve.grid.x.iter().copied()).unwrap_or((0.0, 24.0));
    let latest = curve.latest.map(|p| (p.x, p.value));
    let title = match &curve.latest {
        Some(p) => format!("{} | {}", curve.indicator.display_name(), p.classification.label()),
        None => curve.indicator.display_name().to_string(),
    };
    render_plot(&title, &series, &curve.trajectory, latest, x_range, width, height)
}

fn render_plot(
    title: &str,
    series: &[BandSeries<'_>],
    trajectory: &[(f64, f64)],
    latest: Option<(f64, f64)>,
    (x_min, x_max): (f64, f64),
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let ys = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.1))
        .chain(trajectory.iter().map(|p| p.1))
        .chain(latest.map(|p| p.1));
    let (y_min, y_max) = finite_range(ys).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let frame = Frame {
        x_min,
        x_max,
        y_min,
        y_max,
        width,
        height,
    };
    let mut grid = vec![vec![' '; width]; height];

    // Outer bands first so the median wins where lines cross.
    for band in [SdBand::Sd3Neg, SdBand::Sd3, SdBand::Sd2Neg, SdBand::Sd2, SdBand::Sd1Neg, SdBand::Sd1, SdBand::Sd0] {
        if let Some(s) = series.iter().find(|s| s.band == band) {
            draw_polyline(&mut grid, &frame, s.points, band_char(band));
        }
    }

    draw_polyline(&mut grid, &frame, trajectory, '+');
    for &(x, y) in trajectory {
        if in_window(&frame, x) {
            let (c, r) = frame.cell(x, y);
            grid[r][c] = 'o';
        }
    }
    if let Some((x, y)) = latest {
        let (c, r) = frame.cell(x, y);
        grid[r][c] = 'X';
    }

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&format!(
        "Plot: x=[{x_min:.1}, {x_max:.1}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str("Legend: ':' SD±3  '-' SD±2  '.' SD±1  '=' median  'o' visits  'X' latest\n");
    out
}

fn band_char(band: SdBand) -> char {
    match band {
        SdBand::Sd3Neg | SdBand::Sd3 => ':',
        SdBand::Sd2Neg | SdBand::Sd2 => '-',
        SdBand::Sd1Neg | SdBand::Sd1 => '.',
        SdBand::Sd0 => '=',
    }
}

struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    width: usize,
    height: usize,
}

impl Frame {
    /// Grid `(column, row)` of a data point, clamped to the frame.
    fn cell(&self, x: f64, y: f64) -> (usize, usize) {
        (
            map_x(x, self.x_min, self.x_max, self.width),
            map_y(y, self.y_min, self.y_max, self.height),
        )
    }
}

fn in_window(frame: &Frame, x: f64) -> bool {
    x >= frame.x_min && x <= frame.x_max
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v.is_finite() && max_v.is_finite() && max_v > min_v {
        Some((min_v, max_v))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], frame: &Frame, points: &[(f64, f64)], ch: char) {
    let mut prev = None;
    for &(x, y) in points {
        if !(x.is_finite() && y.is_finite()) || !in_window(frame, x) {
            prev = None;
            continue;
        }
        let (c, r) = frame.cell(x, y);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, c, r, ch),
            None => grid[r][c] = ch,
        }
        prev = Some((c, r));
    }
}

/// Integer line drawing (Bresenham-ish). Later lines overwrite earlier ones.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Classification, CurveGrid, GrowthCategory, GrowthIndicator, LatestPoint, Sex, XAxis,
    };

    /// Flat bands at 1..=7 over x in [0, 9].
    fn flat_curve() -> CurveFile {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let bands = (1..=7).map(|v| vec![v as f64; x.len()]).collect();
        CurveFile {
            tool: "posyandu".to_string(),
            indicator: GrowthIndicator::WeightForAge,
            sex: Sex::Female,
            band: "0_2".to_string(),
            source: "wfa_girls_0_2.csv".to_string(),
            x_axis: XAxis::AgeMonths,
            y_unit: "kg".to_string(),
            grid: CurveGrid { x, bands },
            trajectory: vec![(0.0, 4.0), (9.0, 4.0)],
            latest: Some(LatestPoint {
                x: 9.0,
                value: 4.0,
                classification: Classification::from(GrowthCategory::Normal),
            }),
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        // y-range [1, 7] padded by 0.3; seven rows put each band on its own row.
        let txt = render_ascii_plot_from_curve_file(&flat_curve(), 10, 7);
        let expected = concat!(
            "Weight-for-age | normal\n",
            "Plot: x=[0.0, 9.0] | y=[0.70, 7.30]\n",
            "::::::::::\n",
            "----------\n",
            "..........\n",
            "o++++++++X\n",
            "..........\n",
            "----------\n",
            "::::::::::\n",
            "Legend: ':' SD±3  '-' SD±2  '.' SD±1  '=' median  'o' visits  'X' latest\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn points_outside_window_are_not_drawn() {
        let mut curve = flat_curve();
        curve.trajectory = vec![(-5.0, 2.0), (4.0, 6.0)];
        curve.latest = None;
        let txt = render_ascii_plot_from_curve_file(&curve, 10, 7);
        let rows: Vec<&str> = txt.lines().skip(2).take(7).collect();
        assert_eq!(rows.iter().map(|l| l.matches('o').count()).sum::<usize>(), 1);
        assert!(!rows.iter().any(|l| l.contains('X')));
    }
}
