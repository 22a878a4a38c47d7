//! Formatted terminal output for the dashboard and growth assessments.
//!
//! We keep formatting code in one place so:
//! - the growth/dashboard code stays clean and testable
//! - output changes are localized

use chrono::NaiveDate;

use crate::app::pipeline::{GrowthAssessment, KmsOutcome};
use crate::classify::Assessment;
use crate::domain::{GrowthIndicator, SdBand};
use crate::report::{AttendanceRow, Dashboard};

/// Format the session summary, category counts and both listings.
pub fn format_dashboard(d: &Dashboard) -> String {
    let mut out = String::new();

    out.push_str("=== posyandu - Attendance Dashboard ===\n");
    out.push_str(&format!("Session date: {}\n", d.date));
    out.push_str(&format!(
        "Residents: {} | Visits: {} | Participation: {:.1}%\n",
        d.total_residents, d.visits, d.participation_pct
    ));

    out.push_str(&format!(
        "Residents by sex: {} male, {} female | Visitors by sex: {} male, {} female\n",
        d.residents_by_sex.male, d.residents_by_sex.female, d.visitors_by_sex.male, d.visitors_by_sex.female
    ));

    out.push_str("\nAttendance by age category:\n");
    for (category, count) in &d.category_counts {
        out.push_str(&format!("  {:<44} {:>5}\n", category.label(), count));
    }

    out.push_str("\nVisits per session:\n");
    out.push_str(&format_visit_trend(&d.visit_trend, 40));

    out.push_str(&format!("\nPresent ({}):\n", d.present.len()));
    out.push_str(&format_present_table(&d.present));

    out.push_str(&format!("\nAbsent ({}):\n", d.absent.len()));
    out.push_str(&format_absent_table(&d.absent));

    out
}

/// One line per session with a bar scaled to the busiest session.
fn format_visit_trend(trend: &[(NaiveDate, usize)], max_bar: usize) -> String {
    let peak = trend.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let mut out = String::new();
    for (date, n) in trend {
        let bar = if peak == 0 { 0 } else { (n * max_bar).div_ceil(peak) };
        push_line(&mut out, format!("  {date} {n:>5} {}", "#".repeat(bar)));
    }
    if trend.is_empty() {
        out.push_str("  (no sessions)\n");
    }
    out
}

fn format_present_table(rows: &[AttendanceRow]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<32} {:>5} {:>8} {:>8} {:>9} {:>7} {:>7} {:<20}",
            "name", "age", "weight", "height", "bp", "sugar", "chol", "growth"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<32} {:->5} {:->8} {:->8} {:->9} {:->7} {:->7} {:-<20}",
            "", "", "", "", "", "", "", ""
        ),
    );

    for r in rows {
        let Some(m) = &r.measurement else { continue };
        let bp = match (m.systolic, m.diastolic) {
            (Some(s), Some(d)) if s > 0.0 && d > 0.0 => format!("{s:.0}/{d:.0}"),
            _ => "N/A".to_string(),
        };
        push_line(
            &mut out,
            format!(
                "{:<32} {:>5.1} {:>8} {:>8} {:>9} {:>7} {:>7} {:<20}",
                truncate(&r.resident.display_name(), 32),
                r.age_years,
                fmt_opt(m.weight_kg, 1),
                fmt_opt(m.height_cm, 1),
                bp,
                fmt_opt(m.blood_glucose, 0),
                fmt_opt(m.cholesterol, 0),
                r.growth_status.as_deref().unwrap_or("N/A"),
            ),
        );
    }

    out
}

fn format_absent_table(rows: &[AttendanceRow]) -> String {
    let mut out = String::new();
    push_line(&mut out, format!("{:<32} {:>5} {:<44}", "name", "age", "category"));
    push_line(&mut out, format!("{:-<32} {:->5} {:-<44}", "", "", ""));
    for r in rows {
        push_line(
            &mut out,
            format!(
                "{:<32} {:>5.1} {:<44}",
                truncate(&r.resident.display_name(), 32),
                r.age_years,
                r.category.label()
            ),
        );
    }
    out
}

/// Format the classification of one observation with its band values.
pub fn format_assessment(indicator: GrowthIndicator, a: &Assessment) -> String {
    let mut out = String::new();
    let unit = indicator.y_unit();

    out.push_str(&format!("{} ({unit})\n", indicator.display_name()));
    out.push_str(&format!(
        "{}: {:.1} | value: {:.2} {unit}\n",
        indicator.x_axis().label(),
        a.observation.x,
        a.observation.value
    ));
    if a.x_eval != a.observation.x {
        out.push_str(&format!("(evaluated at reference edge x={:.1})\n", a.x_eval));
    }

    out.push_str("Bands:");
    for band in SdBand::ALL {
        out.push_str(&format!(" {}={:.2}", band.column(), a.bands.get(band)));
    }
    out.push('\n');

    out.push_str(&format!(
        "Status: {} [{}]\n",
        a.classification.label(),
        a.classification.severity.label()
    ));
    out
}

/// Format the header block of a KMS chart (or the placeholder message).
pub fn format_kms_summary(outcome: &KmsOutcome) -> String {
    match outcome {
        KmsOutcome::Placeholder { message } => format!("{message}\n"),
        KmsOutcome::Chart(a) => format_growth_assessment(a),
    }
}

fn format_growth_assessment(a: &GrowthAssessment) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== KMS - {} ===\n", a.resident_name));
    out.push_str(&format!(
        "Sex: {} | Reference: {} {} ({})\n",
        a.sex.display_name(),
        a.indicator.code(),
        a.band.id,
        a.table.source.display()
    ));
    out.push_str(&format!(
        "Latest check-up: {} | Age: {:.1} months | Points: {}\n",
        a.latest_date,
        a.age_months,
        a.trajectory.len()
    ));
    out.push_str(&format_assessment(a.indicator, &a.latest));
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) if v.is_finite() && v > 0.0 => format!("{v:.decimals$}"),
        _ => "N/A".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
