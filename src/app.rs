//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - builds the record store and reference loader once
//! - runs the growth pipeline / dashboard
//! - prints reports/plots and writes optional exports

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{ClassifyArgs, Command, DashboardArgs, KmsArgs, PlotArgs, TrendArgs};
use crate::config::AppConfig;
use crate::domain::{Observation, XAxis};
use crate::error::{AppError, GrowthError};
use crate::io::records::RecordStore;
use crate::report::DashboardFilter;

pub mod pipeline;

/// Entry point for the `posyandu` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    let config = AppConfig::from_args(&cli.global);
    init_logging(&config);
    debug!(?config, "resolved configuration");

    match cli.command {
        Command::Classify(args) => handle_classify(&config, args),
        Command::Kms(args) => handle_kms(&config, args),
        Command::Plot(args) => handle_plot(args),
        Command::Dashboard(args) => handle_dashboard(&config, args),
        Command::Trend(args) => handle_trend(&config, args),
    }
}

/// Install the stderr fmt subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_directive()));
    // A subscriber may already be installed (e.g. when embedded); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Validate the `classify` inputs and build the observation.
fn classify_observation(args: &ClassifyArgs) -> Result<Observation, AppError> {
    if !(args.age_months.is_finite() && args.age_months >= 0.0) {
        return Err(AppError::new(2, "--age-months must be zero or positive."));
    }
    let x = match args.indicator.x_axis() {
        XAxis::AgeMonths => args.age_months,
        XAxis::HeightCm => args
            .height_cm
            .ok_or_else(|| AppError::new(2, "--height-cm is required for weight-for-height."))?,
    };
    if !(x.is_finite() && x >= 0.0 && args.value.is_finite() && args.value > 0.0) {
        return Err(AppError::new(2, "Age/height and value must be positive numbers."));
    }
    Ok(Observation {
        x,
        value: args.value,
        sex: args.sex,
    })
}

fn handle_classify(config: &AppConfig, args: ClassifyArgs) -> Result<(), AppError> {
    let indicator = args.indicator;
    let obs = classify_observation(&args)?;

    let mut loader = config.reference_loader();
    let (_, curves) = pipeline::prepare_curves(&mut loader, indicator, args.sex, args.age_months)?;
    let assessment = crate::classify::assess(&curves, &obs);

    println!("{}", crate::report::format_assessment(indicator, &assessment));
    Ok(())
}

fn handle_kms(config: &AppConfig, args: KmsArgs) -> Result<(), AppError> {
    let store = config.record_store()?;
    let resident = store.resident(&args.resident)?;
    let history = store.history(&resident.id)?;
    let mut loader = config.reference_loader();

    let outcome = pipeline::assess_growth(&mut loader, &resident, &history, args.indicator);
    println!("{}", crate::report::format_kms_summary(&outcome));

    if let Some(a) = outcome.chart().filter(|_| !args.no_plot) {
        println!("{}", crate::plot::render_kms_ascii(a, args.width, args.height));
    }

    if let Some(path) = &args.svg {
        let svg = crate::chart::render_kms_outcome_svg(&outcome)?;
        write_text(path, &svg)?;
        info!(path = %path.display(), "wrote KMS chart");
    }

    if let Some(path) = &args.export_curve {
        let a = outcome.chart().ok_or_else(|| {
            AppError::new(3, "No growth chart available for this resident; nothing to export.")
        })?;
        crate::io::curve::write_curve_json(path, &crate::io::curve::curve_file(a))?;
        info!(path = %path.display(), "wrote curve JSON");
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_dashboard(config: &AppConfig, args: DashboardArgs) -> Result<(), AppError> {
    let store = config.record_store()?;
    let residents = store.residents()?;
    let measurements = store.measurements()?;
    report_row_errors("residents", &residents.row_errors);
    report_row_errors("measurements", &measurements.row_errors);

    let date = match args.date {
        Some(d) => d,
        None => crate::report::available_dates(&measurements.rows)
            .first()
            .copied()
            .ok_or_else(|| AppError::new(3, "No measurement sessions recorded yet."))?,
    };

    let filter = DashboardFilter {
        rt: args.rt,
        sex: args.sex,
        category: args.category,
    };
    let mut loader = config.reference_loader();
    let dashboard =
        crate::report::build_dashboard(&residents.rows, &measurements.rows, date, &filter, &mut loader);

    println!("{}", crate::report::format_dashboard(&dashboard));

    if let Some(path) = &args.export {
        crate::io::export::write_dashboard_csv(path, &dashboard)?;
        info!(path = %path.display(), "wrote dashboard CSV");
    }
    Ok(())
}

fn handle_trend(config: &AppConfig, args: TrendArgs) -> Result<(), AppError> {
    let store = config.record_store()?;
    let resident = store.resident(&args.resident)?;
    let history = store.history(&resident.id)?;

    let svg = if history.is_empty() {
        let message = GrowthError::EmptyHistory.to_string();
        crate::chart::render_placeholder_svg(&message)?
    } else {
        crate::chart::render_trend_svg(&resident, &history)?
    };
    write_text(&args.svg, &svg)?;
    info!(path = %args.svg.display(), points = history.len(), "wrote trend charts");
    Ok(())
}

fn report_row_errors(what: &str, errors: &[crate::io::records::RowError]) {
    if errors.is_empty() {
        return;
    }
    eprintln!("Skipped {} invalid {what} row(s):", errors.len());
    for e in errors.iter().take(10) {
        let id = e.id.as_deref().unwrap_or("?");
        eprintln!("  line {} (id {id}): {}", e.line, e.message);
    }
}

fn write_text(path: &std::path::Path, text: &str) -> Result<(), AppError> {
    std::fs::write(path, text).map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GrowthIndicator, Sex};

    fn classify_args(indicator: GrowthIndicator, age_months: f64, height_cm: Option<f64>) -> ClassifyArgs {
        ClassifyArgs {
            indicator,
            sex: Sex::Female,
            age_months,
            value: 8.2,
            height_cm,
        }
    }

    #[test]
    fn negative_age_is_a_usage_error() {
        let err = classify_observation(&classify_args(GrowthIndicator::WeightForAge, -1.0, None)).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = classify_observation(&classify_args(GrowthIndicator::WeightForHeight, -0.5, Some(70.0))).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn weight_for_height_takes_x_from_height() {
        let obs = classify_observation(&classify_args(GrowthIndicator::WeightForHeight, 10.0, Some(72.5))).unwrap();
        assert_eq!(obs.x, 72.5);

        let err = classify_observation(&classify_args(GrowthIndicator::WeightForHeight, 10.0, None)).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let obs = classify_observation(&classify_args(GrowthIndicator::WeightForAge, 0.0, None)).unwrap();
        assert_eq!(obs.x, 0.0);
    }
}
