//! Command-line parsing for the posyandu growth-chart and dashboard tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the growth/reporting code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{GrowthIndicator, Sex};
use crate::report::AgeCategory;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "posyandu", version, about = "Posyandu records: WHO growth charts (KMS) and attendance dashboard")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    /// Directory with residents.csv and measurements.csv.
    #[arg(long, global = true, env = "POSYANDU_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory with the WHO reference CSVs (e.g. wfa_boys_0_2.csv).
    #[arg(long, global = true, env = "POSYANDU_REFERENCE_DIR", default_value = "data/who")]
    pub reference_dir: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify a single measurement against the WHO reference curves.
    Classify(ClassifyArgs),
    /// Build a resident's growth chart (KMS), print it, and optionally export SVG/JSON.
    Kms(KmsArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Attendance dashboard for one session date.
    Dashboard(DashboardArgs),
    /// Health-trend charts (blood pressure, glucose, weight, cholesterol) for one resident.
    Trend(TrendArgs),
}

/// Options for classifying one measurement.
#[derive(Debug, Parser, Clone)]
pub struct ClassifyArgs {
    #[arg(short, long, value_enum, default_value_t = GrowthIndicator::WeightForAge)]
    pub indicator: GrowthIndicator,

    /// Sex code (L/P); case-insensitive.
    #[arg(short, long, value_enum, ignore_case = true)]
    pub sex: Sex,

    /// Age in months (selects the reference age band).
    #[arg(long)]
    pub age_months: f64,

    /// Measured value (kg, kg/m² or cm depending on the indicator).
    #[arg(long)]
    pub value: f64,

    /// Length/height in cm (required for weight-for-height).
    #[arg(long)]
    pub height_cm: Option<f64>,
}

/// Options for a resident's growth chart.
#[derive(Debug, Parser, Clone)]
pub struct KmsArgs {
    /// Resident id.
    #[arg(short, long)]
    pub resident: String,

    #[arg(short, long, value_enum, default_value_t = GrowthIndicator::WeightForAge)]
    pub indicator: GrowthIndicator,

    /// Write the chart as SVG.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,

    /// Export curve (fitted band grid + trajectory) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `posyandu kms --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for the attendance dashboard.
#[derive(Debug, Parser, Clone)]
pub struct DashboardArgs {
    /// Session date (YYYY-MM-DD). Defaults to the most recent session.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Only residents of this RT.
    #[arg(long)]
    pub rt: Option<String>,

    /// Only residents of this sex (L/P); case-insensitive.
    #[arg(long, value_enum, ignore_case = true)]
    pub sex: Option<Sex>,

    /// Only list residents of this age category.
    #[arg(long, value_enum)]
    pub category: Option<AgeCategory>,

    /// Export the present/absent rows to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// Options for the health-trend charts.
#[derive(Debug, Parser, Clone)]
pub struct TrendArgs {
    /// Resident id.
    #[arg(short, long)]
    pub resident: String,

    /// Output SVG path.
    #[arg(long, value_name = "SVG")]
    pub svg: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_kms_with_global_dirs() {
        let cli = Cli::try_parse_from([
            "posyandu",
            "kms",
            "--resident",
            "w1",
            "--indicator",
            "lhfa",
            "--reference-dir",
            "/tmp/who",
        ])
        .unwrap();
        assert_eq!(cli.global.reference_dir, PathBuf::from("/tmp/who"));
        match cli.command {
            Command::Kms(args) => {
                assert_eq!(args.resident, "w1");
                assert_eq!(args.indicator, GrowthIndicator::LengthHeightForAge);
                assert!(!args.no_plot);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_dashboard_filters() {
        let cli = Cli::try_parse_from([
            "posyandu", "-v", "dashboard", "--date", "2025-03-01", "--sex", "P", "--category", "baduta",
        ])
        .unwrap();
        assert_eq!(cli.global.verbose, 1);
        match cli.command {
            Command::Dashboard(args) => {
                assert_eq!(args.date, NaiveDate::from_ymd_opt(2025, 3, 1));
                assert_eq!(args.sex, Some(Sex::Female));
                assert_eq!(args.category, Some(AgeCategory::UnderTwo));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn sex_codes_parse_in_either_case() {
        for (code, expected) in [("L", Sex::Male), ("l", Sex::Male), ("P", Sex::Female), ("Female", Sex::Female)] {
            let cli = Cli::try_parse_from(["posyandu", "dashboard", "--sex", code]).unwrap();
            match cli.command {
                Command::Dashboard(args) => assert_eq!(args.sex, Some(expected), "{code}"),
                other => panic!("unexpected command: {other:?}"),
            }
        }

        let cli = Cli::try_parse_from(["posyandu", "classify", "-s", "L", "--age-months", "6", "--value", "7.5"]).unwrap();
        match cli.command {
            Command::Classify(args) => assert_eq!(args.sex, Sex::Male),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["posyandu", "dashboard", "--sex", "X"]).is_err());
    }
}
