//! Shared growth-chart pipeline used by the `kms`, `classify` and `dashboard`
//! commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! route age band -> load reference -> fit curves -> build trajectory -> classify
//!
//! The commands can then focus on presentation (printing vs SVG vs tables).
//! Failures of the growth fragment never abort a report: `assess_growth`
//! degrades them into a `KmsOutcome::Placeholder`.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::classify::{Assessment, assess};
use crate::domain::{
    AgeBand, GrowthIndicator, MeasurementRecord, Observation, ReferenceTable, ResidentRecord, Sex, XAxis,
};
use crate::error::GrowthError;
use crate::fit::{FittedCurveSet, fit_curve_set};
use crate::io::reference::ReferenceLoader;

/// Everything needed to draw one resident's KMS chart.
#[derive(Debug, Clone)]
pub struct GrowthAssessment {
    pub resident_name: String,
    pub sex: Sex,
    pub indicator: GrowthIndicator,
    pub band: &'static AgeBand,
    pub table: Arc<ReferenceTable>,
    pub curves: FittedCurveSet,
    /// `(x, value)` for every usable measurement, oldest first.
    pub trajectory: Vec<(f64, f64)>,
    pub latest_date: NaiveDate,
    /// Age in months at `latest_date` (used for band routing).
    pub age_months: f64,
    pub latest: Assessment,
}

/// Result of the growth pipeline for one resident.
#[derive(Debug, Clone)]
pub enum KmsOutcome {
    Chart(Box<GrowthAssessment>),
    /// No chart could be drawn; the message says why.
    Placeholder { message: String },
}

impl KmsOutcome {
    pub fn placeholder(message: impl Into<String>) -> Self {
        KmsOutcome::Placeholder {
            message: message.into(),
        }
    }

    pub fn chart(&self) -> Option<&GrowthAssessment> {
        match self {
            KmsOutcome::Chart(a) => Some(a),
            KmsOutcome::Placeholder { .. } => None,
        }
    }
}

/// Load and fit the reference curves for a subject of the given age.
pub fn prepare_curves(
    loader: &mut ReferenceLoader,
    indicator: GrowthIndicator,
    sex: Sex,
    age_months: f64,
) -> Result<(Arc<ReferenceTable>, FittedCurveSet), GrowthError> {
    let band = indicator.route_band(age_months);
    debug!(indicator = indicator.code(), age_months, band = band.id, "routed age band");
    let table = loader.load(indicator, sex, band)?;
    let curves = fit_curve_set(&table)?;
    Ok((table, curves))
}

/// Build the observation one measurement contributes to an indicator.
pub fn observation_for(
    indicator: GrowthIndicator,
    resident: &ResidentRecord,
    measurement: &MeasurementRecord,
) -> Result<Observation, GrowthError> {
    let value = measurement
        .value_for(indicator)
        .ok_or(GrowthError::NoMeasurement {
            what: measured_quantity(indicator),
        })?;

    let age_months = resident.age_months_at(measurement.date);
    if age_months < 0.0 {
        return Err(GrowthError::BeforeBirth {
            date: measurement.date,
        });
    }

    let x = match indicator.x_axis() {
        XAxis::AgeMonths => age_months,
        XAxis::HeightCm => measurement
            .height()
            .ok_or(GrowthError::NoMeasurement { what: "height" })?,
    };

    Ok(Observation {
        x,
        value,
        sex: resident.sex,
    })
}

/// Run the full pipeline for one resident, propagating failures.
pub fn try_assess_growth(
    loader: &mut ReferenceLoader,
    resident: &ResidentRecord,
    history: &[MeasurementRecord],
    indicator: GrowthIndicator,
) -> Result<GrowthAssessment, GrowthError> {
    let mut ordered: Vec<&MeasurementRecord> = history.iter().collect();
    ordered.sort_by_key(|m| m.date);

    let latest = ordered.last().copied().ok_or(GrowthError::EmptyHistory)?;
    let latest_obs = observation_for(indicator, resident, latest)?;
    let age_months = resident.age_months_at(latest.date);

    let (table, curves) = prepare_curves(loader, indicator, resident.sex, age_months)?;

    let trajectory: Vec<(f64, f64)> = ordered
        .iter()
        .filter_map(|m| match observation_for(indicator, resident, m) {
            Ok(obs) => Some((obs.x, obs.value)),
            Err(e) => {
                debug!(date = %m.date, "trajectory point skipped: {e}");
                None
            }
        })
        .collect();

    let latest_assessment = assess(&curves, &latest_obs);

    Ok(GrowthAssessment {
        resident_name: resident.display_name(),
        sex: resident.sex,
        indicator,
        band: curves.band,
        table,
        curves,
        trajectory,
        latest_date: latest.date,
        age_months,
        latest: latest_assessment,
    })
}

/// Run the full pipeline for one resident, degrading failures to a placeholder.
pub fn assess_growth(
    loader: &mut ReferenceLoader,
    resident: &ResidentRecord,
    history: &[MeasurementRecord],
    indicator: GrowthIndicator,
) -> KmsOutcome {
    match try_assess_growth(loader, resident, history, indicator) {
        Ok(a) => KmsOutcome::Chart(Box::new(a)),
        Err(GrowthError::EmptyHistory) => KmsOutcome::placeholder(format!(
            "No measurement history for {} yet.",
            resident.display_name()
        )),
        Err(e @ GrowthError::NoMeasurement { .. }) => KmsOutcome::placeholder(capitalize(&e.to_string())),
        Err(e) => {
            warn!(
                resident = %resident.id,
                indicator = indicator.code(),
                "growth chart unavailable: {e}"
            );
            KmsOutcome::placeholder(format!("Growth chart unavailable: {e}"))
        }
    }
}

/// Weight-for-age status of one measurement, for the attendance table.
///
/// Only children under five get a status; everything else (adults, missing
/// weight, missing reference data) reads "N/A".
pub fn growth_status(loader: &mut ReferenceLoader, resident: &ResidentRecord, measurement: &MeasurementRecord) -> String {
    const NOT_APPLICABLE: &str = "N/A";
    const UNDER_FIVE_MONTHS: f64 = 61.0;

    let indicator = GrowthIndicator::WeightForAge;
    let age_months = resident.age_months_at(measurement.date);
    if !(0.0..UNDER_FIVE_MONTHS).contains(&age_months) {
        return NOT_APPLICABLE.to_string();
    }

    let status = observation_for(indicator, resident, measurement).and_then(|obs| {
        let (_, curves) = prepare_curves(loader, indicator, resident.sex, age_months)?;
        Ok(assess(&curves, &obs).classification)
    });

    match status {
        Ok(c) => c.label().to_string(),
        Err(e) => {
            debug!(resident = %resident.id, "growth status unavailable: {e}");
            NOT_APPLICABLE.to_string()
        }
    }
}

fn measured_quantity(indicator: GrowthIndicator) -> &'static str {
    match indicator {
        GrowthIndicator::WeightForAge | GrowthIndicator::WeightForHeight => "weight",
        GrowthIndicator::BmiForAge => "weight and height",
        GrowthIndicator::LengthHeightForAge => "length/height",
        GrowthIndicator::HeadCircumferenceForAge => "head circumference",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
