//! Typed resident and measurement records.
//!
//! These are the rows the record store hands to the rest of the crate. They
//! are validated at the boundary (`io::records`), so code downstream never
//! deals with missing keys.

use chrono::NaiveDate;

use crate::domain::{GrowthIndicator, Sex};

/// Days per month used for age-in-months.
pub const DAYS_PER_MONTH: f64 = 365.25 / 12.0;

/// A registered resident (`warga`).
#[derive(Debug, Clone, PartialEq)]
pub struct ResidentRecord {
    pub id: String,
    pub nik: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    /// Neighbourhood unit (RT).
    pub rt: String,
    pub block: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl ResidentRecord {
    /// `"Name (RT-01, BLOK-A)"`, as shown in pickers and tables.
    pub fn display_name(&self) -> String {
        format!("{} (RT-{}, BLOK-{})", self.full_name, self.rt, self.block)
    }

    /// Age in (fractional) years at `date`.
    pub fn age_years_at(&self, date: NaiveDate) -> f64 {
        (date - self.birth_date).num_days() as f64 / 365.25
    }

    /// Age in (fractional) months at `date`.
    pub fn age_months_at(&self, date: NaiveDate) -> f64 {
        (date - self.birth_date).num_days() as f64 / DAYS_PER_MONTH
    }

    /// Registration rule: NIK, name, RT and block are mandatory.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [
            ("nik", self.nik.as_str()),
            ("nama_lengkap", self.full_name.as_str()),
            ("rt", self.rt.as_str()),
            ("blok", self.block.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Missing required value(s): {}", missing.join(", ")))
        }
    }
}

/// One check-up (`pemeriksaan`) for one resident on one date.
///
/// Every measurement is optional: the intake form defaults to zero, and a
/// zero is treated the same as "not measured".
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub resident_id: String,
    pub date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub head_circumference_cm: Option<f64>,
    pub arm_circumference_cm: Option<f64>,
    pub waist_circumference_cm: Option<f64>,
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub blood_glucose: Option<f64>,
    pub cholesterol: Option<f64>,
    pub notes: Option<String>,
}

impl MeasurementRecord {
    /// A record with no measurements filled in.
    pub fn empty(resident_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            resident_id: resident_id.into(),
            date,
            weight_kg: None,
            height_cm: None,
            head_circumference_cm: None,
            arm_circumference_cm: None,
            waist_circumference_cm: None,
            systolic: None,
            diastolic: None,
            blood_glucose: None,
            cholesterol: None,
            notes: None,
        }
    }

    pub fn weight(&self) -> Option<f64> {
        positive(self.weight_kg)
    }

    pub fn height(&self) -> Option<f64> {
        positive(self.height_cm)
    }

    pub fn head_circumference(&self) -> Option<f64> {
        positive(self.head_circumference_cm)
    }

    /// Body-mass index in kg/m², from weight (kg) and height (cm).
    pub fn bmi(&self) -> Option<f64> {
        let weight = self.weight()?;
        let height_m = self.height()? / 100.0;
        positive(Some(weight / (height_m * height_m)))
    }

    /// The y-value this record contributes to an indicator's chart.
    pub fn value_for(&self, indicator: GrowthIndicator) -> Option<f64> {
        match indicator {
            GrowthIndicator::WeightForAge | GrowthIndicator::WeightForHeight => self.weight(),
            GrowthIndicator::BmiForAge => self.bmi(),
            GrowthIndicator::LengthHeightForAge => self.height(),
            GrowthIndicator::HeadCircumferenceForAge => self.head_circumference(),
        }
    }
}

/// Keep only finite, strictly positive values.
pub fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}
