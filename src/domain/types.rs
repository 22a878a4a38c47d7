//! Growth-standard domain types.
//!
//! This module defines:
//!
//! - indicator/sex enums and the age-band partition of each indicator
//! - reference tables (`ReferenceTable`) with their sort/de-dup invariant
//! - observations and classification outputs
//! - the serializable curve file used for exports

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Biological sex as recorded on the resident (`L` / `P`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[value(alias = "l", alias = "boy")]
    Male,
    #[value(alias = "p", alias = "f", alias = "girl")]
    Female,
}

impl Sex {
    /// Parse the stored code. Accepts `L`/`P` plus English spellings.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "l" | "m" | "male" | "laki-laki" => Some(Sex::Male),
            "p" | "f" | "female" | "perempuan" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "L",
            Sex::Female => "P",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Sex::Male => "Laki-laki",
            Sex::Female => "Perempuan",
        }
    }

    /// Tag used in reference file names.
    pub fn file_tag(self) -> &'static str {
        match self {
            Sex::Male => "boys",
            Sex::Female => "girls",
        }
    }
}

/// What the x-axis of an indicator measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XAxis {
    AgeMonths,
    HeightCm,
}

impl XAxis {
    pub fn label(self) -> &'static str {
        match self {
            XAxis::AgeMonths => "Age (months)",
            XAxis::HeightCm => "Length/height (cm)",
        }
    }
}

/// One reference-table partition by age.
///
/// `upper_months` is the exclusive routing bound; `x_range`/`y_range` are the
/// plot window for charts drawn from this band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeBand {
    pub id: &'static str,
    pub label: &'static str,
    pub upper_months: f64,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

const WFA_BANDS: [AgeBand; 2] = [
    AgeBand { id: "0_2", label: "0-2 years", upper_months: 24.0, x_range: (0.0, 24.0), y_range: (1.0, 18.0) },
    AgeBand { id: "2_5", label: "2-5 years", upper_months: 61.0, x_range: (24.0, 60.0), y_range: (7.0, 30.0) },
];

const WFH_BANDS: [AgeBand; 2] = [
    AgeBand { id: "0_2", label: "weight-for-length 0-2 years", upper_months: 24.0, x_range: (45.0, 110.0), y_range: (1.0, 25.0) },
    AgeBand { id: "2_5", label: "weight-for-height 2-5 years", upper_months: 61.0, x_range: (65.0, 120.0), y_range: (5.0, 32.0) },
];

const BFA_BANDS: [AgeBand; 2] = [
    AgeBand { id: "0_2", label: "0-2 years", upper_months: 24.0, x_range: (0.0, 24.0), y_range: (9.0, 23.0) },
    AgeBand { id: "2_5", label: "2-5 years", upper_months: 61.0, x_range: (24.0, 60.0), y_range: (11.0, 22.0) },
];

const LHFA_BANDS: [AgeBand; 2] = [
    AgeBand { id: "0_2", label: "length 0-2 years", upper_months: 24.0, x_range: (0.0, 24.0), y_range: (43.0, 100.0) },
    AgeBand { id: "2_5", label: "height 2-5 years", upper_months: 61.0, x_range: (24.0, 60.0), y_range: (75.0, 125.0) },
];

const HCFA_BANDS: [AgeBand; 2] = [
    AgeBand { id: "0_2", label: "0-2 years", upper_months: 24.0, x_range: (0.0, 24.0), y_range: (30.0, 52.0) },
    AgeBand { id: "2_5", label: "2-5 years", upper_months: 61.0, x_range: (24.0, 60.0), y_range: (43.0, 56.0) },
];

/// WHO growth indicators supported by the KMS chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GrowthIndicator {
    #[value(name = "wfa")]
    #[serde(rename = "wfa")]
    WeightForAge,
    #[value(name = "wfh")]
    #[serde(rename = "wfh")]
    WeightForHeight,
    #[value(name = "bfa")]
    #[serde(rename = "bfa")]
    BmiForAge,
    #[value(name = "lhfa")]
    #[serde(rename = "lhfa")]
    LengthHeightForAge,
    #[value(name = "hcfa")]
    #[serde(rename = "hcfa")]
    HeadCircumferenceForAge,
}

impl GrowthIndicator {
    pub const ALL: [GrowthIndicator; 5] = [
        GrowthIndicator::WeightForAge,
        GrowthIndicator::WeightForHeight,
        GrowthIndicator::BmiForAge,
        GrowthIndicator::LengthHeightForAge,
        GrowthIndicator::HeadCircumferenceForAge,
    ];

    /// Short code used in file names and on the command line.
    pub fn code(self) -> &'static str {
        match self {
            GrowthIndicator::WeightForAge => "wfa",
            GrowthIndicator::WeightForHeight => "wfh",
            GrowthIndicator::BmiForAge => "bfa",
            GrowthIndicator::LengthHeightForAge => "lhfa",
            GrowthIndicator::HeadCircumferenceForAge => "hcfa",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GrowthIndicator::WeightForAge => "Weight-for-age",
            GrowthIndicator::WeightForHeight => "Weight-for-length/height",
            GrowthIndicator::BmiForAge => "BMI-for-age",
            GrowthIndicator::LengthHeightForAge => "Length/height-for-age",
            GrowthIndicator::HeadCircumferenceForAge => "Head circumference-for-age",
        }
    }

    pub fn x_axis(self) -> XAxis {
        match self {
            GrowthIndicator::WeightForHeight => XAxis::HeightCm,
            _ => XAxis::AgeMonths,
        }
    }

    pub fn y_unit(self) -> &'static str {
        match self {
            GrowthIndicator::WeightForAge | GrowthIndicator::WeightForHeight => "kg",
            GrowthIndicator::BmiForAge => "kg/m²",
            GrowthIndicator::LengthHeightForAge | GrowthIndicator::HeadCircumferenceForAge => "cm",
        }
    }

    /// Age bands in ascending order of their upper bound.
    pub fn bands(self) -> &'static [AgeBand] {
        match self {
            GrowthIndicator::WeightForAge => &WFA_BANDS,
            GrowthIndicator::WeightForHeight => &WFH_BANDS,
            GrowthIndicator::BmiForAge => &BFA_BANDS,
            GrowthIndicator::LengthHeightForAge => &LHFA_BANDS,
            GrowthIndicator::HeadCircumferenceForAge => &HCFA_BANDS,
        }
    }

    /// Pick the reference band for a subject of the given age.
    ///
    /// First band whose upper bound is strictly greater than the age; the
    /// oldest band when none match. An age sitting exactly on a bound
    /// therefore routes into the older band.
    pub fn route_band(self, age_months: f64) -> &'static AgeBand {
        let bands = self.bands();
        match bands.iter().find(|b| age_months < b.upper_months) {
            Some(band) => band,
            None => &bands[bands.len() - 1],
        }
    }

    /// Reference file for one indicator × sex × band.
    pub fn reference_path(self, dir: &Path, sex: Sex, band: &AgeBand) -> PathBuf {
        dir.join(format!("{}_{}_{}.csv", self.code(), sex.file_tag(), band.id))
    }
}

/// The seven Z-score reference columns, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SdBand {
    Sd3Neg,
    Sd2Neg,
    Sd1Neg,
    Sd0,
    Sd1,
    Sd2,
    Sd3,
}

impl SdBand {
    pub const ALL: [SdBand; 7] = [
        SdBand::Sd3Neg,
        SdBand::Sd2Neg,
        SdBand::Sd1Neg,
        SdBand::Sd0,
        SdBand::Sd1,
        SdBand::Sd2,
        SdBand::Sd3,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name in reference files.
    pub fn column(self) -> &'static str {
        match self {
            SdBand::Sd3Neg => "SD3neg",
            SdBand::Sd2Neg => "SD2neg",
            SdBand::Sd1Neg => "SD1neg",
            SdBand::Sd0 => "SD0",
            SdBand::Sd1 => "SD1",
            SdBand::Sd2 => "SD2",
            SdBand::Sd3 => "SD3",
        }
    }

    /// Short chart label.
    pub fn label(self) -> &'static str {
        match self {
            SdBand::Sd3Neg => "-3",
            SdBand::Sd2Neg => "-2",
            SdBand::Sd1Neg => "-1",
            SdBand::Sd0 => "0",
            SdBand::Sd1 => "1",
            SdBand::Sd2 => "2",
            SdBand::Sd3 => "3",
        }
    }
}

impl std::fmt::Display for SdBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// One reference row: an x-value and its seven SD values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRow {
    pub x: f64,
    pub sd: [f64; 7],
}

impl ReferenceRow {
    pub fn get(&self, band: SdBand) -> f64 {
        self.sd[band.index()]
    }
}

/// Reference rows for one indicator × sex × age band.
///
/// Rows are sorted by x and hold one row per x-value; the only constructor
/// enforces this, so fitting code can rely on it.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    pub indicator: GrowthIndicator,
    pub sex: Sex,
    pub band: &'static AgeBand,
    pub source: PathBuf,
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    /// Build a table, sorting by x and collapsing ties (first row wins).
    /// Rows with a non-finite x are dropped.
    pub fn new(
        indicator: GrowthIndicator,
        sex: Sex,
        band: &'static AgeBand,
        source: PathBuf,
        rows: Vec<ReferenceRow>,
    ) -> Self {
        let mut rows: Vec<ReferenceRow> = rows.into_iter().filter(|r| r.x.is_finite()).collect();
        rows.sort_by(|a, b| a.x.total_cmp(&b.x));
        rows.dedup_by(|later, kept| later.x == kept.x);
        Self {
            indicator,
            sex,
            band,
            source,
            rows,
        }
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.x).collect()
    }

    pub fn column(&self, band: SdBand) -> Vec<f64> {
        self.rows.iter().map(|r| r.get(band)).collect()
    }

    pub fn x_range(&self) -> Option<(f64, f64)> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some((first.x, last.x))
    }
}

/// The seven band values evaluated at one x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandValues(pub [f64; 7]);

impl BandValues {
    pub fn get(&self, band: SdBand) -> f64 {
        self.0[band.index()]
    }
}

/// A subject measurement to classify.
///
/// `x` is age in months, or height in cm for weight-for-height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub x: f64,
    pub value: f64,
    pub sex: Sex,
}

/// Display severity attached to every category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

impl Severity {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Severity::Green => (46, 160, 67),
            Severity::Yellow => (230, 180, 20),
            Severity::Red => (210, 40, 40),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Green => "green",
            Severity::Yellow => "yellow",
            Severity::Red => "red",
        }
    }
}

/// Nutritional/growth status categories across all indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthCategory {
    Normal,
    // weight-for-age
    SeverelyOverweight,
    Overweight,
    Underweight,
    SeverelyUnderweight,
    // weight-for-height, BMI-for-age
    Obese,
    OverweightRisk,
    Wasted,
    SeverelyWasted,
    // length/height-for-age
    Tall,
    Stunted,
    SeverelyStunted,
    // head circumference-for-age
    Macrocephaly,
    Microcephaly,
}

impl GrowthCategory {
    pub fn label(self) -> &'static str {
        match self {
            GrowthCategory::Normal => "normal",
            GrowthCategory::SeverelyOverweight => "severely overweight",
            GrowthCategory::Overweight => "overweight",
            GrowthCategory::Underweight => "underweight",
            GrowthCategory::SeverelyUnderweight => "severely underweight",
            GrowthCategory::Obese => "obese",
            GrowthCategory::OverweightRisk => "overweight risk",
            GrowthCategory::Wasted => "wasted",
            GrowthCategory::SeverelyWasted => "severely wasted",
            GrowthCategory::Tall => "tall (normal)",
            GrowthCategory::Stunted => "stunted",
            GrowthCategory::SeverelyStunted => "severely stunted",
            GrowthCategory::Macrocephaly => "macrocephaly",
            GrowthCategory::Microcephaly => "microcephaly",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            GrowthCategory::Normal | GrowthCategory::Tall => Severity::Green,
            GrowthCategory::Overweight
            | GrowthCategory::Underweight
            | GrowthCategory::OverweightRisk
            | GrowthCategory::Wasted
            | GrowthCategory::Stunted => Severity::Yellow,
            GrowthCategory::SeverelyOverweight
            | GrowthCategory::SeverelyUnderweight
            | GrowthCategory::Obese
            | GrowthCategory::SeverelyWasted
            | GrowthCategory::SeverelyStunted
            | GrowthCategory::Macrocephaly
            | GrowthCategory::Microcephaly => Severity::Red,
        }
    }
}

/// Classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: GrowthCategory,
    pub severity: Severity,
}

impl From<GrowthCategory> for Classification {
    fn from(category: GrowthCategory) -> Self {
        Self {
            category,
            severity: category.severity(),
        }
    }
}

impl Classification {
    pub fn label(&self) -> &'static str {
        self.category.label()
    }
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub indicator: GrowthIndicator,
    pub sex: Sex,
    pub band: String,
    pub source: String,
    pub x_axis: XAxis,
    pub y_unit: String,
    pub grid: CurveGrid,
    pub trajectory: Vec<(f64, f64)>,
    pub latest: Option<LatestPoint>,
}

/// Fitted band values on an evenly spaced x grid.
///
/// `bands[i][j]` is band `SdBand::ALL[i]` at `x[j]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub x: Vec<f64>,
    pub bands: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatestPoint {
    pub x: f64,
    pub value: f64,
    pub classification: Classification,
}
