//! Attendance dashboard: age categories, session metrics and the
//! present/absent lists for one session date.

pub mod format;

pub use format::*;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::app::pipeline::growth_status;
use crate::domain::{MeasurementRecord, ResidentRecord, Sex};
use crate::io::reference::ReferenceLoader;

/// Life-stage categories used to group residents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum)]
pub enum AgeCategory {
    #[value(name = "bayi")]
    Infant,
    #[value(name = "baduta")]
    UnderTwo,
    #[value(name = "balita")]
    UnderFive,
    #[value(name = "pra-sekolah")]
    Preschool,
    #[value(name = "remaja")]
    SchoolAge,
    #[value(name = "dewasa")]
    Adult,
    #[value(name = "lansia")]
    Elderly,
}

impl AgeCategory {
    pub const ALL: [AgeCategory; 7] = [
        AgeCategory::Infant,
        AgeCategory::UnderTwo,
        AgeCategory::UnderFive,
        AgeCategory::Preschool,
        AgeCategory::SchoolAge,
        AgeCategory::Adult,
        AgeCategory::Elderly,
    ];

    /// Categorize an age in fractional years.
    ///
    /// Edges are mixed inclusive/exclusive: 0.5, 2 and 5 years belong to the
    /// younger category, 6 and 60 to the older one.
    pub fn from_age_years(age: f64) -> Self {
        if age <= 0.5 {
            AgeCategory::Infant
        } else if age <= 2.0 {
            AgeCategory::UnderTwo
        } else if age <= 5.0 {
            AgeCategory::UnderFive
        } else if age < 6.0 {
            AgeCategory::Preschool
        } else if age <= 18.0 {
            AgeCategory::SchoolAge
        } else if age < 60.0 {
            AgeCategory::Adult
        } else {
            AgeCategory::Elderly
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeCategory::Infant => "Bayi (0-6 bln)",
            AgeCategory::UnderTwo => "Baduta (>6 bln - 2 thn)",
            AgeCategory::UnderFive => "Balita (>2 - 5 thn)",
            AgeCategory::Preschool => "Anak Pra-Sekolah (>5 - <6 thn)",
            AgeCategory::SchoolAge => "Anak Usia Sekolah dan Remaja (6 - 18 thn)",
            AgeCategory::Adult => "Dewasa (>18 - <60 thn)",
            AgeCategory::Elderly => "Lansia (≥60 thn)",
        }
    }
}

/// Dashboard filters. `None` means "all".
#[derive(Debug, Clone, Default)]
pub struct DashboardFilter {
    pub rt: Option<String>,
    pub sex: Option<Sex>,
    /// Restricts the listings only; metrics ignore it.
    pub category: Option<AgeCategory>,
}

impl DashboardFilter {
    fn matches_population(&self, r: &ResidentRecord) -> bool {
        self.rt.as_deref().is_none_or(|rt| r.rt == rt) && self.sex.is_none_or(|s| r.sex == s)
    }
}

/// One resident in the present or absent list.
#[derive(Debug, Clone)]
pub struct AttendanceRow {
    pub resident: ResidentRecord,
    pub age_years: f64,
    pub category: AgeCategory,
    /// The session's measurement (present residents only).
    pub measurement: Option<MeasurementRecord>,
    /// Weight-for-age status for present children, "N/A" otherwise.
    pub growth_status: Option<String>,
}

/// Head count per sex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SexSplit {
    pub male: usize,
    pub female: usize,
}

impl SexSplit {
    fn add(&mut self, sex: Sex) {
        match sex {
            Sex::Male => self.male += 1,
            Sex::Female => self.female += 1,
        }
    }
}

/// Everything shown for one session date.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub total_residents: usize,
    pub visits: usize,
    /// `visits / total_residents * 100`, or 0 when there are no residents.
    pub participation_pct: f64,
    /// Present residents per category, in category order.
    pub category_counts: Vec<(AgeCategory, usize)>,
    /// Residents in the filtered region, by sex.
    pub residents_by_sex: SexSplit,
    /// Visitors of this session, by sex.
    pub visitors_by_sex: SexSplit,
    /// Distinct visitors per session date, oldest first.
    pub visit_trend: Vec<(NaiveDate, usize)>,
    pub present: Vec<AttendanceRow>,
    pub absent: Vec<AttendanceRow>,
}

/// Unique measurement dates, newest first.
pub fn available_dates(measurements: &[MeasurementRecord]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = measurements.iter().map(|m| m.date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();
    dates
}

/// One resident's measurements, oldest first.
pub fn resident_history(measurements: &[MeasurementRecord], resident_id: &str) -> Vec<MeasurementRecord> {
    let mut rows: Vec<MeasurementRecord> = measurements
        .iter()
        .filter(|m| m.resident_id == resident_id)
        .cloned()
        .collect();
    rows.sort_by_key(|m| m.date);
    rows
}

/// Distinct visitors per session date, oldest first.
///
/// Only residents matching the region and sex filters count; measurements of
/// unknown residents are ignored.
pub fn visit_trend(
    residents: &[ResidentRecord],
    measurements: &[MeasurementRecord],
    filter: &DashboardFilter,
) -> Vec<(NaiveDate, usize)> {
    let population: HashSet<&str> = residents
        .iter()
        .filter(|r| filter.matches_population(r))
        .map(|r| r.id.as_str())
        .collect();

    let mut sessions: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
    for m in measurements.iter().filter(|m| population.contains(m.resident_id.as_str())) {
        sessions.entry(m.date).or_default().insert(m.resident_id.as_str());
    }
    sessions.into_iter().map(|(date, ids)| (date, ids.len())).collect()
}

/// Build the dashboard for one session date.
pub fn build_dashboard(
    residents: &[ResidentRecord],
    measurements: &[MeasurementRecord],
    date: NaiveDate,
    filter: &DashboardFilter,
    loader: &mut ReferenceLoader,
) -> Dashboard {
    // Later rows for the same resident on the same day win.
    let session: HashMap<&str, &MeasurementRecord> = measurements
        .iter()
        .filter(|m| m.date == date)
        .map(|m| (m.resident_id.as_str(), m))
        .collect();

    let population: Vec<&ResidentRecord> = residents.iter().filter(|r| filter.matches_population(r)).collect();
    let total_residents = population.len();

    let mut category_counts: Vec<(AgeCategory, usize)> = AgeCategory::ALL.iter().map(|&c| (c, 0)).collect();
    let mut residents_by_sex = SexSplit::default();
    let mut visitors_by_sex = SexSplit::default();
    let mut present = Vec::new();
    let mut absent = Vec::new();
    let mut visits = 0usize;

    for resident in population {
        residents_by_sex.add(resident.sex);
        let age_years = resident.age_years_at(date);
        let category = AgeCategory::from_age_years(age_years);
        let measurement = session.get(resident.id.as_str()).copied();

        if measurement.is_some() {
            visits += 1;
            visitors_by_sex.add(resident.sex);
            category_counts[category as usize].1 += 1;
        }

        if filter.category.is_some_and(|c| c != category) {
            continue;
        }

        match measurement {
            Some(m) => present.push(AttendanceRow {
                resident: resident.clone(),
                age_years,
                category,
                measurement: Some(m.clone()),
                growth_status: Some(growth_status(loader, resident, m)),
            }),
            None => absent.push(AttendanceRow {
                resident: resident.clone(),
                age_years,
                category,
                measurement: None,
                growth_status: None,
            }),
        }
    }

    let by_category_then_name =
        |a: &AttendanceRow, b: &AttendanceRow| (a.category, &a.resident.full_name).cmp(&(b.category, &b.resident.full_name));
    present.sort_by(by_category_then_name);
    absent.sort_by(by_category_then_name);

    let participation_pct = if total_residents == 0 {
        0.0
    } else {
        visits as f64 / total_residents as f64 * 100.0
    };

    Dashboard {
        date,
        total_residents,
        visits,
        participation_pct,
        category_counts,
        residents_by_sex,
        visitors_by_sex,
        visit_trend: visit_trend(residents, measurements, filter),
        present,
        absent,
    }
}
