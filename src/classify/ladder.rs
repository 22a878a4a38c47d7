//! Indicator-specific decision ladders.
//!
//! Each ladder compares a measured value against the seven band values at the
//! subject's x. Branches are tested top-down, so where two ranges share a
//! boundary the earlier branch wins.

use crate::domain::{BandValues, Classification, GrowthCategory, GrowthIndicator, SdBand};

/// Classify `value` against precomputed band values.
pub fn classify_value(indicator: GrowthIndicator, bands: &BandValues, value: f64) -> Classification {
    let category = match indicator {
        GrowthIndicator::WeightForAge => weight_for_age(bands, value),
        GrowthIndicator::WeightForHeight | GrowthIndicator::BmiForAge => weight_for_height(bands, value),
        GrowthIndicator::LengthHeightForAge => height_for_age(bands, value),
        GrowthIndicator::HeadCircumferenceForAge => head_circumference(bands, value),
    };
    Classification::from(category)
}

fn weight_for_age(b: &BandValues, v: f64) -> GrowthCategory {
    if v > b.get(SdBand::Sd3) {
        GrowthCategory::SeverelyOverweight
    } else if v > b.get(SdBand::Sd2) {
        GrowthCategory::Overweight
    } else if v >= b.get(SdBand::Sd2Neg) {
        GrowthCategory::Normal
    } else if v > b.get(SdBand::Sd3Neg) {
        GrowthCategory::Underweight
    } else {
        GrowthCategory::SeverelyUnderweight
    }
}

// Wasted is [SD3neg, SD2neg]; a value exactly at SD2neg is caught by the
// normal branch first.
fn weight_for_height(b: &BandValues, v: f64) -> GrowthCategory {
    if v > b.get(SdBand::Sd3) {
        GrowthCategory::Obese
    } else if v > b.get(SdBand::Sd2) {
        GrowthCategory::OverweightRisk
    } else if v >= b.get(SdBand::Sd2Neg) {
        GrowthCategory::Normal
    } else if v >= b.get(SdBand::Sd3Neg) {
        GrowthCategory::Wasted
    } else {
        GrowthCategory::SeverelyWasted
    }
}

fn height_for_age(b: &BandValues, v: f64) -> GrowthCategory {
    if v > b.get(SdBand::Sd2) {
        GrowthCategory::Tall
    } else if v >= b.get(SdBand::Sd2Neg) {
        GrowthCategory::Normal
    } else if v >= b.get(SdBand::Sd3Neg) {
        GrowthCategory::Stunted
    } else {
        GrowthCategory::SeverelyStunted
    }
}

fn head_circumference(b: &BandValues, v: f64) -> GrowthCategory {
    if v > b.get(SdBand::Sd2) {
        GrowthCategory::Macrocephaly
    } else if v >= b.get(SdBand::Sd2Neg) {
        GrowthCategory::Normal
    } else {
        GrowthCategory::Microcephaly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    // SD3neg..SD3 = 7, 8, 9, 10, 11, 12, 13
    fn bands() -> BandValues {
        BandValues([7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0])
    }

    fn label(indicator: GrowthIndicator, v: f64) -> &'static str {
        classify_value(indicator, &bands(), v).label()
    }

    #[test]
    fn weight_for_age_ladder() {
        let wfa = GrowthIndicator::WeightForAge;
        assert_eq!(label(wfa, 13.5), "severely overweight");
        assert_eq!(label(wfa, 13.0), "overweight");
        assert_eq!(label(wfa, 12.0), "normal");
        assert_eq!(label(wfa, 8.0), "normal");
        assert_eq!(label(wfa, 7.5), "underweight");
        assert_eq!(label(wfa, 7.0), "severely underweight");
    }

    #[test]
    fn weight_for_height_overlap_resolves_to_normal() {
        let wfh = GrowthIndicator::WeightForHeight;
        assert_eq!(label(wfh, 14.0), "obese");
        assert_eq!(label(wfh, 12.5), "overweight risk");
        assert_eq!(label(wfh, 8.0), "normal");
        assert_eq!(label(wfh, 7.999), "wasted");
        assert_eq!(label(wfh, 7.0), "wasted");
        assert_eq!(label(wfh, 6.9), "severely wasted");
        assert_eq!(label(GrowthIndicator::BmiForAge, 6.9), "severely wasted");
    }

    #[test]
    fn height_for_age_ladder() {
        let lhfa = GrowthIndicator::LengthHeightForAge;
        let tall = classify_value(lhfa, &bands(), 12.5);
        assert_eq!(tall.category, GrowthCategory::Tall);
        assert_eq!(tall.severity, Severity::Green);
        assert_eq!(label(lhfa, 8.0), "normal");
        assert_eq!(label(lhfa, 7.0), "stunted");
        assert_eq!(label(lhfa, 6.0), "severely stunted");
    }

    #[test]
    fn head_circumference_ladder() {
        let hcfa = GrowthIndicator::HeadCircumferenceForAge;
        assert_eq!(label(hcfa, 12.1), "macrocephaly");
        assert_eq!(label(hcfa, 12.0), "normal");
        assert_eq!(label(hcfa, 7.9), "microcephaly");
    }
}
