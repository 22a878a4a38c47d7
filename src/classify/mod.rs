//! Growth-status classification.
//!
//! `classify` evaluates the fitted band curves at the observation's x and
//! hands the band values to the indicator's decision ladder. It is a pure
//! function of its inputs.

pub mod ladder;

pub use ladder::*;

use crate::domain::{BandValues, Classification, Observation};
use crate::fit::FittedCurveSet;

/// A classification together with the band values it was decided on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub observation: Observation,
    /// x actually used for evaluation (clipped into the reference range).
    pub x_eval: f64,
    pub bands: BandValues,
    pub classification: Classification,
}

/// Classify an observation against a fitted curve set.
///
/// The observation's x is clipped into the curves' reference range first, so
/// subjects beyond the table edges are compared against the edge values
/// rather than an extrapolated polynomial.
pub fn classify(curves: &FittedCurveSet, obs: &Observation) -> Classification {
    assess(curves, obs).classification
}

/// Like `classify`, but also returns the evaluated band values.
pub fn assess(curves: &FittedCurveSet, obs: &Observation) -> Assessment {
    let x_eval = curves.clip_x(obs.x);
    let bands = curves.eval_all(x_eval);
    let classification = classify_value(curves.indicator, &bands, obs.value);
    Assessment {
        observation: *obs,
        x_eval,
        bands,
        classification,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::{GrowthCategory, GrowthIndicator, ReferenceRow, ReferenceTable, SdBand, Severity, Sex};
    use crate::fit::fit_curve_set;

    /// Linear bands with SD2neg=8 and SD2=12 at 12 months.
    fn table_centered_at_12() -> ReferenceTable {
        let at_12 = [6.5, 8.0, 9.0, 10.0, 11.0, 12.0, 14.0];
        let rows = (0..=24)
            .map(|m| {
                let x = m as f64;
                let mut sd = at_12;
                for v in sd.iter_mut() {
                    *v += 0.1 * (x - 12.0);
                }
                ReferenceRow { x, sd }
            })
            .collect();
        ReferenceTable::new(
            GrowthIndicator::WeightForAge,
            Sex::Female,
            &GrowthIndicator::WeightForAge.bands()[0],
            PathBuf::from("wfa_girls_0_2.csv"),
            rows,
        )
    }

    fn obs(x: f64, value: f64) -> Observation {
        Observation {
            x,
            value,
            sex: Sex::Female,
        }
    }

    #[test]
    fn end_to_end_weight_for_age_at_twelve_months() {
        let curves = fit_curve_set(&table_centered_at_12()).unwrap();

        let normal = classify(&curves, &obs(12.0, 10.0));
        assert_eq!(normal.category, GrowthCategory::Normal);
        assert_eq!(normal.severity, Severity::Green);

        let over = classify(&curves, &obs(12.0, 13.0));
        assert_eq!(over.category, GrowthCategory::Overweight);
        assert_eq!(over.severity, Severity::Yellow);

        let under = classify(&curves, &obs(12.0, 6.0));
        assert_eq!(under.category, GrowthCategory::SeverelyUnderweight);
        assert_eq!(under.severity, Severity::Red);
    }

    #[test]
    fn value_at_fitted_sd2neg_is_normal() {
        let curves = fit_curve_set(&table_centered_at_12()).unwrap();
        for &x in &[3.0, 12.0, 20.5] {
            let at_boundary = curves.eval(SdBand::Sd2Neg, x);
            let c = classify(&curves, &obs(x, at_boundary));
            assert_eq!(c.category, GrowthCategory::Normal, "x={x}");
        }
    }

    #[test]
    fn classification_is_pure() {
        let curves = fit_curve_set(&table_centered_at_12()).unwrap();
        let o = obs(7.25, 8.4);
        assert_eq!(assess(&curves, &o), assess(&curves, &o));
        assert_eq!(classify(&curves, &o), classify(&curves, &o));
    }

    #[test]
    fn observations_beyond_range_are_clipped() {
        let curves = fit_curve_set(&table_centered_at_12()).unwrap();
        let a = assess(&curves, &obs(40.0, 10.0));
        assert_eq!(a.x_eval, 24.0);
        let edge = curves.eval_all(24.0);
        assert_eq!(a.bands, edge);
    }
}
