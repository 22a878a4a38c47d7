//! Band curve fitting for one reference table.
//!
//! Given a `ReferenceTable` (sorted, one row per x), we fit a degree-5
//! polynomial independently to each of the seven SD columns and return them
//! as a `FittedCurveSet`. No goodness-of-fit check is applied.

use tracing::debug;

use crate::domain::{AgeBand, BandValues, GrowthIndicator, ReferenceTable, SdBand, Sex};
use crate::error::GrowthError;
use crate::math::Polynomial;

/// Polynomial degree for every band curve.
pub const CURVE_DEGREE: usize = 5;

/// Minimum distinct x-values needed to fit `CURVE_DEGREE`.
pub const MIN_REFERENCE_ROWS: usize = CURVE_DEGREE + 1;

/// Seven fitted band curves for one indicator × sex × age band.
#[derive(Debug, Clone)]
pub struct FittedCurveSet {
    pub indicator: GrowthIndicator,
    pub sex: Sex,
    pub band: &'static AgeBand,
    /// x-range of the reference rows the curves were fitted on.
    pub x_min: f64,
    pub x_max: f64,
    curves: Vec<Polynomial>,
}

impl FittedCurveSet {
    /// Evaluate one band at `x` (extrapolates outside `[x_min, x_max]`).
    pub fn eval(&self, band: SdBand, x: f64) -> f64 {
        self.curves[band.index()].eval(x)
    }

    /// Evaluate all seven bands at `x`.
    pub fn eval_all(&self, x: f64) -> BandValues {
        let mut out = [0.0; 7];
        for band in SdBand::ALL {
            out[band.index()] = self.eval(band, x);
        }
        BandValues(out)
    }

    /// Clamp `x` into the fitted range.
    pub fn clip_x(&self, x: f64) -> f64 {
        x.clamp(self.x_min, self.x_max)
    }

    /// `n` evenly spaced points of one band over `[x0, x1]`.
    pub fn sample(&self, band: SdBand, x0: f64, x1: f64, n: usize) -> Vec<(f64, f64)> {
        let n = n.max(2);
        (0..n)
            .map(|i| {
                let u = i as f64 / (n as f64 - 1.0);
                let x = x0 + u * (x1 - x0);
                (x, self.eval(band, x))
            })
            .collect()
    }
}

/// Fit all seven band curves of a reference table.
pub fn fit_curve_set(table: &ReferenceTable) -> Result<FittedCurveSet, GrowthError> {
    let Some((x_min, x_max)) = table.x_range() else {
        return Err(GrowthError::InsufficientReference {
            path: table.source.clone(),
            rows: 0,
            needed: MIN_REFERENCE_ROWS,
        });
    };
    if table.len() < MIN_REFERENCE_ROWS {
        return Err(GrowthError::InsufficientReference {
            path: table.source.clone(),
            rows: table.len(),
            needed: MIN_REFERENCE_ROWS,
        });
    }

    let xs = table.xs();
    let mut curves = Vec::with_capacity(SdBand::ALL.len());
    for band in SdBand::ALL {
        let ys = table.column(band);
        let poly = Polynomial::fit(&xs, &ys, CURVE_DEGREE).ok_or(GrowthError::FitFailed { band })?;
        curves.push(poly);
    }

    debug!(
        indicator = table.indicator.code(),
        sex = table.sex.file_tag(),
        band = table.band.id,
        rows = table.len(),
        "fitted band curves"
    );

    Ok(FittedCurveSet {
        indicator: table.indicator,
        sex: table.sex,
        band: table.band,
        x_min,
        x_max,
        curves,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::ReferenceRow;

    /// A smooth, WHO-like weight-for-age table (0..=24 months) with bands
    /// spread proportionally around the median.
    pub(crate) fn sample_wfa_table() -> ReferenceTable {
        let band = &GrowthIndicator::WeightForAge.bands()[0];
        let rows = (0..=24)
            .map(|m| {
                let x = m as f64;
                let median = 3.3 + 4.2 * (1.0 - (-x / 6.0).exp()) + 0.2 * x;
                let sd = 0.11 * median;
                let mut values = [0.0; 7];
                for (i, z) in (-3..=3).enumerate() {
                    values[i] = median + z as f64 * sd;
                }
                ReferenceRow { x, sd: values }
            })
            .collect();
        ReferenceTable::new(
            GrowthIndicator::WeightForAge,
            Sex::Male,
            band,
            PathBuf::from("wfa_boys_0_2.csv"),
            rows,
        )
    }

    #[test]
    fn fitted_bands_are_ordered_across_range() {
        let table = sample_wfa_table();
        let curves = fit_curve_set(&table).unwrap();

        for i in 0..=240 {
            let x = i as f64 * 0.1;
            let v = curves.eval_all(x);
            for w in SdBand::ALL.windows(2) {
                assert!(
                    v.get(w[0]) < v.get(w[1]),
                    "bands out of order at x={x}: {} >= {}",
                    w[0],
                    w[1]
                );
            }
        }
    }

    #[test]
    fn fit_tracks_reference_median() {
        let table = sample_wfa_table();
        let curves = fit_curve_set(&table).unwrap();
        for row in table.rows() {
            let fitted = curves.eval(SdBand::Sd0, row.x);
            assert!(
                (fitted - row.get(SdBand::Sd0)).abs() < 0.05,
                "x={} fitted={fitted} ref={}",
                row.x,
                row.get(SdBand::Sd0)
            );
        }
    }

    #[test]
    fn clip_x_clamps_to_reference_range() {
        let curves = fit_curve_set(&sample_wfa_table()).unwrap();
        assert_eq!(curves.clip_x(-2.0), 0.0);
        assert_eq!(curves.clip_x(30.0), 24.0);
        assert_eq!(curves.clip_x(12.5), 12.5);
    }

    #[test]
    fn too_few_rows_is_an_error() {
        let table = sample_wfa_table();
        let short = ReferenceTable::new(
            table.indicator,
            table.sex,
            table.band,
            table.source.clone(),
            table.rows()[..4].to_vec(),
        );
        let err = fit_curve_set(&short).unwrap_err();
        assert!(matches!(err, GrowthError::InsufficientReference { rows: 4, needed: 6, .. }));
    }
}
