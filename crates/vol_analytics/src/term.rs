//! ATM volatility term structure fitting.
//!
//! One point per DTE bucket — the skew curve evaluated at moneyness 0.5 —
//! fitted with the same interpolating-spline family as the skew layer:
//! exact at nodes, flat beyond the observed DTE range. Days with fewer
//! than 2 DTE buckets produce no curve and are omitted.

use std::collections::BTreeMap;

use tracing::debug;
use vol_core::math::interpolate::WeightedLinearSpline;
use vol_core::types::Date;

use crate::skew::DaySkewCurves;

/// A fitted term-structure curve `dte → ATM IV` for one trading day.
///
/// # Examples
/// ```
/// use vol_analytics::rows::SkewRow;
/// use vol_analytics::skew::fit_skew_curves;
/// use vol_analytics::term::fit_term_structures;
/// use vol_core::types::Date;
///
/// let day = Date::from_ymd(2024, 3, 15).unwrap();
/// let mut rows = Vec::new();
/// for (dte, iv) in [(7, 0.25), (30, 0.20), (60, 0.22)] {
///     for m in [0.0, 0.5, 1.0] {
///         rows.push(SkewRow { trade_date: day, dte, moneyness: Some(m), iv: Some(iv) });
///     }
/// }
///
/// let skews = fit_skew_curves(&rows);
/// let terms = fit_term_structures(&skews);
/// let curve = &terms[&day];
/// assert!((curve.iv(30.0) - 0.20).abs() < 1e-12);  // exact at buckets
/// assert!((curve.iv(100.0) - 0.22).abs() < 1e-12); // flat beyond range
/// ```
#[derive(Debug, Clone)]
pub struct TermStructureCurve {
    spline: WeightedLinearSpline,
}

impl TermStructureCurve {
    /// ATM implied volatility at the given days-to-expiry.
    ///
    /// Flat beyond the observed DTE range.
    #[inline]
    pub fn iv(&self, dte: f64) -> f64 {
        self.spline.eval(dte)
    }

    /// The observed DTE range the fit covers.
    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        self.spline.domain()
    }
}

/// Fits one term-structure curve per trading day from skew curves.
///
/// Days with fewer than 2 DTE buckets are omitted from the result.
pub fn fit_term_structures(
    skews_by_day: &BTreeMap<Date, DaySkewCurves>,
) -> BTreeMap<Date, TermStructureCurve> {
    let mut curves = BTreeMap::new();

    for (day, by_dte) in skews_by_day {
        match fit_day(by_dte) {
            Some(curve) => {
                curves.insert(*day, curve);
            }
            None => {
                debug!(%day, buckets = by_dte.len(), "term structure omitted");
            }
        }
    }

    curves
}

/// Fits one day's term structure, or `None` with fewer than 2 buckets.
fn fit_day(by_dte: &DaySkewCurves) -> Option<TermStructureCurve> {
    if by_dte.len() < 2 {
        return None;
    }

    // BTreeMap iteration is already DTE-ascending.
    let xs: Vec<f64> = by_dte.keys().map(|&dte| dte as f64).collect();
    let ys: Vec<f64> = by_dte.values().map(|curve| curve.atm()).collect();

    let spline = WeightedLinearSpline::interpolating(&xs, &ys).ok()?;
    Some(TermStructureCurve { spline })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::SkewRow;
    use crate::skew::fit_skew_curves;
    use approx::assert_relative_eq;

    fn day() -> Date {
        Date::from_ymd(2024, 3, 15).unwrap()
    }

    fn flat_bucket(dte: i32, iv: f64) -> Vec<SkewRow> {
        [0.0, 0.5, 1.0]
            .iter()
            .map(|&m| SkewRow {
                trade_date: day(),
                dte,
                moneyness: Some(m),
                iv: Some(iv),
            })
            .collect()
    }

    fn skews(buckets: &[(i32, f64)]) -> BTreeMap<Date, DaySkewCurves> {
        let rows: Vec<SkewRow> = buckets
            .iter()
            .flat_map(|&(dte, iv)| flat_bucket(dte, iv))
            .collect();
        fit_skew_curves(&rows)
    }

    #[test]
    fn test_reproduces_bucket_values_exactly() {
        let terms = fit_term_structures(&skews(&[(7, 0.25), (30, 0.20), (60, 0.22)]));
        let curve = &terms[&day()];
        assert_relative_eq!(curve.iv(7.0), 0.25, epsilon = 1e-15);
        assert_relative_eq!(curve.iv(30.0), 0.20, epsilon = 1e-15);
        assert_relative_eq!(curve.iv(60.0), 0.22, epsilon = 1e-15);
    }

    #[test]
    fn test_flat_extrapolation_beyond_last_bucket() {
        let terms = fit_term_structures(&skews(&[(7, 0.25), (30, 0.20), (60, 0.22)]));
        let curve = &terms[&day()];
        assert_relative_eq!(curve.iv(100.0), 0.22, epsilon = 1e-15);
        assert_relative_eq!(curve.iv(1.0), 0.25, epsilon = 1e-15);
    }

    #[test]
    fn test_interpolates_between_buckets() {
        let terms = fit_term_structures(&skews(&[(10, 0.30), (30, 0.20)]));
        let curve = &terms[&day()];
        assert_relative_eq!(curve.iv(20.0), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_single_bucket_day_omitted() {
        let terms = fit_term_structures(&skews(&[(30, 0.20)]));
        assert!(terms.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let terms = fit_term_structures(&BTreeMap::new());
        assert!(terms.is_empty());
    }

    #[test]
    fn test_domain_reports_dte_range() {
        let terms = fit_term_structures(&skews(&[(7, 0.25), (60, 0.22)]));
        assert_eq!(terms[&day()].domain(), (7.0, 60.0));
    }
}
