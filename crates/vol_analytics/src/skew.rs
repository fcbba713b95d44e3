//! Implied-volatility skew curve fitting.
//!
//! For each (trading day, DTE bucket) the fitter turns scattered
//! per-contract (moneyness, IV) observations into a smooth curve
//! `moneyness → IV`. The algorithm is pinned — it encodes a deliberate
//! accuracy bias toward at-the-money, where downstream pricing reads the
//! curve:
//!
//! 1. drop observations with null moneyness or IV;
//! 2. deduplicate by moneyness, first occurrence wins;
//! 3. unit weights everywhere, then multiply the weight of the point
//!    nearest moneyness 0.5 by 10 (the ATM anchor);
//! 4. sort by moneyness and fit an interpolating piecewise-linear spline
//!    with flat extrapolation beyond the observed range.
//!
//! Groups with fewer than 2 distinct moneyness points yield no curve; the
//! bucket is omitted from the result, never an error.

use std::collections::BTreeMap;

use tracing::debug;
use vol_core::math::interpolate::WeightedLinearSpline;
use vol_core::types::Date;

use crate::rows::SkewRow;

/// The moneyness treated as at-the-money.
pub const ATM_MONEYNESS: f64 = 0.5;

/// Weight multiplier for the observation nearest at-the-money.
pub const ATM_ANCHOR_WEIGHT: f64 = 10.0;

/// A fitted skew curve for one (trading day, DTE) bucket.
///
/// # Examples
/// ```
/// use vol_analytics::rows::SkewRow;
/// use vol_analytics::skew::fit_skew_curves;
/// use vol_core::types::Date;
///
/// let day = Date::from_ymd(2024, 3, 15).unwrap();
/// let rows: Vec<SkewRow> = [(0.0, 0.20), (0.5, 0.18), (1.0, 0.22)]
///     .iter()
///     .map(|&(m, iv)| SkewRow {
///         trade_date: day,
///         dte: 30,
///         moneyness: Some(m),
///         iv: Some(iv),
///     })
///     .collect();
///
/// let curves = fit_skew_curves(&rows);
/// let curve = &curves[&day][&30];
/// assert!((curve.iv(0.5) - 0.18).abs() < 1e-12); // exact at nodes
/// assert!((curve.iv(1.5) - 0.22).abs() < 1e-12); // flat beyond range
/// ```
#[derive(Debug, Clone)]
pub struct SkewCurve {
    dte: i32,
    spline: WeightedLinearSpline,
}

impl SkewCurve {
    /// Days to expiry of the bucket this curve was fitted for.
    #[inline]
    pub fn dte(&self) -> i32 {
        self.dte
    }

    /// Implied volatility at the given moneyness.
    ///
    /// Flat beyond the observed moneyness range.
    #[inline]
    pub fn iv(&self, moneyness: f64) -> f64 {
        self.spline.eval(moneyness)
    }

    /// Implied volatility at the ATM moneyness (0.5).
    #[inline]
    pub fn atm(&self) -> f64 {
        self.iv(ATM_MONEYNESS)
    }

    /// The observed moneyness range the fit covers.
    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        self.spline.domain()
    }
}

/// Skew curves for one trading day, keyed by DTE.
pub type DaySkewCurves = BTreeMap<i32, SkewCurve>;

/// Fits skew curves from raw observations, grouped by day then DTE.
///
/// Input order matters only for deduplication: when two observations share
/// a moneyness, the first-seen row wins. Buckets that end with fewer than
/// 2 usable points are omitted.
pub fn fit_skew_curves(rows: &[SkewRow]) -> BTreeMap<Date, DaySkewCurves> {
    // Group usable observations, deduplicating by moneyness (first wins).
    let mut grouped: BTreeMap<Date, BTreeMap<i32, Vec<(f64, f64)>>> = BTreeMap::new();

    for row in rows {
        let (moneyness, iv) = match (row.moneyness, row.iv) {
            (Some(m), Some(iv)) if m.is_finite() && iv.is_finite() => (m, iv),
            _ => continue,
        };

        let bucket = grouped
            .entry(row.trade_date)
            .or_default()
            .entry(row.dte)
            .or_default();

        if bucket.iter().any(|&(m, _)| m == moneyness) {
            continue;
        }
        bucket.push((moneyness, iv));
    }

    let mut curves: BTreeMap<Date, DaySkewCurves> = BTreeMap::new();

    for (day, buckets) in grouped {
        for (dte, points) in buckets {
            match fit_bucket(dte, &points) {
                Some(curve) => {
                    curves.entry(day).or_default().insert(dte, curve);
                }
                None => {
                    debug!(%day, dte, points = points.len(), "skew bucket omitted");
                }
            }
        }
    }

    curves
}

/// Fits one (day, dte) bucket, or `None` with fewer than 2 points.
fn fit_bucket(dte: i32, points: &[(f64, f64)]) -> Option<SkewCurve> {
    if points.len() < 2 {
        return None;
    }

    let xs: Vec<f64> = points.iter().map(|&(m, _)| m).collect();
    let ys: Vec<f64> = points.iter().map(|&(_, iv)| iv).collect();
    let mut ws = vec![1.0; points.len()];

    // Anchor the fit at the observation closest to ATM.
    let anchor = nearest_to_atm(&xs)?;
    ws[anchor] *= ATM_ANCHOR_WEIGHT;

    let spline = WeightedLinearSpline::new(&xs, &ys, &ws).ok()?;
    Some(SkewCurve { dte, spline })
}

/// Index of the moneyness closest to [`ATM_MONEYNESS`]; ties keep the
/// first occurrence.
fn nearest_to_atm(xs: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in xs.iter().enumerate() {
        let distance = (x - ATM_MONEYNESS).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}
