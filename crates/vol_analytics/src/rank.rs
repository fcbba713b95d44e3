//! IV rank, IV percentile, and volatility cones over a lookback window.
//!
//! All three consume the same windowed series: one ATM IV scalar per
//! trading day, read off that day's term structure at a target DTE. The
//! last element of the series is the current day. Window clamping to the
//! archive's first day happens upstream via
//! [`crate::config::AnalyticsConfig::clamp_window_start`]; this module
//! receives whatever rows survived.

use tracing::debug;

use crate::report::round4;
use crate::rows::SkewRow;
use crate::skew::fit_skew_curves;
use crate::term::fit_term_structures;

/// IV rank and percentile for the last day of a lookback window.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct IvRank {
    /// Range-based position of current IV in the window, 0-100.
    pub iv_rank: f64,
    /// Rank-based position of current IV in the window, 0-100.
    pub iv_percentile: f64,
}

/// Quantile summary of a windowed IV series.
///
/// Serialises with the percentage-keyed field names the response contract
/// uses. Every field is rounded to 4 decimals.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct VolCone {
    /// IV of the window's last day.
    pub current_iv: f64,
    /// Population standard deviation of the series.
    pub stdev: f64,
    /// Mean of the series.
    pub mean: f64,
    /// Minimum (0th percentile).
    #[serde(rename = "0%")]
    pub p0: f64,
    /// 10th percentile.
    #[serde(rename = "10%")]
    pub p10: f64,
    /// 20th percentile.
    #[serde(rename = "20%")]
    pub p20: f64,
    /// 30th percentile.
    #[serde(rename = "30%")]
    pub p30: f64,
    /// 40th percentile.
    #[serde(rename = "40%")]
    pub p40: f64,
    /// Median (50th percentile).
    #[serde(rename = "50%")]
    pub p50: f64,
    /// 60th percentile.
    #[serde(rename = "60%")]
    pub p60: f64,
    /// 70th percentile.
    #[serde(rename = "70%")]
    pub p70: f64,
    /// 80th percentile.
    #[serde(rename = "80%")]
    pub p80: f64,
    /// 90th percentile.
    #[serde(rename = "90%")]
    pub p90: f64,
    /// Maximum (100th percentile).
    #[serde(rename = "100%")]
    pub p100: f64,
}

/// Builds the windowed IV series for a target DTE.
///
/// Fits each day's skew curves and term structure from the rows, then
/// evaluates the term structure at `target_dte`. Days whose term structure
/// cannot be fitted (fewer than 2 DTE buckets) contribute nothing.
/// Observations at non-positive DTE are ignored, as expired buckets carry
/// no forward-looking information. Output is in chronological order; the
/// final element is the window's most recent day.
pub fn iv_series(rows: &[SkewRow], target_dte: f64) -> Vec<f64> {
    let usable: Vec<SkewRow> = rows.iter().copied().filter(|row| row.dte > 0).collect();

    let skews = fit_skew_curves(&usable);
    let terms = fit_term_structures(&skews);

    // BTreeMap iteration is chronological.
    terms.values().map(|curve| curve.iv(target_dte)).collect()
}

/// IV rank and percentile of the series' last element.
///
/// - rank: `(current − min) / (max − min) × 100`, defined as 0 when the
///   window is constant (`max == min`);
/// - percentile: `(count(iv < current) + 1) / len × 100`.
///
/// Returns `None` for an empty series. Both fields rounded to 4 decimals.
pub fn iv_rank_percentile(series: &[f64]) -> Option<IvRank> {
    let (&current, _) = series.split_last()?;

    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);

    let iv_rank = if max == min {
        0.0
    } else {
        (current - min) / (max - min) * 100.0
    };

    let below = series.iter().filter(|&&iv| iv < current).count();
    let iv_percentile = (below + 1) as f64 / series.len() as f64 * 100.0;

    Some(IvRank {
        iv_rank: round4(iv_rank),
        iv_percentile: round4(iv_percentile),
    })
}

/// Volatility-cone summary of the series.
///
/// Returns `None` for an empty series. Every field rounded to 4 decimals.
pub fn vol_cone(series: &[f64]) -> Option<VolCone> {
    let (&current, _) = series.split_last()?;
    let n = series.len() as f64;

    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|iv| (iv - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = series.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    if sorted.iter().any(|iv| !iv.is_finite()) {
        debug!("vol cone series contains non-finite values");
    }

    Some(VolCone {
        current_iv: round4(current),
        stdev: round4(variance.sqrt()),
        mean: round4(mean),
        p0: round4(sorted[0]),
        p10: round4(quantile(&sorted, 0.10)),
        p20: round4(quantile(&sorted, 0.20)),
        p30: round4(quantile(&sorted, 0.30)),
        p40: round4(quantile(&sorted, 0.40)),
        p50: round4(quantile(&sorted, 0.50)),
        p60: round4(quantile(&sorted, 0.60)),
        p70: round4(quantile(&sorted, 0.70)),
        p80: round4(quantile(&sorted, 0.80)),
        p90: round4(quantile(&sorted, 0.90)),
        p100: round4(sorted[sorted.len() - 1]),
    })
}

/// Linear-interpolated quantile of a sorted slice (the numpy default
/// convention: position `q · (n − 1)` between order statistics).
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let position = q * (n - 1) as f64;
    let lower = position.floor() as usize;
    let fraction = position - lower as f64;

    if lower + 1 >= n {
        return sorted[n - 1];
    }
    sorted[lower] + fraction * (sorted[lower + 1] - sorted[lower])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ==========================================================
    // iv_rank_percentile
    // ==========================================================

    #[test]
    fn test_rank_at_window_high() {
        let series = [0.10, 0.15, 0.20, 0.25, 0.30];
        let rank = iv_rank_percentile(&series).unwrap();
        assert_relative_eq!(rank.iv_rank, 100.0, epsilon = 1e-12);
        assert_relative_eq!(rank.iv_percentile, 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rank_at_window_low() {
        let series = [0.30, 0.25, 0.20, 0.15, 0.10];
        let rank = iv_rank_percentile(&series).unwrap();
        assert_relative_eq!(rank.iv_rank, 0.0, epsilon = 1e-12);
        // No day is strictly below the current: (0 + 1) / 5 * 100
        assert_relative_eq!(rank.iv_percentile, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rank_constant_series_no_division_by_zero() {
        let series = [0.20, 0.20, 0.20];
        let rank = iv_rank_percentile(&series).unwrap();
        assert_eq!(rank.iv_rank, 0.0);
        assert!(rank.iv_rank.is_finite());
    }

    #[test]
    fn test_rank_midpoint() {
        let series = [0.10, 0.30, 0.20];
        let rank = iv_rank_percentile(&series).unwrap();
        assert_relative_eq!(rank.iv_rank, 50.0, epsilon = 1e-12);
        // One of three days strictly below: (1 + 1) / 3 * 100
        assert_relative_eq!(rank.iv_percentile, 66.6667, epsilon = 1e-4);
    }

    #[test]
    fn test_rank_empty_series() {
        assert_eq!(iv_rank_percentile(&[]), None);
    }

    // ==========================================================
    // vol_cone
    // ==========================================================

    #[test]
    fn test_cone_reference_series() {
        let series = [0.1, 0.2, 0.3, 0.4, 0.5];
        let cone = vol_cone(&series).unwrap();

        assert_relative_eq!(cone.p50, 0.3, epsilon = 1e-12);
        assert_relative_eq!(cone.p0, 0.1, epsilon = 1e-12);
        assert_relative_eq!(cone.p100, 0.5, epsilon = 1e-12);
        assert_relative_eq!(cone.current_iv, 0.5, epsilon = 1e-12);
        assert_relative_eq!(cone.mean, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_cone_quantiles_linear_interpolation() {
        // n=5: position = q * 4
        let series = [0.1, 0.2, 0.3, 0.4, 0.5];
        let cone = vol_cone(&series).unwrap();
        assert_relative_eq!(cone.p10, 0.14, epsilon = 1e-12); // 0.1 + 0.4*(0.1)
        assert_relative_eq!(cone.p20, 0.18, epsilon = 1e-12);
        assert_relative_eq!(cone.p90, 0.46, epsilon = 1e-12);
    }

    #[test]
    fn test_cone_population_stdev() {
        let series = [0.1, 0.2, 0.3, 0.4, 0.5];
        let cone = vol_cone(&series).unwrap();
        // Population stdev of [1..5]/10 = sqrt(0.02)
        assert_relative_eq!(cone.stdev, round4(0.02_f64.sqrt()), epsilon = 1e-12);
    }

    #[test]
    fn test_cone_unsorted_input() {
        let series = [0.5, 0.1, 0.4, 0.2, 0.3];
        let cone = vol_cone(&series).unwrap();
        assert_relative_eq!(cone.p50, 0.3, epsilon = 1e-12);
        // Current is the last element of the unsorted series
        assert_relative_eq!(cone.current_iv, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_cone_empty_series() {
        assert_eq!(vol_cone(&[]), None);
    }

    #[test]
    fn test_cone_rounding() {
        let series = [0.123_456_7, 0.234_567_8];
        let cone = vol_cone(&series).unwrap();
        assert_eq!(cone.p0, 0.1235);
        assert_eq!(cone.p100, 0.2346);
    }

    #[test]
    fn test_cone_serialises_percentage_keys() {
        let cone = vol_cone(&[0.1, 0.2, 0.3]).unwrap();
        let json = serde_json::to_string(&cone).unwrap();
        assert!(json.contains("\"0%\""));
        assert!(json.contains("\"50%\""));
        assert!(json.contains("\"100%\""));
        assert!(json.contains("current_iv"));
    }

    // ==========================================================
    // iv_series
    // ==========================================================

    use vol_core::types::Date;

    fn bucket(day: Date, dte: i32, iv: f64) -> Vec<SkewRow> {
        [0.0, 0.5, 1.0]
            .iter()
            .map(|&m| SkewRow {
                trade_date: day,
                dte,
                moneyness: Some(m),
                iv: Some(iv),
            })
            .collect()
    }

    #[test]
    fn test_iv_series_chronological_evaluation() {
        let d1 = Date::from_ymd(2024, 3, 14).unwrap();
        let d2 = Date::from_ymd(2024, 3, 15).unwrap();

        let mut rows = Vec::new();
        rows.extend(bucket(d1, 7, 0.30));
        rows.extend(bucket(d1, 60, 0.20));
        rows.extend(bucket(d2, 7, 0.40));
        rows.extend(bucket(d2, 60, 0.30));

        let series = iv_series(&rows, 30.0);
        assert_eq!(series.len(), 2);
        // Linear between (7, iv7) and (60, iv60) at 30 DTE
        let expected_d1 = 0.30 + (0.20 - 0.30) * (30.0 - 7.0) / (60.0 - 7.0);
        assert_relative_eq!(series[0], expected_d1, epsilon = 1e-12);
        assert!(series[1] > series[0]);
    }

    #[test]
    fn test_iv_series_skips_unfittable_days() {
        let d1 = Date::from_ymd(2024, 3, 14).unwrap();
        let d2 = Date::from_ymd(2024, 3, 15).unwrap();

        let mut rows = Vec::new();
        rows.extend(bucket(d1, 30, 0.25)); // single bucket: no term structure
        rows.extend(bucket(d2, 7, 0.40));
        rows.extend(bucket(d2, 60, 0.30));

        let series = iv_series(&rows, 30.0);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_iv_series_ignores_expired_buckets() {
        let d1 = Date::from_ymd(2024, 3, 14).unwrap();

        let mut rows = Vec::new();
        rows.extend(bucket(d1, 0, 0.90)); // expired, ignored
        rows.extend(bucket(d1, 7, 0.30));
        rows.extend(bucket(d1, 60, 0.20));

        let series = iv_series(&rows, 7.0);
        assert_eq!(series.len(), 1);
        assert_relative_eq!(series[0], 0.30, epsilon = 1e-12);
    }

    #[test]
    fn test_iv_series_empty_rows() {
        assert!(iv_series(&[], 30.0).is_empty());
    }

    // ==========================================================
    // Properties
    // ==========================================================

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Rank and percentile are always inside [0, 100] and never NaN,
            // whatever the window looks like.
            #[test]
            fn prop_rank_bounded(series in proptest::collection::vec(0.01f64..3.0, 1..40)) {
                let rank = iv_rank_percentile(&series).unwrap();
                prop_assert!((0.0..=100.0).contains(&rank.iv_rank));
                prop_assert!((0.0..=100.0).contains(&rank.iv_percentile));
            }

            // Cone quantiles are monotone in the quantile level.
            #[test]
            fn prop_cone_quantiles_monotone(series in proptest::collection::vec(0.01f64..3.0, 1..40)) {
                let cone = vol_cone(&series).unwrap();
                let levels = [
                    cone.p0, cone.p10, cone.p20, cone.p30, cone.p40, cone.p50,
                    cone.p60, cone.p70, cone.p80, cone.p90, cone.p100,
                ];
                for pair in levels.windows(2) {
                    prop_assert!(pair[1] >= pair[0] - 1e-12);
                }
            }
        }
    }
}
