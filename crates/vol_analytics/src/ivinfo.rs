//! Per-expiry implied-volatility report for one trading day.
//!
//! For each DTE bucket of a day's fitted skew surface this report samples
//! the curve across the moneyness range, derives the standard skew ratios,
//! and — when the next earnings date is known — removes the embedded
//! earnings jump from every post-earnings expiry via the jump
//! decomposition chain.

use std::collections::BTreeMap;

use vol_core::types::Date;

use crate::jump::{ex_earnings_vol, forward_vol, implied_jump_move, implied_jump_vol};
use crate::report::round4;
use crate::skew::DaySkewCurves;

/// Shortest DTE for which the ex-earnings formula is defined; shorter
/// expiries fall back to the bracketing forward vol.
const MIN_EX_EARNINGS_DTE: i32 = 3;

/// IV metrics for one expiry bucket. All fields rounded to 4 decimals.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ExpiryIvInfo {
    /// Days to expiry of the bucket.
    pub dte: i32,
    /// IV at moneyness 0.0 (deep put wing).
    pub iv0: f64,
    /// IV at moneyness 0.1.
    pub iv10: f64,
    /// IV at moneyness 0.2.
    pub iv20: f64,
    /// IV at moneyness 0.3.
    pub iv30: f64,
    /// IV at moneyness 0.4.
    pub iv40: f64,
    /// IV at moneyness 0.5 (at-the-money).
    pub iv50: f64,
    /// IV at moneyness 0.6.
    pub iv60: f64,
    /// IV at moneyness 0.7.
    pub iv70: f64,
    /// IV at moneyness 0.8.
    pub iv80: f64,
    /// IV at moneyness 0.9.
    pub iv90: f64,
    /// IV at moneyness 1.0 (deep call wing).
    pub iv100: f64,
    /// Put wing over call wing: iv(0) / iv(1).
    #[serde(rename = "0_100_skew")]
    pub skew_0_100: f64,
    /// iv(0.25) / iv(0.75).
    #[serde(rename = "25_75_skew")]
    pub skew_25_75: f64,
    /// iv(0.25) / iv(0.5).
    #[serde(rename = "25_50_skew")]
    pub skew_25_50: f64,
    /// iv(0) / iv(0.5).
    #[serde(rename = "0_50_skew")]
    pub skew_0_50: f64,
    /// iv(0.5) / iv(0.75).
    #[serde(rename = "50_75_skew")]
    pub skew_50_75: f64,
    /// iv(0.5) / iv(1).
    #[serde(rename = "50_100_skew")]
    pub skew_50_100: f64,
    /// One-day move implied by the ATM vol: iv(0.5) / sqrt(252).
    pub implied_daily_move: f64,
    /// ATM IV with the next-earnings jump removed; plain ATM IV for
    /// expiries before the event. Absent when the decomposition is
    /// undefined.
    pub iv_earnings_removed: Option<f64>,
}

/// The full per-day IV report.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IvInfoReport {
    /// Per-expiry metrics keyed by expiry date (ISO 8601 string).
    pub expiries: BTreeMap<String, ExpiryIvInfo>,
    /// Next earnings date, when known.
    pub next_earnings_date: Option<Date>,
    /// Days from the trade date to the next earnings.
    pub next_earnings_dte: Option<i64>,
    /// Absolute move implied for the next earnings event.
    pub next_earnings_implied_move: Option<f64>,
    /// Near ATM IV over far ATM IV; `None` with a single bucket.
    pub term_structure_slope: Option<f64>,
}

/// Builds the IV report for one day's skew curves.
///
/// `next_earnings_date` drives the jump decomposition: the first two
/// expiries strictly after it bracket the event. Without it (or without
/// two such expiries) the jump fields are absent and every expiry reports
/// its plain ATM IV as `iv_earnings_removed`.
pub fn iv_info(
    curves: &DaySkewCurves,
    trade_date: Date,
    next_earnings_date: Option<Date>,
) -> IvInfoReport {
    let earnings_dte = next_earnings_date.map(|date| date - trade_date);

    // Bracket the event: first two buckets strictly beyond the earnings DTE.
    let jump_chain = earnings_dte.and_then(|edte| {
        let mut beyond = curves
            .iter()
            .filter(|(&dte, _)| i64::from(dte) > edte)
            .map(|(&dte, curve)| (dte, curve.atm()));
        let near = beyond.next()?;
        let far = beyond.next()?;

        let sigma12 = forward_vol(near.1, near.0 as f64, far.1, far.0 as f64);
        let sigma_jump = implied_jump_vol(sigma12, far.1, far.0 as f64);
        Some((sigma12, sigma_jump))
    });

    let mut expiries = BTreeMap::new();
    for (&dte, curve) in curves {
        let atm = curve.atm();

        let iv_earnings_removed = match (earnings_dte, jump_chain) {
            (Some(edte), Some((sigma12, sigma_jump))) if i64::from(dte) > edte => {
                let cleaned = if dte >= MIN_EX_EARNINGS_DTE {
                    ex_earnings_vol(atm, sigma_jump, dte as f64)
                } else {
                    sigma12
                };
                finite_or_none(cleaned).map(round4)
            }
            _ => finite_or_none(atm).map(round4),
        };

        let expiry = trade_date.add_days(i64::from(dte)).to_string();
        expiries.insert(
            expiry,
            ExpiryIvInfo {
                dte,
                iv0: round4(curve.iv(0.0)),
                iv10: round4(curve.iv(0.10)),
                iv20: round4(curve.iv(0.20)),
                iv30: round4(curve.iv(0.30)),
                iv40: round4(curve.iv(0.40)),
                iv50: round4(curve.iv(0.50)),
                iv60: round4(curve.iv(0.60)),
                iv70: round4(curve.iv(0.70)),
                iv80: round4(curve.iv(0.80)),
                iv90: round4(curve.iv(0.90)),
                iv100: round4(curve.iv(1.0)),
                skew_0_100: round4(curve.iv(0.0) / curve.iv(1.0)),
                skew_25_75: round4(curve.iv(0.25) / curve.iv(0.75)),
                skew_25_50: round4(curve.iv(0.25) / atm),
                skew_0_50: round4(curve.iv(0.0) / atm),
                skew_50_75: round4(atm / curve.iv(0.75)),
                skew_50_100: round4(atm / curve.iv(1.0)),
                implied_daily_move: round4(atm / 252.0_f64.sqrt()),
                iv_earnings_removed,
            },
        );
    }

    let term_structure_slope = if curves.len() > 1 {
        let first = curves.values().next().map(|c| c.atm());
        let last = curves.values().next_back().map(|c| c.atm());
        match (first, last) {
            (Some(near), Some(far)) => finite_or_none(near / far).map(round4),
            _ => None,
        }
    } else {
        None
    };

    let next_earnings_implied_move = jump_chain
        .and_then(|(_, sigma_jump)| finite_or_none(implied_jump_move(sigma_jump)))
        .map(round4);

    IvInfoReport {
        expiries,
        next_earnings_date,
        next_earnings_dte: earnings_dte,
        next_earnings_implied_move,
        term_structure_slope,
    }
}

/// Maps NaN and infinite values to `None`.
fn finite_or_none(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
