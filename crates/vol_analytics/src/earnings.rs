//! Historical earnings decomposition.
//!
//! For every earnings event on or before a target day this module compares
//! what the options market implied against what the stock then did:
//!
//! - **realized jump** — the overnight gap attributable to the
//!   announcement (open vs. prior close for before-open events, next open
//!   vs. close for after-close events);
//! - **realized move** — the full-session move over the same boundary;
//! - **implied move** — the absolute move implied by the jump volatility
//!   extracted from the term structure bracketing the event;
//! - **straddle return** — the return on a synthetic ATM straddle bought
//!   just before the event and marked just after, with the post-event legs
//!   priced at the ex-earnings volatility one day closer to expiry.
//!
//! Each event's skew curves come from its last pre-event trading day (the
//! day itself for after-close events); the data layer supplies those rows
//! and they pair with events chronologically.

use tracing::debug;

use vol_core::types::Date;
use vol_models::contracts::{OptionKind, OptionParams, PricedOption, Quote, Side};
use vol_models::position::Position;

use crate::jump::{ex_earnings_vol, forward_vol, implied_jump_move, implied_jump_vol};
use crate::report::round4;
use crate::rows::{EarningsRow, EarningsTime, SkewRow};
use crate::skew::{fit_skew_curves, DaySkewCurves};

/// Shortest near-expiry DTE for which the ex-earnings formula is defined;
/// below it the plain forward vol stands in.
const MIN_EX_EARNINGS_DTE: i32 = 3;

/// Per-event decomposition results. Ratio fields are rounded to 4
/// decimals; absent inputs leave the corresponding field `None`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct EarningsEvent {
    /// Announcement date.
    pub earnings_date: Date,
    /// Announcement timing.
    pub earnings_time: EarningsTime,
    /// Realized announcement gap as a fractional move.
    pub realized_jump: Option<f64>,
    /// Realized full-session move as a fractional move.
    pub realized_move: Option<f64>,
    /// Absolute move implied by the pre-event term structure.
    pub abs_implied_move: Option<f64>,
    /// Synthetic straddle return through the event.
    pub straddle_return: Option<f64>,
}

/// Earnings decomposition for all historical events of a ticker.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EarningsReport {
    /// Per-event results, chronological.
    pub earnings: Vec<EarningsEvent>,
    /// Mean of |realized move| across events with data.
    pub avg_abs_realized_move: Option<f64>,
    /// Mean of |realized jump| across events with data.
    pub avg_abs_realized_jump: Option<f64>,
    /// Mean of |implied move| across events with data.
    pub avg_abs_implied_move: Option<f64>,
    /// Mean straddle return across events with data.
    pub avg_straddle_return: Option<f64>,
    /// Sum of straddle returns across events with data.
    pub cumulative_straddle_return: Option<f64>,
}

/// Computes the earnings report for a set of events.
///
/// `skew_rows` holds the IV observations for each event's bracketing
/// trading day; curves fitted from them pair with `events` in
/// chronological order. Events beyond the available curve days are still
/// reported with their realized statistics, implied fields absent.
pub fn earnings_report(events: &[EarningsRow], skew_rows: &[SkewRow]) -> EarningsReport {
    let curve_days: Vec<DaySkewCurves> = fit_skew_curves(skew_rows).into_values().collect();

    if curve_days.len() < events.len() {
        debug!(
            events = events.len(),
            curve_days = curve_days.len(),
            "fewer curve days than earnings events; implied fields limited"
        );
    }

    let earnings: Vec<EarningsEvent> = events
        .iter()
        .enumerate()
        .map(|(i, event)| decompose_event(event, curve_days.get(i)))
        .collect();

    let avg_abs_realized_move = mean_of(&earnings, |e| e.realized_move.map(f64::abs));
    let avg_abs_realized_jump = mean_of(&earnings, |e| e.realized_jump.map(f64::abs));
    let avg_abs_implied_move = mean_of(&earnings, |e| e.abs_implied_move.map(f64::abs));
    let avg_straddle_return = mean_of(&earnings, |e| e.straddle_return);
    let cumulative_straddle_return = sum_of(&earnings, |e| e.straddle_return);

    EarningsReport {
        earnings,
        avg_abs_realized_move,
        avg_abs_realized_jump,
        avg_abs_implied_move,
        avg_straddle_return,
        cumulative_straddle_return,
    }
}

/// Decomposes one event against its bracketing curves (if any).
fn decompose_event(event: &EarningsRow, curves: Option<&DaySkewCurves>) -> EarningsEvent {
    // Price boundaries depend on announcement timing.
    let (jump_from, jump_to, move_from, move_to, spot_before, spot_after) =
        match event.earnings_time {
            EarningsTime::Bmo => (
                event.prev_close,
                event.earnings_open,
                event.prev_close,
                event.earnings_close,
                event.prev_close,
                event.earnings_close,
            ),
            EarningsTime::Amc => (
                event.earnings_close,
                event.next_open,
                event.earnings_close,
                event.next_close,
                event.earnings_close,
                event.next_close,
            ),
        };

    let realized_jump = fractional_move(jump_from, jump_to).map(round4);
    let realized_move = fractional_move(move_from, move_to).map(round4);

    let implied = curves.and_then(implied_decomposition);

    let (abs_implied_move, straddle_return) = match implied {
        Some(decomp) => {
            let straddle = straddle_return(&decomp, spot_before, spot_after).map(round4);
            (finite_or_none(decomp.implied_move).map(round4), straddle)
        }
        None => (None, None),
    };

    EarningsEvent {
        earnings_date: event.earnings_date,
        earnings_time: event.earnings_time,
        realized_jump,
        realized_move,
        abs_implied_move,
        straddle_return,
    }
}

/// The jump decomposition read off one day's skew curves.
struct ImpliedDecomposition {
    near_dte: i32,
    near_atm: f64,
    ex_earnings: f64,
    implied_move: f64,
}

/// Runs the forward-vol → jump-vol → ex-earnings chain on a day's curves.
///
/// A leading 1-DTE bucket is skipped: the event sits inside it, so it
/// carries the jump itself rather than bracketing it. Requires two buckets
/// after the skip.
fn implied_decomposition(curves: &DaySkewCurves) -> Option<ImpliedDecomposition> {
    let buckets: Vec<(i32, f64)> = curves
        .iter()
        .map(|(&dte, curve)| (dte, curve.atm()))
        .collect();

    let skip = usize::from(buckets.first().is_some_and(|&(dte, _)| dte == 1));

    let &(near_dte, near_atm) = buckets.get(skip)?;
    let &(far_dte, far_atm) = buckets.get(skip + 1)?;

    let sigma12 = forward_vol(near_atm, near_dte as f64, far_atm, far_dte as f64);
    let sigma_jump = implied_jump_vol(sigma12, far_atm, far_dte as f64);

    // Below 3 DTE the ex-earnings formula degenerates; the forward vol
    // between the bracketing expiries stands in.
    let ex_earnings = if near_dte >= MIN_EX_EARNINGS_DTE {
        ex_earnings_vol(near_atm, sigma_jump, near_dte as f64)
    } else {
        sigma12
    };

    Some(ImpliedDecomposition {
        near_dte,
        near_atm,
        ex_earnings,
        implied_move: implied_jump_move(sigma_jump),
    })
}

/// Return on the synthetic before/after straddle pair.
///
/// Before: long ATM call + put struck at the pre-event spot, near DTE,
/// priced at the near expiry's ATM skew vol, zero rate. After: same
/// strike, post-event spot, one day closer to expiry, priced at the
/// ex-earnings vol. Unpriceable legs leave the return absent.
fn straddle_return(
    decomp: &ImpliedDecomposition,
    spot_before: Option<f64>,
    spot_after: Option<f64>,
) -> Option<f64> {
    let spot_before = spot_before.filter(|&s| s > 0.0)?;
    let spot_after = spot_after.filter(|&s| s > 0.0)?;

    let before = straddle(
        spot_before,
        spot_before,
        decomp.near_dte as f64,
        decomp.near_atm,
    )?;
    let after = straddle(
        spot_after,
        spot_before,
        (decomp.near_dte - 1) as f64,
        decomp.ex_earnings,
    )?;

    let before_price = before.price().filter(|&p| p > 0.0)?;
    let after_price = after.price()?;

    Some((after_price - before_price) / before_price)
}

/// Builds a long call + put straddle, or `None` on invalid inputs.
fn straddle(spot: f64, strike: f64, dte: f64, vol: f64) -> Option<Position> {
    if !vol.is_finite() || vol <= 0.0 || dte < 0.0 {
        return None;
    }

    let call = OptionParams::new(
        Side::Long,
        OptionKind::Call,
        spot,
        strike,
        dte,
        0.0,
        Quote::Volatility(vol),
    )
    .ok()?;
    let put = OptionParams::new(
        Side::Long,
        OptionKind::Put,
        spot,
        strike,
        dte,
        0.0,
        Quote::Volatility(vol),
    )
    .ok()?;

    Some(Position::with_legs(vec![
        PricedOption::derive(call),
        PricedOption::derive(put),
    ]))
}

/// `(to - from) / from` when both prices are present and the base is
/// non-zero.
fn fractional_move(from: Option<f64>, to: Option<f64>) -> Option<f64> {
    let from = from.filter(|&p| p != 0.0)?;
    let to = to?;
    Some((to - from) / from)
}

/// Mean of `f` over events where it is present; rounded to 4 decimals.
fn mean_of<F>(events: &[EarningsEvent], f: F) -> Option<f64>
where
    F: Fn(&EarningsEvent) -> Option<f64>,
{
    let values: Vec<f64> = events.iter().filter_map(&f).collect();
    if values.is_empty() {
        return None;
    }
    Some(round4(values.iter().sum::<f64>() / values.len() as f64))
}

/// Sum of `f` over events where it is present; rounded to 4 decimals.
fn sum_of<F>(events: &[EarningsEvent], f: F) -> Option<f64>
where
    F: Fn(&EarningsEvent) -> Option<f64>,
{
    let values: Vec<f64> = events.iter().filter_map(&f).collect();
    if values.is_empty() {
        return None;
    }
    Some(round4(values.iter().sum()))
}

/// Maps NaN and infinite values to `None`.
fn finite_or_none(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
