//! End-to-end property tests for the analytics pipeline.
//!
//! These exercise the documented behavioural contracts across module
//! boundaries: raw observation rows through skew fitting, term-structure
//! building, and the windowed/jump analytics on top.

use approx::assert_relative_eq;
use vol_analytics::jump::{forward_vol, implied_jump_vol};
use vol_analytics::rank::{iv_rank_percentile, iv_series, vol_cone};
use vol_analytics::rows::{EarningsRow, EarningsTime, SkewRow};
use vol_analytics::skew::fit_skew_curves;
use vol_analytics::term::fit_term_structures;
use vol_core::types::Date;

fn day(d: u32) -> Date {
    Date::from_ymd(2024, 3, d).unwrap()
}

fn skew_row(trade_date: Date, dte: i32, moneyness: f64, iv: f64) -> SkewRow {
    SkewRow {
        trade_date,
        dte,
        moneyness: Some(moneyness),
        iv: Some(iv),
    }
}

#[test]
fn skew_fit_is_exact_at_nodes_and_flat_beyond() {
    let rows = vec![
        skew_row(day(15), 30, 0.0, 0.20),
        skew_row(day(15), 30, 0.5, 0.18),
        skew_row(day(15), 30, 1.0, 0.22),
    ];

    let curves = fit_skew_curves(&rows);
    let curve = &curves[&day(15)][&30];

    assert_relative_eq!(curve.iv(0.5), 0.18, epsilon = 1e-15);
    assert_relative_eq!(curve.iv(1.5), 0.22, epsilon = 1e-15);
}

#[test]
fn term_structure_reproduces_atm_inputs_and_extrapolates_flat() {
    let mut rows = Vec::new();
    for (dte, iv) in [(7, 0.25), (30, 0.20), (60, 0.22)] {
        for m in [0.0, 0.5, 1.0] {
            rows.push(skew_row(day(15), dte, m, iv));
        }
    }

    let terms = fit_term_structures(&fit_skew_curves(&rows));
    let curve = &terms[&day(15)];

    assert_relative_eq!(curve.iv(7.0), 0.25, epsilon = 1e-12);
    assert_relative_eq!(curve.iv(60.0), 0.22, epsilon = 1e-12);
    assert_relative_eq!(curve.iv(100.0), 0.22, epsilon = 1e-12);
}

#[test]
fn forward_vol_degenerate_and_flat_cases() {
    // Same expiry on both sides: undefined
    assert!(forward_vol(0.2, 30.0, 0.2, 30.0).is_nan());

    // Flat term structure: forward vol equals the common vol exactly
    let fwd = forward_vol(0.2, 10.0, 0.2, 40.0);
    assert_relative_eq!(fwd, 0.2, epsilon = 1e-15);
}

#[test]
fn jump_vol_misorder_is_corrected() {
    // Capture the swap diagnostic instead of letting it hit stderr.
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::WARN)
        .try_init();

    let straight = implied_jump_vol(0.20, 0.30, 5.0);
    let reversed = implied_jump_vol(0.30, 0.20, 5.0);
    assert_eq!(straight, reversed);
}

#[test]
fn iv_rank_at_extremes_and_constant_window() {
    let rising = [0.10, 0.15, 0.20, 0.25, 0.30];
    let rank = iv_rank_percentile(&rising).unwrap();
    assert_relative_eq!(rank.iv_rank, 100.0, epsilon = 1e-12);
    assert_relative_eq!(rank.iv_percentile, 100.0, epsilon = 1e-12);

    let constant = [0.20, 0.20, 0.20, 0.20];
    let rank = iv_rank_percentile(&constant).unwrap();
    assert_eq!(rank.iv_rank, 0.0);
}

#[test]
fn vol_cone_reference_quantiles() {
    let cone = vol_cone(&[0.1, 0.2, 0.3, 0.4, 0.5]).unwrap();
    assert_relative_eq!(cone.p50, 0.3, epsilon = 1e-12);
    assert_relative_eq!(cone.p0, 0.1, epsilon = 1e-12);
    assert_relative_eq!(cone.p100, 0.5, epsilon = 1e-12);
}

#[test]
fn windowed_series_feeds_rank_and_cone() {
    // Five trading days, each with a 2-bucket term structure whose 30-DTE
    // read rises monotonically.
    let mut rows = Vec::new();
    for (i, d) in (11..=15).enumerate() {
        let level = 0.20 + i as f64 * 0.02;
        for m in [0.0, 0.5, 1.0] {
            rows.push(skew_row(day(d), 7, m, level + 0.05));
            rows.push(skew_row(day(d), 60, m, level));
        }
    }

    let series = iv_series(&rows, 30.0);
    assert_eq!(series.len(), 5);
    assert!(series.windows(2).all(|w| w[1] > w[0]));

    let rank = iv_rank_percentile(&series).unwrap();
    assert_relative_eq!(rank.iv_rank, 100.0, epsilon = 1e-9);
    assert_relative_eq!(rank.iv_percentile, 100.0, epsilon = 1e-9);

    let cone = vol_cone(&series).unwrap();
    assert!(cone.p0 < cone.p50 && cone.p50 < cone.p100);
    assert_relative_eq!(cone.current_iv, cone.p100, epsilon = 1e-9);
}

#[test]
fn earnings_report_full_pipeline() {
    use vol_analytics::earnings::earnings_report;

    let pre_event = day(14);
    let mut rows = Vec::new();
    for (dte, iv) in [(5, 0.40), (33, 0.30)] {
        for m in [0.0, 0.5, 1.0] {
            rows.push(skew_row(pre_event, dte, m, iv));
        }
    }

    let event = EarningsRow {
        earnings_date: day(15),
        earnings_time: EarningsTime::Bmo,
        prev_close: Some(100.0),
        earnings_open: Some(106.0),
        earnings_close: Some(105.0),
        next_open: None,
        next_close: None,
    };

    let report = earnings_report(&[event], &rows);
    assert_eq!(report.earnings.len(), 1);

    let decomposed = &report.earnings[0];
    assert_relative_eq!(decomposed.realized_jump.unwrap(), 0.06, epsilon = 1e-12);
    assert_relative_eq!(decomposed.realized_move.unwrap(), 0.05, epsilon = 1e-12);
    assert!(decomposed.abs_implied_move.unwrap() > 0.0);
    assert!(decomposed.straddle_return.is_some());

    assert!(report.avg_abs_realized_move.is_some());
    assert!(report.cumulative_straddle_return.is_some());
}

#[test]
fn unpriceable_rows_filtered_from_price_chain_only() {
    use vol_analytics::chain::{price_chain, quote_chain};
    use vol_analytics::rows::QuoteRow;

    let trade_date = day(15);
    let expiry = trade_date.add_days(30);

    // One fair row and one priced far above any no-arbitrage bound
    let fair = QuoteRow {
        expiry_date: expiry,
        strike: 100.0,
        adj_strike: 100.0,
        option_type: 'C',
        spot_price: 100.0,
        bid_price: 3.30,
        ask_price: 3.60,
        interpolated_price: 3.45,
        volume: 10,
        open_interest: 50,
        rate: None,
        ask_iv: None,
        total_adjustment_factor: 1.0,
    };
    let broken = QuoteRow {
        interpolated_price: 180.0,
        bid_price: 180.0,
        ask_price: 180.0,
        ..fair.clone()
    };

    let priced = price_chain(&[fair.clone(), broken.clone()], trade_date, None).unwrap();
    assert_eq!(priced[&expiry.to_string()].calls.len(), 1);

    let quoted = quote_chain(&[fair, broken], trade_date, None).unwrap();
    assert_eq!(quoted[&expiry.to_string()].calls.len(), 2);
    let unpriceable = &quoted[&expiry.to_string()].calls[1];
    assert_eq!(unpriceable.interpolated.ivol, 0.0);
    assert_eq!(unpriceable.interpolated.delta, None);
}
