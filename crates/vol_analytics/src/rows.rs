//! Input row types at the data-access boundary.
//!
//! The relational layer is an external collaborator: it runs the queries
//! and hands this crate fully materialised rows. These types mirror the
//! row shapes it produces. Adjustment factors arrive pre-computed; this
//! crate never selects corporate actions itself.

use vol_core::types::Date;

/// One option quote row for a trading day.
///
/// `option_type` carries the archive's raw single-character code; it is
/// validated against {C, P} during chain assembly, which fails fast on
/// anything else.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuoteRow {
    /// Option expiry date.
    pub expiry_date: Date,
    /// Unadjusted strike.
    pub strike: f64,
    /// Split-adjusted strike used for ordering.
    pub adj_strike: f64,
    /// Raw option type code, 'C' or 'P'.
    pub option_type: char,
    /// Underlying spot price on the trading day.
    pub spot_price: f64,
    /// Bid price.
    pub bid_price: f64,
    /// Ask price.
    pub ask_price: f64,
    /// Interpolated (smoothed) contract price.
    pub interpolated_price: f64,
    /// Contract volume.
    pub volume: i64,
    /// Open interest.
    pub open_interest: i64,
    /// Risk-free rate for the expiry; absent rows price at zero rate.
    pub rate: Option<f64>,
    /// Ask-side implied volatility as stored, if any.
    pub ask_iv: Option<f64>,
    /// Cumulative split adjustment factor (1.0 when unadjusted).
    pub total_adjustment_factor: f64,
}

/// One implied-volatility observation for skew fitting.
///
/// Null moneyness or IV values survive the query; the fitter drops them.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SkewRow {
    /// Trading day of the observation.
    pub trade_date: Date,
    /// Days to expiry of the observation's contract.
    pub dte: i32,
    /// Normalized strike position in [0, 1], when defined.
    pub moneyness: Option<f64>,
    /// Implied volatility, when defined.
    pub iv: Option<f64>,
}

/// Earnings announcement timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarningsTime {
    /// Before market open.
    Bmo,
    /// After market close.
    Amc,
}

/// One historical earnings event with its surrounding prices.
///
/// Which price fields are populated depends on timing: `prev_close` for
/// before-open events, `next_open`/`next_close` for after-close events.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EarningsRow {
    /// Announcement date.
    pub earnings_date: Date,
    /// Announcement timing.
    pub earnings_time: EarningsTime,
    /// Close of the prior session (before-open events).
    pub prev_close: Option<f64>,
    /// Open of the announcement session.
    pub earnings_open: Option<f64>,
    /// Close of the announcement session.
    pub earnings_close: Option<f64>,
    /// Open of the next session (after-close events).
    pub next_open: Option<f64>,
    /// Close of the next session (after-close events).
    pub next_close: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skew_row_deserializes_nulls() {
        let json = r#"{"trade_date":"2024-03-15","dte":30,"moneyness":null,"iv":null}"#;
        let row: SkewRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.dte, 30);
        assert_eq!(row.moneyness, None);
        assert_eq!(row.iv, None);
    }

    #[test]
    fn test_earnings_time_lowercase_codes() {
        let bmo: EarningsTime = serde_json::from_str("\"bmo\"").unwrap();
        let amc: EarningsTime = serde_json::from_str("\"amc\"").unwrap();
        assert_eq!(bmo, EarningsTime::Bmo);
        assert_eq!(amc, EarningsTime::Amc);
    }

    #[test]
    fn test_quote_row_round_trip() {
        let row = QuoteRow {
            expiry_date: Date::from_ymd(2024, 4, 19).unwrap(),
            strike: 105.0,
            adj_strike: 105.0,
            option_type: 'C',
            spot_price: 101.3,
            bid_price: 1.2,
            ask_price: 1.4,
            interpolated_price: 1.31,
            volume: 250,
            open_interest: 1200,
            rate: Some(0.013),
            ask_iv: Some(0.32),
            total_adjustment_factor: 1.0,
        };
        let json = serde_json::to_string(&row).unwrap();
        let back: QuoteRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
