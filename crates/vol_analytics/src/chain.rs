//! Priced option-chain assembly.
//!
//! Turns raw quote rows for one trading day into the nested per-expiry
//! mappings the service layer returns: a *price* view keyed off the
//! smoothed contract price, and a *quote* view with bid/mid/interpolated/
//! ask variants per contract.
//!
//! Strikes are de-adjusted with the row's cumulative split factor and the
//! per-contract share count scales the same way. The price view applies
//! the unpriceable filtering rule — rows whose implied-vol inversion fails
//! (`sigma == 0`) are skipped; the quote view reports every row and lets
//! unpriceable variants carry a zero IV with absent greeks.

use std::collections::BTreeMap;

use tracing::debug;
use vol_core::types::Date;
use vol_models::contracts::{ContractError, OptionKind, OptionParams, PricedOption, Quote, Side};

use crate::report::{round2, round4};
use crate::rows::QuoteRow;

/// Tolerance for matching a requested strike against adjusted strikes.
pub const STRIKE_MATCH_TOLERANCE: f64 = 0.015;

/// Shares per unadjusted contract.
const SHARES_PER_CONTRACT: f64 = 100.0;

/// One contract in the price view.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PricedContract {
    /// Split-adjusted strike, 2 decimals.
    pub strike: f64,
    /// Deliverable share count (100 × adjustment factor).
    pub num_shares: i64,
    /// Underlying spot, 2 decimals.
    pub spot_price: f64,
    /// Smoothed contract price, 2 decimals.
    pub contract_price: f64,
    /// Implied volatility, 4 decimals.
    pub ivol: f64,
    /// Delta, 4 decimals; absent when undefined.
    pub delta: Option<f64>,
    /// Gamma, 4 decimals; absent when undefined.
    pub gamma: Option<f64>,
    /// Vega, 4 decimals; absent when undefined.
    pub vega: Option<f64>,
    /// Theta, 4 decimals; absent when undefined.
    pub theta: Option<f64>,
    /// Rho, 4 decimals; absent when undefined.
    pub rho: Option<f64>,
}

/// Calls and puts for one expiry.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChainEntry<C> {
    /// Call contracts, in row order.
    #[serde(rename = "C")]
    pub calls: Vec<C>,
    /// Put contracts, in row order.
    #[serde(rename = "P")]
    pub puts: Vec<C>,
}

impl<C> Default for ChainEntry<C> {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            puts: Vec::new(),
        }
    }
}

/// Price view: per-expiry-date contracts with greeks.
pub type PriceChain = BTreeMap<String, ChainEntry<PricedContract>>;

/// One quote variant (bid, mid, interpolated, or ask) with its greeks.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct QuoteLevel {
    /// Quoted price, 2 decimals.
    pub price: f64,
    /// Implied volatility, 4 decimals; 0 when unpriceable.
    pub ivol: f64,
    /// Delta, 4 decimals; absent when undefined.
    pub delta: Option<f64>,
    /// Gamma, 4 decimals; absent when undefined.
    pub gamma: Option<f64>,
    /// Vega, 4 decimals; absent when undefined.
    pub vega: Option<f64>,
    /// Theta, 4 decimals; absent when undefined.
    pub theta: Option<f64>,
    /// Rho, 4 decimals; absent when undefined.
    pub rho: Option<f64>,
}

/// One contract in the quote view.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct QuotedContract {
    /// Split-adjusted strike, 2 decimals.
    pub strike: f64,
    /// Deliverable share count (100 × adjustment factor).
    pub num_shares: i64,
    /// Bid-side quote and greeks.
    pub bid: QuoteLevel,
    /// Mid quote and greeks.
    pub mid: QuoteLevel,
    /// Smoothed-price quote and greeks.
    pub interpolated: QuoteLevel,
    /// Ask-side quote and greeks.
    pub ask: QuoteLevel,
}

/// Quote view: per-expiry-date contracts with quote-level greeks.
pub type QuoteChain = BTreeMap<String, ChainEntry<QuotedContract>>;

/// Builds the price view for one trading day.
///
/// Rows whose contract is unpriceable off the interpolated price
/// (`sigma == 0`) are skipped. An optional `strike_filter` keeps only rows
/// whose adjusted strike is within [`STRIKE_MATCH_TOLERANCE`].
///
/// # Errors
/// `ContractError::InvalidOptionType` when a row carries a type code
/// outside {C, P} — malformed rows fail the request, they are not skipped.
pub fn price_chain(
    rows: &[QuoteRow],
    trade_date: Date,
    strike_filter: Option<f64>,
) -> Result<PriceChain, ContractError> {
    let mut chain = PriceChain::new();

    for row in rows {
        let kind = OptionKind::from_code(row.option_type)?;
        let strike = adjusted_strike(row);

        if !matches_filter(strike, strike_filter) {
            continue;
        }

        let dte = (trade_date - row.expiry_date).abs() as f64;
        let option = derive_quote(row, kind, strike, dte, row.interpolated_price);

        let Some(option) = option.filter(|o| o.is_priceable()) else {
            debug!(
                strike,
                expiry = %row.expiry_date,
                kind = %kind.code(),
                "unpriceable row skipped from price chain"
            );
            continue;
        };

        let contract = PricedContract {
            strike,
            num_shares: num_shares(row),
            spot_price: round2(row.spot_price),
            contract_price: round2(row.interpolated_price),
            ivol: round4(option.sigma()),
            delta: option.delta().map(round4),
            gamma: option.gamma().map(round4),
            vega: option.vega().map(round4),
            theta: option.theta().map(round4),
            rho: option.rho().map(round4),
        };

        push_contract(&mut chain, row.expiry_date, kind, contract);
    }

    Ok(chain)
}

/// Builds the quote view for one trading day.
///
/// Every surviving row is reported; variants that cannot be priced carry
/// `ivol == 0` and absent greeks. The mid price is `(bid + ask) / 2`,
/// falling back to the non-zero side when one side is zero.
///
/// # Errors
/// `ContractError::InvalidOptionType` for a type code outside {C, P}.
pub fn quote_chain(
    rows: &[QuoteRow],
    trade_date: Date,
    strike_filter: Option<f64>,
) -> Result<QuoteChain, ContractError> {
    let mut chain = QuoteChain::new();

    for row in rows {
        let kind = OptionKind::from_code(row.option_type)?;
        let strike = adjusted_strike(row);

        if !matches_filter(strike, strike_filter) {
            continue;
        }

        let dte = (trade_date - row.expiry_date).abs() as f64;
        let mid = mid_price(row.bid_price, row.ask_price);

        let contract = QuotedContract {
            strike,
            num_shares: num_shares(row),
            bid: quote_level(row, kind, strike, dte, row.bid_price),
            mid: quote_level(row, kind, strike, dte, mid),
            interpolated: quote_level(row, kind, strike, dte, row.interpolated_price),
            ask: quote_level(row, kind, strike, dte, row.ask_price),
        };

        push_contract(&mut chain, row.expiry_date, kind, contract);
    }

    Ok(chain)
}

/// Mid price with the zero-side fallback rule.
fn mid_price(bid: f64, ask: f64) -> f64 {
    if bid == 0.0 {
        ask
    } else if ask == 0.0 {
        bid
    } else {
        (bid + ask) / 2.0
    }
}

/// Split-adjusted strike, 2 decimals.
fn adjusted_strike(row: &QuoteRow) -> f64 {
    round2(row.strike / row.total_adjustment_factor)
}

/// Deliverable shares: 100 scaled by the adjustment factor.
fn num_shares(row: &QuoteRow) -> i64 {
    (SHARES_PER_CONTRACT * row.total_adjustment_factor).round() as i64
}

fn matches_filter(strike: f64, filter: Option<f64>) -> bool {
    match filter {
        Some(target) => (strike - target).abs() <= STRIKE_MATCH_TOLERANCE,
        None => true,
    }
}

/// Derives a contract off one quoted price; `None` when the row's inputs
/// cannot form valid params (non-positive spot or price).
fn derive_quote(
    row: &QuoteRow,
    kind: OptionKind,
    strike: f64,
    dte: f64,
    price: f64,
) -> Option<PricedOption> {
    let params = OptionParams::new(
        Side::Long,
        kind,
        row.spot_price,
        strike,
        dte,
        row.rate.unwrap_or(0.0),
        Quote::ObservedPrice(round2(price)),
    )
    .ok()?;
    Some(PricedOption::derive(params))
}

/// Builds one quote level, degrading unpriceable variants to zero IV.
fn quote_level(row: &QuoteRow, kind: OptionKind, strike: f64, dte: f64, price: f64) -> QuoteLevel {
    let option = derive_quote(row, kind, strike, dte, price);

    match option {
        Some(option) => QuoteLevel {
            price: round2(price),
            ivol: round4(option.sigma()),
            delta: option.delta().map(round4),
            gamma: option.gamma().map(round4),
            vega: option.vega().map(round4),
            theta: option.theta().map(round4),
            rho: option.rho().map(round4),
        },
        None => QuoteLevel {
            price: round2(price),
            ivol: 0.0,
            delta: None,
            gamma: None,
            vega: None,
            theta: None,
            rho: None,
        },
    }
}

fn push_contract<C>(
    chain: &mut BTreeMap<String, ChainEntry<C>>,
    expiry: Date,
    kind: OptionKind,
    contract: C,
) {
    let entry = chain.entry(expiry.to_string()).or_default();
    match kind {
        OptionKind::Call => entry.calls.push(contract),
        OptionKind::Put => entry.puts.push(contract),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vol_models::analytical::BlackScholesMerton;

    fn trade_day() -> Date {
        Date::from_ymd(2024, 3, 15).unwrap()
    }

    fn expiry() -> Date {
        trade_day().add_days(30)
    }

    /// A quote row whose interpolated price is the exact BSM price at the
    /// given vol, so the chain recovers that vol.
    fn fair_row(kind: char, strike: f64, vol: f64) -> QuoteRow {
        let bsm = BlackScholesMerton::new(100.0, 0.01, 0.0, vol).unwrap();
        let expiry_t = 30.0 / 365.0;
        let fair = if kind == 'C' {
            bsm.price_call(strike, expiry_t)
        } else {
            bsm.price_put(strike, expiry_t)
        };

        QuoteRow {
            expiry_date: expiry(),
            strike,
            adj_strike: strike,
            option_type: kind,
            spot_price: 100.0,
            bid_price: round2(fair * 0.98),
            ask_price: round2(fair * 1.02),
            interpolated_price: round2(fair),
            volume: 100,
            open_interest: 500,
            rate: Some(0.01),
            ask_iv: None,
            total_adjustment_factor: 1.0,
        }
    }

    #[test]
    fn test_price_chain_recovers_vol() {
        let rows = vec![fair_row('C', 100.0, 0.3)];
        let chain = price_chain(&rows, trade_day(), None).unwrap();

        let entry = &chain[&expiry().to_string()];
        assert_eq!(entry.calls.len(), 1);
        assert!(entry.puts.is_empty());

        let contract = &entry.calls[0];
        // Prices get rounded to cents on the way in, so recovery is loose
        assert_relative_eq!(contract.ivol, 0.3, epsilon = 0.01);
        assert!(contract.delta.unwrap() > 0.0);
    }

    #[test]
    fn test_price_chain_skips_unpriceable() {
        let mut bad = fair_row('C', 100.0, 0.3);
        bad.interpolated_price = 150.0; // above spot: unpriceable

        let chain = price_chain(&[bad], trade_day(), None).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_quote_chain_keeps_unpriceable() {
        let mut bad = fair_row('C', 100.0, 0.3);
        bad.interpolated_price = 150.0;

        let chain = quote_chain(&[bad], trade_day(), None).unwrap();
        let contract = &chain[&expiry().to_string()].calls[0];
        assert_eq!(contract.interpolated.ivol, 0.0);
        assert_eq!(contract.interpolated.delta, None);
        // Price is still reported
        assert_eq!(contract.interpolated.price, 150.0);
        // Bid/ask variants remain priceable
        assert!(contract.bid.ivol > 0.0);
    }

    #[test]
    fn test_invalid_type_code_fails_request() {
        let mut bad = fair_row('C', 100.0, 0.3);
        bad.option_type = 'X';

        let result = price_chain(&[bad], trade_day(), None);
        assert!(matches!(
            result.unwrap_err(),
            ContractError::InvalidOptionType { code: 'X' }
        ));
    }

    #[test]
    fn test_strike_adjustment_and_shares() {
        // 2:1 split: factor 2, 200 strike reads as 100, 200 shares deliver
        let mut row = fair_row('P', 100.0, 0.3);
        row.strike = 200.0;
        row.total_adjustment_factor = 2.0;

        let chain = price_chain(&[row], trade_day(), None).unwrap();
        let contract = &chain[&expiry().to_string()].puts[0];
        assert_eq!(contract.strike, 100.0);
        assert_eq!(contract.num_shares, 200);
    }

    #[test]
    fn test_strike_filter_tolerance() {
        let rows = vec![fair_row('C', 100.0, 0.3), fair_row('C', 105.0, 0.3)];

        let chain = price_chain(&rows, trade_day(), Some(100.01)).unwrap();
        let entry = &chain[&expiry().to_string()];
        assert_eq!(entry.calls.len(), 1);
        assert_eq!(entry.calls[0].strike, 100.0);

        let none = price_chain(&rows, trade_day(), Some(102.0)).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_mid_price_fallback() {
        assert_eq!(mid_price(1.0, 2.0), 1.5);
        assert_eq!(mid_price(0.0, 2.0), 2.0);
        assert_eq!(mid_price(1.0, 0.0), 1.0);
    }

    #[test]
    fn test_quote_chain_mid_between_bid_ask() {
        let rows = vec![fair_row('C', 100.0, 0.3)];
        let chain = quote_chain(&rows, trade_day(), None).unwrap();
        let contract = &chain[&expiry().to_string()].calls[0];

        assert!(contract.bid.price <= contract.mid.price);
        assert!(contract.mid.price <= contract.ask.price);
        // Higher price at fixed strike means higher implied vol
        assert!(contract.bid.ivol <= contract.ask.ivol);
    }

    #[test]
    fn test_calls_and_puts_split() {
        let rows = vec![fair_row('C', 100.0, 0.3), fair_row('P', 100.0, 0.3)];
        let chain = price_chain(&rows, trade_day(), None).unwrap();
        let entry = &chain[&expiry().to_string()];
        assert_eq!(entry.calls.len(), 1);
        assert_eq!(entry.puts.len(), 1);
    }

    #[test]
    fn test_chain_keyed_by_expiry_string() {
        let mut far = fair_row('C', 100.0, 0.3);
        far.expiry_date = trade_day().add_days(60);

        let rows = vec![fair_row('C', 100.0, 0.3), far];
        let chain = price_chain(&rows, trade_day(), None).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.contains_key(&expiry().to_string()));
        assert!(chain.contains_key(&trade_day().add_days(60).to_string()));
    }

    #[test]
    fn test_empty_rows() {
        assert!(price_chain(&[], trade_day(), None).unwrap().is_empty());
        assert!(quote_chain(&[], trade_day(), None).unwrap().is_empty());
    }
}
