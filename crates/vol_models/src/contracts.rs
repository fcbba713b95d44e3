//! Option contract construction and derivation.
//!
//! A contract is built in two explicit stages:
//!
//! 1. [`OptionParams`] — an immutable, validated record of the market
//!    inputs. Exactly one of volatility or observed price is supplied,
//!    enforced by the [`Quote`] enum.
//! 2. [`PricedOption::derive`] — a pure function of the params that resolves
//!    the volatility (inverting the observed price when needed) and the
//!    price (forward-pricing from volatility when needed).
//!
//! Changing an input (`with_spot`, `with_days_to_expiry`, `with_volatility`)
//! produces new params; nothing is recomputed until the caller derives
//! again, so recomputation-after-mutation is a visible step rather than a
//! hidden side effect.
//!
//! ## The unpriceable sentinel
//!
//! When implied-volatility inversion fails (price outside no-arbitrage
//! bounds, degenerate expiry, non-convergence) the derived contract carries
//! `sigma() == 0`. That is a value, not an error: downstream consumers use
//! it as the filtering rule to skip the record. Greeks on an unpriceable or
//! expired contract are `None`.

use thiserror::Error;

use crate::analytical::{implied_volatility, BlackScholesMerton};

/// Days per year used to convert integer DTE inputs to year fractions.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Errors from contract construction.
///
/// Construction validation fails fast, before any pricing occurs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    /// Option type code was not 'C'/'c' or 'P'/'p'.
    #[error("Invalid option type code: {code:?}, must be 'C' or 'P'")]
    InvalidOptionType {
        /// The rejected code
        code: char,
    },

    /// Spot price must be positive.
    #[error("Invalid spot price: {spot}")]
    InvalidSpot {
        /// The offending spot
        spot: f64,
    },

    /// Strike price must be positive.
    #[error("Invalid strike price: {strike}")]
    InvalidStrike {
        /// The offending strike
        strike: f64,
    },

    /// Days to expiry must be finite and non-negative.
    #[error("Invalid days to expiry: {days}")]
    InvalidExpiry {
        /// The offending DTE
        days: f64,
    },

    /// Quoted volatility or price must be finite and non-negative.
    #[error("Invalid quote: {0}")]
    InvalidQuote(String),
}

/// Option type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionKind {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl OptionKind {
    /// Parses the archive's single-character type code.
    ///
    /// # Errors
    /// `ContractError::InvalidOptionType` for anything other than
    /// 'C'/'c'/'P'/'p'.
    ///
    /// # Examples
    /// ```
    /// use vol_models::contracts::OptionKind;
    ///
    /// assert_eq!(OptionKind::from_code('C').unwrap(), OptionKind::Call);
    /// assert_eq!(OptionKind::from_code('p').unwrap(), OptionKind::Put);
    /// assert!(OptionKind::from_code('X').is_err());
    /// ```
    pub fn from_code(code: char) -> Result<Self, ContractError> {
        match code.to_ascii_uppercase() {
            'C' => Ok(OptionKind::Call),
            'P' => Ok(OptionKind::Put),
            _ => Err(ContractError::InvalidOptionType { code }),
        }
    }

    /// Returns the archive's type code.
    pub fn code(&self) -> char {
        match self {
            OptionKind::Call => 'C',
            OptionKind::Put => 'P',
        }
    }

    /// True for calls.
    #[inline]
    pub fn is_call(&self) -> bool {
        matches!(self, OptionKind::Call)
    }
}

/// Position direction of a contract.
///
/// Carried as contract metadata; leg values are always quoted from the long
/// perspective and aggregation decides signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// Long the contract.
    Long,
    /// Short the contract.
    Short,
}

/// The one market quote supplied at construction.
///
/// Makes "exactly one of volatility or price" unrepresentable-wrong.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quote {
    /// A volatility quote (decimal, 0.30 = 30%); price is derived.
    Volatility(f64),
    /// An observed price; volatility is derived by inversion.
    ObservedPrice(f64),
}

/// Immutable, validated option market inputs.
///
/// # Examples
/// ```
/// use vol_models::contracts::{OptionKind, OptionParams, PricedOption, Quote, Side};
///
/// let params = OptionParams::new(
///     Side::Long,
///     OptionKind::Call,
///     100.0,           // spot
///     105.0,           // strike
///     30.0,            // days to expiry
///     0.01,            // rate
///     Quote::Volatility(0.35),
/// ).unwrap();
///
/// let option = PricedOption::derive(params);
/// assert!(option.price().unwrap() > 0.0);
/// assert_eq!(option.sigma(), 0.35);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionParams {
    /// Position direction.
    pub side: Side,
    /// Call or put.
    pub kind: OptionKind,
    /// Underlying spot price.
    pub spot: f64,
    /// Strike price.
    pub strike: f64,
    /// Days to expiry (calendar days; stored as given, scaled on use).
    pub days_to_expiry: f64,
    /// Risk-free rate, continuously compounded decimal.
    pub rate: f64,
    /// Continuous dividend yield, decimal.
    pub dividend_yield: f64,
    /// The supplied market quote.
    pub quote: Quote,
}

impl OptionParams {
    /// Creates validated params with zero dividend yield.
    ///
    /// # Errors
    /// - `ContractError::InvalidSpot` if spot <= 0
    /// - `ContractError::InvalidStrike` if strike <= 0
    /// - `ContractError::InvalidExpiry` if days_to_expiry is negative or
    ///   non-finite
    /// - `ContractError::InvalidQuote` if the quote value is negative or
    ///   non-finite
    pub fn new(
        side: Side,
        kind: OptionKind,
        spot: f64,
        strike: f64,
        days_to_expiry: f64,
        rate: f64,
        quote: Quote,
    ) -> Result<Self, ContractError> {
        if !(spot > 0.0) || !spot.is_finite() {
            return Err(ContractError::InvalidSpot { spot });
        }
        if !(strike > 0.0) || !strike.is_finite() {
            return Err(ContractError::InvalidStrike { strike });
        }
        if !(days_to_expiry >= 0.0) || !days_to_expiry.is_finite() {
            return Err(ContractError::InvalidExpiry {
                days: days_to_expiry,
            });
        }
        let quote_value = match quote {
            Quote::Volatility(v) => v,
            Quote::ObservedPrice(p) => p,
        };
        if !(quote_value >= 0.0) || !quote_value.is_finite() {
            return Err(ContractError::InvalidQuote(format!(
                "{:?} must be finite and non-negative",
                quote
            )));
        }

        Ok(Self {
            side,
            kind,
            spot,
            strike,
            days_to_expiry,
            rate,
            dividend_yield: 0.0,
            quote,
        })
    }

    /// Sets the continuous dividend yield.
    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    /// Returns a copy with a new spot price.
    ///
    /// Nothing else is recomputed; derive again for updated price/greeks.
    pub fn with_spot(mut self, spot: f64) -> Self {
        self.spot = spot;
        self
    }

    /// Returns a copy with a new days-to-expiry.
    pub fn with_days_to_expiry(mut self, days_to_expiry: f64) -> Self {
        self.days_to_expiry = days_to_expiry;
        self
    }

    /// Returns a copy quoted at a new volatility.
    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.quote = Quote::Volatility(volatility);
        self
    }

    /// Time to expiry as a year fraction (days / 365).
    #[inline]
    pub fn year_fraction(&self) -> f64 {
        self.days_to_expiry / DAYS_PER_YEAR
    }
}

/// A derived option: params plus resolved volatility and price.
///
/// Produced by [`PricedOption::derive`]; immutable. Greeks are computed on
/// demand from the resolved volatility and reported as `None` whenever the
/// closed form is undefined (unpriceable contract, zero time to expiry, or
/// a non-finite result).
#[derive(Debug, Clone, Copy)]
pub struct PricedOption {
    params: OptionParams,
    /// Resolved volatility; 0.0 means unpriceable.
    sigma: f64,
    /// Resolved price; `None` when it cannot be computed.
    price: Option<f64>,
}

impl PricedOption {
    /// Derives price and volatility from validated params.
    ///
    /// Pure: same params always produce the same result.
    ///
    /// - `Quote::Volatility(v)`: sigma is `v`; price is forward-priced
    ///   (`None` if `v == 0`, since the model is undefined there).
    /// - `Quote::ObservedPrice(p)`: price is `p`; sigma is solved by
    ///   implied-volatility inversion, with any failure degrading to the
    ///   `sigma = 0` unpriceable sentinel.
    pub fn derive(params: OptionParams) -> Self {
        let expiry = params.year_fraction();

        match params.quote {
            Quote::Volatility(v) => {
                let sigma = if v.is_finite() && v > 0.0 { v } else { 0.0 };
                let price = if sigma > 0.0 {
                    BlackScholesMerton::new(params.spot, params.rate, params.dividend_yield, sigma)
                        .ok()
                        .map(|bsm| {
                            if params.kind.is_call() {
                                bsm.price_call(params.strike, expiry)
                            } else {
                                bsm.price_put(params.strike, expiry)
                            }
                        })
                        .and_then(finite_or_none)
                } else {
                    None
                };
                Self {
                    params,
                    sigma,
                    price,
                }
            }
            Quote::ObservedPrice(p) => {
                let sigma = implied_volatility(
                    p,
                    params.spot,
                    params.strike,
                    expiry,
                    params.rate,
                    params.dividend_yield,
                    params.kind.is_call(),
                )
                .unwrap_or(0.0);
                Self {
                    params,
                    sigma,
                    price: finite_or_none(p),
                }
            }
        }
    }

    /// Returns the input params.
    #[inline]
    pub fn params(&self) -> &OptionParams {
        &self.params
    }

    /// Resolved volatility. Zero means unpriceable; consumers skip such
    /// records.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// True when the contract has a usable volatility.
    #[inline]
    pub fn is_priceable(&self) -> bool {
        self.sigma > 0.0
    }

    /// Resolved price: the observed price when one was supplied, otherwise
    /// the forward price from the quoted volatility.
    #[inline]
    pub fn price(&self) -> Option<f64> {
        self.price
    }

    /// Delta (∂V/∂S). `None` when undefined.
    pub fn delta(&self) -> Option<f64> {
        self.with_model(|bsm, p, t| bsm.delta(p.strike, t, p.kind.is_call()))
    }

    /// Gamma (∂²V/∂S²). `None` when undefined.
    pub fn gamma(&self) -> Option<f64> {
        self.with_model(|bsm, p, t| bsm.gamma(p.strike, t))
    }

    /// Vega (∂V/∂σ), per 1.0 of volatility. `None` when undefined.
    pub fn vega(&self) -> Option<f64> {
        self.with_model(|bsm, p, t| bsm.vega(p.strike, t))
    }

    /// Theta (∂V/∂t), per year. `None` when undefined.
    pub fn theta(&self) -> Option<f64> {
        self.with_model(|bsm, p, t| bsm.theta(p.strike, t, p.kind.is_call()))
    }

    /// Rho (∂V/∂r), per 1.0 of rate. `None` when undefined.
    pub fn rho(&self) -> Option<f64> {
        self.with_model(|bsm, p, t| bsm.rho(p.strike, t, p.kind.is_call()))
    }

    /// Runs a greek computation against the resolved model, degrading every
    /// failure mode (unpriceable, expired, non-finite result) to `None`.
    fn with_model<F>(&self, f: F) -> Option<f64>
    where
        F: Fn(&BlackScholesMerton<f64>, &OptionParams, f64) -> f64,
    {
        if self.sigma <= 0.0 {
            return None;
        }
        let expiry = self.params.year_fraction();
        if expiry <= 0.0 {
            return None;
        }
        let bsm = BlackScholesMerton::new(
            self.params.spot,
            self.params.rate,
            self.params.dividend_yield,
            self.sigma,
        )
        .ok()?;
        finite_or_none(f(&bsm, &self.params, expiry))
    }
}

/// Maps NaN and infinite values to `None`.
#[inline]
fn finite_or_none(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}
