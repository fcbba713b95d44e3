//! Error types for analytical pricing.

use thiserror::Error;

/// Errors from closed-form pricing and implied-volatility inversion.
///
/// # Variants
/// - `InvalidSpot`: Spot price not positive
/// - `InvalidStrike`: Strike price not positive
/// - `InvalidVolatility`: Volatility not positive
/// - `InvalidExpiry`: Expiry not positive where required
/// - `PriceOutOfBounds`: Observed price violates no-arbitrage bounds
/// - `NoConvergence`: Root-finder failed to converge on a volatility
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticalError {
    /// Spot price must be positive.
    #[error("Invalid spot price: {spot}")]
    InvalidSpot {
        /// The offending spot value
        spot: f64,
    },

    /// Strike price must be positive.
    #[error("Invalid strike price: {strike}")]
    InvalidStrike {
        /// The offending strike value
        strike: f64,
    },

    /// Volatility must be positive.
    #[error("Invalid volatility: {volatility}")]
    InvalidVolatility {
        /// The offending volatility value
        volatility: f64,
    },

    /// Expiry must be positive for this operation.
    #[error("Invalid expiry: {expiry}")]
    InvalidExpiry {
        /// The offending expiry (years)
        expiry: f64,
    },

    /// Observed price is outside the no-arbitrage bounds for the contract.
    #[error("Price {price} outside no-arbitrage bounds [{lower}, {upper}]")]
    PriceOutOfBounds {
        /// Observed price
        price: f64,
        /// Lower no-arbitrage bound
        lower: f64,
        /// Upper no-arbitrage bound
        upper: f64,
    },

    /// Implied-volatility inversion did not converge.
    #[error("Implied volatility did not converge: {0}")]
    NoConvergence(String),
}

impl From<vol_core::types::SolverError> for AnalyticalError {
    fn from(err: vol_core::types::SolverError) -> Self {
        AnalyticalError::NoConvergence(err.to_string())
    }
}
