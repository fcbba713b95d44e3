//! Closed-form analytical pricing models.
//!
//! This module provides the Black-Scholes-Merton model with continuous
//! dividend yield, the standard normal distribution functions it is built
//! on, and implied-volatility inversion from observed prices.

pub mod black_scholes;
pub mod distributions;
pub mod error;
pub mod implied_vol;

pub use black_scholes::BlackScholesMerton;
pub use error::AnalyticalError;
pub use implied_vol::implied_volatility;
