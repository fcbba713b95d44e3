//! Implied-volatility inversion from observed option prices.
//!
//! Given an observed price, recover the Black-Scholes-Merton volatility
//! that reproduces it. The objective is monotone in volatility, so a
//! bracketing Brent search converges whenever the price sits strictly
//! inside its no-arbitrage bounds.

use vol_core::math::solvers::{BrentSolver, SolverConfig};

use super::black_scholes::BlackScholesMerton;
use super::error::AnalyticalError;

/// Lower volatility bracket endpoint.
const VOL_LOWER: f64 = 1e-4;

/// Upper volatility bracket endpoint. 1000% covers any listed equity quote.
const VOL_UPPER: f64 = 10.0;

/// Solves for the implied volatility of a European option.
///
/// # Arguments
/// * `price` - Observed option price (must be positive)
/// * `spot` - Spot price (must be positive)
/// * `strike` - Strike price (must be positive)
/// * `expiry` - Time to expiry in years (must be positive)
/// * `rate` - Risk-free rate, continuously compounded
/// * `dividend_yield` - Continuous dividend yield
/// * `is_call` - True for a call, false for a put
///
/// # Returns
/// The volatility σ such that the BSM price equals `price`, accurate to the
/// solver tolerance (well inside 1e-6 relative for realistic inputs).
///
/// # Errors
/// - `AnalyticalError::InvalidSpot` / `InvalidStrike` / `InvalidExpiry` on
///   degenerate inputs
/// - `AnalyticalError::PriceOutOfBounds` when no volatility can reproduce
///   the price
/// - `AnalyticalError::NoConvergence` when the root-finder fails
///
/// Callers that need the "unpriceable" degradation rather than an error
/// (the contract layer) map any `Err` to the `sigma = 0` sentinel.
///
/// # Examples
/// ```
/// use vol_models::analytical::{implied_volatility, BlackScholesMerton};
///
/// let bsm = BlackScholesMerton::new(100.0_f64, 0.05, 0.0, 0.25).unwrap();
/// let price = bsm.price_call(105.0, 0.5);
///
/// let iv = implied_volatility(price, 100.0, 105.0, 0.5, 0.05, 0.0, true).unwrap();
/// assert!((iv - 0.25).abs() < 1e-8);
/// ```
pub fn implied_volatility(
    price: f64,
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    dividend_yield: f64,
    is_call: bool,
) -> Result<f64, AnalyticalError> {
    if spot <= 0.0 {
        return Err(AnalyticalError::InvalidSpot { spot });
    }
    if strike <= 0.0 {
        return Err(AnalyticalError::InvalidStrike { strike });
    }
    if expiry <= 0.0 {
        return Err(AnalyticalError::InvalidExpiry { expiry });
    }

    let (lower, upper) = no_arbitrage_bounds(spot, strike, expiry, rate, dividend_yield, is_call);
    if price <= lower || price >= upper {
        return Err(AnalyticalError::PriceOutOfBounds {
            price,
            lower,
            upper,
        });
    }

    let objective = |sigma: f64| -> f64 {
        // The bracket keeps sigma strictly positive, so construction only
        // fails on inputs already validated above.
        match BlackScholesMerton::new(spot, rate, dividend_yield, sigma) {
            Ok(bsm) => {
                let model_price = if is_call {
                    bsm.price_call(strike, expiry)
                } else {
                    bsm.price_put(strike, expiry)
                };
                model_price - price
            }
            Err(_) => f64::NAN,
        }
    };

    let solver = BrentSolver::new(SolverConfig::new(1e-12, 200));
    let sigma = solver.find_root(objective, VOL_LOWER, VOL_UPPER)?;

    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(AnalyticalError::NoConvergence(format!(
            "solver returned non-positive volatility {}",
            sigma
        )));
    }

    Ok(sigma)
}

/// No-arbitrage price bounds for a European option.
///
/// Call: `max(S·e^(-qT) - K·e^(-rT), 0) < price < S·e^(-qT)`
/// Put:  `max(K·e^(-rT) - S·e^(-qT), 0) < price < K·e^(-rT)`
fn no_arbitrage_bounds(
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    dividend_yield: f64,
    is_call: bool,
) -> (f64, f64) {
    let fwd_spot = spot * (-dividend_yield * expiry).exp();
    let disc_strike = strike * (-rate * expiry).exp();

    if is_call {
        ((fwd_spot - disc_strike).max(0.0), fwd_spot)
    } else {
        ((disc_strike - fwd_spot).max(0.0), disc_strike)
    }
}
