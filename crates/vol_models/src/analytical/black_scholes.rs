//! Black-Scholes-Merton pricing model for European equity options.
//!
//! Extends the classic Black-Scholes closed forms with a continuous
//! dividend yield `q`, which is how the historical archive supplies
//! dividend information.
//!
//! ## Mathematical Formulas
//!
//! **Call Price**: C = S·e^(-qT)·N(d₁) - K·e^(-rT)·N(d₂)
//! **Put Price**: P = K·e^(-rT)·N(-d₂) - S·e^(-qT)·N(-d₁)
//!
//! Where:
//! - d₁ = (ln(S/K) + (r - q + σ²/2)T) / (σ√T)
//! - d₂ = d₁ - σ√T

use num_traits::Float;

use super::distributions::{norm_cdf, norm_pdf};
use super::error::AnalyticalError;

/// Black-Scholes-Merton model for European option pricing.
///
/// Provides closed-form pricing and greeks for European options under
/// lognormal dynamics with a continuous dividend yield.
///
/// # Type Parameters
/// * `T` - Floating-point type implementing `Float` (e.g., `f64`)
///
/// # Examples
/// ```
/// use vol_models::analytical::BlackScholesMerton;
///
/// let bsm = BlackScholesMerton::new(100.0_f64, 0.05, 0.0, 0.2).unwrap();
/// let call = bsm.price_call(100.0, 1.0);
/// let put = bsm.price_put(100.0, 1.0);
///
/// // Put-call parity with q = 0: C - P = S - K*exp(-rT)
/// let parity = call - put - (100.0 - 100.0 * (-0.05_f64).exp());
/// assert!(parity.abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BlackScholesMerton<T: Float> {
    /// Spot price (S)
    spot: T,
    /// Risk-free interest rate (r), continuously compounded
    rate: T,
    /// Continuous dividend yield (q)
    dividend_yield: T,
    /// Volatility (σ), decimal
    volatility: T,
}

impl<T: Float> BlackScholesMerton<T> {
    /// Creates a new Black-Scholes-Merton model.
    ///
    /// # Arguments
    /// * `spot` - Current spot price (must be positive)
    /// * `rate` - Risk-free rate, continuously compounded (may be negative)
    /// * `dividend_yield` - Continuous dividend yield (may be zero)
    /// * `volatility` - Volatility as a decimal (must be positive)
    ///
    /// # Errors
    /// - `AnalyticalError::InvalidSpot` if spot <= 0
    /// - `AnalyticalError::InvalidVolatility` if volatility <= 0
    pub fn new(spot: T, rate: T, dividend_yield: T, volatility: T) -> Result<Self, AnalyticalError> {
        let zero = T::zero();

        if spot <= zero {
            return Err(AnalyticalError::InvalidSpot {
                spot: spot.to_f64().unwrap_or(0.0),
            });
        }

        if volatility <= zero {
            return Err(AnalyticalError::InvalidVolatility {
                volatility: volatility.to_f64().unwrap_or(0.0),
            });
        }

        Ok(Self {
            spot,
            rate,
            dividend_yield,
            volatility,
        })
    }

    /// Returns the spot price.
    #[inline]
    pub fn spot(&self) -> T {
        self.spot
    }

    /// Returns the risk-free rate.
    #[inline]
    pub fn rate(&self) -> T {
        self.rate
    }

    /// Returns the dividend yield.
    #[inline]
    pub fn dividend_yield(&self) -> T {
        self.dividend_yield
    }

    /// Returns the volatility.
    #[inline]
    pub fn volatility(&self) -> T {
        self.volatility
    }

    /// Computes the d1 term.
    ///
    /// d₁ = (ln(S/K) + (r - q + σ²/2)T) / (σ√T)
    ///
    /// For expiry ≈ 0 the limiting value is returned: a large positive
    /// (negative) number when spot is above (below) strike.
    #[inline]
    pub fn d1(&self, strike: T, expiry: T) -> T {
        let zero = T::zero();
        let half = T::from(0.5).unwrap();
        let epsilon = T::from(1e-10).unwrap();

        if expiry <= epsilon {
            let large = T::from(100.0).unwrap();
            return if self.spot > strike {
                large
            } else if self.spot < strike {
                -large
            } else {
                zero
            };
        }

        let sqrt_t = expiry.sqrt();
        let vol_sqrt_t = self.volatility * sqrt_t;

        let log_moneyness = (self.spot / strike).ln();
        let drift =
            (self.rate - self.dividend_yield + half * self.volatility * self.volatility) * expiry;

        (log_moneyness + drift) / vol_sqrt_t
    }

    /// Computes the d2 term: d₂ = d₁ - σ√T.
    #[inline]
    pub fn d2(&self, strike: T, expiry: T) -> T {
        let epsilon = T::from(1e-10).unwrap();

        if expiry <= epsilon {
            return self.d1(strike, expiry);
        }

        self.d1(strike, expiry) - self.volatility * expiry.sqrt()
    }

    /// Computes the European call price.
    ///
    /// C = S·e^(-qT)·N(d₁) - K·e^(-rT)·N(d₂)
    ///
    /// Expiry ≈ 0 returns intrinsic value.
    #[inline]
    pub fn price_call(&self, strike: T, expiry: T) -> T {
        let zero = T::zero();
        let epsilon = T::from(1e-10).unwrap();

        if expiry <= epsilon {
            let intrinsic = self.spot - strike;
            return if intrinsic > zero { intrinsic } else { zero };
        }

        let d1 = self.d1(strike, expiry);
        let d2 = self.d2(strike, expiry);

        let df_rate = (-self.rate * expiry).exp();
        let df_div = (-self.dividend_yield * expiry).exp();

        self.spot * df_div * norm_cdf(d1) - strike * df_rate * norm_cdf(d2)
    }

    /// Computes the European put price.
    ///
    /// P = K·e^(-rT)·N(-d₂) - S·e^(-qT)·N(-d₁)
    ///
    /// Expiry ≈ 0 returns intrinsic value.
    #[inline]
    pub fn price_put(&self, strike: T, expiry: T) -> T {
        let zero = T::zero();
        let epsilon = T::from(1e-10).unwrap();

        if expiry <= epsilon {
            let intrinsic = strike - self.spot;
            return if intrinsic > zero { intrinsic } else { zero };
        }

        let d1 = self.d1(strike, expiry);
        let d2 = self.d2(strike, expiry);

        let df_rate = (-self.rate * expiry).exp();
        let df_div = (-self.dividend_yield * expiry).exp();

        strike * df_rate * norm_cdf(-d2) - self.spot * df_div * norm_cdf(-d1)
    }

    /// Computes Delta (∂V/∂S).
    ///
    /// - Call Delta = e^(-qT)·N(d₁)
    /// - Put Delta = e^(-qT)·(N(d₁) - 1)
    #[inline]
    pub fn delta(&self, strike: T, expiry: T, is_call: bool) -> T {
        let epsilon = T::from(1e-10).unwrap();

        if expiry <= epsilon {
            let one = T::one();
            let zero = T::zero();
            return if is_call {
                if self.spot > strike {
                    one
                } else {
                    zero
                }
            } else if self.spot < strike {
                -one
            } else {
                zero
            };
        }

        let d1 = self.d1(strike, expiry);
        let df_div = (-self.dividend_yield * expiry).exp();
        let n_d1 = norm_cdf(d1);

        if is_call {
            df_div * n_d1
        } else {
            df_div * (n_d1 - T::one())
        }
    }

    /// Computes Gamma (∂²V/∂S²), identical for calls and puts.
    ///
    /// Gamma = e^(-qT)·φ(d₁) / (S·σ·√T)
    #[inline]
    pub fn gamma(&self, strike: T, expiry: T) -> T {
        let epsilon = T::from(1e-10).unwrap();

        if expiry <= epsilon {
            return T::zero();
        }

        let d1 = self.d1(strike, expiry);
        let sqrt_t = expiry.sqrt();
        let df_div = (-self.dividend_yield * expiry).exp();

        df_div * norm_pdf(d1) / (self.spot * self.volatility * sqrt_t)
    }

    /// Computes Vega (∂V/∂σ), identical for calls and puts.
    ///
    /// Vega = S·e^(-qT)·√T·φ(d₁), per 1.0 of volatility.
    #[inline]
    pub fn vega(&self, strike: T, expiry: T) -> T {
        let epsilon = T::from(1e-10).unwrap();

        if expiry <= epsilon {
            return T::zero();
        }

        let d1 = self.d1(strike, expiry);
        let sqrt_t = expiry.sqrt();
        let df_div = (-self.dividend_yield * expiry).exp();

        self.spot * df_div * sqrt_t * norm_pdf(d1)
    }

    /// Computes Theta (∂V/∂t), per year.
    ///
    /// - Call: -(S·e^(-qT)·σ·φ(d₁))/(2√T) + q·S·e^(-qT)·N(d₁) - r·K·e^(-rT)·N(d₂)
    /// - Put:  -(S·e^(-qT)·σ·φ(d₁))/(2√T) - q·S·e^(-qT)·N(-d₁) + r·K·e^(-rT)·N(-d₂)
    #[inline]
    pub fn theta(&self, strike: T, expiry: T, is_call: bool) -> T {
        let epsilon = T::from(1e-10).unwrap();

        if expiry <= epsilon {
            return T::zero();
        }

        let d1 = self.d1(strike, expiry);
        let d2 = self.d2(strike, expiry);
        let sqrt_t = expiry.sqrt();
        let df_rate = (-self.rate * expiry).exp();
        let df_div = (-self.dividend_yield * expiry).exp();
        let two = T::from(2.0).unwrap();

        let decay = -(self.spot * df_div * self.volatility * norm_pdf(d1)) / (two * sqrt_t);

        if is_call {
            decay + self.dividend_yield * self.spot * df_div * norm_cdf(d1)
                - self.rate * strike * df_rate * norm_cdf(d2)
        } else {
            decay - self.dividend_yield * self.spot * df_div * norm_cdf(-d1)
                + self.rate * strike * df_rate * norm_cdf(-d2)
        }
    }

    /// Computes Rho (∂V/∂r), per 1.0 of rate.
    ///
    /// - Call Rho = K·T·e^(-rT)·N(d₂)
    /// - Put Rho = -K·T·e^(-rT)·N(-d₂)
    #[inline]
    pub fn rho(&self, strike: T, expiry: T, is_call: bool) -> T {
        let epsilon = T::from(1e-10).unwrap();

        if expiry <= epsilon {
            return T::zero();
        }

        let d2 = self.d2(strike, expiry);
        let df_rate = (-self.rate * expiry).exp();

        if is_call {
            strike * expiry * df_rate * norm_cdf(d2)
        } else {
            -strike * expiry * df_rate * norm_cdf(-d2)
        }
    }
}
