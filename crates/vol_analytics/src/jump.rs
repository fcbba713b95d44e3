//! Forward-volatility and earnings-jump decomposition formulas.
//!
//! The decomposition treats an expiry's total implied variance as diffusive
//! variance plus a single event-day jump variance, following the standard
//! term-structure identities (Bennett, *Trading Volatility*, ch. on
//! forward vol and jumps). All times here are in days, matching how the
//! curves are keyed.

use tracing::warn;

/// Trading days per year, used for the daily jump-move scaling.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Forward volatility between two expiries.
///
/// `sqrt((σ2²·T2 − σ1²·T1) / (T2 − T1))` for an earlier expiry `(σ1, t1)`
/// and a later one `(σ2, t2)`.
///
/// Degenerate brackets are undefined: `t1 == t2` yields NaN (0/0 for equal
/// vols), as does a negative forward variance. Callers treat NaN as "no
/// value".
///
/// # Examples
/// ```
/// use vol_analytics::jump::forward_vol;
///
/// // Flat term structure: the forward vol equals the spot vol exactly
/// let fwd = forward_vol(0.25, 10.0, 0.25, 40.0);
/// assert!((fwd - 0.25).abs() < 1e-12);
///
/// // Degenerate bracket is NaN
/// assert!(forward_vol(0.25, 30.0, 0.25, 30.0).is_nan());
/// ```
pub fn forward_vol(sigma1: f64, t1: f64, sigma2: f64, t2: f64) -> f64 {
    let numerator = sigma2 * sigma2 * t2 - sigma1 * sigma1 * t1;
    let denominator = t2 - t1;

    (numerator / denominator).sqrt()
}

/// Implied volatility of a single event-day jump.
///
/// Given the diffusive volatility, the IV of the first expiry after the
/// jump, and that expiry's DTE `t`:
/// `sqrt(σ_after²·t − σ_diffusive²·(t − 1))`.
///
/// The diffusive input must be the smaller of the two volatilities. When a
/// noisy surface hands them in reversed — the estimated diffusive vol
/// above the post-jump expiry's total vol — the inputs are swapped before
/// computing and a warning is emitted. This reordering is a deliberate
/// compensating fix for a volatility-estimation artifact; both orderings
/// produce the same numeric result by construction.
///
/// # Examples
/// ```
/// use vol_analytics::jump::implied_jump_vol;
///
/// let straight = implied_jump_vol(0.20, 0.30, 5.0);
/// let reversed = implied_jump_vol(0.30, 0.20, 5.0);
/// assert_eq!(straight, reversed);
/// ```
pub fn implied_jump_vol(sigma_diffusive: f64, sigma_exp_after_jump: f64, t: f64) -> f64 {
    let (diffusive, after) = if sigma_diffusive > sigma_exp_after_jump {
        warn!(
            sigma_diffusive,
            sigma_exp_after_jump, "implied_jump_vol inputs misordered, swapping"
        );
        (sigma_exp_after_jump, sigma_diffusive)
    } else {
        (sigma_diffusive, sigma_exp_after_jump)
    };

    (after * after * t - diffusive * diffusive * (t - 1.0)).sqrt()
}

/// Volatility of an expiry with the event-jump component removed.
///
/// `forward_vol(jump_vol, 1, total_ivol, t − 1)` for an expiry of DTE `t`
/// and total IV `total_ivol`. Only meaningful for `t > 2`; at shorter
/// tenors callers substitute the plain forward vol between the bracketing
/// expiries instead.
pub fn ex_earnings_vol(total_ivol: f64, implied_jump_vol: f64, t: f64) -> f64 {
    forward_vol(implied_jump_vol, 1.0, total_ivol, t - 1.0)
}

/// Expected absolute percentage move implied by a jump volatility.
///
/// `sqrt(1/252) · jump_vol · sqrt(2/π)` — the expected absolute value of a
/// one-day-scaled normal draw.
///
/// # Examples
/// ```
/// use vol_analytics::jump::implied_jump_move;
///
/// let move_pct = implied_jump_move(0.80);
/// assert!(move_pct > 0.0 && move_pct < 0.10);
/// ```
pub fn implied_jump_move(implied_jump_vol: f64) -> f64 {
    (1.0 / TRADING_DAYS_PER_YEAR).sqrt()
        * implied_jump_vol
        * (2.0 / std::f64::consts::PI).sqrt()
}
