//! Multi-leg position aggregation.
//!
//! A [`Position`] combines option legs and a share count into one
//! price/greeks view. It exists to price synthetic structures — the
//! earnings analytics build straddles with it — so aggregation is a plain
//! sum over legs with the share delta added on.
//!
//! Greeks aggregate through `Option`: if any leg cannot produce a greek the
//! aggregate is absent, because a partial sum would silently misstate the
//! position's risk.

use tracing::warn;

use crate::contracts::PricedOption;

/// Shares represented by one unit of per-share delta.
const SHARES_PER_CONTRACT: f64 = 100.0;

/// An ordered collection of option legs plus a share count.
///
/// Constructed fresh per computation and discarded; legs are owned.
///
/// The `spot`/`rate`/`days_to_expiry` accessors read the first leg only —
/// callers must ensure all legs share those fields before using them. That
/// is a precondition, not an enforced invariant.
///
/// # Examples
/// ```
/// use vol_models::contracts::{OptionKind, OptionParams, PricedOption, Quote, Side};
/// use vol_models::position::Position;
///
/// let call = PricedOption::derive(OptionParams::new(
///     Side::Long, OptionKind::Call, 100.0, 100.0, 30.0, 0.0,
///     Quote::Volatility(0.3),
/// ).unwrap());
/// let put = PricedOption::derive(OptionParams::new(
///     Side::Long, OptionKind::Put, 100.0, 100.0, 30.0, 0.0,
///     Quote::Volatility(0.3),
/// ).unwrap());
///
/// let mut straddle = Position::new();
/// straddle.add_legs(vec![call, put]);
///
/// // An ATM straddle is near delta-neutral
/// assert!(straddle.delta().unwrap().abs() < 0.1);
/// assert!(straddle.price().unwrap() > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Position {
    legs: Vec<PricedOption>,
    shares: i64,
}

impl Position {
    /// Creates an empty position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a position from initial legs.
    pub fn with_legs(legs: Vec<PricedOption>) -> Self {
        Self { legs, shares: 0 }
    }

    /// Appends one leg.
    pub fn add_leg(&mut self, leg: PricedOption) {
        self.legs.push(leg);
    }

    /// Appends several legs in order.
    pub fn add_legs(&mut self, legs: Vec<PricedOption>) {
        self.legs.extend(legs);
    }

    /// Removes and returns the leg at `index`.
    ///
    /// Removing a non-existent leg is tolerated: it returns `None` and logs
    /// a warning rather than panicking, so callers can ignore the outcome —
    /// but the outcome is visible in the return type for those that care.
    pub fn remove_leg(&mut self, index: usize) -> Option<PricedOption> {
        if index < self.legs.len() {
            Some(self.legs.remove(index))
        } else {
            warn!(
                index,
                legs = self.legs.len(),
                "remove_leg: no leg at index, position unchanged"
            );
            None
        }
    }

    /// Returns the leg at `index`, if present.
    pub fn leg(&self, index: usize) -> Option<&PricedOption> {
        self.legs.get(index)
    }

    /// Returns all legs in order.
    pub fn legs(&self) -> &[PricedOption] {
        &self.legs
    }

    /// Adds shares to the position.
    pub fn add_shares(&mut self, shares: i64) {
        self.shares += shares;
    }

    /// Removes shares from the position.
    pub fn remove_shares(&mut self, shares: i64) {
        self.shares -= shares;
    }

    /// Returns the current share count.
    pub fn shares(&self) -> i64 {
        self.shares
    }

    /// Theoretical position price: sum of leg prices.
    ///
    /// `None` if any leg's price is unavailable.
    pub fn price(&self) -> Option<f64> {
        sum_over(&self.legs, |leg| leg.price())
    }

    /// Position delta: sum of leg deltas plus `shares / 100`.
    pub fn delta(&self) -> Option<f64> {
        let leg_delta = sum_over(&self.legs, |leg| leg.delta())?;
        Some(leg_delta + self.shares as f64 / SHARES_PER_CONTRACT)
    }

    /// Position gamma: sum of leg gammas.
    pub fn gamma(&self) -> Option<f64> {
        sum_over(&self.legs, |leg| leg.gamma())
    }

    /// Position vega: sum of leg vegas.
    pub fn vega(&self) -> Option<f64> {
        sum_over(&self.legs, |leg| leg.vega())
    }

    /// Position theta: sum of leg thetas.
    pub fn theta(&self) -> Option<f64> {
        sum_over(&self.legs, |leg| leg.theta())
    }

    /// Position rho: sum of leg rhos.
    pub fn rho(&self) -> Option<f64> {
        sum_over(&self.legs, |leg| leg.rho())
    }

    /// Arithmetic mean of leg volatilities.
    ///
    /// Only meaningful when all legs share one underlying view; `None` for
    /// an empty position.
    pub fn sigma(&self) -> Option<f64> {
        if self.legs.is_empty() {
            return None;
        }
        let total: f64 = self.legs.iter().map(|leg| leg.sigma()).sum();
        Some(total / self.legs.len() as f64)
    }

    /// Spot price of the first leg. Precondition: all legs share it.
    pub fn spot(&self) -> Option<f64> {
        self.legs.first().map(|leg| leg.params().spot)
    }

    /// Rate of the first leg. Precondition: all legs share it.
    pub fn rate(&self) -> Option<f64> {
        self.legs.first().map(|leg| leg.params().rate)
    }

    /// Days to expiry of the first leg. Precondition: all legs share it.
    pub fn days_to_expiry(&self) -> Option<f64> {
        self.legs.first().map(|leg| leg.params().days_to_expiry)
    }
}

/// Sums `f` over legs, absent if any leg is absent. Empty slice sums to 0.
fn sum_over<F>(legs: &[PricedOption], f: F) -> Option<f64>
where
    F: Fn(&PricedOption) -> Option<f64>,
{
    legs.iter().try_fold(0.0, |acc, leg| f(leg).map(|v| acc + v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{OptionKind, OptionParams, Quote, Side};
    use approx::assert_relative_eq;

    fn leg(kind: OptionKind, vol: f64) -> PricedOption {
        PricedOption::derive(
            OptionParams::new(Side::Long, kind, 100.0, 100.0, 30.0, 0.0, Quote::Volatility(vol))
                .unwrap(),
        )
    }

    fn straddle(vol: f64) -> Position {
        Position::with_legs(vec![leg(OptionKind::Call, vol), leg(OptionKind::Put, vol)])
    }

    #[test]
    fn test_price_sums_legs() {
        let position = straddle(0.3);
        let expected = position.leg(0).unwrap().price().unwrap()
            + position.leg(1).unwrap().price().unwrap();
        assert_relative_eq!(position.price().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_straddle_near_delta_neutral() {
        let position = straddle(0.3);
        assert!(position.delta().unwrap().abs() < 0.1);
    }

    #[test]
    fn test_delta_includes_share_count() {
        let mut position = straddle(0.3);
        let base = position.delta().unwrap();
        position.add_shares(100);
        assert_relative_eq!(position.delta().unwrap(), base + 1.0, epsilon = 1e-12);

        position.remove_shares(50);
        assert_relative_eq!(position.delta().unwrap(), base + 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_gamma_vega_theta_rho_sum() {
        let position = straddle(0.3);
        let call = position.leg(0).unwrap();
        let put = position.leg(1).unwrap();
        assert_relative_eq!(
            position.gamma().unwrap(),
            call.gamma().unwrap() + put.gamma().unwrap(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            position.vega().unwrap(),
            call.vega().unwrap() + put.vega().unwrap(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            position.theta().unwrap(),
            call.theta().unwrap() + put.theta().unwrap(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            position.rho().unwrap(),
            call.rho().unwrap() + put.rho().unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sigma_is_mean_of_legs() {
        let position =
            Position::with_legs(vec![leg(OptionKind::Call, 0.2), leg(OptionKind::Put, 0.4)]);
        assert_relative_eq!(position.sigma().unwrap(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_sigma_empty_position() {
        let position = Position::new();
        assert_eq!(position.sigma(), None);
    }

    #[test]
    fn test_unpriceable_leg_makes_aggregate_absent() {
        let mut position = straddle(0.3);
        position.add_leg(leg(OptionKind::Call, 0.0)); // unpriceable
        assert_eq!(position.price(), None);
        assert_eq!(position.delta(), None);
    }

    #[test]
    fn test_remove_leg_present() {
        let mut position = straddle(0.3);
        let removed = position.remove_leg(0);
        assert!(removed.is_some());
        assert_eq!(position.legs().len(), 1);
    }

    #[test]
    fn test_remove_leg_absent_is_tolerated() {
        let mut position = straddle(0.3);
        let removed = position.remove_leg(5);
        assert!(removed.is_none());
        assert_eq!(position.legs().len(), 2);
    }

    #[test]
    fn test_first_leg_accessors() {
        let position = straddle(0.3);
        assert_eq!(position.spot(), Some(100.0));
        assert_eq!(position.rate(), Some(0.0));
        assert_eq!(position.days_to_expiry(), Some(30.0));

        let empty = Position::new();
        assert_eq!(empty.spot(), None);
    }

    #[test]
    fn test_empty_position_price_is_zero() {
        let position = Position::new();
        assert_eq!(position.price(), Some(0.0));
    }
}
