//! Weighted piecewise-linear interpolation with flat boundary extrapolation.
//!
//! This is the curve family used for every volatility fit in the workspace:
//! skew curves (moneyness → IV) and term-structure curves (DTE → IV). Two
//! properties are contractual and must not change:
//!
//! - **Zero smoothing**: the fitted curve passes exactly through every node.
//!   Per-point weights are carried through the fit so that callers can
//!   express relative confidence (the at-the-money anchor); with zero
//!   smoothing they never displace a node value.
//! - **Flat extrapolation**: evaluation outside the observed abscissa range
//!   holds the boundary ordinate constant. The curve never extrapolates
//!   linearly, so `eval` is total.

use crate::types::InterpolationError;

/// Weighted piecewise-linear interpolating spline.
///
/// Stores `(x, y, w)` triples sorted by x and evaluates by linear
/// interpolation between the two bracketing nodes, clamping to the boundary
/// value outside the observed domain.
///
/// # Construction
///
/// Nodes are sorted by x during construction. At least 2 nodes with strictly
/// distinct x values are required; duplicate abscissae are rejected (callers
/// deduplicate before fitting).
///
/// # Example
///
/// ```
/// use vol_core::math::interpolate::WeightedLinearSpline;
///
/// let spline = WeightedLinearSpline::interpolating(
///     &[0.0, 0.5, 1.0],
///     &[0.20, 0.18, 0.22],
/// ).unwrap();
///
/// // Exact at nodes
/// assert!((spline.eval(0.5) - 0.18).abs() < 1e-12);
/// // Linear between nodes
/// assert!((spline.eval(0.25) - 0.19).abs() < 1e-12);
/// // Flat beyond the domain
/// assert!((spline.eval(1.5) - 0.22).abs() < 1e-12);
/// assert!((spline.eval(-9.0) - 0.20).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct WeightedLinearSpline {
    /// Sorted x-coordinates.
    xs: Vec<f64>,
    /// Ordinates, in sorted-x order.
    ys: Vec<f64>,
    /// Fit weights, in sorted-x order.
    ws: Vec<f64>,
}

impl WeightedLinearSpline {
    /// Constructs a weighted spline from x, y, and weight slices.
    ///
    /// # Arguments
    ///
    /// * `xs` - Abscissae (need not be sorted)
    /// * `ys` - Ordinates, paired with `xs`
    /// * `ws` - Positive fit weights, paired with `xs`
    ///
    /// # Errors
    ///
    /// * `InterpolationError::InvalidInput` - Mismatched slice lengths,
    ///   non-finite or duplicate abscissae, or a non-positive weight
    /// * `InterpolationError::InsufficientData` - Fewer than 2 nodes
    pub fn new(xs: &[f64], ys: &[f64], ws: &[f64]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() || xs.len() != ws.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "xs, ys and ws must have same length: got {}, {} and {}",
                xs.len(),
                ys.len(),
                ws.len()
            )));
        }

        if xs.len() < 2 {
            return Err(InterpolationError::InsufficientData {
                got: xs.len(),
                need: 2,
            });
        }

        if xs.iter().any(|x| !x.is_finite()) || ys.iter().any(|y| !y.is_finite()) {
            return Err(InterpolationError::InvalidInput(
                "non-finite node coordinates".to_string(),
            ));
        }

        if ws.iter().any(|&w| !(w > 0.0)) {
            return Err(InterpolationError::InvalidInput(
                "weights must be positive".to_string(),
            ));
        }

        let mut nodes: Vec<(f64, f64, f64)> = xs
            .iter()
            .zip(ys.iter())
            .zip(ws.iter())
            .map(|((&x, &y), &w)| (x, y, w))
            .collect();
        nodes.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        if nodes.windows(2).any(|pair| pair[0].0 == pair[1].0) {
            return Err(InterpolationError::InvalidInput(
                "duplicate abscissae".to_string(),
            ));
        }

        let mut spline = WeightedLinearSpline {
            xs: Vec::with_capacity(nodes.len()),
            ys: Vec::with_capacity(nodes.len()),
            ws: Vec::with_capacity(nodes.len()),
        };
        for (x, y, w) in nodes {
            spline.xs.push(x);
            spline.ys.push(y);
            spline.ws.push(w);
        }
        Ok(spline)
    }

    /// Constructs an interpolating spline with unit weights.
    ///
    /// Equivalent to [`WeightedLinearSpline::new`] with every weight 1.
    pub fn interpolating(xs: &[f64], ys: &[f64]) -> Result<Self, InterpolationError> {
        let ws = vec![1.0; xs.len()];
        Self::new(xs, ys, &ws)
    }

    /// Evaluates the spline at `x`.
    ///
    /// Piecewise-linear between nodes; constant at the boundary ordinate
    /// outside `[x_min, x_max]`. Total: never errors, never extrapolates
    /// linearly.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();

        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        // partition_point gives the first index with xs[i] > x; the segment
        // is [pos-1, pos].
        let pos = self.xs.partition_point(|&xi| xi <= x);
        let (x0, x1) = (self.xs[pos - 1], self.xs[pos]);
        let (y0, y1) = (self.ys[pos - 1], self.ys[pos]);

        let t = (x - x0) / (x1 - x0);
        y0 + (y1 - y0) * t
    }

    /// Returns the observed abscissa range `(x_min, x_max)`.
    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Returns the sorted abscissae.
    #[inline]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Returns the ordinates in sorted-x order.
    #[inline]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Returns the fit weights in sorted-x order.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.ws
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Returns true if the spline has no nodes (never true once constructed).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}
