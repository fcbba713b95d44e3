//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;

/// Brent's method root finder.
///
/// Combines bisection, the secant method, and inverse quadratic
/// interpolation for robust derivative-free root finding. Converges for any
/// continuous function with a valid bracket, which is what the
/// implied-volatility objective provides: monotone in volatility with a
/// sign change over the bracket whenever the target price is attainable.
///
/// # Example
///
/// ```
/// use vol_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
/// let f = |x: f64| x * x - 2.0;
///
/// let root = solver.find_root(f, 0.0, 2.0).unwrap();
/// assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver {
    config: SolverConfig,
}

impl BrentSolver {
    /// Creates a new Brent solver with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Creates a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    /// Finds a root of `f` in the bracket `[a, b]`.
    ///
    /// Requires that `f(a)` and `f(b)` have opposite signs.
    ///
    /// # Arguments
    ///
    /// * `f` - Function to find a root of
    /// * `a` - Left bracket endpoint
    /// * `b` - Right bracket endpoint
    ///
    /// # Returns
    ///
    /// * `Ok(x)` - Root where `|f(x)| < tolerance`
    /// * `Err(SolverError::NoBracket)` - `f(a)` and `f(b)` have same sign
    /// * `Err(SolverError::MaxIterationsExceeded)` - Failed to converge
    pub fn find_root<F>(&self, f: F, a: f64, b: f64) -> Result<f64, SolverError>
    where
        F: Fn(f64) -> f64,
    {
        let mut a = a;
        let mut b = b;
        let mut fa = f(a);
        let mut fb = f(b);

        if fa * fb > 0.0 {
            return Err(SolverError::NoBracket { a, b });
        }

        // Keep b the better estimate: |f(b)| <= |f(a)|
        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }

        let mut c = a;
        let mut fc = fa;
        let mut d = b - a;
        let mut e = d;

        for _ in 0..self.config.max_iterations {
            if fb.abs() < self.config.tolerance {
                return Ok(b);
            }

            let tol = self.config.tolerance;
            let m = (c - b) / 2.0;
            if m.abs() <= tol {
                return Ok(b);
            }

            // Try inverse quadratic interpolation, then secant; fall back to
            // bisection when the proposed step is not trustworthy.
            let use_bisection;
            if fa != fc && fb != fc {
                let r = fb / fc;
                let s = fb / fa;
                let t = fa / fc;

                let p = s * (t * (r - t) * (c - b) - (1.0 - r) * (b - a));
                let q = (t - 1.0) * (r - 1.0) * (s - 1.0);

                if p.abs() < (3.0 * m * q).abs() / 2.0 && p.abs() < (e * q).abs() / 2.0 {
                    e = d;
                    d = p / q;
                    use_bisection = false;
                } else {
                    use_bisection = true;
                }
            } else if fb != fa {
                let s = fb / fa;
                let p = 2.0 * m * s;
                let q = 1.0 - s;

                if p.abs() < (3.0 * m * q).abs() / 2.0 && p.abs() < (e * q).abs() / 2.0 {
                    e = d;
                    d = p / q;
                    use_bisection = false;
                } else {
                    use_bisection = true;
                }
            } else {
                use_bisection = true;
            }

            if use_bisection {
                d = m;
                e = m;
            }

            a = b;
            fa = fb;

            if d.abs() > tol {
                b += d;
            } else {
                // Minimum step toward the midpoint
                b += if m > 0.0 { tol } else { -tol };
            }

            fb = f(b);

            // Re-bracket: f(b) and f(c) must straddle the root
            if (fb > 0.0) == (fc > 0.0) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }

            // Keep |f(c)| >= |f(b)|
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}
