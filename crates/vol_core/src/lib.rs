//! # vol_core: Foundation Layer for Volatility Analytics
//!
//! ## Layer 1 (Foundation) Role
//!
//! vol_core is the bottom layer of the 3-layer workspace, providing:
//! - Weighted piecewise-linear interpolation with flat boundary
//!   extrapolation (`math::interpolate`)
//! - Brent root-finding for implied-volatility inversion (`math::solvers`)
//! - Time types: `Date` (`types::time`)
//! - Error types: `DateError`, `InterpolationError`, `SolverError`
//!   (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other vol_* crates, with minimal external
//! dependencies:
//! - chrono: Date arithmetic
//! - thiserror: Structured error types
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use vol_core::math::interpolate::WeightedLinearSpline;
//! use vol_core::types::Date;
//!
//! // Date operations
//! let start = Date::from_ymd(2024, 1, 1).unwrap();
//! let end = Date::from_ymd(2024, 1, 31).unwrap();
//! assert_eq!(end - start, 30);
//!
//! // Interpolation with flat extrapolation
//! let spline = WeightedLinearSpline::interpolating(
//!     &[0.0, 0.5, 1.0],
//!     &[0.20, 0.18, 0.22],
//! ).unwrap();
//! assert!((spline.eval(0.5) - 0.18).abs() < 1e-12);
//! assert!((spline.eval(1.5) - 0.22).abs() < 1e-12);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod types;
