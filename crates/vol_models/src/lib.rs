//! # vol_models: Pricing Kernel for Volatility Analytics
//!
//! ## Layer 2 (Model) Role
//!
//! vol_models sits between the numerical foundation (`vol_core`) and the
//! surface analytics (`vol_analytics`), providing:
//! - Closed-form Black-Scholes-Merton pricing and greeks
//!   (`analytical::black_scholes`)
//! - Standard normal distribution helpers (`analytical::distributions`)
//! - Robust implied-volatility inversion (`analytical::implied_vol`)
//! - The two-stage option contract: immutable [`contracts::OptionParams`]
//!   derived into a [`contracts::PricedOption`] (`contracts`)
//! - Multi-leg aggregation with a share delta (`position`)
//!
//! ## Degenerate-input policy
//!
//! Nothing in this crate panics on bad market data. An observed price that
//! no volatility can reproduce yields the `sigma == 0` unpriceable sentinel;
//! a greek that would be NaN or infinite is reported as `None`. Consumers
//! skip records rather than abort (see `vol_analytics::chain`).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod contracts;
pub mod position;
