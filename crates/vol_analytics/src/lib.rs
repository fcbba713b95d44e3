//! # vol_analytics: Volatility Surface & Earnings Analytics
//!
//! ## Layer 3 (Analytics) Role
//!
//! vol_analytics is the top layer of the workspace. It consumes rows that
//! the data-access collaborator has already materialised (`rows`) and the
//! pricing kernel (`vol_models`), and produces the analytics the service
//! layer serves:
//!
//! - Skew curves per trading day and DTE bucket (`skew`)
//! - ATM volatility term structures (`term`)
//! - Forward/jump/ex-earnings volatility decomposition (`jump`)
//! - IV rank, IV percentile, and volatility cones (`rank`)
//! - Historical earnings decomposition with synthetic straddles
//!   (`earnings`)
//! - Per-expiry IV reports (`ivinfo`)
//! - Priced option-chain assembly (`chain`)
//!
//! ## Execution model
//!
//! Everything here is synchronous, single-threaded, and stateless: each
//! function is a pure map from owned inputs to owned outputs with no
//! caching and no I/O. The calling layer may run any number of such calls
//! concurrently without coordination.
//!
//! ## Degradation policy
//!
//! This is best-effort analytics over noisy historical data. Fit groups
//! with too few points are omitted, unpriceable contracts are skipped or
//! reported with absent fields, and empty windows produce explicitly empty
//! results. Nothing in this crate aborts a request.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod chain;
pub mod config;
pub mod earnings;
pub mod ivinfo;
pub mod jump;
pub mod rank;
pub mod report;
pub mod rows;
pub mod skew;
pub mod term;
