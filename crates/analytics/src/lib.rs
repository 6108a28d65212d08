//! # Beta Analytics
//!
//! The numeric core of the ranker: turning closing prices into log-returns and
//! measuring how strongly one return series co-moves with another.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   providers or transports and depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** every function recomputes from the slices it is
//!   given. Lookback windows are at most a few hundred points, so there is no
//!   incremental state to maintain.
//!
//! ## Public API
//!
//! - `log_returns`: the returns calculator.
//! - `mean`, `variance`, `std_dev`, `covariance`: the statistics kernel.
//! - `BetaEstimator` / `beta`: regression slope with the degeneracy policy.
//! - `align_on_dates`: pairs two dated return series day by day.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

pub mod beta;
pub mod error;
pub mod returns;
pub mod stats;

pub use beta::{BetaEstimator, DEFAULT_MIN_SAMPLES, align_on_dates, beta};
pub use error::AnalyticsError;
pub use returns::{log_returns, series_returns};
pub use stats::{covariance, mean, std_dev, variance};
