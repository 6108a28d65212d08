//! # Beta Ranking Pipeline
//!
//! Orchestrates a ranking request: load both benchmarks, fetch and regress
//! every ticker with per-ticker fault isolation, score, sort, and rank.
//!
//! ## Public API
//!
//! - `Ranker`: owns the price provider and the ranking policy.
//! - `composite_score`, `compare_scores`, `rank_rows`: the scoring and
//!   ordering rules, usable on their own.
//! - `AnalyzerError` / `FetchError`: request-level and symbol-level failures.

pub mod error;
pub mod ranker;
pub mod scoring;

pub use error::{AnalyzerError, FetchError};
pub use ranker::Ranker;
pub use scoring::{compare_scores, composite_score, rank_rows};
