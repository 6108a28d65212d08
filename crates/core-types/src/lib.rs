pub mod enums;
pub mod error;
pub mod structs;
pub mod symbol;

// Re-export the core types to provide a clean public API.
pub use enums::{ProviderKind, ScoringPolicy};
pub use error::CoreError;
pub use structs::{
    Benchmark, BenchmarkSet, FetchWindow, PriceSeries, RankResponse, RankRow, ReturnSeries,
};
pub use symbol::{QUOTE_SUFFIXES, normalize_symbol};
