use analytics::AnalyticsError;
use api_client::error::ApiError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("At least one ticker is required")]
    EmptyTickers,

    #[error("Benchmark '{name}' is unavailable: {source}")]
    Benchmark {
        name: String,
        #[source]
        source: FetchError,
    },
}

/// Why one symbol's return series could not be produced. For a ticker this
/// ends up as the row's error text; for a benchmark it aborts the request.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0}")]
    Provider(#[from] ApiError),

    #[error("Price fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Could not compute returns: {0}")]
    Returns(#[from] AnalyticsError),

    #[error("Symbol '{0}' has no recognisable base asset")]
    Unparseable(String),
}
