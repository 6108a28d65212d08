use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Cannot compute '{0}' over an empty input")]
    EmptyInput(&'static str),

    #[error("Not enough data to compute '{metric}': need at least {required} points, got {actual}")]
    InsufficientData {
        metric: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Series lengths differ in '{metric}': {left} vs {right}")]
    LengthMismatch {
        metric: &'static str,
        left: usize,
        right: usize,
    },

    #[error("Invalid price at index {index}: {value}")]
    InvalidPrice { index: usize, value: f64 },

    #[error("Invalid return dates: {0}")]
    InvalidDates(String),
}
