use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Invalid price at index {index} for {symbol}: {value}")]
    InvalidPrice {
        symbol: String,
        index: usize,
        value: f64,
    },
}
