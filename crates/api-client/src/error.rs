use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("The API request returned an error: {0}")]
    Provider(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Insufficient data for {symbol}: got {actual} daily closes, need at least {required}")]
    InsufficientData {
        symbol: String,
        actual: usize,
        required: usize,
    },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}

impl ApiError {
    /// Whether repeating the same request may succeed: transport failures,
    /// rate limiting and upstream server errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Deserialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_throttling_and_server_errors_are_retryable() {
        let status = |s: u16| ApiError::Status {
            status: s,
            body: String::new(),
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!ApiError::Provider("bad pair".to_string()).is_retryable());
        assert!(
            !ApiError::InsufficientData {
                symbol: "X".to_string(),
                actual: 3,
                required: 20
            }
            .is_retryable()
        );
    }
}
