use analyzer::AnalyzerError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    #[error("Webhook relay is not configured")]
    RelayNotConfigured,
    #[error("Webhook relay failed: {0}")]
    Relay(#[from] reqwest::Error),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Analyzer(AnalyzerError::EmptyTickers) => StatusCode::BAD_REQUEST,
            AppError::Analyzer(AnalyzerError::Benchmark { .. }) => {
                tracing::error!(error = %self, "Ranking aborted.");
                StatusCode::BAD_GATEWAY
            }
            AppError::RelayNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Relay(e) => {
                tracing::error!(error = ?e, "Webhook relay error.");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
