use crate::error::ApiError;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;

const USER_AGENT: &str = concat!("betarank/", env!("CARGO_PKG_VERSION"));

pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn into_status_error(self) -> ApiError {
        ApiError::Status {
            status: self.status.as_u16(),
            body: self.body,
        }
    }
}

/// The shared reqwest client every provider variant is built on.
pub(crate) fn build_http_client() -> Result<Client, ApiError> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

/// Sends a request and reads the whole body, whatever the status.
pub(crate) async fn send(request: RequestBuilder) -> Result<RawResponse, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    Ok(RawResponse { status, body })
}
