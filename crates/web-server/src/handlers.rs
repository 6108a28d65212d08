use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use core_types::RankResponse;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRequest {
    pub tickers: Vec<String>,
    /// Anything that is not a whole number of days is treated as absent, so
    /// the ranker falls back to its default lookback.
    #[serde(default, deserialize_with = "lenient_days")]
    pub lookback_days: Option<i64>,
}

fn lenient_days<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(whole_days))
}

/// Accepts `45`, `45.0` and `"45"`; rejects fractions and non-numbers.
fn whole_days(value: &Value) -> Option<i64> {
    let from_float = |f: f64| (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15).then_some(f as i64);
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(from_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(from_float))
        }
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub ok: bool,
    pub status: u16,
}

/// # GET /
pub async fn root() -> &'static str {
    "Server is running"
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// # POST /api/rank
/// Ranks the posted tickers by their beta to the configured benchmarks.
pub async fn rank(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RankRequest>, JsonRejection>,
) -> Result<Json<RankResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let response = state
        .ranker
        .rank(&request.tickers, request.lookback_days)
        .await?;
    Ok(Json(response))
}

/// # POST /api/webhook/relay
/// Forwards the JSON body to the configured downstream webhook.
pub async fn relay_webhook(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RelayResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let url = state
        .relay_url
        .as_deref()
        .ok_or(AppError::RelayNotConfigured)?;

    let response = state.http.post(url).json(&payload).send().await?;
    let status = response.status();
    tracing::info!(status = status.as_u16(), "Webhook relayed.");
    Ok(Json(RelayResponse {
        ok: status.is_success(),
        status: status.as_u16(),
    }))
}

/// # POST /api/webhook/tradingview
/// Accepts a TradingView alert. Alerts may be JSON or plain text; either way
/// the payload is only logged.
pub async fn tradingview_webhook(payload: String) -> &'static str {
    tracing::info!(alert = %payload.trim(), "TradingView alert received.");
    "OK"
}
