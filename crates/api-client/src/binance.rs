use crate::error::ApiError;
use crate::http::{self, RawResponse};
use crate::responses::{
    BINANCE_INVALID_SYMBOL, BinanceErrorResponse, parse_binance_klines, validate_closes,
};
use crate::retry::RetryPolicy;
use crate::PriceProvider;
use async_trait::async_trait;
use configuration::ProviderConfig;
use core_types::{FetchWindow, PriceSeries};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
/// Most klines a single request may return.
const MAX_KLINES: usize = 1000;

/// Daily closes from Binance spot klines. The traded pair is `base + quote`,
/// e.g. `SOL` + `USDT` → `SOLUSDT`.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    min_candles: usize,
    retry: RetryPolicy,
}

impl BinanceClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: http::build_http_client()?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            min_candles: config.min_candles,
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_backoff_ms),
            ),
        })
    }

    fn query_for(symbol: &str, window: FetchWindow) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("symbol", symbol.to_string()),
            ("interval", "1d".to_string()),
        ];
        match window {
            FetchWindow::Trailing { days } => {
                query.push(("limit", days.min(MAX_KLINES).to_string()));
            }
            FetchWindow::Range { start, end } => {
                let start_ms = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
                let end_ms = end
                    .succ_opt()
                    .unwrap_or(end)
                    .and_time(chrono::NaiveTime::MIN)
                    .and_utc()
                    .timestamp_millis()
                    - 1;
                query.push(("startTime", start_ms.to_string()));
                query.push(("endTime", end_ms.to_string()));
                query.push(("limit", MAX_KLINES.to_string()));
            }
        }
        query
    }

    fn error_from(symbol: &str, raw: RawResponse) -> ApiError {
        match serde_json::from_str::<BinanceErrorResponse>(&raw.body) {
            Ok(e) if e.code == BINANCE_INVALID_SYMBOL => ApiError::UnknownSymbol(symbol.to_string()),
            Ok(e) if raw.status.is_client_error() && raw.status.as_u16() != 429 => {
                ApiError::Provider(format!("{} ({})", e.msg, e.code))
            }
            _ => raw.into_status_error(),
        }
    }
}

#[async_trait]
impl PriceProvider for BinanceClient {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn fetch_closes(
        &self,
        base: &str,
        quote: &str,
        window: FetchWindow,
    ) -> Result<PriceSeries, ApiError> {
        let symbol = format!("{}{}", base, quote).to_ascii_uppercase();
        let url = format!("{}/api/v3/klines", self.base_url);
        let query = Self::query_for(&symbol, window);

        let client = &self.client;
        let (url, query, pair) = (&url, &query, symbol.as_str());
        let candles = self
            .retry
            .run(pair, || async move {
                let raw = http::send(client.get(url).query(query)).await?;
                if !raw.status.is_success() {
                    return Err(Self::error_from(pair, raw));
                }
                parse_binance_klines(&raw.body)
            })
            .await?;

        tracing::debug!(symbol = %symbol, candles = candles.len(), "Fetched Binance klines.");
        validate_closes(base, candles, self.min_candles)
    }
}
