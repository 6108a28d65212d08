use crate::error::ApiError;
use crate::http;
use crate::responses::{parse_crypto_compare_histoday, validate_closes};
use crate::retry::RetryPolicy;
use crate::PriceProvider;
use async_trait::async_trait;
use configuration::ProviderConfig;
use core_types::{FetchWindow, PriceSeries};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com";
/// Largest `limit` the histoday endpoint accepts.
const MAX_LIMIT: usize = 2000;

/// Daily closes from CryptoCompare's aggregated `histoday` endpoint.
#[derive(Debug, Clone)]
pub struct CryptoCompareClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    min_candles: usize,
    retry: RetryPolicy,
}

impl CryptoCompareClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: http::build_http_client()?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            min_candles: config.min_candles,
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_backoff_ms),
            ),
        })
    }

    /// `histoday` returns `limit + 1` bars ending at `toTs` (default: now).
    fn query_for(base: &str, quote: &str, window: FetchWindow) -> Vec<(&'static str, String)> {
        let limit = window.day_count().saturating_sub(1).clamp(1, MAX_LIMIT);
        let mut query = vec![
            ("fsym", base.to_ascii_uppercase()),
            ("tsym", quote.to_ascii_uppercase()),
            ("limit", limit.to_string()),
        ];
        if let FetchWindow::Range { end, .. } = window {
            let to_ts = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
            query.push(("toTs", to_ts.to_string()));
        }
        query
    }
}

#[async_trait]
impl PriceProvider for CryptoCompareClient {
    fn name(&self) -> &'static str {
        "cryptocompare"
    }

    async fn fetch_closes(
        &self,
        base: &str,
        quote: &str,
        window: FetchWindow,
    ) -> Result<PriceSeries, ApiError> {
        let url = format!("{}/data/v2/histoday", self.base_url);
        let query = Self::query_for(base, quote, window);
        let label = format!("{}-{}", base, quote);

        let client = &self.client;
        let api_key = self.api_key.as_deref();
        let (url, query) = (&url, &query);
        let candles = self
            .retry
            .run(&label, || async move {
                let mut request = client.get(url).query(query);
                if let Some(key) = api_key {
                    request = request.header("authorization", format!("Apikey {}", key));
                }
                let raw = http::send(request).await?;
                if !raw.status.is_success() {
                    return Err(raw.into_status_error());
                }
                parse_crypto_compare_histoday(&raw.body)
            })
            .await?;

        tracing::debug!(pair = %label, candles = candles.len(), "Fetched CryptoCompare histoday.");
        validate_closes(base, candles, self.min_candles)
    }
}
