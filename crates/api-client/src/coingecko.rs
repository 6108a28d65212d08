use crate::cache::SymbolIdCache;
use crate::error::ApiError;
use crate::http;
use crate::responses::{parse_coingecko_market_chart, parse_coingecko_search, validate_closes};
use crate::retry::RetryPolicy;
use crate::PriceProvider;
use async_trait::async_trait;
use configuration::ProviderConfig;
use core_types::{FetchWindow, PriceSeries};
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Stablecoin quotes CoinGecko does not price against; they map to `usd`.
const USD_PEGGED: &[&str] = &["USDT", "USDC", "BUSD", "FDUSD", "TUSD", "DAI"];

/// Daily closes from CoinGecko's market charts.
///
/// CoinGecko addresses coins by id (`bitcoin`), not ticker, so every base
/// symbol is resolved through `/search` once and remembered in a
/// [`SymbolIdCache`].
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    min_candles: usize,
    retry: RetryPolicy,
    ids: SymbolIdCache,
}

impl CoinGeckoClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        Self::with_cache(config, SymbolIdCache::new())
    }

    /// Builds a client that resolves ids through an existing cache.
    fn with_cache(config: &ProviderConfig, ids: SymbolIdCache) -> Result<Self, ApiError> {
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
            ids,
        })
    }

    fn vs_currency(quote: &str) -> String {
        let upper = quote.to_ascii_uppercase();
        if USD_PEGGED.contains(&upper.as_str()) {
            "usd".to_string()
        } else {
            upper.to_ascii_lowercase()
        }
    }

    fn chart_request(&self, id: &str, vs: &str, window: FetchWindow) -> (String, Vec<(&'static str, String)>) {
        match window {
            FetchWindow::Trailing { days } => (
                format!("{}/api/v3/coins/{}/market_chart", self.base_url, id),
                vec![
                    ("vs_currency", vs.to_string()),
                    ("days", days.to_string()),
                    ("interval", "daily".to_string()),
                ],
            ),
            FetchWindow::Range { start, end } => {
                let from = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
                let to = end
                    .succ_opt()
                    .unwrap_or(end)
                    .and_time(chrono::NaiveTime::MIN)
                    .and_utc()
                    .timestamp()
                    - 1;
                (
                    format!("{}/api/v3/coins/{}/market_chart/range", self.base_url, id),
                    vec![
                        ("vs_currency", vs.to_string()),
                        ("from", from.to_string()),
                        ("to", to.to_string()),
                    ],
                )
            }
        }
    }

    async fn get(&self, label: &str, url: &str, query: &[(&'static str, String)]) -> Result<String, ApiError> {
        let client = &self.client;
        let api_key = self.api_key.as_deref();
        self.retry
            .run(label, || async move {
                let mut request = client.get(url).query(query);
                if let Some(key) = api_key {
                    request = request.header(API_KEY_HEADER, key);
                }
                let raw = http::send(request).await?;
                if raw.status == StatusCode::NOT_FOUND {
                    return Err(ApiError::UnknownSymbol(label.to_string()));
                }
                if !raw.status.is_success() {
                    return Err(raw.into_status_error());
                }
                Ok(raw.body)
            })
            .await
    }

    /// Resolves a base symbol to a CoinGecko coin id.
    async fn resolve_id(&self, base: &str) -> Result<String, ApiError> {
        if let Some(id) = self.ids.get(base) {
            return Ok(id);
        }
        let url = format!("{}/api/v3/search", self.base_url);
        let body = self
            .get(base, &url, &[("query", base.to_string())])
            .await?;
        let id = parse_coingecko_search(&body, base)?
            .ok_or_else(|| ApiError::UnknownSymbol(base.to_string()))?;
        let id = self.ids.insert(base, id);
        tracing::debug!(symbol = base, id = %id, "Resolved CoinGecko id.");
        Ok(id)
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoClient {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn fetch_closes(
        &self,
        base: &str,
        quote: &str,
        window: FetchWindow,
    ) -> Result<PriceSeries, ApiError> {
        let id = self.resolve_id(base).await?;
        let vs = Self::vs_currency(quote);
        let (url, query) = self.chart_request(&id, &vs, window);

        let body = self.get(&id, &url, &query).await?;
        let candles = parse_coingecko_market_chart(&body)?;

        tracing::debug!(id = %id, candles = candles.len(), "Fetched CoinGecko market chart.");
        validate_closes(base, candles, self.min_candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn client() -> CoinGeckoClient {
        CoinGeckoClient::new(&ProviderConfig::default()).unwrap()
    }

    #[test]
    fn stablecoin_quotes_price_in_usd() {
        assert_eq!(CoinGeckoClient::vs_currency("USDT"), "usd");
        assert_eq!(CoinGeckoClient::vs_currency("usdc"), "usd");
        assert_eq!(CoinGeckoClient::vs_currency("EUR"), "eur");
        assert_eq!(CoinGeckoClient::vs_currency("btc"), "btc");
    }

    #[test]
    fn trailing_window_uses_market_chart() {
        let (url, query) = client().chart_request("bitcoin", "usd", FetchWindow::Trailing { days: 95 });
        assert_eq!(url, "https://api.coingecko.com/api/v3/coins/bitcoin/market_chart");
        assert!(query.contains(&("days", "95".to_string())));
        assert!(query.contains(&("interval", "daily".to_string())));
    }

    #[test]
    fn range_window_uses_unix_seconds() {
        let window = FetchWindow::range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
        let (url, query) = client().chart_request("ethereum", "eur", window);
        assert!(url.ends_with("/coins/ethereum/market_chart/range"));
        assert!(query.contains(&("from", "1704067200".to_string())));
        assert!(query.contains(&("to", "1704153599".to_string())));
    }

    #[tokio::test]
    async fn cached_ids_skip_the_search() {
        let cache = SymbolIdCache::new();
        cache.insert("BTC", "bitcoin");
        let client = CoinGeckoClient::with_cache(&ProviderConfig::default(), cache).unwrap();
        assert_eq!(client.resolve_id("btc").await.unwrap(), "bitcoin");
    }
}
