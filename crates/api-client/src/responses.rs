use crate::error::ApiError;
use chrono::{DateTime, NaiveDate};
use core_types::PriceSeries;
use serde::Deserialize;
use std::str::FromStr;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// One daily close and the UTC day it belongs to.
pub type DailyClose = (NaiveDate, f64);

fn day_of_millis(timestamp_ms: i64) -> Result<NaiveDate, ApiError> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|t| t.date_naive())
        .ok_or_else(|| ApiError::InvalidData(format!("Timestamp out of range: {timestamp_ms}")))
}

// --- Binance ---

/// One row of `GET /api/v3/klines`. Prices arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct RawKline(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    i64,
    String,
    String,
    String,
);

/// Represents an error response from the Binance API.
#[derive(Debug, Clone, Deserialize)]
pub struct BinanceErrorResponse {
    pub code: i32,
    pub msg: String,
}

/// Binance reports an unknown trading pair with this code.
pub const BINANCE_INVALID_SYMBOL: i32 = -1121;

/// Extracts daily closes from a klines payload, oldest first, dated by
/// each candle's open time.
pub fn parse_binance_klines(body: &str) -> Result<Vec<DailyClose>, ApiError> {
    let rows: Vec<RawKline> = serde_json::from_str(body)?;
    rows.into_iter()
        .map(|raw| -> Result<DailyClose, ApiError> {
            let close = f64::from_str(&raw.4).map_err(|e| {
                ApiError::InvalidData(format!("Invalid close '{}' at {}: {}", raw.4, raw.0, e))
            })?;
            Ok((day_of_millis(raw.0)?, close))
        })
        .collect()
}

// --- CryptoCompare ---

#[derive(Debug, Deserialize)]
struct CryptoCompareResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data", default)]
    data: Option<CryptoCompareData>,
}

#[derive(Debug, Default, Deserialize)]
struct CryptoCompareData {
    #[serde(rename = "Data", default)]
    data: Vec<CryptoCompareBar>,
}

#[derive(Debug, Deserialize)]
struct CryptoCompareBar {
    /// Unix seconds at the start of the day.
    time: i64,
    close: f64,
}

/// Extracts daily closes from a `histoday` payload.
///
/// CryptoCompare pads the start of a short history with zero-priced rows;
/// those are dropped.
pub fn parse_crypto_compare_histoday(body: &str) -> Result<Vec<DailyClose>, ApiError> {
    let response: CryptoCompareResponse = serde_json::from_str(body)?;
    if response.response.eq_ignore_ascii_case("error") {
        return Err(ApiError::Provider(response.message));
    }
    let bars = response.data.unwrap_or_default().data;
    bars.into_iter()
        .skip_while(|bar| bar.close == 0.0)
        .map(|bar| -> Result<DailyClose, ApiError> {
            Ok((day_of_millis(bar.time.saturating_mul(1000))?, bar.close))
        })
        .collect()
}

// --- CoinGecko ---

#[derive(Debug, Deserialize)]
struct CoinGeckoSearch {
    #[serde(default)]
    coins: Vec<CoinGeckoCoin>,
}

#[derive(Debug, Deserialize)]
struct CoinGeckoCoin {
    id: String,
    symbol: String,
    market_cap_rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CoinGeckoMarketChart {
    prices: Vec<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
struct CoinGeckoErrorResponse {
    error: String,
}

/// Picks the coin id for `symbol` from a `/search` payload.
///
/// Several coins can share a ticker; the one with the best market-cap rank
/// wins, unranked coins only when nothing ranked matches.
pub fn parse_coingecko_search(body: &str, symbol: &str) -> Result<Option<String>, ApiError> {
    let search: CoinGeckoSearch = serde_json::from_str(body)?;
    let best = search
        .coins
        .into_iter()
        .filter(|coin| coin.symbol.eq_ignore_ascii_case(symbol))
        .min_by_key(|coin| coin.market_cap_rank.unwrap_or(u32::MAX));
    Ok(best.map(|coin| coin.id))
}

/// Extracts one close per UTC day from a `market_chart` payload.
///
/// Short ranges come back with intraday points and the daily endpoint appends
/// the current price; the last point of each day is kept.
pub fn parse_coingecko_market_chart(body: &str) -> Result<Vec<DailyClose>, ApiError> {
    if let Ok(error) = serde_json::from_str::<CoinGeckoErrorResponse>(body) {
        return Err(ApiError::Provider(error.error));
    }
    let chart: CoinGeckoMarketChart = serde_json::from_str(body)?;

    let mut closes: Vec<(i64, f64)> = Vec::with_capacity(chart.prices.len());
    for (timestamp_ms, price) in chart.prices {
        let day = (timestamp_ms as i64).div_euclid(MILLIS_PER_DAY);
        match closes.last_mut() {
            Some((last_day, last_price)) if *last_day == day => *last_price = price,
            _ => closes.push((day, price)),
        }
    }
    closes
        .into_iter()
        .map(|(day, price)| -> Result<DailyClose, ApiError> {
            Ok((day_of_millis(day * MILLIS_PER_DAY)?, price))
        })
        .collect()
}

// --- Shared ---

/// Turns dated closes into a validated `PriceSeries`.
pub fn validate_closes(
    symbol: &str,
    candles: Vec<DailyClose>,
    min_candles: usize,
) -> Result<PriceSeries, ApiError> {
    if candles.len() < min_candles {
        return Err(ApiError::InsufficientData {
            symbol: symbol.to_string(),
            actual: candles.len(),
            required: min_candles,
        });
    }
    let (dates, closes): (Vec<NaiveDate>, Vec<f64>) = candles.into_iter().unzip();
    PriceSeries::new(symbol, closes)
        .and_then(|series| series.with_dates(dates))
        .map_err(|e| ApiError::InvalidData(e.to_string()))
}
