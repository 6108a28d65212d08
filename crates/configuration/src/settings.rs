use crate::error::ConfigError;
use core_types::{ProviderKind, ScoringPolicy};
use serde::Deserialize;

/// Largest trailing window, lookback plus buffer, that every provider can
/// serve in a single request (Binance caps klines at 1000 per call).
pub const MAX_FETCH_DAYS: usize = 1000;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `config.toml` (or none at all)
/// yields a working Binance-backed deployment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub ranking: RankingConfig,
    pub benchmarks: BenchmarksConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

/// Where the HTTP surface listens and where relayed webhooks go.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Target for `POST /api/webhook/relay`. Relaying is disabled when unset.
    pub relay_webhook_url: Option<String>,
}

/// Parameters of the ranking pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Used when a request carries no usable lookback.
    pub default_lookback_days: usize,
    /// Requests asking for less are raised to this.
    pub min_lookback_days: usize,
    /// Requests asking for more are capped to this.
    pub max_lookback_days: usize,
    /// Extra candles fetched on top of the lookback to absorb provider
    /// off-by-one conventions.
    pub fetch_buffer_days: usize,
    /// Fewest overlapping returns a beta is computed from.
    pub min_beta_samples: usize,
    /// Upper bound on concurrent per-ticker fetches.
    pub max_concurrency: usize,
    pub fetch_timeout_secs: u64,
    pub scoring: ScoringPolicy,
}

/// A single benchmark asset.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkConfig {
    /// Label used in responses (e.g. "BTC").
    pub name: String,
    /// Raw symbol handed to the normalizer and provider (e.g. "BTCUSDT").
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchmarksConfig {
    pub primary: BenchmarkConfig,
    pub secondary: BenchmarkConfig,
}

/// The single upstream price source of this deployment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Quote currency prices are requested in (e.g. "USDT", "USD").
    pub quote: String,
    /// Overrides the provider's public endpoint.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Series shorter than this are reported as insufficient data.
    pub min_candles: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// When set, logs go to a daily rolling file in this directory.
    pub directory: Option<String>,
}

// --- Default Implementations ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            relay_webhook_url: None,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_lookback_days: 90,
            min_lookback_days: 20,
            max_lookback_days: 365,
            fetch_buffer_days: 5,
            min_beta_samples: 10,
            max_concurrency: 8,
            fetch_timeout_secs: 10,
            scoring: ScoringPolicy::MeanAbsolute,
        }
    }
}

impl Default for BenchmarksConfig {
    fn default() -> Self {
        Self {
            primary: BenchmarkConfig {
                name: "BTC".to_string(),
                symbol: "BTC".to_string(),
            },
            secondary: BenchmarkConfig {
                name: "ETH".to_string(),
                symbol: "ETH".to_string(),
            },
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Binance,
            quote: "USDT".to_string(),
            base_url: None,
            api_key: None,
            min_candles: 20,
            max_retries: 2,
            retry_backoff_ms: 250,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl RankingConfig {
    /// Applies the default, floor and cap to a requested lookback.
    ///
    /// Missing and non-positive values fall back to the default.
    pub fn effective_lookback(&self, requested: Option<i64>) -> usize {
        let days = match requested {
            Some(d) if d > 0 => usize::try_from(d).unwrap_or(usize::MAX),
            _ => self.default_lookback_days,
        };
        days.max(self.min_lookback_days).min(self.max_lookback_days)
    }
}

impl Config {
    /// Rejects combinations the ranking pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.ranking;
        if r.min_beta_samples < 2 {
            return Err(invalid("ranking.min_beta_samples must be at least 2"));
        }
        if r.min_lookback_days < r.min_beta_samples {
            return Err(invalid(format!(
                "ranking.min_lookback_days ({}) must be >= ranking.min_beta_samples ({})",
                r.min_lookback_days, r.min_beta_samples
            )));
        }
        if r.max_lookback_days < r.min_lookback_days {
            return Err(invalid(format!(
                "ranking.max_lookback_days ({}) must be >= ranking.min_lookback_days ({})",
                r.max_lookback_days, r.min_lookback_days
            )));
        }
        if r.max_lookback_days + r.fetch_buffer_days > MAX_FETCH_DAYS {
            return Err(invalid(format!(
                "ranking.max_lookback_days + ranking.fetch_buffer_days must not exceed {} (got {})",
                MAX_FETCH_DAYS,
                r.max_lookback_days + r.fetch_buffer_days
            )));
        }
        if r.fetch_buffer_days == 0 {
            return Err(invalid("ranking.fetch_buffer_days must be at least 1"));
        }
        if r.max_concurrency == 0 {
            return Err(invalid("ranking.max_concurrency must be at least 1"));
        }
        if r.fetch_timeout_secs == 0 {
            return Err(invalid("ranking.fetch_timeout_secs must be at least 1"));
        }
        if self.provider.min_candles < 2 {
            return Err(invalid("provider.min_candles must be at least 2"));
        }
        if self.provider.quote.trim().is_empty() {
            return Err(invalid("provider.quote must not be empty"));
        }

        let b = &self.benchmarks;
        for (label, bench) in [("primary", &b.primary), ("secondary", &b.secondary)] {
            if bench.name.trim().is_empty() || bench.symbol.trim().is_empty() {
                return Err(invalid(format!(
                    "benchmarks.{label} needs a non-empty name and symbol"
                )));
            }
        }
        if b.primary.name.eq_ignore_ascii_case(&b.secondary.name) {
            return Err(invalid("benchmark names must be distinct"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
