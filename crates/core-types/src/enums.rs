use serde::{Deserialize, Serialize};
use std::fmt;

/// The upstream market-data API a deployment pulls daily closes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ProviderKind {
    #[default]
    Binance,
    #[cfg_attr(feature = "clap", value(name = "cryptocompare"))]
    CryptoCompare,
    #[cfg_attr(feature = "clap", value(name = "coingecko"))]
    CoinGecko,
}

impl ProviderKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Binance => "binance",
            ProviderKind::CryptoCompare => "cryptocompare",
            ProviderKind::CoinGecko => "coingecko",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the two benchmark betas of a ticker are folded into one ranking score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ScoringPolicy {
    /// Mean of the absolute betas.
    #[default]
    MeanAbsolute,
    /// Largest of the absolute betas.
    MaxAbsolute,
}

impl ScoringPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScoringPolicy::MeanAbsolute => "mean_absolute",
            ScoringPolicy::MaxAbsolute => "max_absolute",
        }
    }
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
