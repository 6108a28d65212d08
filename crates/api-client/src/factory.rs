use crate::binance::BinanceClient;
use crate::coingecko::CoinGeckoClient;
use crate::crypto_compare::CryptoCompareClient;
use crate::error::ApiError;
use crate::PriceProvider;
use configuration::ProviderConfig;
use core_types::ProviderKind;
use std::sync::Arc;

/// Creates the configured price provider.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn PriceProvider>, ApiError> {
    let provider: Arc<dyn PriceProvider> = match config.kind {
        ProviderKind::Binance => Arc::new(BinanceClient::new(config)?),
        ProviderKind::CryptoCompare => Arc::new(CryptoCompareClient::new(config)?),
        ProviderKind::CoinGecko => Arc::new(CoinGeckoClient::new(config)?),
    };
    tracing::info!(provider = provider.name(), quote = %config.quote, "Price provider ready.");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_variant() {
        for (kind, name) in [
            (ProviderKind::Binance, "binance"),
            (ProviderKind::CryptoCompare, "cryptocompare"),
            (ProviderKind::CoinGecko, "coingecko"),
        ] {
            let config = ProviderConfig {
                kind,
                ..ProviderConfig::default()
            };
            assert_eq!(create_provider(&config).unwrap().name(), name);
        }
    }
}
