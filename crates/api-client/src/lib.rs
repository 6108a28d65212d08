use crate::error::ApiError;
use async_trait::async_trait;
use core_types::{FetchWindow, PriceSeries};

pub mod binance;
pub mod cache;
pub mod coingecko;
pub mod crypto_compare;
pub mod error;
pub mod factory;
mod http;
pub mod responses;
pub mod retry;

// --- Public API ---
pub use binance::BinanceClient;
pub use cache::SymbolIdCache;
pub use coingecko::CoinGeckoClient;
pub use crypto_compare::CryptoCompareClient;
pub use factory::create_provider;
pub use retry::RetryPolicy;

/// The one interface the ranking pipeline fetches prices through.
///
/// Each upstream API is a variant of this trait, chosen by configuration, so
/// callers never depend on a concrete provider. Test doubles implement it too.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetches daily closes for `base` priced in `quote`, oldest first.
    ///
    /// Implementations must surface transport failures, provider-reported
    /// errors and series shorter than their configured minimum as distinct
    /// `ApiError` variants.
    async fn fetch_closes(
        &self,
        base: &str,
        quote: &str,
        window: FetchWindow,
    ) -> Result<PriceSeries, ApiError>;
}
