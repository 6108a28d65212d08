//! Reduces raw ticker strings to the base asset symbol price providers expect.
//!
//! `BINANCE:SOLUSDT`, `SOL/USDT`, `sol-usd` and `SOLUSDT` all reduce to `SOL`.

/// Quote-currency suffixes, tried in this order. Longer codes that end in a
/// shorter one (`USDT` vs `USD`) must come first.
pub const QUOTE_SUFFIXES: &[&str] = &[
    "USDT", "USDC", "BUSD", "FDUSD", "TUSD", "USD", "EUR", "BTC", "ETH", "BNB",
];

const EXCHANGE_DELIMITER: char = ':';
const PAIR_DELIMITERS: &[char] = &['/', '-', '_'];

/// Returns the base symbol for a raw ticker, or an empty string when nothing
/// usable remains.
pub fn normalize_symbol(raw: &str) -> String {
    let upper = raw.trim().to_ascii_uppercase();

    // Exchange prefix: keep the last segment.
    let symbol = upper
        .rsplit(EXCHANGE_DELIMITER)
        .next()
        .unwrap_or_default()
        .trim();

    // Explicit pairs carry their own separator; the base is the first leg.
    if symbol.contains(PAIR_DELIMITERS) {
        return symbol
            .split(PAIR_DELIMITERS)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
    }

    for suffix in QUOTE_SUFFIXES {
        if let Some(base) = symbol.strip_suffix(suffix) {
            if !base.is_empty() {
                return base.to_string();
            }
        }
    }

    symbol.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_exchange_prefix_and_quote_suffix() {
        assert_eq!(normalize_symbol("BINANCE:SOLUSDT"), "SOL");
        assert_eq!(normalize_symbol("ETHUSDT"), "ETH");
        assert_eq!(normalize_symbol("  btcusdc "), "BTC");
        assert_eq!(normalize_symbol("COINBASE:ADAUSD"), "ADA");
    }

    #[test]
    fn usdt_is_tried_before_usd() {
        // Stripping USD first would leave "DOGET".
        assert_eq!(normalize_symbol("DOGEUSDT"), "DOGE");
    }

    #[test]
    fn cross_pairs_strip_crypto_quotes() {
        assert_eq!(normalize_symbol("ETHBTC"), "ETH");
        assert_eq!(normalize_symbol("LINKETH"), "LINK");
    }

    #[test]
    fn explicit_pair_separators() {
        assert_eq!(normalize_symbol("SOL/USDT"), "SOL");
        assert_eq!(normalize_symbol("KRAKEN:xrp-usd"), "XRP");
        assert_eq!(normalize_symbol("avax_usdt"), "AVAX");
    }

    #[test]
    fn bare_quote_code_is_kept() {
        assert_eq!(normalize_symbol("BTC"), "BTC");
        assert_eq!(normalize_symbol("USDT"), "USDT");
    }

    #[test]
    fn unparseable_input_is_empty() {
        assert_eq!(normalize_symbol(""), "");
        assert_eq!(normalize_symbol("   "), "");
        assert_eq!(normalize_symbol("BINANCE:"), "");
        assert_eq!(normalize_symbol("/USDT"), "");
    }
}
