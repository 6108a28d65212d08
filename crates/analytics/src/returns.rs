use crate::error::AnalyticsError;
use core_types::{PriceSeries, ReturnSeries};

/// Converts closing prices into log-returns: `r[i] = ln(p[i + 1] / p[i])`.
///
/// The result has exactly one element fewer than the input.
pub fn log_returns(prices: &[f64]) -> Result<ReturnSeries, AnalyticsError> {
    if prices.len() < 2 {
        return Err(AnalyticsError::InsufficientData {
            metric: "log_returns",
            required: 2,
            actual: prices.len(),
        });
    }
    if let Some((index, &value)) = prices
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
        return Err(AnalyticsError::InvalidPrice { index, value });
    }

    let values = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    Ok(ReturnSeries::from_values(values))
}

/// Log-returns of a validated price series, dated by each return's closing
/// day when the series is dated.
pub fn series_returns(series: &PriceSeries) -> Result<ReturnSeries, AnalyticsError> {
    let returns = log_returns(series.closes())?;
    match series.dates() {
        [] => Ok(returns),
        [_, rest @ ..] => ReturnSeries::with_dates(returns.values().to_vec(), rest.to_vec())
            .map_err(|e| AnalyticsError::InvalidDates(e.to_string())),
    }
}
