use crate::enums::ScoringPolicy;
use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily closing prices for one symbol, oldest first.
///
/// Every close is positive and finite, so log-returns over the series are
/// always defined. Provider-backed series also carry the UTC calendar day of
/// each close; hand-built series may be undated.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    closes: Vec<f64>,
    dates: Vec<NaiveDate>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, closes: Vec<f64>) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        if closes.is_empty() {
            return Err(CoreError::InvalidInput(
                symbol,
                "price series must contain at least one close".to_string(),
            ));
        }
        if let Some((index, &value)) = closes
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_finite() || **c <= 0.0)
        {
            return Err(CoreError::InvalidPrice {
                symbol,
                index,
                value,
            });
        }
        Ok(Self {
            symbol,
            closes,
            dates: Vec::new(),
        })
    }

    /// Attaches one calendar day per close. Days must be strictly increasing.
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self, CoreError> {
        check_dates(&self.symbol, dates.len(), self.closes.len(), &dates)?;
        self.dates = dates;
        Ok(self)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    /// Day of each close; empty for an undated series.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// The most recent close.
    pub fn last(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Log-returns derived from a `PriceSeries`. Never mutated once built.
///
/// When dated, `dates[i]` is the day whose close ends return `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    values: Vec<f64>,
    dates: Vec<NaiveDate>,
}

impl ReturnSeries {
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            values,
            dates: Vec::new(),
        }
    }

    pub fn with_dates(values: Vec<f64>, dates: Vec<NaiveDate>) -> Result<Self, CoreError> {
        check_dates("returns", dates.len(), values.len(), &dates)?;
        Ok(Self { values, dates })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn is_dated(&self) -> bool {
        !self.dates.is_empty() && self.dates.len() == self.values.len()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The last `n` elements, or the whole series when it is shorter.
    pub fn tail(&self, n: usize) -> &[f64] {
        let start = self.values.len().saturating_sub(n);
        &self.values[start..]
    }

    /// A new series holding only the trailing `n` returns (and their days).
    pub fn trailing(&self, n: usize) -> Self {
        let start = self.values.len().saturating_sub(n);
        Self {
            values: self.values[start..].to_vec(),
            dates: self.dates.get(start..).unwrap_or_default().to_vec(),
        }
    }
}

fn check_dates(
    symbol: &str,
    dates: usize,
    values: usize,
    days: &[NaiveDate],
) -> Result<(), CoreError> {
    if dates != values {
        return Err(CoreError::InvalidInput(
            symbol.to_string(),
            format!("{dates} dates for {values} values"),
        ));
    }
    if let Some(pair) = days.windows(2).find(|w| w[0] >= w[1]) {
        return Err(CoreError::InvalidInput(
            symbol.to_string(),
            format!("dates must be strictly increasing ({} then {})", pair[0], pair[1]),
        ));
    }
    Ok(())
}

/// A named benchmark return series.
#[derive(Debug, Clone, PartialEq)]
pub struct Benchmark {
    pub name: String,
    pub returns: ReturnSeries,
}

/// The two benchmarks every ticker in a ranking request is regressed against.
/// Built once per request and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSet {
    pub primary: Benchmark,
    pub secondary: Benchmark,
}

impl BenchmarkSet {
    pub fn names(&self) -> [String; 2] {
        [self.primary.name.clone(), self.secondary.name.clone()]
    }
}

/// The span of daily candles requested from a price provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchWindow {
    /// The most recent `days` daily candles.
    Trailing { days: usize },
    /// Every daily candle between two dates, both inclusive.
    Range { start: NaiveDate, end: NaiveDate },
}

impl FetchWindow {
    pub fn trailing(days: usize) -> Result<Self, CoreError> {
        if days == 0 {
            return Err(CoreError::InvalidInput(
                "window".to_string(),
                "trailing window must cover at least one day".to_string(),
            ));
        }
        Ok(FetchWindow::Trailing { days })
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidInput(
                "window".to_string(),
                format!("range start {} is after end {}", start, end),
            ));
        }
        Ok(FetchWindow::Range { start, end })
    }

    /// Number of daily candles the window spans.
    pub fn day_count(&self) -> usize {
        match self {
            FetchWindow::Trailing { days } => *days,
            FetchWindow::Range { start, end } => ((*end - *start).num_days() + 1) as usize,
        }
    }
}

/// One ticker's outcome in a ranking request.
///
/// A row is either computed (betas and score may still be absent when the
/// data is degenerate) or failed, in which case every numeric field is absent
/// and `error` explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRow {
    pub ticker: String,
    pub base: String,
    pub beta_primary: Option<f64>,
    pub beta_secondary: Option<f64>,
    pub score: Option<f64>,
    pub error: Option<String>,
    /// 1-based position after sorting; zero until assigned.
    pub rank: usize,
}

impl RankRow {
    pub fn scored(
        ticker: impl Into<String>,
        base: impl Into<String>,
        beta_primary: Option<f64>,
        beta_secondary: Option<f64>,
        score: Option<f64>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            base: base.into(),
            beta_primary,
            beta_secondary,
            score,
            error: None,
            rank: 0,
        }
    }

    pub fn failed(
        ticker: impl Into<String>,
        base: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            base: base.into(),
            beta_primary: None,
            beta_secondary: None,
            score: None,
            error: Some(error.into()),
            rank: 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// The result of a ranking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    /// The lookback actually used, after defaulting and clamping.
    pub lookback_days: usize,
    pub benchmarks: [String; 2],
    pub scoring: ScoringPolicy,
    pub rows: Vec<RankRow>,
}
