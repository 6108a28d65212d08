use crate::error::{AnalyzerError, FetchError};
use crate::scoring::{composite_score, rank_rows};
use analytics::{BetaEstimator, series_returns, std_dev};
use api_client::PriceProvider;
use configuration::{BenchmarkConfig, BenchmarksConfig, Config, RankingConfig};
use core_types::{
    Benchmark, BenchmarkSet, FetchWindow, RankResponse, RankRow, ReturnSeries, normalize_symbol,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// Ranks tickers by their beta to two benchmark assets.
///
/// A `Ranker` holds no per-request state and can serve any number of
/// concurrent `rank` calls.
pub struct Ranker {
    provider: Arc<dyn PriceProvider>,
    ranking: RankingConfig,
    benchmarks: BenchmarksConfig,
    quote: String,
    estimator: BetaEstimator,
    fetch_timeout: Duration,
}

/// The effective parameters of one ranking request.
#[derive(Debug, Clone, Copy)]
struct RequestPlan {
    lookback: usize,
    window: FetchWindow,
}

impl Ranker {
    pub fn new(provider: Arc<dyn PriceProvider>, config: &Config) -> Self {
        Self::from_parts(
            provider,
            config.ranking.clone(),
            config.benchmarks.clone(),
            config.provider.quote.clone(),
        )
    }

    pub fn from_parts(
        provider: Arc<dyn PriceProvider>,
        ranking: RankingConfig,
        benchmarks: BenchmarksConfig,
        quote: String,
    ) -> Self {
        Self {
            provider,
            estimator: BetaEstimator::new(ranking.min_beta_samples),
            fetch_timeout: Duration::from_secs(ranking.fetch_timeout_secs),
            ranking,
            benchmarks,
            quote,
        }
    }

    /// Fetches, scores, and ranks every ticker against both benchmarks.
    ///
    /// Fails only when `tickers` is empty or a benchmark cannot be loaded.
    /// Every other problem is confined to the affected ticker's row. Tickers
    /// without a recognisable base symbol are dropped.
    pub async fn rank(
        &self,
        tickers: &[String],
        lookback_days: Option<i64>,
    ) -> Result<RankResponse, AnalyzerError> {
        if tickers.is_empty() {
            return Err(AnalyzerError::EmptyTickers);
        }

        let lookback = self.ranking.effective_lookback(lookback_days);
        let plan = RequestPlan {
            lookback,
            window: FetchWindow::Trailing {
                days: lookback + self.ranking.fetch_buffer_days,
            },
        };

        let span = tracing::info_span!(
            "rank",
            request_id = %Uuid::new_v4(),
            tickers = tickers.len(),
            lookback,
        );
        self.run(tickers, plan).instrument(span).await
    }

    async fn run(&self, tickers: &[String], plan: RequestPlan) -> Result<RankResponse, AnalyzerError> {
        // 1. Benchmarks (hard join point)
        let benchmarks = self.load_benchmarks(plan).await?;

        // 2. Per-ticker fetch and regression
        let jobs: Vec<(String, String)> = tickers
            .iter()
            .filter_map(|raw| {
                let base = normalize_symbol(raw);
                if base.is_empty() {
                    tracing::debug!(ticker = %raw, "Dropping ticker without a base symbol.");
                    None
                } else {
                    Some((raw.trim().to_ascii_uppercase(), base))
                }
            })
            .collect();

        let dropped = tickers.len() - jobs.len();

        let benchmarks = &benchmarks;
        let rows: Vec<RankRow> = stream::iter(jobs)
            .map(|(ticker, base)| async move {
                self.rank_ticker(&ticker, &base, benchmarks, plan).await
            })
            .buffered(self.ranking.max_concurrency.max(1))
            .collect()
            .await;

        // 3. Rank
        let rows = rank_rows(rows);
        let failed = rows.iter().filter(|r| r.is_failed()).count();
        tracing::info!(rows = rows.len(), failed, dropped, "Ranking complete.");

        Ok(RankResponse {
            lookback_days: plan.lookback,
            benchmarks: benchmarks.names(),
            scoring: self.ranking.scoring,
            rows,
        })
    }

    /// Loads both benchmarks concurrently; either failing aborts the request.
    async fn load_benchmarks(&self, plan: RequestPlan) -> Result<BenchmarkSet, AnalyzerError> {
        let (primary, secondary) = tokio::try_join!(
            self.load_benchmark(&self.benchmarks.primary, plan),
            self.load_benchmark(&self.benchmarks.secondary, plan),
        )?;
        Ok(BenchmarkSet { primary, secondary })
    }

    async fn load_benchmark(
        &self,
        config: &BenchmarkConfig,
        plan: RequestPlan,
    ) -> Result<Benchmark, AnalyzerError> {
        let to_error = |source: FetchError| {
            tracing::error!(benchmark = %config.name, error = %source, "Benchmark unavailable.");
            AnalyzerError::Benchmark {
                name: config.name.clone(),
                source,
            }
        };

        let base = normalize_symbol(&config.symbol);
        if base.is_empty() {
            return Err(to_error(FetchError::Unparseable(config.symbol.clone())));
        }
        let returns = self.fetch_returns(&base, plan).await.map_err(to_error)?;

        if let Ok(vol) = std_dev(returns.values()) {
            tracing::debug!(benchmark = %config.name, returns = returns.len(), daily_vol = vol, "Benchmark loaded.");
        }
        Ok(Benchmark {
            name: config.name.clone(),
            returns,
        })
    }

    /// Fetches closes for `base` and returns its trailing log-returns.
    async fn fetch_returns(&self, base: &str, plan: RequestPlan) -> Result<ReturnSeries, FetchError> {
        let fetch = self.provider.fetch_closes(base, &self.quote, plan.window);
        let series = tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .map_err(|_| FetchError::Timeout(self.fetch_timeout))??;
        let returns = series_returns(&series)?;
        Ok(returns.trailing(plan.lookback))
    }

    async fn rank_ticker(
        &self,
        ticker: &str,
        base: &str,
        benchmarks: &BenchmarkSet,
        plan: RequestPlan,
    ) -> RankRow {
        match self.fetch_returns(base, plan).await {
            Ok(returns) => {
                if let (Some(last), Some(bench_last)) =
                    (returns.last_date(), benchmarks.primary.returns.last_date())
                {
                    if last != bench_last {
                        tracing::debug!(ticker = %ticker, %last, %bench_last, "Ticker series ends on a different day; pairing by date.");
                    }
                }
                let beta_primary = self
                    .estimator
                    .estimate_series(&returns, &benchmarks.primary.returns);
                let beta_secondary = self
                    .estimator
                    .estimate_series(&returns, &benchmarks.secondary.returns);
                let score = composite_score(self.ranking.scoring, beta_primary, beta_secondary);
                RankRow::scored(ticker, base, beta_primary, beta_secondary, score)
            }
            Err(e) => {
                tracing::warn!(ticker = %ticker, base = %base, error = %e, "Ticker failed.");
                RankRow::failed(ticker, base, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::error::ApiError;
    use approx::assert_abs_diff_eq;
    use async_trait::async_trait;
    use chrono::{Days, NaiveDate};
    use core_types::PriceSeries;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// How the stub answers for one base symbol.
    #[derive(Clone)]
    enum Canned {
        Returns(fn(usize) -> f64),
        Constant(f64),
        Fail,
        Short,
        Slow(Duration),
    }

    #[derive(Default)]
    struct StubProvider {
        canned: HashMap<String, Canned>,
        delays: HashMap<String, Duration>,
        /// Bases served as dated series ending this many days before `last_day()`.
        lags: HashMap<String, u64>,
        windows: Mutex<Vec<(String, FetchWindow)>>,
    }

    fn first_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn last_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
    }

    impl StubProvider {
        fn with(mut self, base: &str, canned: Canned) -> Self {
            self.canned.insert(base.to_string(), canned);
            self
        }

        fn delayed(mut self, base: &str, delay: Duration) -> Self {
            self.delays.insert(base.to_string(), delay);
            self
        }

        fn lagged(mut self, base: &str, lag: u64) -> Self {
            self.lags.insert(base.to_string(), lag);
            self
        }

        fn requested(&self) -> Vec<(String, FetchWindow)> {
            self.windows.lock().unwrap().clone()
        }
    }

    fn prices_from(returns: fn(usize) -> f64, days: usize) -> Vec<f64> {
        let mut prices = vec![100.0];
        for i in 1..days {
            let last = prices[i - 1];
            prices.push(last * returns(i).exp());
        }
        prices
    }

    /// Prices whose return on each calendar day depends only on that day.
    fn dated_prices(returns: fn(usize) -> f64, days: usize, lag: u64) -> PriceSeries {
        let end = last_day() - Days::new(lag);
        let dates: Vec<NaiveDate> = (0..days)
            .rev()
            .map(|back| end - Days::new(back as u64))
            .collect();
        let mut prices = vec![100.0];
        for date in &dates[1..] {
            let t = (*date - first_day()).num_days() as usize;
            let last = prices[prices.len() - 1];
            prices.push(last * returns(t).exp());
        }
        PriceSeries::new("dated", prices)
            .unwrap()
            .with_dates(dates)
            .unwrap()
    }

    #[async_trait]
    impl PriceProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_closes(
            &self,
            base: &str,
            _quote: &str,
            window: FetchWindow,
        ) -> Result<PriceSeries, ApiError> {
            self.windows.lock().unwrap().push((base.to_string(), window));
            if let Some(delay) = self.delays.get(base) {
                tokio::time::sleep(*delay).await;
            }
            let days = window.day_count();
            let closes = match self.canned.get(base).cloned() {
                Some(Canned::Returns(f)) => match self.lags.get(base) {
                    Some(lag) => return Ok(dated_prices(f, days, *lag)),
                    None => prices_from(f, days),
                },
                Some(Canned::Constant(p)) => vec![p; days],
                Some(Canned::Fail) => {
                    return Err(ApiError::Provider(format!("no market for {base}")));
                }
                Some(Canned::Short) => {
                    return Err(ApiError::InsufficientData {
                        symbol: base.to_string(),
                        actual: 3,
                        required: 20,
                    });
                }
                Some(Canned::Slow(d)) => {
                    tokio::time::sleep(d).await;
                    prices_from(btc, days)
                }
                None => return Err(ApiError::UnknownSymbol(base.to_string())),
            };
            Ok(PriceSeries::new(base, closes).unwrap())
        }
    }

    fn btc(i: usize) -> f64 {
        let t = i as f64;
        0.02 * (t * 0.7).sin() + 0.01 * (t * 1.3).cos()
    }

    fn eth(i: usize) -> f64 {
        let t = i as f64;
        0.03 * (t * 0.5 + 1.0).sin() - 0.005 * (t * 2.1).cos()
    }

    fn sol(i: usize) -> f64 {
        1.8 * btc(i) + 0.4 * eth(i)
    }

    fn base_stub() -> StubProvider {
        StubProvider::default()
            .with("BTC", Canned::Returns(btc))
            .with("ETH", Canned::Returns(eth))
    }

    fn ranker(stub: StubProvider) -> (Arc<StubProvider>, Ranker) {
        let stub = Arc::new(stub);
        let ranker = Ranker::new(stub.clone(), &Config::default());
        (stub, ranker)
    }

    fn tickers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn row<'a>(response: &'a RankResponse, ticker: &str) -> &'a RankRow {
        response
            .rows
            .iter()
            .find(|r| r.ticker == ticker)
            .unwrap_or_else(|| panic!("missing row {ticker}"))
    }

    #[tokio::test]
    async fn ranks_with_a_flat_ticker_last() {
        let (_, ranker) = ranker(base_stub().with("ZZZINVALID", Canned::Constant(3.0)));
        let response = ranker
            .rank(&tickers(&["BTCUSDT", "ETHUSDT", "ZZZINVALID"]), Some(90))
            .await
            .unwrap();

        assert_eq!(response.lookback_days, 90);
        assert_eq!(response.benchmarks, ["BTC".to_string(), "ETH".to_string()]);
        assert_eq!(response.rows.len(), 3);

        let btc_row = row(&response, "BTCUSDT");
        assert_eq!(btc_row.base, "BTC");
        assert_abs_diff_eq!(btc_row.beta_primary.unwrap(), 1.0, epsilon = 1e-9);
        assert!(btc_row.score.is_some());

        let eth_row = row(&response, "ETHUSDT");
        assert_abs_diff_eq!(eth_row.beta_secondary.unwrap(), 1.0, epsilon = 1e-9);

        let flat = row(&response, "ZZZINVALID");
        assert!(flat.score.is_none());
        assert!(flat.error.is_none());
        assert_eq!(flat.rank, 3);
        assert_eq!(response.rows.last().unwrap().ticker, "ZZZINVALID");
    }

    #[tokio::test]
    async fn one_failing_ticker_does_not_affect_the_others() {
        let stub = base_stub()
            .with("SOL", Canned::Returns(sol))
            .with("BAD", Canned::Fail);
        let (_, ranker) = ranker(stub);
        let response = ranker
            .rank(&tickers(&["SOLUSDT", "BADUSDT", "ETHUSDT"]), None)
            .await
            .unwrap();

        assert_eq!(response.rows.len(), 3);
        let bad = row(&response, "BADUSDT");
        assert!(bad.error.as_deref().unwrap().contains("no market for BAD"));
        assert!(bad.beta_primary.is_none() && bad.beta_secondary.is_none() && bad.score.is_none());
        assert_eq!(bad.rank, 3);

        for ticker in ["SOLUSDT", "ETHUSDT"] {
            let ok = row(&response, ticker);
            assert!(ok.error.is_none());
            assert!(ok.beta_primary.is_some() && ok.beta_secondary.is_some() && ok.score.is_some());
        }
    }

    #[tokio::test]
    async fn rows_are_sorted_by_descending_score() {
        let stub = base_stub().with("SOL", Canned::Returns(sol));
        let (_, ranker) = ranker(stub);
        let response = ranker
            .rank(&tickers(&["ETHUSDT", "BTCUSDT", "SOLUSDT"]), Some(60))
            .await
            .unwrap();

        let scores: Vec<f64> = response.rows.iter().map(|r| r.score.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(response.rows[0].ticker, "SOLUSDT");
        assert_eq!(
            response.rows.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn insufficient_data_and_unknown_symbols_are_row_errors() {
        let (_, ranker) = ranker(base_stub().with("TINY", Canned::Short));
        let response = ranker
            .rank(&tickers(&["TINYUSDT", "NOPE"]), None)
            .await
            .unwrap();

        assert!(row(&response, "TINYUSDT").error.as_deref().unwrap().contains("Insufficient data"));
        assert!(row(&response, "NOPE").error.as_deref().unwrap().contains("Unknown symbol"));
    }

    #[tokio::test]
    async fn empty_ticker_list_is_rejected() {
        let (stub, ranker) = ranker(base_stub());
        assert!(matches!(ranker.rank(&[], Some(90)).await, Err(AnalyzerError::EmptyTickers)));
        assert!(stub.requested().is_empty());
    }

    #[tokio::test]
    async fn benchmark_failure_aborts_the_request() {
        let stub = StubProvider::default()
            .with("BTC", Canned::Returns(btc))
            .with("ETH", Canned::Fail);
        let (_, ranker) = ranker(stub);
        match ranker.rank(&tickers(&["BTCUSDT"]), None).await {
            Err(AnalyzerError::Benchmark { name, .. }) => assert_eq!(name, "ETH"),
            other => panic!("expected benchmark failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_tickers_are_dropped() {
        let (_, ranker) = ranker(base_stub());
        let response = ranker
            .rank(&tickers(&["", "BINANCE:", "  ", "btcusdt"]), None)
            .await
            .unwrap();
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0].ticker, "BTCUSDT");
        assert_eq!(response.rows[0].rank, 1);
    }

    #[tokio::test]
    async fn lookback_is_clamped_and_buffered() {
        let (stub, ranker) = ranker(base_stub());
        let response = ranker.rank(&tickers(&["BTCUSDT"]), Some(5)).await.unwrap();
        assert_eq!(response.lookback_days, 20);
        assert!(
            stub.requested()
                .iter()
                .all(|(_, w)| *w == FetchWindow::Trailing { days: 25 })
        );

        let response = ranker.rank(&tickers(&["BTCUSDT"]), Some(-1)).await.unwrap();
        assert_eq!(response.lookback_days, 90);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticker_times_out_in_isolation() {
        let stub = base_stub().with("SLOW", Canned::Slow(Duration::from_secs(60)));
        let (_, ranker) = ranker(stub);
        let response = ranker
            .rank(&tickers(&["SLOWUSDT", "BTCUSDT"]), None)
            .await
            .unwrap();

        let slow = row(&response, "SLOWUSDT");
        assert!(slow.error.as_deref().unwrap().contains("timed out"));
        assert!(row(&response, "BTCUSDT").score.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn completion_order_does_not_change_the_result() {
        let fast_first = base_stub()
            .with("SOL", Canned::Returns(sol))
            .delayed("SOL", Duration::from_millis(900));
        let (_, ranker_a) = ranker(fast_first);

        let slow_first = base_stub()
            .with("SOL", Canned::Returns(sol))
            .delayed("ETH", Duration::from_millis(5))
            .delayed("BTC", Duration::from_millis(900));
        let (_, ranker_b) = ranker(slow_first);

        let input = tickers(&["BTCUSDT", "SOLUSDT", "ETHUSDT"]);
        let a = ranker_a.rank(&input, None).await.unwrap();
        let b = ranker_b.rank(&input, None).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn rank_future_is_send() {
        let (_, ranker) = ranker(base_stub());
        let ranker = Arc::new(ranker);
        let handle = tokio::spawn({
            let ranker = Arc::clone(&ranker);
            async move {
                let input = tickers(&["BTCUSDT", "ETHUSDT"]);
                ranker.rank(&input, None).await
            }
        });
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.rows.len(), 2);
    }

    #[tokio::test]
    async fn halted_ticker_is_paired_with_benchmarks_by_day() {
        // HALT moves exactly like BTC but its last candle is three days old.
        let stub = base_stub()
            .lagged("BTC", 0)
            .lagged("ETH", 0)
            .with("HALT", Canned::Returns(btc))
            .lagged("HALT", 3);
        let (_, ranker) = ranker(stub);
        let response = ranker.rank(&tickers(&["HALTUSDT"]), Some(30)).await.unwrap();

        let halted = &response.rows[0];
        assert!(halted.error.is_none());
        assert_abs_diff_eq!(halted.beta_primary.unwrap(), 1.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn benchmarks_and_tickers_use_the_same_window_length() {
        let (_, ranker) = ranker(base_stub().with("SOL", Canned::Returns(sol)));
        let response = ranker.rank(&tickers(&["SOLUSDT"]), Some(30)).await.unwrap();
        // sol = 1.8 btc + 0.4 eth; both betas are finite and far from zero.
        let sol_row = &response.rows[0];
        assert!(sol_row.beta_primary.unwrap() > 0.5);
        assert!(sol_row.beta_secondary.unwrap() > 0.0);
    }
}
