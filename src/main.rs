use analytics::log_returns;
use analyzer::Ranker;
use anyhow::bail;
use api_client::create_provider;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{Config, ConfigArgs};
use core_types::{FetchWindow, ProviderKind, RankResponse, ScoringPolicy, normalize_symbol};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::time::Duration;

/// The main entry point for the beta ranking service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Provider keys may live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config(cli.config.config.as_deref())?;
    let _guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Rank(args) => handle_rank(args, config).await,
        Commands::Closes(args) => handle_closes(args, config).await,
        Commands::Serve(args) => web_server::run_server(config, args.addr).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Ranks crypto tickers by their beta to two benchmark assets.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank tickers by beta to the configured benchmarks.
    Rank(RankArgs),
    /// Fetch and print the daily closes of a single ticker.
    Closes(ClosesArgs),
    /// Start the HTTP API.
    Serve(ServeArgs),
}

#[derive(Args)]
struct RankArgs {
    /// Comma-separated tickers (e.g., "BINANCE:SOLUSDT,ETHUSDT,DOGE").
    #[arg(long, value_delimiter = ',', required = true)]
    tickers: Vec<String>,

    /// Number of daily returns to regress over.
    #[arg(long)]
    lookback: Option<i64>,

    /// Overrides the configured price provider.
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Overrides the configured scoring policy.
    #[arg(long, value_enum)]
    scoring: Option<ScoringPolicy>,

    /// Print the response as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ClosesArgs {
    /// The ticker to fetch (e.g., "SOLUSDT").
    #[arg(long)]
    ticker: String,

    /// Number of most recent daily closes.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    days: Option<usize>,

    /// First day of the range (format: YYYY-MM-DD).
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// Last day of the range, inclusive (format: YYYY-MM-DD).
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Overrides the configured price provider.
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,
}

#[derive(Args)]
struct ServeArgs {
    /// Listen address; defaults to the configured host and port.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_rank(args: RankArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(kind) = args.provider {
        config.provider.kind = kind;
    }
    if let Some(scoring) = args.scoring {
        config.ranking.scoring = scoring;
    }

    let ranker = Ranker::new(create_provider(&config.provider)?, &config);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?);
    spinner.set_message(format!(
        "Ranking {} tickers via {}...",
        args.tickers.len(),
        config.provider.kind
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = ranker.rank(&args.tickers, args.lookback).await;
    spinner.finish_and_clear();
    let response = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", rank_table(&response));
    }
    Ok(())
}

fn rank_table(response: &RankResponse) -> Table {
    let [primary, secondary] = &response.benchmarks;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Rank".to_string(),
        "Ticker".to_string(),
        "Base".to_string(),
        format!("Beta {primary}"),
        format!("Beta {secondary}"),
        format!("Score ({})", response.scoring),
        "Error".to_string(),
    ]);

    for row in &response.rows {
        table.add_row(vec![
            row.rank.to_string(),
            row.ticker.clone(),
            row.base.clone(),
            fmt_opt(row.beta_primary),
            fmt_opt(row.beta_secondary),
            fmt_opt(row.score),
            row.error.clone().unwrap_or_default(),
        ]);
    }
    table
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

async fn handle_closes(args: ClosesArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(kind) = args.provider {
        config.provider.kind = kind;
    }

    let window = match (args.from, args.to) {
        (Some(from), Some(to)) => FetchWindow::range(from, to)?,
        _ => FetchWindow::trailing(args.days.unwrap_or(config.ranking.default_lookback_days))?,
    };
    let base = normalize_symbol(&args.ticker);
    if base.is_empty() {
        bail!("'{}' has no recognisable base symbol", args.ticker);
    }

    let provider = create_provider(&config.provider)?;
    let series = provider
        .fetch_closes(&base, &config.provider.quote, window)
        .await?;
    // A single close has no return; the column is then left empty.
    let returns = log_returns(series.closes())
        .map(|r| r.values().to_vec())
        .unwrap_or_default();

    println!(
        "{} daily closes for {}/{} from {}",
        series.len(),
        series.symbol(),
        config.provider.quote,
        provider.name()
    );
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Date", "Close", "Log-return"]);
    for (i, close) in series.closes().iter().enumerate() {
        let day = series
            .dates()
            .get(i)
            .map_or_else(|| i.to_string(), |d| d.to_string());
        let ret = i.checked_sub(1).and_then(|j| returns.get(j).copied());
        table.add_row(vec![day, format!("{close:.6}"), fmt_opt(ret)]);
    }
    println!("{table}");
    Ok(())
}
