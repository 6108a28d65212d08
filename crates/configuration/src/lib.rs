use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    BenchmarkConfig, BenchmarksConfig, Config, LoggingConfig, MAX_FETCH_DAYS, ProviderConfig,
    RankingConfig, ServerConfig,
};

/// Prefix of environment overrides, e.g. `BETARANK__PROVIDER__KIND=coingecko`.
pub const ENV_PREFIX: &str = "BETARANK";

/// Global CLI flag pointing at an alternative configuration file.
#[cfg(feature = "clap")]
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Path to a TOML configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,
}

/// Loads the application configuration.
///
/// Layers, lowest precedence first: built-in defaults, the TOML file
/// (`config.toml` in the working directory unless `path` is given), then
/// `BETARANK__*` environment variables. The plain `PORT` and
/// `TRADINGVIEW_WEBHOOK_URL` variables are honoured last. The result is
/// validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name("config").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config = builder.try_deserialize::<Config>()?;
    apply_plain_env(&mut config, |key| std::env::var(key).ok());

    config.validate()?;
    Ok(config)
}

/// Applies the unprefixed variables older deployments set.
fn apply_plain_env(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
        config.server.port = port;
    }
    if let Some(url) = lookup("TRADINGVIEW_WEBHOOK_URL").filter(|u| !u.trim().is_empty()) {
        config.server.relay_webhook_url = Some(url.trim().to_string());
    }
}
