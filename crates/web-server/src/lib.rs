use analyzer::Ranker;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use configuration::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// The shared application state that all handlers can access.
pub struct AppState {
    pub ranker: Ranker,
    /// Downstream target of `/api/webhook/relay`.
    pub relay_url: Option<String>,
    /// Client used for relaying webhooks.
    pub http: reqwest::Client,
}

/// Builds the router with every route and middleware layer attached.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/rank", post(handlers::rank))
        .route("/api/webhook/relay", post(handlers::relay_webhook))
        .route("/api/webhook/tradingview", post(handlers::tradingview_webhook))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// Client for relaying webhooks; a slow downstream must not hold a handler forever.
fn relay_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(RELAY_TIMEOUT)
        .build()
}

/// Runs the web server until the process is stopped.
///
/// Tracing must already be initialized by the caller. `addr` overrides the
/// configured host and port.
pub async fn run_server(config: Config, addr: Option<SocketAddr>) -> anyhow::Result<()> {
    let addr = match addr {
        Some(addr) => addr,
        None => format!("{}:{}", config.server.host, config.server.port).parse()?,
    };

    let provider = api_client::create_provider(&config.provider)?;
    let state = Arc::new(AppState {
        ranker: Ranker::new(provider, &config),
        relay_url: config.server.relay_webhook_url.clone(),
        http: relay_client()?,
    });
    let app = build_router(state);

    tracing::info!("Web server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
