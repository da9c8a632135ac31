use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobboard_api::auth::GoTrueAuth;
use jobboard_api::config::Config;
use jobboard_api::gateway::RestGateway;
use jobboard_api::preferences::ThemeStore;
use jobboard_api::routes::build_router;
use jobboard_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("jobboard_api={},tower_http={}", &config.rust_log, &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Board API v{}", env!("CARGO_PKG_VERSION"));

    // Missing backend settings are reported, not fatal: remote calls answer 503.
    config.report_missing();

    let gateway = RestGateway::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    );
    let auth = GoTrueAuth::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    );
    info!("Backend clients initialized");

    let theme = ThemeStore::load(config.preferences_path.clone()).await;
    info!(
        "Theme preference {:?} loaded from {}",
        theme.theme(),
        theme.path().display()
    );

    let state = AppState {
        gateway: Arc::new(gateway),
        auth: Arc::new(auth),
        config: config.clone(),
        theme: Arc::new(Mutex::new(theme)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the SPA host once it is configurable

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
