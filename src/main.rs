use anyhow::Context;
use kaj_lagbe::api::{AppState, app_routes};
use kaj_lagbe::config::AppConfig;
use kaj_lagbe::logging::init_logging;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;
    let _log_guard = init_logging(config.log_dir.as_deref())?;

    eprintln!("🧰 Kaj Lagbe v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/workers", config.port);
    eprintln!("   Navigation WS: ws://0.0.0.0:{}/ws/navigation", config.port);

    // ── Database ─────────────────────────────────────────────────────────
    let state = AppState::open(&config)
        .await
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    eprintln!("   Database: {}", config.db_path.display());

    // ── HTTP server ──────────────────────────────────────────────────────
    let app = app_routes(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
