use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wgcatalog::{presence_api_router, InMemoryPresence, PresenceState};
use wgconfig::get_config;
use wgproxy::{proxy_api_router, FailoverRouter, HostSelector, ProxyState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_config();

    // RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.get_log_level()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.get_log_console() {
        subscriber.init();
    } else {
        subscriber.with_writer(std::io::sink).init();
    }

    info!("🎵 Starting WaveGate proxy...");

    let hosts = Arc::new(HostSelector::new()?);
    let router = FailoverRouter::builder()
        .hosts(Arc::clone(&hosts))
        .app_name(config.get_app_name())
        .default_limit(config.get_trending_limit())
        .build()?;

    let presence: Arc<dyn wgcatalog::PresenceService> = Arc::new(InMemoryPresence::new());

    let base_url = config.get_base_url();
    let app = Router::new()
        .nest(
            "/api/audius",
            proxy_api_router(ProxyState::new(Arc::new(router))),
        )
        .nest("/api/presence", presence_api_router(PresenceState::new(presence)))
        .route(
            "/api/info",
            get(move || {
                let base_url = base_url.clone();
                async move {
                    Json(serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "base_url": base_url,
                    }))
                }
            }),
        );

    let addr = format!("0.0.0.0:{}", config.get_http_port());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🌐 Listening on http://{}", addr);
    info!("Press Ctrl+C to stop...");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("✅ WaveGate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}
