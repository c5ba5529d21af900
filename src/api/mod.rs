pub mod handlers;
pub mod types;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::shield::Shield;

pub struct AppState {
    pub shield: Shield,
}

pub fn router(shield: Shield) -> Router {
    let state = Arc::new(AppState { shield });

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/stats", get(handlers::stats))
        .route("/api/v1/check/send", post(handlers::check_send))
        .route("/api/v1/check/receive", post(handlers::check_receive))
        .route("/api/v1/analyze", post(handlers::analyze))
        .route("/api/v1/similarity", get(handlers::compare))
        .route("/api/v1/phishing/{address}", get(handlers::phishing))
        .route("/api/v1/report", post(handlers::report))
        .route("/api/v1/malicious", get(handlers::list_malicious))
        .route(
            "/api/v1/malicious/{address}",
            get(handlers::malicious_by_address),
        )
        .route("/api/v1/cache", delete(handlers::clear_cache))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(
    shield: Shield,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> eyre::Result<()> {
    let app = router(shield);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
