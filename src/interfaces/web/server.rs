use super::{GenerationState, generate, health};
use crate::config::ServiceConfig;
use crate::domain::generation::ModelGateway;
use crate::infrastructure::staging::GlbStaging;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Builds the router for `/health` and `/generate`.
///
/// Request bodies are unbounded unless `body_limit` is set.
pub fn build_router(state: Arc<GenerationState>, body_limit: Option<usize>) -> Router {
    let body_limit = match body_limit {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(body_limit)
                .layer(CorsLayer::permissive()),
        )
}

pub async fn create_server(
    config: ServiceConfig,
    gateway: Arc<dyn ModelGateway>,
) -> anyhow::Result<()> {
    info!("Starting TripoSR web server...");

    let state = Arc::new(GenerationState::new(
        gateway.clone(),
        config.foreground_ratio,
        GlbStaging::new(config.staging_dir.clone()),
    ));
    let app = build_router(state, config.body_limit);

    info!("Binding to {}", config.bind_address());
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;

    println!("🌐 Web server started successfully!");
    println!("   URL: http://{addr}");
    println!("   Model: {} on {}", gateway.model_name(), gateway.device());
    println!("   Endpoints:");
    println!("     GET  /health");
    println!("     POST /generate");
    println!("   Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
