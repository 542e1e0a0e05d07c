use std::net::SocketAddr;
use std::sync::Arc;

use api_gateway::ConceptMapGateway;
use concept_map_rs::ConceptMapPipeline;
use config_rs::ServiceConfig;
use error_handling_rs::{init_logging, LoggingConfig, RetryPolicy};
use llm_client_rs::GeminiClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file and environment
    let config = ServiceConfig::from_env();

    let _log_guard = init_logging(LoggingConfig {
        level: config.logging.level.clone(),
        service_name: "concept-map-service".to_string(),
        json_format: config.logging.json_format,
        log_dir: config.logging.log_dir.clone(),
    })?;

    let upstream = GeminiClient::from_settings(&config.upstream)?;
    if !upstream.is_configured() {
        tracing::warn!("GEMINI_API_KEY is not set; concept map requests will fail with 503");
    }

    let retry = RetryPolicy::new(config.retry.max_retries, config.retry.initial_delay);
    tracing::info!(model = upstream.model(), retry = %retry, "Upstream client ready");

    let pipeline = ConceptMapPipeline::new(Arc::new(upstream), retry);
    let gateway = Arc::new(ConceptMapGateway::new(pipeline, config.rate_limits));
    let app = gateway.create_router();

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Concept map service listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Concept map service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
