use service_core::observability::init_tracing;
use summary_service::config::SummaryConfig;
use summary_service::services::init_metrics;
use summary_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics();

    let config = SummaryConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing("summary-service", "info", config.otlp_endpoint.as_deref());

    tracing::info!(
        backend = ?config.backend,
        max_upload_bytes = config.upload.max_bytes,
        "Starting clinical summary API"
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
