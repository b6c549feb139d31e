use crate::config::{Backend, SummaryConfig};
use crate::handlers;
use crate::services::{
    MemoryStorage, MemoryStore, ObjectStorage, PostgrestStore, SummaryService, SummaryStore,
    SupabaseStorage,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use service_core::observability::{extract_traceparent, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Headroom for the text fields that travel alongside the PDF.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: SummaryConfig,
    pub summaries: SummaryService,
}

impl AppState {
    pub fn new(
        config: SummaryConfig,
        store: Arc<dyn SummaryStore>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            config,
            summaries: SummaryService::new(store, storage),
        }
    }

    /// Wires the backends selected by `config.backend`.
    pub fn from_config(config: SummaryConfig) -> Result<Self, AppError> {
        let (store, storage): (Arc<dyn SummaryStore>, Arc<dyn ObjectStorage>) = match config.backend
        {
            Backend::Supabase => {
                let supabase = &config.supabase;
                tracing::info!(
                    url = %supabase.url,
                    table = %supabase.table,
                    bucket = %supabase.storage_bucket,
                    "Using hosted datastore and storage"
                );
                (
                    Arc::new(PostgrestStore::new(
                        &supabase.url,
                        &supabase.table,
                        supabase.key.clone(),
                    )),
                    Arc::new(SupabaseStorage::new(
                        &supabase.url,
                        &supabase.storage_bucket,
                        supabase.key.clone(),
                    )?),
                )
            }
            Backend::Memory => {
                tracing::warn!("Using in-memory datastore and storage; data is not persisted");
                (
                    Arc::new(MemoryStore::new()),
                    Arc::new(MemoryStorage::new(&config.supabase.storage_bucket)),
                )
            }
        };

        Ok(Self::new(config, store, storage))
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/summaries", post(handlers::create_summary))
        .route(
            "/summaries/by-patient/:patient_id",
            get(handlers::list_by_patient),
        )
        // Static segments win over the `:summary_id` capture below.
        .route("/summaries/by-date", get(handlers::list_by_date))
        .route("/summaries/all", get(handlers::list_all))
        .route("/summaries/:summary_id", get(handlers::get_summary))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                let traceparent = extract_traceparent(request.headers()).unwrap_or_default();

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    traceparent = %traceparent,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: SummaryConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config)?;
        Self::with_state(state).await
    }

    /// Binds `state.config.common.port` (0 picks a free port).
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
