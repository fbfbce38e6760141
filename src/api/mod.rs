//! Axum router, shared state and the serve loop used by the server binary.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, AppResult};
use crate::generator::ImageGenerator;
use crate::store::PromptStore;

pub mod handlers;

pub struct AppState {
    pub store: PromptStore,
    pub generator: Arc<dyn ImageGenerator>,
    pub static_dir: PathBuf,
    pub generation_timeout: Duration,
    pub workers: Semaphore,
    pub shutdown: Notify,
}

impl AppState {
    pub fn new(
        store: PromptStore,
        generator: Arc<dyn ImageGenerator>,
        static_dir: impl Into<PathBuf>,
        generation_timeout: Duration,
        workers: usize,
    ) -> Self {
        AppState {
            store,
            generator,
            static_dir: static_dir.into(),
            generation_timeout,
            workers: Semaphore::new(workers.max(1)),
            shutdown: Notify::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(state.static_dir.clone());
    Router::new()
        .route("/", get(handlers::root))
        .route("/generate", post(handlers::generate))
        .route("/view-prompts", get(handlers::view_prompts))
        .route("/delete-prompt/:id", delete(handlers::delete_prompt))
        .route("/delete-all-prompts", delete(handlers::delete_all_prompts))
        .route("/shutdown", post(handlers::shutdown))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already-bound listener until `/shutdown` is hit or `signal` resolves.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    signal: impl Future<Output = ()> + Send + 'static,
) -> AppResult<()> {
    listener.set_nonblocking(true)?;
    let app = router(state.clone());
    let stop = async move {
        tokio::select! {
            _ = state.shutdown.notified() => tracing::info!("shutdown requested over HTTP"),
            _ = signal => tracing::info!("shutdown signal received"),
        }
    };
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(stop)
        .await?;
    Ok(())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidPrompt(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Api { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
