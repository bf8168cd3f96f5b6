//! HTTP route handlers.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::Backends;
use crate::config::Config;
use crate::worker::WorkerHandle;

use super::types::*;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Backends handed to every worker started through the API
    pub backends: Backends,
    /// The most recently started worker, if any
    pub worker: RwLock<Option<WorkerHandle>>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends) -> Self {
        Self {
            config,
            backends,
            worker: RwLock::new(None),
        }
    }
}

type ApiError = (StatusCode, String);

const NOT_INITIALIZED: &str = "Worker not initialized";

/// Build the router for `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/worker/start", post(start_worker))
        .route("/api/worker/stop", post(stop_worker))
        .route("/api/worker/status", get(worker_status))
        .route("/api/worker/status/text", get(worker_status_text))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let backends = Backends::from_config(&config);
    let state = Arc::new(AppState::new(config.clone(), backends));
    let app = router(Arc::clone(&state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal(shutdown_state).await;
        })
        .await?;

    Ok(())
}

/// Wait for SIGTERM/SIGINT, then stop the worker and wait for it to exit.
async fn shutdown_signal(state: Arc<AppState>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping worker...");
    if let Some(handle) = state.worker.write().await.take() {
        handle.shutdown().await;
    }
    tracing::info!("Graceful shutdown complete");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backends: state
            .backends
            .available()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// Start the queue worker. 409 when one is already running.
async fn start_worker(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartWorkerRequest>>,
) -> Result<Json<WorkerActionResponse>, ApiError> {
    let mode = body.and_then(|Json(req)| req.mode).unwrap_or_default();
    let mut worker = state.worker.write().await;

    if let Some(existing) = worker.as_ref() {
        if existing.is_running() {
            return Err((
                StatusCode::CONFLICT,
                format!("Worker already running in {} mode", existing.mode()),
            ));
        }
    }

    *worker = Some(WorkerHandle::spawn(&state.config, &state.backends, mode));
    Ok(Json(WorkerActionResponse {
        success: true,
        message: format!("Worker started in {} mode", mode),
        mode,
    }))
}

/// Request a stop. 404 when no worker was ever started.
async fn stop_worker(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WorkerActionResponse>, ApiError> {
    let worker = state.worker.read().await;
    let handle = worker
        .as_ref()
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No worker running".to_string()))?;

    handle.stop();
    Ok(Json(WorkerActionResponse {
        success: true,
        message: "Worker stopped".to_string(),
        mode: handle.mode(),
    }))
}

async fn worker_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WorkerStatusResponse>, ApiError> {
    let worker = state.worker.read().await;
    let handle = worker
        .as_ref()
        .ok_or_else(|| (StatusCode::NOT_FOUND, NOT_INITIALIZED.to_string()))?;
    Ok(Json(handle.status().into()))
}

async fn worker_status_text(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    match state.worker.read().await.as_ref() {
        Some(handle) => (StatusCode::OK, handle.status().render()),
        None => (StatusCode::NOT_FOUND, NOT_INITIALIZED.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerMode;
    use std::time::Duration;

    fn state(root: &std::path::Path) -> Arc<AppState> {
        let mut config = Config::for_game(root);
        // Keep the worker parked on an empty queue until stopped.
        config.timings.idle_delay = Duration::from_secs(3600);
        Arc::new(AppState::new(config, Backends::default()))
    }

    fn start_request(mode: WorkerMode) -> Option<Json<StartWorkerRequest>> {
        Some(Json(StartWorkerRequest { mode: Some(mode) }))
    }

    async fn shutdown_worker(state: &AppState) {
        let handle = state.worker.write().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }

    /// Wait until the stopped worker's loop has actually exited.
    async fn wait_until_exited(state: &AppState) {
        for _ in 0..200 {
            let running = state.worker.read().await.as_ref().is_some_and(|h| h.is_running());
            if !running {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("worker did not exit after stop");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let temp = tempfile::tempdir().expect("tempdir");
        let Json(body) = health(State(state(temp.path()))).await;
        assert_eq!(body.status, "ok");
        assert!(body.backends.is_empty());
    }

    #[tokio::test]
    async fn status_and_stop_before_start_are_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = state(temp.path());

        let err = stop_worker(State(Arc::clone(&state))).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = worker_status(State(Arc::clone(&state))).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let (code, text) = worker_status_text(State(state)).await;
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(text, NOT_INITIALIZED);
    }

    #[tokio::test]
    async fn second_start_conflicts_until_stopped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = state(temp.path());

        let Json(started) =
            start_worker(State(Arc::clone(&state)), start_request(WorkerMode::BugFixer))
                .await
                .unwrap();
        assert!(started.success);
        assert_eq!(started.mode, WorkerMode::BugFixer);

        let err = start_worker(State(Arc::clone(&state)), None).await.unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        let Json(status) = worker_status(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(status.status.mode, WorkerMode::BugFixer);
        assert_eq!(status.success_rate, 0.0);

        let Json(stopped) = stop_worker(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(stopped.message, "Worker stopped");
        wait_until_exited(&state).await;

        let Json(restarted) = start_worker(State(Arc::clone(&state)), None).await.unwrap();
        assert_eq!(restarted.mode, WorkerMode::FeatureGenerator);

        shutdown_worker(&state).await;
    }

    #[tokio::test]
    async fn text_status_renders_block() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = state(temp.path());
        start_worker(State(Arc::clone(&state)), start_request(WorkerMode::ContentCreator))
            .await
            .unwrap();

        let (code, text) = worker_status_text(State(Arc::clone(&state))).await;
        assert_eq!(code, StatusCode::OK);
        assert!(text.contains("Mode: content_creator"));

        shutdown_worker(&state).await;
    }

    #[test]
    fn status_response_flattens_snapshot() {
        let status = crate::worker::WorkerStatus::new(WorkerMode::Optimizer);
        let value = serde_json::to_value(WorkerStatusResponse::from(status)).unwrap();
        assert_eq!(value["mode"], "optimizer");
        assert_eq!(value["success_rate"], 0.0);
        assert_eq!(value["tasks_processed"], 0);
    }
}
