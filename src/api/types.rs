//! API request/response types.

use serde::{Deserialize, Serialize};

use crate::worker::{WorkerMode, WorkerStatus};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Names of the configured generation backends
    pub backends: Vec<String>,
}

/// Request to start the queue worker.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartWorkerRequest {
    /// Worker mode label; defaults to `feature_generator`
    #[serde(default)]
    pub mode: Option<WorkerMode>,
}

/// Result of a start/stop request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerActionResponse {
    pub success: bool,
    pub message: String,
    pub mode: WorkerMode,
}

/// Status snapshot plus derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatusResponse {
    #[serde(flatten)]
    pub status: WorkerStatus,
    /// Percentage of processed tasks that succeeded
    pub success_rate: f64,
}

impl From<WorkerStatus> for WorkerStatusResponse {
    fn from(status: WorkerStatus) -> Self {
        Self {
            success_rate: status.success_rate(),
            status,
        }
    }
}
