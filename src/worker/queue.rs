//! Unbounded queue worker: fetch a batch, process it, wait, repeat.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::content;
use super::pause;
use super::status::StatusTracker;
use crate::backend::GameAi;
use crate::config::LoopTimings;
use crate::pipeline::{Developer, ResultArchive};
use crate::source::TaskSource;
use crate::task::{Task, TaskKind};

/// Outcome of one queue task; archived when successful.
#[derive(Debug, Clone, Serialize)]
pub struct QueueResult {
    pub task: Task,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub struct QueueWorker {
    source: Arc<dyn TaskSource>,
    developer: Developer,
    content_ai: Option<GameAi>,
    archive: ResultArchive,
    timings: LoopTimings,
    status: StatusTracker,
}

impl QueueWorker {
    pub fn new(
        source: Arc<dyn TaskSource>,
        developer: Developer,
        archive: ResultArchive,
        timings: LoopTimings,
        status: StatusTracker,
    ) -> Self {
        Self {
            source,
            developer,
            content_ai: None,
            archive,
            timings,
            status,
        }
    }

    pub fn with_content_ai(mut self, ai: Option<GameAi>) -> Self {
        self.content_ai = ai;
        self
    }

    /// Run until `cancel` fires. The stop request is honoured at the top of
    /// each cycle, before each task and during every wait.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Starting queue worker");
        self.status.started();

        'cycles: loop {
            if cancel.is_cancelled() {
                break;
            }

            let tasks = self.source.fetch().await;
            if tasks.is_empty() {
                tracing::info!("No tasks in queue, waiting");
                if !pause(self.timings.idle_delay, &cancel).await {
                    break;
                }
                continue;
            }

            tracing::info!("Found {} tasks in queue", tasks.len());
            for task in tasks {
                if cancel.is_cancelled() {
                    break 'cycles;
                }

                let result = self.process_task(task).await;
                self.status.record(result.success);
                if result.success {
                    match self.archive.store(&result).await {
                        Ok(path) => tracing::info!("Saved result to {}", path.display()),
                        Err(e) => tracing::warn!("Failed to archive result: {}", e),
                    }
                }

                if !pause(self.timings.task_delay, &cancel).await {
                    break 'cycles;
                }
            }

            tracing::info!("Batch complete, waiting for next cycle");
            if !pause(self.timings.batch_delay, &cancel).await {
                break;
            }
        }

        self.status.stopped();
        tracing::info!("Queue worker stopped");
    }

    /// Process one task. Failures are recorded on the result, never raised.
    pub async fn process_task(&mut self, task: Task) -> QueueResult {
        tracing::info!("Processing task: {}", task.label());

        let (success, output, error) = match task.kind {
            TaskKind::Content => {
                let generated = content::generate(
                    self.content_ai.as_ref(),
                    task.content_type.as_deref().unwrap_or_default(),
                    task.context.as_deref().unwrap_or_default(),
                )
                .await;
                (true, serde_json::to_value(&generated).ok(), None)
            }
            TaskKind::Unknown => (false, None, Some("Unknown task type".to_string())),
            _ => {
                let developed = self.developer.develop_feature(&task.feature_request()).await;
                let error = developed.failure_reason().map(str::to_string);
                (
                    developed.success,
                    serde_json::to_value(&developed).ok(),
                    error,
                )
            }
        };

        match &error {
            None => tracing::info!("Task completed successfully"),
            Some(e) => tracing::info!("Task failed: {}", e),
        }

        QueueResult {
            task,
            success,
            output,
            error,
            timestamp: Utc::now(),
        }
    }
}
