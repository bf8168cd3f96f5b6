//! Loop drivers.
//!
//! - [`ImprovementLoop`]: bounded passes over the game's sources
//! - [`QueueWorker`]: unbounded queue processing, started and stopped through [`WorkerHandle`]
//!
//! Both loops run tasks one at a time and stop cooperatively through a
//! [`CancellationToken`].

mod content;
mod improvement;
mod queue;
mod status;

pub use content::GeneratedContent;
pub use improvement::{ImprovementLoop, TASKS_PER_ITERATION};
pub use queue::{QueueResult, QueueWorker};
pub use status::{StatusTracker, WorkerMode, WorkerStatus};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::Backends;
use crate::config::Config;
use crate::pipeline::{Developer, ResultArchive};
use crate::source::QueueSource;

/// Sleep for `duration` unless cancelled first. Returns `false` on cancellation.
pub(crate) async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// A queue worker running in the background.
pub struct WorkerHandle {
    mode: WorkerMode,
    cancel: CancellationToken,
    status: watch::Receiver<WorkerStatus>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Build a queue worker from `config` and spawn it.
    pub fn spawn(config: &Config, backends: &Backends, mode: WorkerMode) -> Self {
        tracing::info!(
            "Starting worker in {} mode (queue: {})",
            mode,
            config
                .queue
                .repo_url
                .as_deref()
                .unwrap_or("local tasks file")
        );
        let (tracker, status) = StatusTracker::new(mode);
        let worker = QueueWorker::new(
            Arc::new(QueueSource::new(config.queue.clone())),
            Developer::from_config(config, backends),
            ResultArchive::new(config.game_file("generated_output")),
            config.timings,
            tracker,
        )
        .with_content_ai(backends.inference.clone());
        Self::start(worker, mode, status)
    }

    /// Spawn an already built worker.
    pub fn start(worker: QueueWorker, mode: WorkerMode, status: watch::Receiver<WorkerStatus>) -> Self {
        let cancel = CancellationToken::new();
        let join = tokio::spawn(worker.run(cancel.clone()));
        Self {
            mode,
            cancel,
            status,
            join,
        }
    }

    pub fn mode(&self) -> WorkerMode {
        self.mode
    }

    /// Current snapshot, uptime included.
    pub fn status(&self) -> WorkerStatus {
        self.status.borrow().at(Utc::now())
    }

    /// Whether the loop task is still alive. Stays `true` after [`stop`](Self::stop)
    /// until the loop finishes its current step and exits.
    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Request a stop. Returns immediately; the loop exits at its next check.
    pub fn stop(&self) {
        tracing::info!("Stopping worker");
        self.cancel.cancel();
    }

    /// Request a stop and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            tracing::error!("Worker task failed: {}", e);
        }
    }
}
