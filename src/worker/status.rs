//! Worker status: owned by the running loop, read as snapshots.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Label a worker runs under. Every mode processes the same queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerMode {
    #[default]
    FeatureGenerator,
    BugFixer,
    Optimizer,
    ContentCreator,
}

impl WorkerMode {
    pub const ALL: [WorkerMode; 4] = [
        WorkerMode::FeatureGenerator,
        WorkerMode::BugFixer,
        WorkerMode::Optimizer,
        WorkerMode::ContentCreator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerMode::FeatureGenerator => "feature_generator",
            WorkerMode::BugFixer => "bug_fixer",
            WorkerMode::Optimizer => "optimizer",
            WorkerMode::ContentCreator => "content_creator",
        }
    }
}

impl fmt::Display for WorkerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown worker mode: {s}"))
    }
}

/// Point-in-time copy of a worker's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerStatus {
    pub mode: WorkerMode,
    pub running: bool,
    pub tasks_processed: u64,
    pub tasks_succeeded: u64,
    pub tasks_failed: u64,
    pub last_task_time: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
}

impl WorkerStatus {
    pub fn new(mode: WorkerMode) -> Self {
        Self {
            mode,
            running: false,
            tasks_processed: 0,
            tasks_succeeded: 0,
            tasks_failed: 0,
            last_task_time: None,
            started_at: None,
            uptime_secs: 0,
        }
    }

    /// Percentage of processed tasks that succeeded; 0 before the first task.
    pub fn success_rate(&self) -> f64 {
        self.tasks_succeeded as f64 / self.tasks_processed.max(1) as f64 * 100.0
    }

    /// Copy with `uptime_secs` brought up to `now` while the worker runs.
    pub fn at(&self, now: DateTime<Utc>) -> Self {
        let mut status = self.clone();
        if status.running {
            if let Some(started) = status.started_at {
                status.uptime_secs = (now - started).num_seconds().max(0) as u64;
            }
        }
        status
    }

    /// Plain-text status block.
    pub fn render(&self) -> String {
        let last = self
            .last_task_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "Never".to_string());
        format!(
            "Worker Status\n\
             \n\
             Mode: {}\n\
             Running: {}\n\
             \n\
             Statistics:\n\
             - Tasks Processed: {}\n\
             - Tasks Succeeded: {}\n\
             - Tasks Failed: {}\n\
             - Success Rate: {:.1}%\n\
             \n\
             Uptime: {} seconds\n\
             Last Task: {}\n",
            self.mode,
            if self.running { "Yes" } else { "No" },
            self.tasks_processed,
            self.tasks_succeeded,
            self.tasks_failed,
            self.success_rate(),
            self.uptime_secs,
            last,
        )
    }
}

/// Single writer side of the status channel.
pub struct StatusTracker {
    tx: watch::Sender<WorkerStatus>,
}

impl StatusTracker {
    pub fn new(mode: WorkerMode) -> (Self, watch::Receiver<WorkerStatus>) {
        let (tx, rx) = watch::channel(WorkerStatus::new(mode));
        (Self { tx }, rx)
    }

    pub fn started(&self) {
        let now = Utc::now();
        self.tx.send_modify(|s| {
            s.running = true;
            s.started_at = Some(now);
            s.uptime_secs = 0;
        });
    }

    pub fn record(&self, success: bool) {
        let now = Utc::now();
        self.tx.send_modify(|s| {
            s.tasks_processed += 1;
            if success {
                s.tasks_succeeded += 1;
            } else {
                s.tasks_failed += 1;
            }
            s.last_task_time = Some(now);
            *s = s.at(now);
        });
    }

    pub fn stopped(&self) {
        let now = Utc::now();
        self.tx.send_modify(|s| {
            *s = s.at(now);
            s.running = false;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_wire_names() {
        assert_eq!("bug_fixer".parse::<WorkerMode>(), Ok(WorkerMode::BugFixer));
        assert!("janitor".parse::<WorkerMode>().is_err());
        let mode: WorkerMode = serde_json::from_str("\"content_creator\"").unwrap();
        assert_eq!(mode, WorkerMode::ContentCreator);
    }

    #[test]
    fn success_rate_before_any_task_is_zero() {
        assert_eq!(WorkerStatus::new(WorkerMode::default()).success_rate(), 0.0);
    }

    #[test]
    fn tracker_publishes_counts() {
        let (tracker, rx) = StatusTracker::new(WorkerMode::Optimizer);
        tracker.started();
        tracker.record(true);
        tracker.record(false);
        tracker.record(true);
        tracker.record(true);

        let status = rx.borrow().clone();
        assert!(status.running);
        assert_eq!(status.tasks_processed, 4);
        assert_eq!(status.tasks_succeeded, 3);
        assert_eq!(status.tasks_failed, 1);
        assert_eq!(status.success_rate(), 75.0);
        assert!(status.last_task_time.is_some());

        tracker.stopped();
        assert!(!rx.borrow().running);
    }

    #[test]
    fn render_mentions_every_counter() {
        let mut status = WorkerStatus::new(WorkerMode::BugFixer);
        status.tasks_processed = 2;
        status.tasks_succeeded = 1;
        status.tasks_failed = 1;
        let text = status.render();
        assert!(text.contains("Mode: bug_fixer"));
        assert!(text.contains("Running: No"));
        assert!(text.contains("Success Rate: 50.0%"));
        assert!(text.contains("Last Task: Never"));
    }
}
