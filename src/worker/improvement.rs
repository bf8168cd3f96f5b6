//! Bounded improvement loop over the game's own sources.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::pause;
use crate::config::Config;
use crate::pipeline::{Developer, RunSummary};
use crate::source::TaskSource;
use crate::task::prioritize;

/// Tasks developed per iteration, highest severity first.
pub const TASKS_PER_ITERATION: usize = 3;

pub struct ImprovementLoop {
    source: Arc<dyn TaskSource>,
    developer: Developer,
    max_iterations: usize,
    iteration_delay: Duration,
}

impl ImprovementLoop {
    pub fn new(source: Arc<dyn TaskSource>, developer: Developer, config: &Config) -> Self {
        Self {
            source,
            developer,
            max_iterations: config.max_iterations,
            iteration_delay: config.timings.iteration_delay,
        }
    }

    /// Scan, prioritize and develop until the iteration budget is spent,
    /// nothing is left to do, or `cancel` fires.
    pub async fn run(&mut self, cancel: &CancellationToken) -> RunSummary {
        tracing::info!(
            "Starting autonomous improvement loop ({} iterations)",
            self.max_iterations
        );

        for iteration in 1..=self.max_iterations {
            if cancel.is_cancelled() {
                tracing::info!("Improvement loop cancelled");
                break;
            }
            tracing::info!("Iteration {}/{}", iteration, self.max_iterations);

            let tasks = prioritize(self.source.fetch().await);
            if tasks.is_empty() {
                tracing::info!("No improvement opportunities found");
                break;
            }

            for task in tasks.iter().take(TASKS_PER_ITERATION) {
                if cancel.is_cancelled() {
                    break;
                }
                let feature_request = task.feature_request();
                let result = self.developer.develop_feature(&feature_request).await;
                if result.success {
                    tracing::info!("Completed: {}", feature_request);
                } else {
                    tracing::info!("Failed: {}", feature_request);
                }
            }

            if iteration < self.max_iterations {
                tracing::info!(
                    "Waiting {}s before next iteration",
                    self.iteration_delay.as_secs()
                );
                if !pause(self.iteration_delay, cancel).await {
                    break;
                }
            }
        }

        let summary = self.developer.summary();
        tracing::info!(
            "Autonomous development complete. Features developed: {}/{}",
            summary.succeeded,
            summary.attempted
        );
        summary
    }
}
