//! Task sources.
//!
//! - [`GameScanner`]: static heuristics over the game's Lua sources
//! - [`QueueSource`]: a JSON task queue, local or in a GitHub repository
//!
//! A source never fails: problems are logged and an empty batch is returned.

mod queue;
mod scanner;

pub use queue::{decode_contents, contents_url, QueueSource, SourceError};
pub use scanner::{check_code_quality, find_opportunities, GameScanner, ScanReport, ScanRules};

use async_trait::async_trait;

use crate::task::Task;

#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Produce the next batch of tasks; empty when there is nothing to do
    /// or the source could not be read.
    async fn fetch(&self) -> Vec<Task>;
}
