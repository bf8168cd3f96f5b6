//! Severity ordering for task batches.

use super::Task;

/// Order tasks by severity, `high` first.
///
/// The sort is stable: tasks with equal severity keep their relative order,
/// so scanner output order decides between equals.
pub fn prioritize(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| b.severity.cmp(&a.severity));
    tasks
}
