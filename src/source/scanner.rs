//! Heuristic scanner for Lua sources.
//!
//! Every rule is a plain substring test. The duplication rule fires once per
//! qualifying start line, so one duplicated region is usually reported
//! several times.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use super::TaskSource;
use crate::task::{Severity, Task, TaskKind};

/// Segments longer than this many lines are reported as too long.
const MAX_FUNCTION_LINES: usize = 100;
/// Size of the sliding block used by the duplication rule.
const DUPLICATE_BLOCK_LINES: usize = 5;
/// A block seen more often than this is a duplicate.
const DUPLICATE_THRESHOLD: usize = 2;
/// `if` occurrences above which a file counts as conditional-heavy.
const MAX_IF_COUNT: usize = 10;

/// Optional rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanRules {
    /// Report files with many `if` occurrences as `refactor` opportunities.
    pub complex_conditionals: bool,
}

/// Findings of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub issues: Vec<Task>,
    pub opportunities: Vec<Task>,
}

impl ScanReport {
    /// Issues followed by opportunities.
    pub fn into_tasks(self) -> Vec<Task> {
        let mut tasks = self.issues;
        tasks.extend(self.opportunities);
        tasks
    }
}

/// Scans `<game>/src/**/*.lua`.
pub struct GameScanner {
    src_path: PathBuf,
    rules: ScanRules,
}

impl GameScanner {
    pub fn new(src_path: impl Into<PathBuf>, rules: ScanRules) -> Self {
        Self {
            src_path: src_path.into(),
            rules,
        }
    }

    /// Lua files below the source root, in path order.
    fn lua_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.src_path)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable path during scan: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().map(|ext| ext == "lua").unwrap_or(false))
            .collect();
        files.sort();
        files
    }

    /// Read every Lua file once and collect issues and opportunities.
    pub async fn analyze(&self) -> ScanReport {
        tracing::info!("Analyzing codebase under {}", self.src_path.display());

        let mut report = ScanReport::default();
        for path in self.lua_files() {
            let code = match tokio::fs::read_to_string(&path).await {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };
            let filename = file_name(&path);
            report.issues.extend(check_code_quality(&code, &filename));
            report
                .opportunities
                .extend(find_opportunities(&code, &filename, self.rules));
        }

        tracing::info!(
            "Found {} issues and {} opportunities",
            report.issues.len(),
            report.opportunities.len()
        );
        report
    }
}

#[async_trait]
impl TaskSource for GameScanner {
    async fn fetch(&self) -> Vec<Task> {
        self.analyze().await.into_tasks()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Issues: long functions, duplicated blocks, missing error guards.
pub fn check_code_quality(code: &str, filename: &str) -> Vec<Task> {
    let mut issues = Vec::new();

    for (i, segment) in code.split("function ").skip(1).enumerate() {
        let lines = segment.split('\n').count();
        if lines > MAX_FUNCTION_LINES {
            issues.push(
                Task::new(
                    TaskKind::CodeSmell,
                    Severity::Medium,
                    format!("Function #{} is too long ({} lines)", i + 1, lines),
                )
                .with_file(filename)
                .with_suggestion("Consider breaking into smaller functions"),
            );
        }
    }

    let lines: Vec<&str> = code.split('\n').collect();
    for start in 0..lines.len().saturating_sub(DUPLICATE_BLOCK_LINES) {
        let block = lines[start..start + DUPLICATE_BLOCK_LINES].join("\n");
        if code.matches(block.as_str()).count() > DUPLICATE_THRESHOLD {
            issues.push(
                Task::new(
                    TaskKind::Duplication,
                    Severity::Low,
                    "Duplicated code block detected",
                )
                .with_file(filename)
                .with_suggestion("Extract to reusable function"),
            );
        }
    }

    // `xpcall` contains `pcall`, so one test covers both guards.
    if !code.contains("pcall") && code.contains("function") {
        issues.push(
            Task::new(TaskKind::ErrorHandling, Severity::Medium, "No error handling found")
                .with_file(filename)
                .with_suggestion("Add pcall for error handling"),
        );
    }

    issues
}

/// Opportunities: blocking waits, unfinished services, conditional-heavy files.
pub fn find_opportunities(code: &str, filename: &str, rules: ScanRules) -> Vec<Task> {
    let mut opportunities = Vec::new();

    if code.contains("wait(") {
        opportunities.push(
            Task::new(
                TaskKind::Performance,
                Severity::Low,
                "Using wait() - could use task.wait()",
            )
            .with_file(filename)
            .with_benefit("Better performance"),
        );
    }

    if filename.contains("Service") && code.contains("-- TODO") {
        opportunities.push(
            Task::new(TaskKind::Feature, Severity::Medium, "TODO comments found")
                .with_file(filename)
                .with_benefit("Complete unfinished features"),
        );
    }

    if rules.complex_conditionals && code.matches("if").count() > MAX_IF_COUNT {
        opportunities.push(
            Task::new(TaskKind::Refactor, Severity::Medium, "Complex conditional logic")
                .with_file(filename)
                .with_benefit("Improved readability"),
        );
    }

    opportunities
}
