//! Core Task type.
//!
//! # Wire format
//! Queue files use the loose JSON shape produced by hand or by other tools:
//! `type` defaults to `feature`, `description` to `""`, and `severity` also
//! accepts the key `priority` (scanner opportunities are written that way).
//! When both keys are present `severity` wins; missing, null or unrecognised
//! values read as `low`.

use serde::{Deserialize, Serialize};

/// Kind of work a task asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    CodeSmell,
    Duplication,
    ErrorHandling,
    Performance,
    #[default]
    Feature,
    Refactor,
    BugFix,
    Optimization,
    Content,
    /// Any `type` value this build does not recognise
    #[serde(other)]
    Unknown,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CodeSmell => "code_smell",
            Self::Duplication => "duplication",
            Self::ErrorHandling => "error_handling",
            Self::Performance => "performance",
            Self::Feature => "feature",
            Self::Refactor => "refactor",
            Self::BugFix => "bug_fix",
            Self::Optimization => "optimization",
            Self::Content => "content",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an issue or priority of an opportunity.
///
/// Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    /// Parse `low`/`medium`/`high`, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    fn from_value(value: &serde_json::Value) -> Option<Self> {
        value.as_str().and_then(Self::from_label)
    }
}

/// A unit of requested work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTask")]
pub struct Task {
    #[serde(rename = "type")]
    pub kind: TaskKind,

    /// Source file the task refers to (file name only for scanner tasks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    pub description: String,

    pub severity: Severity,

    /// Suggested remedy (scanner issues)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Expected benefit (scanner opportunities)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,

    /// Bug report text (queue `bug_fix` tasks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,

    /// Optimization target (queue `optimization` tasks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Kind of content to write (queue `content` tasks), e.g. `npc_dialogue`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Queue entry as written on disk, before severity is resolved.
#[derive(Deserialize)]
struct RawTask {
    #[serde(rename = "type", default)]
    kind: TaskKind,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    severity: Option<serde_json::Value>,
    #[serde(default)]
    priority: Option<serde_json::Value>,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default)]
    benefit: Option<String>,
    #[serde(default)]
    issue: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    context: Option<String>,
}

impl From<RawTask> for Task {
    fn from(raw: RawTask) -> Self {
        let severity = raw
            .severity
            .as_ref()
            .and_then(Severity::from_value)
            .or_else(|| raw.priority.as_ref().and_then(Severity::from_value))
            .unwrap_or_default();

        Self {
            kind: raw.kind,
            file: raw.file,
            description: raw.description,
            severity,
            suggestion: raw.suggestion,
            benefit: raw.benefit,
            issue: raw.issue,
            target: raw.target,
            content_type: raw.content_type,
            context: raw.context,
        }
    }
}

impl Task {
    pub fn new(kind: TaskKind, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            kind,
            file: None,
            description: description.into(),
            severity,
            suggestion: None,
            benefit: None,
            issue: None,
            target: None,
            content_type: None,
            context: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_benefit(mut self, benefit: impl Into<String>) -> Self {
        self.benefit = Some(benefit.into());
        self
    }

    /// Turn the task into the natural-language request handed to the backends.
    pub fn feature_request(&self) -> String {
        let file = self.file.as_deref().unwrap_or("unknown file");
        match self.kind {
            TaskKind::CodeSmell => format!(
                "Refactor {}: {}",
                file,
                self.suggestion.as_deref().unwrap_or(&self.description)
            ),
            TaskKind::ErrorHandling => format!("Add error handling to {}", file),
            TaskKind::Performance => format!("Optimize {}: {}", file, self.description),
            TaskKind::BugFix => format!(
                "Fix bug in {}: {}",
                file,
                self.issue.as_deref().unwrap_or(&self.description)
            ),
            TaskKind::Optimization => format!(
                "Optimize {}: {}",
                file,
                self.target.as_deref().unwrap_or(&self.description)
            ),
            _ if self.description.is_empty() => "Unknown task".to_string(),
            _ => self.description.clone(),
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            "Unknown"
        } else {
            &self.description
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_loose_queue_entries() {
        let tasks: Vec<Task> = serde_json::from_str(
            r#"[
                {"type": "bug_fix", "file": "ShopService.lua", "issue": "nil player", "priority": "high"},
                {"description": "Add a leaderboard"},
                {"type": "teleport", "description": "??"}
            ]"#,
        )
        .unwrap();

        assert_eq!(tasks[0].kind, TaskKind::BugFix);
        assert_eq!(tasks[0].severity, Severity::High);
        assert_eq!(tasks[0].issue.as_deref(), Some("nil player"));

        assert_eq!(tasks[1].kind, TaskKind::Feature);
        assert_eq!(tasks[1].severity, Severity::Low);

        assert_eq!(tasks[2].kind, TaskKind::Unknown);
    }

    #[test]
    fn severity_is_lenient_and_prefers_severity_key() {
        let tasks: Vec<Task> = serde_json::from_str(
            r#"[
                {"description": "both", "severity": "medium", "priority": "high"},
                {"description": "critical", "severity": "critical"},
                {"description": "null", "severity": null},
                {"description": "fallback", "severity": "urgent", "priority": " High "}
            ]"#,
        )
        .unwrap();

        let severities: Vec<Severity> = tasks.iter().map(|t| t.severity).collect();
        assert_eq!(
            severities,
            [Severity::Medium, Severity::Low, Severity::Low, Severity::High]
        );
    }

    #[test]
    fn severity_orders_high_above_low() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn feature_request_follows_task_kind() {
        let smell = Task::new(TaskKind::CodeSmell, Severity::Medium, "Function #1 is too long")
            .with_file("Shop.lua")
            .with_suggestion("Consider breaking into smaller functions");
        assert_eq!(
            smell.feature_request(),
            "Refactor Shop.lua: Consider breaking into smaller functions"
        );

        let guard = Task::new(TaskKind::ErrorHandling, Severity::Medium, "No error handling found")
            .with_file("Foo.lua");
        assert_eq!(guard.feature_request(), "Add error handling to Foo.lua");

        let perf = Task::new(TaskKind::Performance, Severity::Low, "Using wait()").with_file("Loop.lua");
        assert_eq!(perf.feature_request(), "Optimize Loop.lua: Using wait()");

        let feature = Task::new(TaskKind::Feature, Severity::Low, "Add pets");
        assert_eq!(feature.feature_request(), "Add pets");

        let empty = Task::new(TaskKind::Unknown, Severity::Low, "");
        assert_eq!(empty.feature_request(), "Unknown task");
    }

    #[test]
    fn serializes_kind_under_type_key() {
        let task = Task::new(TaskKind::Duplication, Severity::Low, "dup");
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["type"], "duplication");
        assert_eq!(value["severity"], "low");
        assert!(value.get("file").is_none());
    }
}
