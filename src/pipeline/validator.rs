//! Structural plausibility checks for a selected candidate.
//!
//! This is an acceptance gate, not a test run: the code is never executed.

use serde::{Deserialize, Serialize};

use super::ScoredCandidate;

/// Minimum accepted code length, in characters.
pub const MIN_CODE_LEN: usize = 10;

/// Any one of these must appear for the code to count as Lua.
pub const LUA_MARKERS: &[&str] = &["function", "local"];

pub const REASON_MISSING: &str = "no implementation provided";
pub const REASON_TOO_SHORT: &str = "code too short";
pub const REASON_NOT_LUA: &str = "not valid lua code";

/// Result of validating a candidate.
///
/// # Invariants
/// - `success == true` implies `error.is_none()` and a non-empty `checks_passed`
/// - `success == false` implies `error.is_some()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    checks_passed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ValidationReport {
    /// Create a passing report.
    pub fn pass(score: f64) -> Self {
        Self {
            success: true,
            checks_passed: vec!["syntax".to_string(), "structure".to_string()],
            score: Some(score),
            error: None,
        }
    }

    /// Create a failing report.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            checks_passed: Vec::new(),
            score: None,
            error: Some(reason.into()),
        }
    }

    pub fn passed(&self) -> bool {
        self.success
    }

    pub fn checks_passed(&self) -> &[String] {
        &self.checks_passed
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Validate the selected candidate, if there is one.
pub fn validate(selected: Option<&ScoredCandidate>) -> ValidationReport {
    let Some(selected) = selected else {
        return ValidationReport::fail(REASON_MISSING);
    };
    let code = &selected.candidate.code;

    if code.chars().count() < MIN_CODE_LEN {
        return ValidationReport::fail(REASON_TOO_SHORT);
    }

    if !LUA_MARKERS.iter().any(|marker| code.contains(marker)) {
        return ValidationReport::fail(REASON_NOT_LUA);
    }

    ValidationReport::pass(selected.candidate.quality)
}
