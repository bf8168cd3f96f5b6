//! Develops one feature request end to end:
//! plan -> generate -> select -> validate -> save -> learn -> log.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    select_best, validate, CandidateGenerator, DevLog, FeatureStore, GenerationFailure,
    SavedFeature, ScoredCandidate, ValidationReport,
};
use crate::backend::{
    Backends, ChatMessage, CompletionBackend, CompletionTask, LearningSample, PatternCoder,
};
use crate::config::Config;

/// Implementation plan for a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_text: Option<String>,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Plan {
    /// Plan used when no completion backend is available.
    pub fn default_steps() -> Self {
        Self {
            plan_text: None,
            steps: vec![
                "Generate code".to_string(),
                "Test code".to_string(),
                "Deploy code".to_string(),
            ],
            error: None,
        }
    }
}

/// One development attempt. Appended to the development log as a single JSON line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentResult {
    pub id: Uuid,
    pub feature: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    /// Number of candidates generated
    #[serde(default)]
    pub implementations: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generation_failures: Vec<GenerationFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_implementation: Option<ScoredCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_result: Option<ValidationReport>,
    /// Validation failure reasons
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Failure after validation (e.g. the implementation could not be saved)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved: Option<SavedFeature>,
}

impl DevelopmentResult {
    fn new(feature: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            feature: feature.to_string(),
            timestamp: Utc::now(),
            success: false,
            plan: None,
            implementations: 0,
            generation_failures: Vec::new(),
            selected_implementation: None,
            test_result: None,
            errors: Vec::new(),
            error: None,
            saved: None,
        }
    }

    /// Human-readable failure reason, if the attempt failed.
    pub fn failure_reason(&self) -> Option<&str> {
        if self.success {
            return None;
        }
        self.error
            .as_deref()
            .or_else(|| self.errors.first().map(String::as_str))
            .or(Some("Unknown error"))
    }
}

/// Counts over every attempt made by one developer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
}

pub struct Developer {
    generator: CandidateGenerator,
    planner: Option<Arc<dyn CompletionBackend>>,
    learner: Option<Arc<dyn PatternCoder>>,
    store: FeatureStore,
    log: DevLog,
    history: Vec<DevelopmentResult>,
}

impl Developer {
    pub fn new(generator: CandidateGenerator, store: FeatureStore, log: DevLog) -> Self {
        Self {
            generator,
            planner: None,
            learner: None,
            store,
            log,
            history: Vec::new(),
        }
    }

    /// Wire every configured backend and the game's output locations.
    pub fn from_config(config: &Config, backends: &Backends) -> Self {
        let mut developer = Self::new(
            CandidateGenerator::from_backends(backends),
            FeatureStore::new(config.features_dir()),
            DevLog::new(config.dev_log_path()),
        );
        developer.planner = backends.completion.clone();
        developer.learner = backends.pattern.clone();
        developer
    }

    pub fn with_planner(mut self, planner: Arc<dyn CompletionBackend>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn with_learner(mut self, learner: Arc<dyn PatternCoder>) -> Self {
        self.learner = Some(learner);
        self
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            attempted: self.history.len(),
            succeeded: self.history.iter().filter(|r| r.success).count(),
        }
    }

    /// Develop one feature request. Never fails: every problem is recorded
    /// on the returned result, which is also logged and kept in the history.
    pub async fn develop_feature(&mut self, feature_request: &str) -> DevelopmentResult {
        tracing::info!("Developing feature: {}", feature_request);
        let mut result = DevelopmentResult::new(feature_request);

        result.plan = Some(self.plan_feature(feature_request).await);

        let generation = self.generator.generate(feature_request).await;
        result.implementations = generation.candidates.len();
        result.generation_failures = generation.failures;

        let selected = select_best(&generation.candidates);
        let report = validate(selected.as_ref());
        result.selected_implementation = selected;

        if report.passed() {
            if let Some(implementation) = &result.selected_implementation {
                match self.store.save(feature_request, implementation).await {
                    Ok(saved) => {
                        result.saved = Some(saved);
                        result.success = true;
                        self.learn(&implementation.candidate.code).await;
                    }
                    Err(e) => {
                        tracing::error!("Failed to save implementation: {}", e);
                        result.error = Some(e.to_string());
                    }
                }
            }
        } else if let Some(reason) = report.reason() {
            tracing::info!("Validation failed: {}", reason);
            result.errors.push(reason.to_string());
        }
        result.test_result = Some(report);

        if let Err(e) = self.log.append(&result).await {
            tracing::warn!(
                "Failed to append to development log {}: {}",
                self.log.path().display(),
                e
            );
        }
        self.history.push(result.clone());
        result
    }

    async fn plan_feature(&self, feature_request: &str) -> Plan {
        let Some(planner) = &self.planner else {
            return Plan::default_steps();
        };

        let prompt = format!(
            "Plan how to implement this Roblox game feature: {}\n\nProvide step-by-step implementation plan.",
            feature_request
        );
        let text = match planner
            .complete(&[ChatMessage::user(prompt)], CompletionTask::Planning)
            .await
        {
            Ok(completion) => completion.first_content().map(str::to_string),
            Err(e) => Err(e),
        };

        match text {
            Ok(text) => Plan {
                steps: text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect(),
                plan_text: Some(text),
                error: None,
            },
            Err(e) => {
                tracing::warn!("Planning failed: {}", e);
                Plan {
                    plan_text: None,
                    steps: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn learn(&self, code: &str) {
        let Some(learner) = &self.learner else {
            return;
        };
        match learner.learn_from_code(&LearningSample::lua(code)).await {
            Ok(()) => tracing::debug!("Pattern coder learned from accepted implementation"),
            Err(e) => tracing::warn!("Pattern learning failed: {}", e),
        }
    }
}
