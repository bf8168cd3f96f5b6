//! Candidate generation across the configured backends.
//!
//! Backends are tried one after another in a fixed order. Each attempt is
//! isolated: an error is logged and recorded, and the remaining backends
//! still run. Producing no candidate at all is a normal outcome.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Candidate;
use crate::backend::{
    BackendError, Backends, ChatMessage, CompletionBackend, CompletionTask, GameAi,
    GenerationRequest, PatternCoder,
};

/// Static priors for backends that do not score their own output.
pub const HUGGINGFACE_PRIOR: (f64, f64) = (0.5, 0.6);
pub const LLM_PRIOR: (f64, f64) = (0.7, 0.8);

/// A backend able to turn a feature request into one candidate.
#[async_trait]
pub trait CandidateBackend: Send + Sync {
    /// Provenance name recorded on the candidate.
    fn name(&self) -> &str;

    async fn generate(&self, feature_request: &str) -> Result<Candidate, BackendError>;
}

/// Why one backend produced no candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub backend: String,
    pub reason: String,
}

/// Output of one generation round.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// Candidates in backend order
    pub candidates: Vec<Candidate>,
    pub failures: Vec<GenerationFailure>,
}

#[derive(Clone, Default)]
pub struct CandidateGenerator {
    backends: Vec<Arc<dyn CandidateBackend>>,
}

impl CandidateGenerator {
    pub fn new(backends: Vec<Arc<dyn CandidateBackend>>) -> Self {
        Self { backends }
    }

    /// Pattern coder, then hosted inference, then the completion LLM.
    pub fn from_backends(backends: &Backends) -> Self {
        let mut list: Vec<Arc<dyn CandidateBackend>> = Vec::new();
        if let Some(pattern) = &backends.pattern {
            list.push(Arc::new(AutocoderCandidates::new(Arc::clone(pattern))));
        }
        if let Some(ai) = &backends.inference {
            list.push(Arc::new(HuggingFaceCandidates::new(ai.clone())));
        }
        if let Some(llm) = &backends.completion {
            list.push(Arc::new(LlmCandidates::new(Arc::clone(llm))));
        }
        Self::new(list)
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub async fn generate(&self, feature_request: &str) -> Generation {
        let mut generation = Generation::default();
        for backend in &self.backends {
            match backend.generate(feature_request).await {
                Ok(candidate) => {
                    tracing::debug!(
                        "{} produced a candidate (quality {:.2}, confidence {:.2})",
                        backend.name(),
                        candidate.quality,
                        candidate.confidence
                    );
                    generation.candidates.push(candidate);
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}", backend.name(), e);
                    generation.failures.push(GenerationFailure {
                        backend: backend.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        generation
    }
}

/// Pattern-assisted coder; scores are self-reported.
pub struct AutocoderCandidates {
    coder: Arc<dyn PatternCoder>,
}

impl AutocoderCandidates {
    pub fn new(coder: Arc<dyn PatternCoder>) -> Self {
        Self { coder }
    }
}

#[async_trait]
impl CandidateBackend for AutocoderCandidates {
    fn name(&self) -> &str {
        "autocoder"
    }

    async fn generate(&self, feature_request: &str) -> Result<Candidate, BackendError> {
        let response = self
            .coder
            .generate_code(&GenerationRequest::lua(feature_request))
            .await?;
        if response.success == Some(false) {
            return Err(BackendError::rejected(
                response
                    .error
                    .unwrap_or_else(|| "generation unsuccessful".to_string()),
            ));
        }
        Ok(Candidate::new(
            self.name(),
            response.code,
            response.quality_score.unwrap_or(0.0),
            response.confidence.unwrap_or(0.0),
        ))
    }
}

/// Hosted inference pipeline; fixed prior.
pub struct HuggingFaceCandidates {
    ai: GameAi,
}

impl HuggingFaceCandidates {
    pub fn new(ai: GameAi) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl CandidateBackend for HuggingFaceCandidates {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn generate(&self, feature_request: &str) -> Result<Candidate, BackendError> {
        let code = self.ai.generate_lua_code(feature_request).await?;
        let (quality, confidence) = HUGGINGFACE_PRIOR;
        Ok(Candidate::new(self.name(), code, quality, confidence))
    }
}

/// Raw completion LLM; fixed prior.
pub struct LlmCandidates {
    llm: Arc<dyn CompletionBackend>,
}

impl LlmCandidates {
    pub fn new(llm: Arc<dyn CompletionBackend>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CandidateBackend for LlmCandidates {
    fn name(&self) -> &str {
        "llm"
    }

    async fn generate(&self, feature_request: &str) -> Result<Candidate, BackendError> {
        let prompt = format!(
            "Write Lua code for Roblox that implements: {}\n\nProvide complete, working code.",
            feature_request
        );
        let completion = self
            .llm
            .complete(&[ChatMessage::user(prompt)], CompletionTask::ComplexCoding)
            .await?;
        let (quality, confidence) = LLM_PRIOR;
        Ok(Candidate::new(
            self.name(),
            completion.first_content()?,
            quality,
            confidence,
        ))
    }
}
