//! External generation backends.
//!
//! Each backend is an opaque service reached through a narrow
//! request/response contract:
//! - [`PatternCoder`]: pattern-assisted code generation and pattern learning
//! - [`InferencePipeline`]: hosted text-generation models
//! - [`CompletionBackend`]: chat-completion LLM
//!
//! Backends are optional. A backend that is not configured is simply absent
//! from the [`Backends`] bundle and every consumer skips it.

mod completion;
mod error;
mod inference;
mod pattern;
mod registry;

pub use completion::ChatCompletionsClient;
pub use error::{classify_http_status, BackendError, BackendErrorKind};
pub use inference::{Capability, GameAi, GenerationParams, HfInferenceClient, InferenceModels};
pub use pattern::{PatternServiceClient, ROBLOX_DOMAIN};
pub use registry::Backends;

pub(crate) use error::read_json;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request to a code generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub language: String,
    pub domain: String,
}

impl GenerationRequest {
    /// A Lua request for the Roblox domain.
    pub fn lua(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            language: "lua".to_string(),
            domain: ROBLOX_DOMAIN.to_string(),
        }
    }
}

/// Response from a code generation backend.
///
/// Scores are optional; a backend that does not self-report gets the
/// consumer's static prior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Code sample fed back to the pattern learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSample {
    pub code: String,
    pub language: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl LearningSample {
    pub fn lua(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: "lua".to_string(),
            domain: ROBLOX_DOMAIN.to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// A recurring code pattern reported by the pattern learner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frequency: u64,
    #[serde(default)]
    pub quality_score: f64,
}

/// Pattern-assisted coder.
#[async_trait]
pub trait PatternCoder: Send + Sync {
    /// Generate code for a prompt using learned patterns.
    async fn generate_code(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError>;

    /// Learn patterns from a code sample.
    async fn learn_from_code(&self, sample: &LearningSample) -> Result<(), BackendError>;

    /// List the common patterns of a domain.
    async fn analyze_patterns(
        &self,
        domain: &str,
        categories: &[&str],
    ) -> Result<Vec<Pattern>, BackendError>;

    /// Export the learned pattern set as a JSON document.
    async fn export_patterns(&self, domain: &str) -> Result<serde_json::Value, BackendError>;
}

/// Hosted text-generation pipeline.
#[async_trait]
pub trait InferencePipeline: Send + Sync {
    /// Run `model` on `inputs`, returning one generated text per sequence.
    async fn generate(
        &self,
        model: &str,
        inputs: &str,
        params: &GenerationParams,
    ) -> Result<Vec<String>, BackendError>;

    /// Check that `model` is reachable.
    async fn probe(&self, model: &str) -> Result<(), BackendError>;
}

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// What a completion is for; backends route it to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTask {
    Planning,
    ComplexCoding,
}

/// `{choices: [{message: {content}}]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: CompletionMessage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Single-choice completion, mostly for stubs.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![CompletionChoice {
                message: CompletionMessage {
                    content: Some(content.into()),
                },
            }],
        }
    }

    /// Content of the first choice.
    pub fn first_content(&self) -> Result<&str, BackendError> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| BackendError::parse_error("No choices in response".to_string()))
    }
}

/// Chat-completion LLM.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        task: CompletionTask,
    ) -> Result<ChatCompletion, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_first_content() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"local x = 1"}}]}"#,
        )
        .unwrap();
        assert_eq!(completion.first_content().unwrap(), "local x = 1");

        let empty = ChatCompletion::default();
        assert!(empty.first_content().is_err());
    }

    #[test]
    fn generation_response_tolerates_missing_fields() {
        let response: GenerationResponse = serde_json::from_str(r#"{"code":"local a"}"#).unwrap();
        assert_eq!(response.code, "local a");
        assert!(response.quality_score.is_none());
        assert!(response.success.is_none());
    }

    #[test]
    fn learning_sample_metadata_is_omitted_when_empty() {
        let value = serde_json::to_value(LearningSample::lua("local a = 1")).unwrap();
        assert_eq!(value["language"], "lua");
        assert_eq!(value["domain"], "roblox");
        assert!(value.get("metadata").is_none());
    }
}
