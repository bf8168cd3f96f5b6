use std::sync::Arc;

use super::{ChatCompletionsClient, CompletionBackend, GameAi, PatternCoder, PatternServiceClient};
use crate::config::Config;

/// The set of backends available to this process.
///
/// Each slot is independent; an empty slot means the backend is unavailable
/// and every consumer skips it.
#[derive(Clone, Default)]
pub struct Backends {
    pub pattern: Option<Arc<dyn PatternCoder>>,
    pub inference: Option<GameAi>,
    pub completion: Option<Arc<dyn CompletionBackend>>,
}

impl Backends {
    /// Build the HTTP backends that `config` enables, warning about the others.
    pub fn from_config(config: &Config) -> Self {
        let pattern = config.pattern.as_ref().map(|p| {
            tracing::info!("Pattern coder at {}", p.base_url);
            Arc::new(PatternServiceClient::new(p.base_url.clone())) as Arc<dyn PatternCoder>
        });
        if pattern.is_none() {
            tracing::warn!("Pattern coder not configured (PATTERN_SERVICE_URL); some features will be limited");
        }

        let inference = config.inference.as_ref().map(|c| {
            tracing::info!("Hosted inference at {} (code model {})", c.base_url, c.code_model);
            GameAi::from_config(c)
        });
        if inference.is_none() {
            tracing::warn!("Hosted inference not configured (HF_API_TOKEN or HF_INFERENCE_URL)");
        }

        let completion = config.completion.as_ref().map(|c| {
            tracing::info!("Completion backend at {}", c.api_url);
            Arc::new(ChatCompletionsClient::new(c.clone())) as Arc<dyn CompletionBackend>
        });
        if completion.is_none() {
            tracing::warn!("Completion backend not configured (LLM_API_KEY)");
        }

        Self {
            pattern,
            inference,
            completion,
        }
    }

    /// Names of the configured backends, in generation order.
    pub fn available(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.pattern.is_some() {
            names.push("autocoder");
        }
        if self.inference.is_some() {
            names.push("huggingface");
        }
        if self.completion.is_some() {
            names.push("llm");
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_backends_are_absent() {
        let backends = Backends::from_config(&Config::for_game("/tmp/game"));
        assert!(backends.available().is_empty());
    }
}
