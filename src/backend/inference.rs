//! Hosted text-generation pipeline (Hugging Face Inference API).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{read_json, BackendError, InferencePipeline};
use crate::config::InferenceConfig;

/// Sampling parameters sent with a generation request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub num_return_sequences: u32,
    pub do_sample: bool,
    pub return_full_text: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.7,
            num_return_sequences: 1,
            do_sample: true,
            return_full_text: true,
        }
    }
}

#[derive(Deserialize)]
struct GeneratedText {
    #[serde(default)]
    generated_text: String,
}

/// Inference API client: `POST <base>/<model>` with `{inputs, parameters}`.
pub struct HfInferenceClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HfInferenceClient {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.base_url, model)
    }

    fn request(&self, model: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(self.model_url(model));
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl InferencePipeline for HfInferenceClient {
    async fn generate(
        &self,
        model: &str,
        inputs: &str,
        params: &GenerationParams,
    ) -> Result<Vec<String>, BackendError> {
        let response = self
            .request(model)
            .json(&json!({ "inputs": inputs, "parameters": params }))
            .send()
            .await?;
        let generated: Vec<GeneratedText> = read_json(response).await?;
        Ok(generated.into_iter().map(|g| g.generated_text).collect())
    }

    async fn probe(&self, model: &str) -> Result<(), BackendError> {
        let response = self
            .request(model)
            .json(&json!({ "inputs": "-- ping" }))
            .send()
            .await?;
        let _: serde_json::Value = read_json(response).await?;
        Ok(())
    }
}

/// Model identifiers per capability.
#[derive(Debug, Clone)]
pub struct InferenceModels {
    /// Code generation
    pub code: String,
    /// Free-form text (dialogue, descriptions)
    pub text: String,
    /// Code understanding (embedding model; probed only)
    pub understanding: String,
}

impl From<&InferenceConfig> for InferenceModels {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            code: config.code_model.clone(),
            text: config.text_model.clone(),
            understanding: config.understanding_model.clone(),
        }
    }
}

/// Game-oriented operations on top of an inference pipeline.
#[derive(Clone)]
pub struct GameAi {
    pipeline: Arc<dyn InferencePipeline>,
    models: InferenceModels,
}

impl GameAi {
    pub fn new(pipeline: Arc<dyn InferencePipeline>, models: InferenceModels) -> Self {
        Self { pipeline, models }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(
            Arc::new(HfInferenceClient::new(
                config.base_url.clone(),
                config.api_token.clone(),
            )),
            InferenceModels::from(config),
        )
    }

    /// Generate Lua for a natural-language prompt.
    pub async fn generate_lua_code(&self, prompt: &str) -> Result<String, BackendError> {
        let lua_prompt = format!("-- {}\nlocal function", prompt);
        let texts = self
            .pipeline
            .generate(&self.models.code, &lua_prompt, &GenerationParams::default())
            .await?;
        first_text(texts)
    }

    /// Ask the code model for an improved version of a snippet.
    pub async fn improve_code(&self, snippet: &str) -> Result<String, BackendError> {
        let prompt = format!("-- Improve this code:\n{}\n\n-- Improved version:\n", snippet);
        let params = GenerationParams {
            max_new_tokens: 100,
            temperature: 0.5,
            ..GenerationParams::default()
        };
        let texts = self
            .pipeline
            .generate(&self.models.code, &prompt, &params)
            .await?;
        first_text(texts)
    }

    /// Generate three variants of game content, e.g. NPC dialogue lines.
    pub async fn generate_game_content(
        &self,
        content_type: &str,
        context: &str,
    ) -> Result<Vec<String>, BackendError> {
        let prompt = format!("Generate {}: {}\n\nResult:", content_type, context);
        let params = GenerationParams {
            max_new_tokens: 150,
            temperature: 0.8,
            num_return_sequences: 3,
            ..GenerationParams::default()
        };
        let texts = self
            .pipeline
            .generate(&self.models.text, &prompt, &params)
            .await?;
        if texts.is_empty() {
            return Err(BackendError::rejected("Empty generation".to_string()));
        }
        Ok(texts)
    }

    /// Probe every configured model, in capability order (code, understanding, text).
    pub async fn probe_models(&self) -> Vec<(Capability, String, Result<(), BackendError>)> {
        let mut results = Vec::with_capacity(3);
        for (capability, model) in [
            (Capability::CodeGeneration, &self.models.code),
            (Capability::CodeUnderstanding, &self.models.understanding),
            (Capability::TextGeneration, &self.models.text),
        ] {
            let outcome = self.pipeline.probe(model).await;
            results.push((capability, model.clone(), outcome));
        }
        results
    }
}

/// Capability a hosted model provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CodeGeneration,
    CodeUnderstanding,
    TextGeneration,
}

fn first_text(texts: Vec<String>) -> Result<String, BackendError> {
    texts
        .into_iter()
        .next()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| BackendError::rejected("Empty generation".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoPipeline {
        prompts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl InferencePipeline for EchoPipeline {
        async fn generate(
            &self,
            model: &str,
            inputs: &str,
            params: &GenerationParams,
        ) -> Result<Vec<String>, BackendError> {
            self.prompts
                .lock()
                .unwrap()
                .push((model.to_string(), inputs.to_string()));
            Ok((0..params.num_return_sequences)
                .map(|i| format!("{inputs} -- {i}"))
                .collect())
        }

        async fn probe(&self, model: &str) -> Result<(), BackendError> {
            if model == "broken" {
                Err(BackendError::server_error(503, "loading".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn game_ai(understanding: &str) -> (GameAi, Arc<EchoPipeline>) {
        let pipeline = Arc::new(EchoPipeline {
            prompts: Mutex::new(Vec::new()),
        });
        let ai = GameAi::new(
            pipeline.clone(),
            InferenceModels {
                code: "code-model".to_string(),
                text: "text-model".to_string(),
                understanding: understanding.to_string(),
            },
        );
        (ai, pipeline)
    }

    #[tokio::test]
    async fn lua_prompt_primes_a_local_function() {
        let (ai, pipeline) = game_ai("bert");
        let code = ai.generate_lua_code("double a number").await.unwrap();
        assert!(code.starts_with("-- double a number\nlocal function"));
        let prompts = pipeline.prompts.lock().unwrap();
        assert_eq!(prompts[0].0, "code-model");
    }

    #[tokio::test]
    async fn content_uses_text_model_and_three_sequences() {
        let (ai, pipeline) = game_ai("bert");
        let lines = ai
            .generate_game_content("NPC dialogue", "friendly shopkeeper")
            .await
            .unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(pipeline.prompts.lock().unwrap()[0].0, "text-model");
    }

    #[tokio::test]
    async fn probe_reports_each_model() {
        let (ai, _) = game_ai("broken");
        let results = ai.probe_models().await;
        assert_eq!(results.len(), 3);
        assert!(results[0].2.is_ok());
        assert_eq!(results[1].0, Capability::CodeUnderstanding);
        assert!(results[1].2.is_err());
        assert!(results[2].2.is_ok());
    }
}
