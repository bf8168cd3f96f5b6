//! OpenAI-compatible chat completion client (OpenRouter by default).

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{read_json, BackendError, ChatCompletion, ChatMessage, CompletionBackend, CompletionTask};
use crate::config::CompletionConfig;

pub struct ChatCompletionsClient {
    client: Client,
    config: CompletionConfig,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

impl ChatCompletionsClient {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Planning goes to the cheaper model, code to the stronger one.
    fn model_for(&self, task: CompletionTask) -> &str {
        match task {
            CompletionTask::Planning => &self.config.planning_model,
            CompletionTask::ComplexCoding => &self.config.coding_model,
        }
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionsClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        task: CompletionTask,
    ) -> Result<ChatCompletion, BackendError> {
        let model = self.model_for(task);
        tracing::debug!("Chat completion ({:?}) with model {}", task, model);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .header("X-Title", "autodev")
            .json(&CompletionRequest { model, messages })
            .send()
            .await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ChatCompletionsClient {
        ChatCompletionsClient::new(CompletionConfig {
            api_url: "http://127.0.0.1:1/v1/chat/completions".to_string(),
            api_key: "test".to_string(),
            planning_model: "small".to_string(),
            coding_model: "large".to_string(),
        })
    }

    #[test]
    fn routes_task_types_to_models() {
        let client = client();
        assert_eq!(client.model_for(CompletionTask::Planning), "small");
        assert_eq!(client.model_for(CompletionTask::ComplexCoding), "large");
    }

    #[tokio::test]
    async fn connection_failure_is_reported_not_panicked() {
        let err = client()
            .complete(&[ChatMessage::user("hi")], CompletionTask::Planning)
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::backend::BackendErrorKind::NetworkError);
    }
}
