//! HTTP client for the pattern-assisted coder service.
//!
//! Endpoints (relative to the configured base URL):
//! - `POST /generate` - `GenerationRequest` -> `GenerationResponse`
//! - `POST /learn` - `LearningSample`
//! - `POST /patterns/analyze` - `{domain, categories}` -> `{patterns: [...]}`
//! - `GET /patterns?domain=` - exported pattern document

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{
    read_json, BackendError, GenerationRequest, GenerationResponse, LearningSample, Pattern,
    PatternCoder,
};

/// Domain tag used for every pattern exchanged by this crate.
pub const ROBLOX_DOMAIN: &str = "roblox";

pub struct PatternServiceClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    patterns: Vec<Pattern>,
}

impl PatternServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl PatternCoder for PatternServiceClient {
    async fn generate_code(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        let response = self
            .client
            .post(self.endpoint("generate"))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn learn_from_code(&self, sample: &LearningSample) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint("learn"))
            .json(sample)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status.as_u16(), &body));
        }
        Ok(())
    }

    async fn analyze_patterns(
        &self,
        domain: &str,
        categories: &[&str],
    ) -> Result<Vec<Pattern>, BackendError> {
        let response = self
            .client
            .post(self.endpoint("patterns/analyze"))
            .json(&json!({ "domain": domain, "categories": categories }))
            .send()
            .await?;
        let parsed: AnalyzeResponse = read_json(response).await?;
        Ok(parsed.patterns)
    }

    async fn export_patterns(&self, domain: &str) -> Result<serde_json::Value, BackendError> {
        let response = self
            .client
            .get(self.endpoint("patterns"))
            .query(&[("domain", domain)])
            .send()
            .await?;
        read_json(response).await
    }
}
