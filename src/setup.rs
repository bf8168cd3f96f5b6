//! Hosted model setup: probe each model, smoke-test the helpers, write
//! `huggingface_config.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendError, Capability, GameAi};

pub const MANIFEST_FILE: &str = "huggingface_config.json";

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub code_generation: bool,
    pub code_understanding: bool,
    pub text_generation: bool,
}

impl Capabilities {
    fn set(&mut self, capability: Capability) {
        match capability {
            Capability::CodeGeneration => self.code_generation = true,
            Capability::CodeUnderstanding => self.code_understanding = true,
            Capability::TextGeneration => self.text_generation = true,
        }
    }
}

/// Contents of `huggingface_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupManifest {
    /// Models that answered the probe
    pub models_loaded: Vec<String>,
    pub device: String,
    pub endpoint: String,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmokeTest {
    pub name: &'static str,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SmokeTest {
    fn from_result<T>(name: &'static str, result: Result<T, BackendError>) -> Self {
        match result {
            Ok(_) => {
                tracing::info!("{}: success", name);
                Self {
                    name,
                    passed: true,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("{}: failed: {}", name, e);
                Self {
                    name,
                    passed: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub manifest: SetupManifest,
    pub manifest_path: PathBuf,
    pub smoke_tests: Vec<SmokeTest>,
    /// More than half of the smoke tests passed
    pub success: bool,
}

impl SetupReport {
    pub fn passed(&self) -> usize {
        self.smoke_tests.iter().filter(|t| t.passed).count()
    }
}

/// Probe every model, record what answered.
pub async fn probe(ai: &GameAi, endpoint: &str) -> SetupManifest {
    let mut manifest = SetupManifest {
        models_loaded: Vec::new(),
        device: "hosted".to_string(),
        endpoint: endpoint.to_string(),
        capabilities: Capabilities::default(),
    };

    for (capability, model, outcome) in ai.probe_models().await {
        match outcome {
            Ok(()) => {
                tracing::info!("Model {} available ({:?})", model, capability);
                manifest.models_loaded.push(model);
                manifest.capabilities.set(capability);
            }
            Err(e) => tracing::warn!("Model {} unavailable: {}", model, e),
        }
    }
    manifest
}

/// Lua generation, code improvement and content generation, in that order.
pub async fn smoke_tests(ai: &GameAi) -> Vec<SmokeTest> {
    vec![
        SmokeTest::from_result(
            "Code Generation",
            ai.generate_lua_code("create a function that doubles a number").await,
        ),
        SmokeTest::from_result(
            "Code Improvement",
            ai.improve_code("function add(a, b) return a + b end").await,
        ),
        SmokeTest::from_result(
            "Content Generation",
            ai.generate_game_content("NPC dialogue", "friendly shopkeeper").await,
        ),
    ]
}

/// Run the whole setup and write the manifest into `out_dir`.
pub async fn run_setup(ai: &GameAi, endpoint: &str, out_dir: &Path) -> Result<SetupReport, SetupError> {
    let manifest = probe(ai, endpoint).await;
    let smoke_tests = smoke_tests(ai).await;

    let passed = smoke_tests.iter().filter(|t| t.passed).count();
    let success = passed * 2 > smoke_tests.len();
    tracing::info!("Test results: {}/{}", passed, smoke_tests.len());

    tokio::fs::create_dir_all(out_dir).await?;
    let manifest_path = out_dir.join(MANIFEST_FILE);
    tokio::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?).await?;
    tracing::info!("Saved configuration to {}", manifest_path.display());

    Ok(SetupReport {
        manifest,
        manifest_path,
        smoke_tests,
        success,
    })
}
