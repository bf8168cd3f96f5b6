//! Pattern training: feed the game's Lua sources to the pattern coder,
//! check what it generates, and export the learned patterns.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::backend::{
    BackendError, GenerationRequest, LearningSample, Pattern, PatternCoder, ROBLOX_DOMAIN,
};

pub const PATTERNS_FILE: &str = "roblox_game_patterns.json";
pub const REPORT_FILE: &str = "training_report.json";
pub const GAME_NAME: &str = "Roblox Multiplication Game";

pub const PATTERN_CATEGORIES: [&str; 4] = ["service", "ui", "config", "controller"];

pub const TEST_PROMPTS: [&str; 4] = [
    "Create a new object type called Robot worth 15 currency",
    "Add a new upgrade that increases spawn rate",
    "Create a notification system for achievements",
    "Add a leaderboard UI component",
];

/// A generated sample counts as good above both thresholds.
const MIN_TEST_QUALITY: f64 = 0.7;
const MIN_TEST_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern export failed: {0}")]
    Export(#[from] BackendError),
}

/// One source file prepared for learning.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingFile {
    /// Path relative to the game root, `/`-separated
    pub file: String,
    pub code: String,
    pub lines: usize,
    pub category: &'static str,
    pub service: &'static str,
}

/// Category by file name.
pub fn categorize_file(file_name: &str) -> &'static str {
    if file_name.contains("Manager") || file_name.contains("Service") {
        "service"
    } else if file_name.contains("UI") || file_name.contains("GUI") {
        "ui"
    } else if file_name.contains("Config") {
        "config"
    } else if file_name.contains("Controller") {
        "controller"
    } else {
        "utility"
    }
}

/// Roblox service a file lives under, by path.
pub fn service_type(path: &str) -> &'static str {
    if path.contains("ServerScriptService") {
        "server"
    } else if path.contains("StarterGui") {
        "client_ui"
    } else if path.contains("StarterPlayer") {
        "client_character"
    } else if path.contains("ReplicatedStorage") {
        "shared"
    } else {
        "unknown"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationTest {
    pub prompt: &'static str,
    pub quality: f64,
    pub confidence: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Contents of `training_report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub game: String,
    pub files_trained: usize,
    pub domain: String,
    pub language: String,
    pub timestamp: String,
    pub model_path: PathBuf,
    pub patterns_found: usize,
    pub test_successes: usize,
    pub test_total: usize,
}

pub struct Trainer {
    coder: Arc<dyn PatternCoder>,
    game_path: PathBuf,
}

impl Trainer {
    pub fn new(coder: Arc<dyn PatternCoder>, game_path: impl Into<PathBuf>) -> Self {
        Self {
            coder,
            game_path: game_path.into(),
        }
    }

    fn src_path(&self) -> PathBuf {
        self.game_path.join("src")
    }

    /// Every `src/**/*.lua`, in path order. Unreadable files are skipped.
    pub async fn collect_training_data(&self) -> Vec<TrainingFile> {
        tracing::info!("Collecting training data from {}", self.src_path().display());

        let mut paths: Vec<PathBuf> = WalkDir::new(self.src_path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().map(|ext| ext == "lua").unwrap_or(false))
            .collect();
        paths.sort();

        let mut data = Vec::with_capacity(paths.len());
        for path in paths {
            let code = match tokio::fs::read_to_string(&path).await {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };
            let file = relative_path(&self.game_path, &path);
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let lines = code.split('\n').count();
            tracing::debug!("Collected {} ({} lines)", file, lines);

            data.push(TrainingFile {
                category: categorize_file(&file_name),
                service: service_type(&file),
                file,
                code,
                lines,
            });
        }

        tracing::info!("Collected {} files", data.len());
        data
    }

    /// Feed every file to the pattern learner. Returns how many were accepted.
    pub async fn train_patterns(&self, data: &[TrainingFile]) -> usize {
        let mut learned = 0;
        for file in data {
            let sample = LearningSample::lua(file.code.as_str())
                .with_metadata("file", file.file.as_str())
                .with_metadata("category", file.category)
                .with_metadata("service", file.service);
            match self.coder.learn_from_code(&sample).await {
                Ok(()) => {
                    learned += 1;
                    tracing::debug!("Learned patterns from {}", file.file);
                }
                Err(e) => tracing::warn!("Failed to learn from {}: {}", file.file, e),
            }
        }
        tracing::info!("Learned patterns from {}/{} files", learned, data.len());
        learned
    }

    pub async fn extract_common_patterns(&self) -> Vec<Pattern> {
        match self
            .coder
            .analyze_patterns(ROBLOX_DOMAIN, &PATTERN_CATEGORIES)
            .await
        {
            Ok(patterns) => {
                tracing::info!("Found {} common patterns", patterns.len());
                for pattern in patterns.iter().take(10) {
                    tracing::info!(
                        "  {} (used in {} places, quality {:.2})",
                        pattern.name,
                        pattern.frequency,
                        pattern.quality_score
                    );
                }
                patterns
            }
            Err(e) => {
                tracing::warn!("Could not extract patterns: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn test_generation(&self) -> Vec<GenerationTest> {
        let mut results = Vec::with_capacity(TEST_PROMPTS.len());
        for prompt in TEST_PROMPTS {
            let result = match self.coder.generate_code(&GenerationRequest::lua(prompt)).await {
                Ok(response) => {
                    let quality = response.quality_score.unwrap_or(0.0);
                    let confidence = response.confidence.unwrap_or(0.0);
                    tracing::info!(
                        "{}: quality {:.2}, confidence {:.2}, {} lines",
                        prompt,
                        quality,
                        confidence,
                        response.code.split('\n').count()
                    );
                    GenerationTest {
                        prompt,
                        quality,
                        confidence,
                        success: quality > MIN_TEST_QUALITY && confidence > MIN_TEST_CONFIDENCE,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!("Generation failed for {:?}: {}", prompt, e);
                    GenerationTest {
                        prompt,
                        quality: 0.0,
                        confidence: 0.0,
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }
        results
    }

    /// Export the learned patterns and write the training report next to them.
    pub async fn save(
        &self,
        files_trained: usize,
        patterns_found: usize,
        tests: &[GenerationTest],
    ) -> Result<TrainingReport, TrainError> {
        let model_path = self.game_path.join(PATTERNS_FILE);
        let exported = self.coder.export_patterns(ROBLOX_DOMAIN).await?;
        tokio::fs::write(&model_path, serde_json::to_vec_pretty(&exported)?).await?;
        tracing::info!("Saved patterns to {}", model_path.display());

        let report = TrainingReport {
            game: GAME_NAME.to_string(),
            files_trained,
            domain: ROBLOX_DOMAIN.to_string(),
            language: "lua".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            model_path,
            patterns_found,
            test_successes: tests.iter().filter(|t| t.success).count(),
            test_total: tests.len(),
        };
        let report_path = self.game_path.join(REPORT_FILE);
        tokio::fs::write(&report_path, serde_json::to_vec_pretty(&report)?).await?;
        tracing::info!("Saved training report to {}", report_path.display());

        Ok(report)
    }

    /// Collect, learn, analyze, test, save. `Ok(None)` when there is nothing to train on.
    pub async fn run(&self) -> Result<Option<TrainingReport>, TrainError> {
        let data = self.collect_training_data().await;
        if data.is_empty() {
            tracing::error!("No training data found under {}", self.src_path().display());
            return Ok(None);
        }

        self.train_patterns(&data).await;
        let patterns = self.extract_common_patterns().await;
        let tests = self.test_generation().await;
        let report = self.save(data.len(), patterns.len(), &tests).await?;

        tracing::info!(
            "Training complete: {} files, {} patterns, {}/{} test generations succeeded",
            report.files_trained,
            report.patterns_found,
            report.test_successes,
            report.test_total
        );
        Ok(Some(report))
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
