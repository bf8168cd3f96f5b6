//! Configuration management for autodev.
//!
//! Configuration is read from environment variables:
//! - `GAME_PATH` - Optional. Game project root (expects a `src/` tree). Defaults to current directory.
//! - `MAX_ITERATIONS` - Optional. Improvement loop iterations. Defaults to `5`.
//! - `HOST` / `PORT` - Optional. Worker control API address. Defaults to `0.0.0.0:7860`.
//! - `TASKS_FILE` - Optional. Local task queue file. Defaults to `tasks.json`.
//! - `REPO_URL` - Optional. GitHub repository holding the task queue file (enables remote queue mode).
//! - `GITHUB_TOKEN` - Optional. Bearer token for the remote queue fetch.
//! - `PATTERN_SERVICE_URL` - Optional. Pattern-assisted coder service.
//! - `HF_API_TOKEN` / `HF_INFERENCE_URL` - Optional. Either one enables hosted inference.
//! - `HF_CODE_MODEL`, `HF_TEXT_MODEL`, `HF_UNDERSTANDING_MODEL` - Optional model overrides.
//! - `LLM_API_KEY` (or `OPENROUTER_API_KEY`) - Optional. Enables the completion backend.
//! - `LLM_API_URL`, `LLM_PLANNING_MODEL`, `LLM_CODING_MODEL` - Optional completion overrides.
//! - `ITERATION_DELAY_SECS`, `TASK_DELAY_SECS`, `BATCH_DELAY_SECS`, `IDLE_DELAY_SECS` - Loop cadence.
//! - `SCAN_COMPLEX_CONDITIONALS` - Optional. Enables the `if`-count refactor heuristic.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::util::{env_var_bool, env_var_opt, env_var_parse};

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_COMPLETION_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Sleep intervals for the loop drivers. All delays are fixed; there is no backoff growth.
#[derive(Debug, Clone, Copy)]
pub struct LoopTimings {
    /// Improvement loop: pause after each iteration
    pub iteration_delay: Duration,
    /// Queue worker: pause between two tasks of a batch
    pub task_delay: Duration,
    /// Queue worker: pause after a complete batch
    pub batch_delay: Duration,
    /// Queue worker: pause after an empty fetch or a failed iteration
    pub idle_delay: Duration,
}

impl Default for LoopTimings {
    fn default() -> Self {
        Self {
            iteration_delay: Duration::from_secs(60),
            task_delay: Duration::from_secs(5),
            batch_delay: Duration::from_secs(300),
            idle_delay: Duration::from_secs(60),
        }
    }
}

impl LoopTimings {
    /// No waiting at all; used by tests and one-shot runs.
    pub fn immediate() -> Self {
        Self {
            iteration_delay: Duration::ZERO,
            task_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            idle_delay: Duration::ZERO,
        }
    }
}

/// Where the queue worker reads its tasks from.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Local queue file, used when no repository is configured
    pub tasks_file: PathBuf,
    /// `https://github.com/<owner>/<repo>` holding the queue file
    pub repo_url: Option<String>,
    /// Bearer credential for the repository content endpoint
    pub github_token: Option<String>,
}

impl QueueConfig {
    pub fn is_remote(&self) -> bool {
        self.repo_url.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct PatternConfig {
    pub base_url: String,
}

/// Hosted text-generation pipeline configuration.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub code_model: String,
    pub text_model: String,
    pub understanding_model: String,
}

impl Default for InferenceConfig {
    /// Public endpoint, no token, the stock model set.
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INFERENCE_URL.to_string(),
            api_token: None,
            code_model: "Salesforce/codegen-350M-mono".to_string(),
            text_model: "distilgpt2".to_string(),
            understanding_model: "microsoft/codebert-base".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: String,
    pub planning_model: String,
    pub coding_model: String,
}

/// Runtime configuration shared by every entry point.
#[derive(Debug, Clone)]
pub struct Config {
    /// Game project root; sources are scanned below `<game_path>/src`
    pub game_path: PathBuf,

    /// Maximum iterations of the improvement loop
    pub max_iterations: usize,

    /// Control API host
    pub host: String,

    /// Control API port
    pub port: u16,

    pub timings: LoopTimings,

    pub queue: QueueConfig,

    /// Pattern-assisted coder; `None` disables that backend
    pub pattern: Option<PatternConfig>,

    /// Hosted inference; `None` disables that backend
    pub inference: Option<InferenceConfig>,

    /// Chat completion LLM; `None` disables that backend and planning
    pub completion: Option<CompletionConfig>,

    /// Enable the complex-conditional scanner rule
    pub scan_complex_conditionals: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let game_path = env_var_opt("GAME_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let max_iterations = parse_var("MAX_ITERATIONS", 5usize)?;
        let host = env_var_opt("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_var("PORT", 7860u16)?;

        let defaults = LoopTimings::default();
        let timings = LoopTimings {
            iteration_delay: parse_secs("ITERATION_DELAY_SECS", defaults.iteration_delay)?,
            task_delay: parse_secs("TASK_DELAY_SECS", defaults.task_delay)?,
            batch_delay: parse_secs("BATCH_DELAY_SECS", defaults.batch_delay)?,
            idle_delay: parse_secs("IDLE_DELAY_SECS", defaults.idle_delay)?,
        };

        let queue = QueueConfig {
            tasks_file: env_var_opt("TASKS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("tasks.json")),
            repo_url: env_var_opt("REPO_URL"),
            github_token: env_var_opt("GITHUB_TOKEN"),
        };

        let pattern = env_var_opt("PATTERN_SERVICE_URL").map(|base_url| PatternConfig { base_url });

        let hf_token = env_var_opt("HF_API_TOKEN");
        let hf_url = env_var_opt("HF_INFERENCE_URL");
        let inference = if hf_token.is_some() || hf_url.is_some() {
            let defaults = InferenceConfig::default();
            Some(InferenceConfig {
                base_url: hf_url.unwrap_or(defaults.base_url),
                api_token: hf_token,
                code_model: env_var_opt("HF_CODE_MODEL").unwrap_or(defaults.code_model),
                text_model: env_var_opt("HF_TEXT_MODEL").unwrap_or(defaults.text_model),
                understanding_model: env_var_opt("HF_UNDERSTANDING_MODEL")
                    .unwrap_or(defaults.understanding_model),
            })
        } else {
            None
        };

        let completion = env_var_opt("LLM_API_KEY")
            .or_else(|| env_var_opt("OPENROUTER_API_KEY"))
            .map(|api_key| CompletionConfig {
                api_url: env_var_opt("LLM_API_URL")
                    .unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string()),
                api_key,
                planning_model: env_var_opt("LLM_PLANNING_MODEL")
                    .unwrap_or_else(|| "openai/gpt-4o-mini".to_string()),
                coding_model: env_var_opt("LLM_CODING_MODEL")
                    .unwrap_or_else(|| "anthropic/claude-sonnet-4.5".to_string()),
            });

        Ok(Self {
            game_path,
            max_iterations,
            host,
            port,
            timings,
            queue,
            pattern,
            inference,
            completion,
            scan_complex_conditionals: env_var_bool("SCAN_COMPLEX_CONDITIONALS", false),
        })
    }

    /// Create a config rooted at `game_path` with every backend disabled (useful for testing).
    pub fn for_game(game_path: impl Into<PathBuf>) -> Self {
        let game_path = game_path.into();
        Self {
            queue: QueueConfig {
                tasks_file: game_path.join("tasks.json"),
                repo_url: None,
                github_token: None,
            },
            game_path,
            max_iterations: 5,
            host: "127.0.0.1".to_string(),
            port: 7860,
            timings: LoopTimings::immediate(),
            pattern: None,
            inference: None,
            completion: None,
            scan_complex_conditionals: false,
        }
    }

    /// Directory scanned for Lua sources.
    pub fn src_path(&self) -> PathBuf {
        self.game_path.join("src")
    }

    /// Directory receiving accepted implementations.
    pub fn features_dir(&self) -> PathBuf {
        self.game_path.join("generated_features")
    }

    /// Append-only development log.
    pub fn dev_log_path(&self) -> PathBuf {
        self.game_path.join("autonomous_dev.log")
    }

    /// Resolve a file name relative to the game root.
    pub fn game_file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.game_path.join(name)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_var_parse(name, default)
        .map_err(|(raw, e)| ConfigError::InvalidValue(name.to_string(), format!("{raw:?}: {e}")))
}

fn parse_secs(name: &str, default: Duration) -> Result<Duration, ConfigError> {
    parse_var(name, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_game_disables_every_backend() {
        let config = Config::for_game("/tmp/game");
        assert!(config.pattern.is_none());
        assert!(config.inference.is_none());
        assert!(config.completion.is_none());
        assert!(!config.queue.is_remote());
        assert_eq!(config.src_path(), PathBuf::from("/tmp/game/src"));
        assert_eq!(
            config.dev_log_path(),
            PathBuf::from("/tmp/game/autonomous_dev.log")
        );
    }

    #[test]
    fn default_timings_match_loop_cadence() {
        let timings = LoopTimings::default();
        assert_eq!(timings.iteration_delay, Duration::from_secs(60));
        assert_eq!(timings.task_delay, Duration::from_secs(5));
        assert_eq!(timings.batch_delay, Duration::from_secs(300));
        assert_eq!(timings.idle_delay, Duration::from_secs(60));
    }
}
