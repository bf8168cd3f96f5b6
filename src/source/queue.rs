//! Task queue stored as a JSON array, either in a local file or in a GitHub
//! repository (read through the contents API).

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::TaskSource;
use crate::config::QueueConfig;
use crate::task::Task;

const GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Queue endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid task JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
}

pub struct QueueSource {
    client: Client,
    config: QueueConfig,
    api_base: String,
}

impl QueueSource {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            api_base: GITHUB_API_BASE.to_string(),
        }
    }

    /// Point the remote fetch at another API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn tasks_file_name(&self) -> String {
        self.config
            .tasks_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tasks.json".to_string())
    }

    async fn fetch_local(&self, path: &Path) -> Result<Vec<Task>, SourceError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => parse_tasks(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_remote(&self, repo_url: &str) -> Result<Vec<Task>, SourceError> {
        let url = contents_url(&self.api_base, repo_url, &self.tasks_file_name())?;
        tracing::debug!("Fetching task queue from {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "autodev");
        if let Some(token) = &self.config.github_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let contents: ContentsResponse = response.json().await?;
        decode_contents(&contents.content)
    }

    async fn try_fetch(&self) -> Result<Vec<Task>, SourceError> {
        match &self.config.repo_url {
            Some(repo_url) => self.fetch_remote(repo_url).await,
            None => self.fetch_local(&self.config.tasks_file).await,
        }
    }
}

#[async_trait]
impl TaskSource for QueueSource {
    async fn fetch(&self) -> Vec<Task> {
        match self.try_fetch().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!("Could not fetch tasks: {}", e);
                Vec::new()
            }
        }
    }
}

/// `https://github.com/<owner>/<repo>` -> `<api_base>/repos/<owner>/<repo>/contents/<file>`
pub fn contents_url(api_base: &str, repo_url: &str, file: &str) -> Result<String, SourceError> {
    let parsed =
        url::Url::parse(repo_url).map_err(|e| SourceError::InvalidRepoUrl(format!("{repo_url}: {e}")))?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [owner, repo, ..] => Ok(format!(
            "{}/repos/{}/{}/contents/{}",
            api_base,
            owner,
            repo.trim_end_matches(".git"),
            file
        )),
        _ => Err(SourceError::InvalidRepoUrl(repo_url.to_string())),
    }
}

/// Decode the base64 `content` field of a contents API response into tasks.
///
/// GitHub wraps the payload every 60 characters; whitespace is ignored.
pub fn decode_contents(content: &str) -> Result<Vec<Task>, SourceError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
    parse_tasks(&bytes)
}

/// Parse a JSON array of tasks. The array itself must be valid; entries that
/// do not decode as a task are logged and skipped.
pub fn parse_tasks(bytes: &[u8]) -> Result<Vec<Task>, SourceError> {
    let entries: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    let tasks = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(task) => Some(task),
            Err(e) => {
                tracing::warn!("Skipping queue entry {}: {}", index, e);
                None
            }
        })
        .collect();
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Severity, TaskKind};
    use axum::{http::HeaderMap, http::StatusCode, routing::get, Json, Router};
    use std::path::PathBuf;

    fn local_config(path: PathBuf) -> QueueConfig {
        QueueConfig {
            tasks_file: path,
            repo_url: None,
            github_token: None,
        }
    }

    fn remote_source(api_base: &str, token: Option<&str>) -> QueueSource {
        QueueSource::new(QueueConfig {
            tasks_file: PathBuf::from("tasks.json"),
            repo_url: Some("https://github.com/acme/mult-game".to_string()),
            github_token: token.map(str::to_string),
        })
        .with_api_base(api_base)
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn spawn_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Contents API stand-in that requires `Bearer secret`.
    fn contents_api(json: &str) -> Router {
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);
        let wrapped = encoded
            .as_bytes()
            .chunks(60)
            .map(|chunk| std::str::from_utf8(chunk).unwrap())
            .collect::<Vec<_>>()
            .join("\n");

        Router::new().route(
            "/repos/acme/mult-game/contents/tasks.json",
            get(move |headers: HeaderMap| {
                let content = wrapped.clone();
                async move {
                    let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
                    if auth != Some("Bearer secret") {
                        return Err(StatusCode::UNAUTHORIZED);
                    }
                    Ok(Json(serde_json::json!({ "content": content, "encoding": "base64" })))
                }
            }),
        )
    }

    #[tokio::test]
    async fn fetches_tasks_from_contents_api() {
        let json = r#"[
            {"type":"bug_fix","file":"ShopService.lua","issue":"nil player","priority":"high"},
            {"type":"content","content_type":"npc_dialogue","context":"friendly shopkeeper","description":"Write shopkeeper lines for the market square"}
        ]"#;
        let base = spawn_api(contents_api(json)).await;

        let tasks = remote_source(&base, Some("secret")).fetch().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].kind, TaskKind::BugFix);
        assert_eq!(tasks[0].severity, Severity::High);
        assert_eq!(tasks[1].content_type.as_deref(), Some("npc_dialogue"));
    }

    #[tokio::test]
    async fn non_success_status_yields_no_tasks() {
        let base = spawn_api(contents_api("[]")).await;

        let unauthenticated = remote_source(&base, None);
        assert!(matches!(
            unauthenticated.try_fetch().await,
            Err(SourceError::Status(401))
        ));
        assert!(unauthenticated.fetch().await.is_empty());

        let missing = QueueSource::new(QueueConfig {
            tasks_file: PathBuf::from("other.json"),
            repo_url: Some("https://github.com/acme/mult-game".to_string()),
            github_token: Some("secret".to_string()),
        })
        .with_api_base(&base);
        assert!(matches!(missing.try_fetch().await, Err(SourceError::Status(404))));
        assert!(missing.fetch().await.is_empty());
    }

    #[test]
    fn builds_contents_url_from_repo_url() {
        let url = contents_url(GITHUB_API_BASE, "https://github.com/acme/mult-game", "tasks.json").unwrap();
        assert_eq!(url, "https://api.github.com/repos/acme/mult-game/contents/tasks.json");

        let url = contents_url(GITHUB_API_BASE, "https://github.com/acme/mult-game.git/", "q.json").unwrap();
        assert_eq!(url, "https://api.github.com/repos/acme/mult-game/contents/q.json");

        assert!(contents_url(GITHUB_API_BASE, "https://github.com/acme", "tasks.json").is_err());
        assert!(contents_url(GITHUB_API_BASE, "not a url", "tasks.json").is_err());
    }

    #[test]
    fn decodes_wrapped_base64_payload() {
        let json = r#"[{"type":"feature","description":"Add a leaderboard UI component","priority":"high"}]"#;
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);
        let wrapped = format!("{}\n{}\n", &encoded[..40], &encoded[40..]);

        let tasks = decode_contents(&wrapped).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind, TaskKind::Feature);
        assert_eq!(tasks[0].severity, Severity::High);
    }

    #[test]
    fn rejects_garbage_payload() {
        assert!(matches!(decode_contents("!!!"), Err(SourceError::Base64(_))));
        let not_json = base64::engine::general_purpose::STANDARD.encode("nope");
        assert!(matches!(decode_contents(&not_json), Err(SourceError::Json(_))));
    }

    #[test]
    fn bad_entries_do_not_drop_the_rest_of_the_queue() {
        let json = r#"[
            {"type":"feature","description":"both keys","severity":"medium","priority":"high"},
            {"type":"feature","description":"critical","severity":"critical"},
            {"type":"feature","description":"null","severity":null},
            {"type":"feature","description":42},
            "not a task"
        ]"#;
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);

        let tasks = decode_contents(&encoded).unwrap();
        let descriptions: Vec<&str> = tasks.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["both keys", "critical", "null"]);
        assert_eq!(tasks[0].severity, Severity::Medium);
        assert_eq!(tasks[1].severity, Severity::Low);
        assert_eq!(tasks[2].severity, Severity::Low);
    }

    #[tokio::test]
    async fn unknown_priority_keeps_local_queue_usable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tasks.json");
        std::fs::write(
            &path,
            r#"[{"type":"feature","description":"Add pets","priority":"high"},{"type":"feature","description":"Add trading","priority":"urgent"}]"#,
        )
        .unwrap();

        let tasks = QueueSource::new(local_config(path)).fetch().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].severity, Severity::High);
        assert_eq!(tasks[1].severity, Severity::Low);
    }

    #[tokio::test]
    async fn reads_local_queue_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tasks.json");
        std::fs::write(
            &path,
            r#"[{"type":"bug_fix","file":"Shop.lua","issue":"nil"},{"type":"content","content_type":"npc_dialogue"}]"#,
        )
        .unwrap();

        let tasks = QueueSource::new(local_config(path)).fetch().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].kind, TaskKind::BugFix);
        assert_eq!(tasks[1].content_type.as_deref(), Some("npc_dialogue"));
    }

    #[tokio::test]
    async fn missing_or_invalid_local_file_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = QueueSource::new(local_config(temp.path().join("absent.json")));
        assert!(missing.fetch().await.is_empty());

        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(QueueSource::new(local_config(path)).fetch().await.is_empty());
    }

    #[tokio::test]
    async fn network_failure_is_empty_not_an_error() {
        let source = QueueSource::new(QueueConfig {
            tasks_file: PathBuf::from("tasks.json"),
            repo_url: Some("https://github.com/acme/mult-game".to_string()),
            github_token: Some("secret".to_string()),
        })
        .with_api_base("http://127.0.0.1:1");

        assert!(source.fetch().await.is_empty());
    }
}
