//! Persistence for accepted implementations and for the development log.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::ScoredCandidate;
use crate::util::file_stamp;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paths written for one accepted implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFeature {
    pub code_path: PathBuf,
    pub metadata_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct FeatureMetadata<'a> {
    feature: &'a str,
    file: String,
    timestamp: String,
    source: &'a str,
    quality: f64,
    confidence: f64,
    score: f64,
}

/// Writes accepted implementations as `feature_<stamp>.lua` + `feature_<stamp>.json`.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    dir: PathBuf,
}

impl FeatureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn save(
        &self,
        feature: &str,
        implementation: &ScoredCandidate,
    ) -> Result<SavedFeature, SinkError> {
        fs::create_dir_all(&self.dir).await?;

        let base = unused_stem(&self.dir, &format!("feature_{}", file_stamp())).await;
        let code_path = self.dir.join(format!("{base}.lua"));
        let metadata_path = self.dir.join(format!("{base}.json"));
        let generated_at = Utc::now().to_rfc3339();
        let candidate = &implementation.candidate;

        let contents = format!(
            "-- {}\n-- Generated: {}\n-- Source: {}\n\n{}",
            feature, generated_at, candidate.source, candidate.code
        );
        fs::write(&code_path, contents).await?;

        let metadata = FeatureMetadata {
            feature,
            file: code_path.to_string_lossy().into_owned(),
            timestamp: generated_at,
            source: &candidate.source,
            quality: candidate.quality,
            confidence: candidate.confidence,
            score: implementation.score,
        };
        fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata)?).await?;

        tracing::info!("Saved implementation to {}", code_path.display());
        Ok(SavedFeature {
            code_path,
            metadata_path,
        })
    }
}

/// `stem`, or `stem_<n>` when a file with that stem already exists.
async fn unused_stem(dir: &Path, stem: &str) -> String {
    let mut candidate = stem.to_string();
    let mut n = 1;
    while fs::try_exists(dir.join(format!("{candidate}.lua")))
        .await
        .unwrap_or(false)
    {
        candidate = format!("{stem}_{n}");
        n += 1;
    }
    candidate
}

/// Append-only newline-delimited JSON log. Never truncated or rotated.
#[derive(Debug, Clone)]
pub struct DevLog {
    path: PathBuf,
}

impl DevLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append<T: Serialize>(&self, record: &T) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Archive of successful queue results, one pretty JSON file each.
#[derive(Debug, Clone)]
pub struct ResultArchive {
    dir: PathBuf,
}

impl ResultArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn store<T: Serialize>(&self, result: &T) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(&self.dir).await?;
        let stem = format!("result_{}", file_stamp());
        let mut path = self.dir.join(format!("{stem}.json"));
        let mut n = 1;
        while fs::try_exists(&path).await.unwrap_or(false) {
            path = self.dir.join(format!("{stem}_{n}.json"));
            n += 1;
        }
        fs::write(&path, serde_json::to_vec_pretty(result)?).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{select_best, Candidate};

    fn implementation() -> ScoredCandidate {
        select_best(&[Candidate::new("stub", "local function f() return 1 end", 0.9, 0.9)]).unwrap()
    }

    #[tokio::test]
    async fn save_writes_header_and_metadata() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FeatureStore::new(temp.path().join("generated_features"));

        let saved = store.save("Add error handling to Foo.lua", &implementation()).await.unwrap();

        let code = std::fs::read_to_string(&saved.code_path).unwrap();
        let lines: Vec<&str> = code.lines().collect();
        assert_eq!(lines[0], "-- Add error handling to Foo.lua");
        assert!(lines[1].starts_with("-- Generated: "));
        assert_eq!(lines[2], "-- Source: stub");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "local function f() return 1 end");

        let metadata: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&saved.metadata_path).unwrap()).unwrap();
        assert_eq!(metadata["source"], "stub");
        assert_eq!(metadata["feature"], "Add error handling to Foo.lua");
        assert_eq!(metadata["quality"], 0.9);
    }

    #[tokio::test]
    async fn same_second_saves_do_not_overwrite() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FeatureStore::new(temp.path());

        let first = store.save("one", &implementation()).await.unwrap();
        let second = store.save("two", &implementation()).await.unwrap();
        assert_ne!(first.code_path, second.code_path);
        assert!(first.code_path.exists());
        assert!(second.metadata_path.exists());
    }

    #[tokio::test]
    async fn dev_log_appends_one_line_per_record() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = DevLog::new(temp.path().join("autonomous_dev.log"));

        log.append(&serde_json::json!({"feature": "a", "success": true})).await.unwrap();
        log.append(&serde_json::json!({"feature": "b", "success": false})).await.unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["feature"], "b");
    }

    #[tokio::test]
    async fn archive_stores_pretty_json() {
        let temp = tempfile::tempdir().expect("tempdir");
        let archive = ResultArchive::new(temp.path().join("generated_output"));
        let path = archive.store(&serde_json::json!({"success": true})).await.unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("result_"));
        assert!(std::fs::read_to_string(path).unwrap().contains("\"success\": true"));
    }
}
