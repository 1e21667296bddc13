//! JSON-lines persistence hook

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::models::{Coordinate, LocationStep};
use crate::domain::ports::{PersistError, RawResponse, ScanSink};

/// One line of the output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub recorded_at: DateTime<Utc>,
    pub step: usize,
    pub ring: u32,
    pub coordinate: Coordinate,
    pub response: RawResponse,
}

/// Appends one JSON record per persisted step
///
/// Writes are serialized through an internal mutex so lines never
/// interleave, whatever the engine's storage concurrency mode.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it and its parent directories
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path).await?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ScanSink for JsonLinesSink {
    async fn persist(
        &self,
        response: &RawResponse,
        location: &LocationStep,
    ) -> Result<(), PersistError> {
        let record = ScanRecord {
            recorded_at: Utc::now(),
            step: location.step,
            ring: location.ring,
            coordinate: location.coordinate,
            response: response.clone(),
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn step(step: usize) -> LocationStep {
        LocationStep {
            step,
            ring: 1,
            coordinate: Coordinate::new(1.0, 2.0),
        }
    }

    #[tokio::test]
    async fn test_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out/scan/records.jsonl");

        let sink = JsonLinesSink::create(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(sink.path(), path);
    }

    #[tokio::test]
    async fn test_persist_writes_one_record_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.jsonl");
        let sink = JsonLinesSink::create(&path).await.unwrap();

        sink.persist(&RawResponse::new(json!({"n": 1})), &step(1))
            .await
            .unwrap();
        sink.persist(&RawResponse::new(json!({"n": 2})), &step(2))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let records: Vec<ScanRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].step, 1);
        assert_eq!(records[1].response.as_value()["n"], 2);
    }

    #[tokio::test]
    async fn test_concurrent_writes_do_not_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.jsonl");
        let sink = Arc::new(JsonLinesSink::create(&path).await.unwrap());

        let writers: Vec<_> = (1..=20)
            .map(|i| {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    sink.persist(&RawResponse::new(json!({"payload": "x".repeat(512)})), &step(i))
                        .await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut steps: Vec<usize> = contents
            .lines()
            .map(|line| serde_json::from_str::<ScanRecord>(line).unwrap().step)
            .collect();
        steps.sort_unstable();
        assert_eq!(steps, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.jsonl");

        JsonLinesSink::create(&path)
            .await
            .unwrap()
            .persist(&RawResponse::new(json!(null)), &step(1))
            .await
            .unwrap();
        JsonLinesSink::create(&path)
            .await
            .unwrap()
            .persist(&RawResponse::new(json!(null)), &step(2))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
