// Results persistence - where finished games are recorded
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::errors::InfrastructureError;
use crate::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRecord {
    pub player_id: PlayerId,
    pub money: i64,
    /// Seconds since the Unix epoch
    pub finished_at: u64,
}

impl FinishRecord {
    pub fn now(player_id: impl Into<PlayerId>, money: i64) -> Self {
        let finished_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            player_id: player_id.into(),
            money,
            finished_at,
        }
    }
}

#[async_trait]
pub trait ResultsStore: Send + Sync {
    async fn record_finish(&self, record: FinishRecord) -> Result<(), InfrastructureError>;
}

/// Keeps results for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryResultsStore {
    records: Mutex<Vec<FinishRecord>>,
}

impl InMemoryResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<FinishRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl ResultsStore for InMemoryResultsStore {
    async fn record_finish(&self, record: FinishRecord) -> Result<(), InfrastructureError> {
        self.records.lock().await.push(record);
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
pub struct JsonLinesResultsStore {
    path: PathBuf,
    // Serializes appends so lines never interleave
    write_lock: Mutex<()>,
}

impl JsonLinesResultsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ResultsStore for JsonLinesResultsStore {
    async fn record_finish(&self, record: FinishRecord) -> Result<(), InfrastructureError> {
        let mut line = serde_json::to_string(&record).map_err(store_error)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(store_error)?;
        file.write_all(line.as_bytes()).await.map_err(store_error)?;
        file.flush().await.map_err(store_error)?;
        Ok(())
    }
}

fn store_error(e: impl std::fmt::Display) -> InfrastructureError {
    InfrastructureError::ResultsStore {
        details: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_keeps_order() {
        let store = InMemoryResultsStore::new();
        store.record_finish(FinishRecord::now("a", 10)).await.unwrap();
        store.record_finish(FinishRecord::now("b", 20)).await.unwrap();
        let records = store.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].player_id, "a");
        assert_eq!(records[1].money, 20);
    }

    #[tokio::test]
    async fn test_json_lines_store_appends() {
        let path = std::env::temp_dir().join(format!("sugoroku-results-{}.jsonl", uuid::Uuid::new_v4()));
        let store = JsonLinesResultsStore::new(&path);
        store.record_finish(FinishRecord::now("a", 1)).await.unwrap();
        store.record_finish(FinishRecord::now("b", 2)).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let records: Vec<FinishRecord> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].player_id, "b");
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_json_lines_store_reports_io_errors() {
        let store = JsonLinesResultsStore::new("/nonexistent-dir/results.jsonl");
        let result = store.record_finish(FinishRecord::now("a", 1)).await;
        assert!(matches!(result, Err(InfrastructureError::ResultsStore { .. })));
    }
}
