use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::{models::MatchRecord, MatchStatistics, StatsError};
use crate::roster::MatchRoster;

/// Source of per-match records. Implementations stand in for whatever
/// decodes replays and computes their statistics.
#[async_trait]
pub trait MatchRecordRepository: Send + Sync {
    async fn load_match(&self, match_id: &str) -> Result<MatchRecord, StatsError>;
    async fn list_matches(&self) -> Result<Vec<String>, StatsError>;
}

#[derive(Debug, Default)]
pub struct InMemoryMatchRecordRepository {
    records: Arc<RwLock<HashMap<String, MatchRecord>>>,
}

impl InMemoryMatchRecordRepository {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_records(records: Vec<MatchRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.match_id.clone(), record))
            .collect();
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn insert(&self, record: MatchRecord) {
        let mut records = self.records.write().await;
        records.insert(record.match_id.clone(), record);
    }
}

#[async_trait]
impl MatchRecordRepository for InMemoryMatchRecordRepository {
    async fn load_match(&self, match_id: &str) -> Result<MatchRecord, StatsError> {
        let records = self.records.read().await;
        records
            .get(match_id)
            .cloned()
            .ok_or_else(|| StatsError::Repository(format!("unknown match `{match_id}`")))
    }

    async fn list_matches(&self) -> Result<Vec<String>, StatsError> {
        let records = self.records.read().await;
        let mut ids: Vec<String> = records.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// Reads `<match_id>.json` files from one directory.
///
/// A file whose roster parses but whose statistics do not is still returned,
/// with `statistics` set to `None`.
#[derive(Debug, Clone)]
pub struct JsonDirectoryRepository {
    root: PathBuf,
}

#[derive(serde::Deserialize)]
struct StoredMatchRecord {
    #[serde(default)]
    match_id: Option<String>,
    roster: MatchRoster,
    #[serde(default)]
    statistics: Option<serde_json::Value>,
}

impl JsonDirectoryRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ids are plain file stems; anything that could leave `root` is refused.
    fn record_path(&self, match_id: &str) -> Result<PathBuf, StatsError> {
        let is_plain = !match_id.is_empty()
            && match_id != "."
            && match_id != ".."
            && !match_id.contains(['/', '\\'])
            && !Path::new(match_id).is_absolute();
        if !is_plain {
            return Err(StatsError::Repository(format!("invalid match id `{match_id}`")));
        }
        Ok(self.root.join(format!("{match_id}.json")))
    }
}

#[async_trait]
impl MatchRecordRepository for JsonDirectoryRepository {
    #[instrument(skip(self))]
    async fn load_match(&self, match_id: &str) -> Result<MatchRecord, StatsError> {
        let path = self.record_path(match_id)?;
        let contents = tokio::fs::read_to_string(&path).await.map_err(|err| {
            StatsError::Repository(format!("failed to read {}: {err}", path.display()))
        })?;

        let stored: StoredMatchRecord = serde_json::from_str(&contents).map_err(|err| {
            StatsError::Repository(format!("failed to parse {}: {err}", path.display()))
        })?;

        let statistics = match stored.statistics {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => match serde_json::from_value::<MatchStatistics>(value) {
                Ok(statistics) => Some(statistics),
                Err(err) => {
                    warn!(match_id, error = %err, "Discarding malformed statistics");
                    None
                }
            },
        };

        debug!(match_id, has_statistics = statistics.is_some(), "Loaded match record");

        if let Some(stored_id) = stored.match_id.as_deref() {
            if stored_id != match_id {
                warn!(
                    match_id,
                    stored_id, "Record names a different match id; keeping the requested one"
                );
            }
        }

        Ok(MatchRecord {
            match_id: match_id.to_string(),
            roster: stored.roster,
            statistics,
        })
    }

    #[instrument(skip(self))]
    async fn list_matches(&self) -> Result<Vec<String>, StatsError> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|err| {
            StatsError::Repository(format!("failed to list {}: {err}", self.root.display()))
        })?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| StatsError::Repository(err.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
