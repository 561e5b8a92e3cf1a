//! Where batch tasks come from

use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use tracing::info;

use crate::error::{RankError, RankResult};
use crate::session::SearchTask;

/// A task plus the caller's reference for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTask {
    pub task: SearchTask,
    pub tracked_place_id: Option<String>,
}

impl From<SearchTask> for BatchTask {
    fn from(task: SearchTask) -> Self {
        Self {
            task,
            tracked_place_id: None,
        }
    }
}

pub trait TaskSource: Send + Sync {
    /// Load every task up front. Invalid records fail the whole load.
    fn load(&self) -> impl Future<Output = RankResult<Vec<BatchTask>>> + Send;
}

/// A JSON array of task records, e.g.
///
/// ```json
/// [{"keyword": "강남 맛집", "shop_name": "교촌치킨 강남점", "target_id": "1234567", "max_rank": 50}]
/// ```
///
/// `target_name` and `shop_name` are interchangeable. `max_rank` falls back
/// to the configured default.
pub struct JsonFileSource {
    path: PathBuf,
    default_max_rank: i32,
}

#[derive(Debug, Deserialize)]
struct TaskRecord {
    keyword: String,
    #[serde(default, alias = "shop_name")]
    target_name: String,
    #[serde(default, alias = "cid")]
    target_id: Option<Value>,
    #[serde(default)]
    max_rank: Option<i32>,
    #[serde(default)]
    tracked_place_id: Option<Value>,
}

fn id_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, default_max_rank: i32) -> Self {
        Self {
            path: path.into(),
            default_max_rank,
        }
    }

    /// Parse task records from a JSON string
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid record.
    pub fn parse(json: &str, default_max_rank: i32) -> RankResult<Vec<BatchTask>> {
        let records: Vec<TaskRecord> = serde_json::from_str(json)
            .map_err(|e| RankError::config(format!("task list is not a JSON array of tasks: {e}")))?;

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let task = SearchTask::new(
                    record.keyword,
                    record.target_name,
                    id_text(record.target_id),
                    record.max_rank.unwrap_or(default_max_rank),
                )
                .map_err(|e| RankError::config(format!("task #{index}: {e}")))?;
                Ok(BatchTask {
                    task,
                    tracked_place_id: id_text(record.tracked_place_id),
                })
            })
            .collect()
    }
}

impl TaskSource for JsonFileSource {
    async fn load(&self) -> RankResult<Vec<BatchTask>> {
        let json = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RankError::config(format!("cannot read tasks from {}: {e}", self.path.display()))
        })?;
        let tasks = Self::parse(&json, self.default_max_rank)?;
        info!("Loaded {} tasks from {}", tasks.len(), self.path.display());
        Ok(tasks)
    }
}
