//! Append-only JSON Lines file sink

use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::{ResultSink, SinkRecord, TaskContext};
use crate::error::{RankError, RankResult};
use crate::session::SearchOutcome;

pub struct JsonlSink {
    path: PathBuf,
    // one writer at a time so lines from concurrent workers never interleave
    write_lock: Mutex<()>,
}

impl JsonlSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, outcome: &SearchOutcome, context: &TaskContext) -> RankResult<()> {
        let mut line = serde_json::to_string(&SinkRecord { context, outcome })?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| RankError::Sink(format!("open {}: {e}", self.path.display())))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

impl ResultSink for JsonlSink {
    async fn record(&self, outcome: &SearchOutcome, context: &TaskContext) -> bool {
        match self.append(outcome, context).await {
            Ok(()) => {
                debug!("Recorded {} to {}", context.task_id, self.path.display());
                true
            }
            Err(e) => {
                error!("Failed to record outcome for '{}': {e}", outcome.keyword);
                false
            }
        }
    }
}
