//! Where finished outcomes go
//!
//! The core only needs `ResultSink::record`. Two small implementations ship
//! with the crate: an append-only JSON Lines file and an in-memory list.

pub mod jsonl;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use uuid::Uuid;

use crate::session::SearchOutcome;

pub use jsonl::JsonlSink;
pub use memory::MemorySink;

/// Bookkeeping that travels with an outcome but is not part of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    pub task_id: Uuid,
    /// Caller's own id for the tracked place, if it keeps one
    pub tracked_place_id: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl TaskContext {
    #[must_use]
    pub fn new(tracked_place_id: Option<String>) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            tracked_place_id,
            attempted_at: Utc::now(),
        }
    }
}

/// Persist one outcome.
///
/// Implementations never panic and never propagate: a failed write is logged
/// and reported as `false`.
pub trait ResultSink: Send + Sync {
    fn record(
        &self,
        outcome: &SearchOutcome,
        context: &TaskContext,
    ) -> impl Future<Output = bool> + Send;
}

/// Flattened row written by file-backed sinks
#[derive(Serialize)]
pub(crate) struct SinkRecord<'a> {
    #[serde(flatten)]
    pub context: &'a TaskContext,
    #[serde(flatten)]
    pub outcome: &'a SearchOutcome,
}
