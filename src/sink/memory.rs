//! In-process sink, mostly for tests and embedding

use parking_lot::Mutex;

use super::{ResultSink, TaskContext};
use crate::session::SearchOutcome;

#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(SearchOutcome, TaskContext)>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> Vec<(SearchOutcome, TaskContext)> {
        self.records.lock().clone()
    }

    #[must_use]
    pub fn outcomes(&self) -> Vec<SearchOutcome> {
        self.records.lock().iter().map(|(o, _)| o.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl ResultSink for MemorySink {
    async fn record(&self, outcome: &SearchOutcome, context: &TaskContext) -> bool {
        self.records.lock().push((outcome.clone(), context.clone()));
        true
    }
}
