//! The single record a session produces

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{SessionState, TerminalState};
use super::task::SearchTask;
use crate::extract::ListingEntry;
use crate::keyword_profile::KeywordProfile;
use crate::utils::TOP_ENTRIES_KEPT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub keyword: String,
    pub target_name: String,
    pub target_id: Option<String>,
    /// Present exactly when `success` is true
    pub rank: Option<u32>,
    pub success: bool,
    pub matched_entry: Option<ListingEntry>,
    pub total_entries_scanned: usize,
    pub blocked: bool,
    pub elapsed_ms: u64,
    pub message: String,
    pub terminal: TerminalState,
    /// First display names seen, for diagnosing near misses
    pub top_entries: Vec<String>,
    pub profile: KeywordProfile,
    pub checked_at: DateTime<Utc>,
}

impl SearchOutcome {
    pub(crate) fn found(
        task: &SearchTask,
        state: &SessionState,
        entry: ListingEntry,
        rank: u32,
    ) -> Self {
        let message = format!(
            "'{}' found at rank {rank} for '{}'",
            entry.display_name,
            task.keyword()
        );
        let mut outcome = Self::base(task, state, TerminalState::Found, message);
        outcome.rank = Some(rank);
        outcome.success = true;
        outcome.matched_entry = Some(entry);
        outcome
    }

    pub(crate) fn blocked(task: &SearchTask, state: &SessionState, message: String) -> Self {
        let mut outcome = Self::base(task, state, TerminalState::Blocked, message);
        outcome.blocked = true;
        outcome
    }

    pub(crate) fn exhausted(task: &SearchTask, state: &SessionState, message: String) -> Self {
        Self::base(task, state, TerminalState::Exhausted, message)
    }

    fn base(
        task: &SearchTask,
        state: &SessionState,
        terminal: TerminalState,
        message: String,
    ) -> Self {
        Self {
            keyword: task.keyword().to_string(),
            target_name: task.target_name().to_string(),
            target_id: task.target_id().map(str::to_string),
            rank: None,
            success: false,
            matched_entry: None,
            total_entries_scanned: state.entries_seen.len(),
            blocked: false,
            elapsed_ms: u64::try_from(state.started_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            message,
            terminal,
            top_entries: state
                .entries_seen
                .iter()
                .take(TOP_ENTRIES_KEPT)
                .map(|e| e.display_name.clone())
                .collect(),
            profile: KeywordProfile::from_keyword(task.keyword()),
            checked_at: Utc::now(),
        }
    }
}
