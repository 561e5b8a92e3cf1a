//! Session phases and per-session bookkeeping

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::extract::ListingEntry;
use crate::gateway::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Init,
    Fetching,
    Extracting,
    Matching,
    Scrolling,
    Found,
    Blocked,
    Exhausted,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Found,
    Blocked,
    Exhausted,
}

impl From<TerminalState> for SessionPhase {
    fn from(terminal: TerminalState) -> Self {
        match terminal {
            TerminalState::Found => SessionPhase::Found,
            TerminalState::Blocked => SessionPhase::Blocked,
            TerminalState::Exhausted => SessionPhase::Exhausted,
        }
    }
}

/// Mutable state of one running session. Never shared.
#[derive(Debug)]
pub struct SessionState {
    pub current_route: Option<Route>,
    pub requests_issued: u32,
    /// Every entry loaded so far, in display order
    pub entries_seen: Vec<ListingEntry>,
    /// Non-sponsored entries among `entries_seen`
    pub ranked_so_far: u32,
    pub scroll_attempts: u32,
    pub started_at: Instant,
    pub phase: SessionPhase,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_route: None,
            requests_issued: 0,
            entries_seen: Vec::new(),
            ranked_so_far: 0,
            scroll_attempts: 0,
            started_at: Instant::now(),
            phase: SessionPhase::Init,
        }
    }

    /// Append newly loaded entries and refresh the ranked count
    pub fn absorb(&mut self, entries: Vec<ListingEntry>) {
        self.ranked_so_far += entries.iter().filter(|e| !e.is_sponsored).count() as u32;
        self.entries_seen.extend(entries);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
