//! Rank sessions
//!
//! A session takes one `SearchTask` through
//! Init → Fetching → Extracting → Matching → {Found | Scrolling | Blocked | Exhausted}
//! and emits exactly one `SearchOutcome`.

pub mod outcome;
pub mod runner;
pub mod state;
pub mod task;

pub use outcome::SearchOutcome;
pub use runner::{RankSession, SessionLimits};
pub use state::{SessionPhase, SessionState, TerminalState};
pub use task::SearchTask;
