//! Canonical rank tracker for local place search
//!
//! Given a keyword and a target place, a `RankSession` loads result pages
//! through a `RequestGateway` (proxy rotation, adaptive pacing, challenge
//! detection), extracts the listings in display order, and reports the
//! target's organic rank as a single `SearchOutcome`.

pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod gateway;
pub mod keyword_profile;
pub mod matcher;
pub mod session;
pub mod sink;
pub mod utils;

pub use batch::{BatchReport, BatchTask, JsonFileSource, TaskSource, run_batch};
pub use config::{FetcherKind, RankConfig, RankConfigBuilder};
pub use context::RankContext;
pub use error::{RankError, RankResult};
pub use extract::{ListingEntry, ResultExtractor};
pub use fetch::{BrowserFetcher, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use gateway::{
    CaptchaDetector, PacingGovernor, PageVerdict, ProxyEndpoint, ProxyPool, ProxyStatus,
    RequestGateway, Route,
};
pub use keyword_profile::KeywordProfile;
pub use matcher::{MatchKind, MatchTarget, Matcher};
pub use session::{RankSession, SearchOutcome, SearchTask, TerminalState};
pub use sink::{JsonlSink, MemorySink, ResultSink, TaskContext};
