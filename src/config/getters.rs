//! Getter methods for `RankConfig`

use regex::Regex;
use std::time::Duration;

use super::types::{FetcherKind, PaceThreshold, RankConfig, SelectorTable};

impl RankConfig {
    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn fetcher(&self) -> FetcherKind {
        self.fetcher
    }

    #[must_use]
    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    #[must_use]
    pub fn more_url(&self) -> &str {
        &self.more_url
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn delay_range_secs(&self) -> (f64, f64) {
        self.delay_range_secs
    }

    #[must_use]
    pub fn pace_thresholds(&self) -> &[PaceThreshold] {
        &self.pace_thresholds
    }

    #[must_use]
    pub fn failure_window(&self) -> usize {
        self.failure_window
    }

    #[must_use]
    pub fn max_rank(&self) -> i32 {
        self.max_rank
    }

    #[must_use]
    pub fn daily_request_limit(&self) -> u32 {
        self.daily_request_limit
    }

    #[must_use]
    pub fn proxy_list(&self) -> &[String] {
        &self.proxy_list
    }

    #[must_use]
    pub fn use_proxy(&self) -> bool {
        self.use_proxy
    }

    #[must_use]
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    #[must_use]
    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    #[must_use]
    pub fn failed_cooldown(&self) -> Duration {
        Duration::from_secs(self.failed_cooldown_secs)
    }

    #[must_use]
    pub fn per_proxy_quota(&self) -> Option<u32> {
        self.per_proxy_quota
    }

    #[must_use]
    pub fn block_url_keywords(&self) -> &[String] {
        &self.block_url_keywords
    }

    #[must_use]
    pub fn block_text_keywords(&self) -> &[String] {
        &self.block_text_keywords
    }

    #[must_use]
    pub fn ad_markers(&self) -> &[String] {
        &self.ad_markers
    }

    #[must_use]
    pub fn ad_keywords(&self) -> &[String] {
        &self.ad_keywords
    }

    #[must_use]
    pub fn selectors(&self) -> &SelectorTable {
        &self.selectors
    }

    #[must_use]
    pub fn match_threshold(&self) -> f64 {
        self.match_threshold
    }

    #[must_use]
    pub fn brand_aliases(&self) -> &[String] {
        &self.brand_aliases
    }

    /// Compiled alias patterns; empty unless the config went through `build()`
    #[must_use]
    pub fn brand_aliases_compiled(&self) -> &[Regex] {
        &self.brand_aliases_compiled
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub fn fetch_timeout_secs(&self) -> u64 {
        self.fetch_timeout_secs
    }

    #[must_use]
    pub fn max_scrolls(&self) -> u32 {
        self.max_scrolls
    }

    #[must_use]
    pub fn max_transport_attempts(&self) -> u32 {
        self.max_transport_attempts
    }

    #[must_use]
    pub fn extraction_retries(&self) -> u32 {
        self.extraction_retries
    }

    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    #[must_use]
    pub fn block_pause(&self) -> Duration {
        Duration::from_secs(self.block_pause_secs)
    }

    #[must_use]
    pub fn user_agents(&self) -> &[String] {
        &self.user_agents
    }
}
