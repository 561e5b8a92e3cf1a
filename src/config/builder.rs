//! Fluent builder for `RankConfig`
//!
//! Every setter is optional; `build()` validates the combination and compiles
//! the brand-alias patterns once so matching never compiles a regex.

use regex::{Regex, RegexBuilder};

use super::types::{FetcherKind, PaceThreshold, RankConfig, SelectorTable};
use crate::error::{RankError, RankResult};

/// Compile a brand-alias pattern, case-insensitive
///
/// # Errors
///
/// Returns a configuration error if the pattern is not a valid regex.
pub(crate) fn compile_alias_pattern(pattern: &str) -> RankResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| RankError::config(format!("Invalid brand alias pattern '{pattern}': {e}")))
}

#[derive(Debug, Clone, Default)]
pub struct RankConfigBuilder {
    config: RankConfig,
}

impl RankConfig {
    /// Create a builder for configuring a `RankConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> RankConfigBuilder {
        RankConfigBuilder::default()
    }
}

impl RankConfigBuilder {
    /// Start from an existing config, e.g. one deserialized from disk
    #[must_use]
    pub fn from_config(config: RankConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn fetcher(mut self, fetcher: FetcherKind) -> Self {
        self.config.fetcher = fetcher;
        self
    }

    #[must_use]
    pub fn search_url(mut self, template: impl Into<String>) -> Self {
        self.config.search_url = template.into();
        self
    }

    #[must_use]
    pub fn more_url(mut self, template: impl Into<String>) -> Self {
        self.config.more_url = template.into();
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    #[must_use]
    pub fn delay_range_secs(mut self, min: f64, max: f64) -> Self {
        self.config.delay_range_secs = (min, max);
        self
    }

    #[must_use]
    pub fn pace_thresholds(mut self, thresholds: Vec<PaceThreshold>) -> Self {
        self.config.pace_thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn failure_window(mut self, window: usize) -> Self {
        self.config.failure_window = window;
        self
    }

    #[must_use]
    pub fn max_rank(mut self, max_rank: i32) -> Self {
        self.config.max_rank = max_rank;
        self
    }

    #[must_use]
    pub fn daily_request_limit(mut self, limit: u32) -> Self {
        self.config.daily_request_limit = limit;
        self
    }

    #[must_use]
    pub fn proxy_list<I, S>(mut self, proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.proxy_list = proxies.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn use_proxy(mut self, use_proxy: bool) -> Self {
        self.config.use_proxy = use_proxy;
        self
    }

    #[must_use]
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    #[must_use]
    pub fn rate_limit_cooldown_secs(mut self, secs: u64) -> Self {
        self.config.rate_limit_cooldown_secs = secs;
        self
    }

    #[must_use]
    pub fn failed_cooldown_secs(mut self, secs: u64) -> Self {
        self.config.failed_cooldown_secs = secs;
        self
    }

    #[must_use]
    pub fn per_proxy_quota(mut self, quota: Option<u32>) -> Self {
        self.config.per_proxy_quota = quota;
        self
    }

    #[must_use]
    pub fn block_url_keywords(mut self, keywords: Vec<String>) -> Self {
        self.config.block_url_keywords = keywords;
        self
    }

    #[must_use]
    pub fn block_text_keywords(mut self, keywords: Vec<String>) -> Self {
        self.config.block_text_keywords = keywords;
        self
    }

    #[must_use]
    pub fn ad_markers(mut self, markers: Vec<String>) -> Self {
        self.config.ad_markers = markers;
        self
    }

    #[must_use]
    pub fn ad_keywords(mut self, keywords: Vec<String>) -> Self {
        self.config.ad_keywords = keywords;
        self
    }

    #[must_use]
    pub fn selectors(mut self, selectors: SelectorTable) -> Self {
        self.config.selectors = selectors;
        self
    }

    #[must_use]
    pub fn match_threshold(mut self, threshold: f64) -> Self {
        self.config.match_threshold = threshold;
        self
    }

    #[must_use]
    pub fn brand_aliases(mut self, aliases: Vec<String>) -> Self {
        self.config.brand_aliases = aliases;
        self
    }

    #[must_use]
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_scrolls(mut self, scrolls: u32) -> Self {
        self.config.max_scrolls = scrolls;
        self
    }

    #[must_use]
    pub fn max_transport_attempts(mut self, attempts: u32) -> Self {
        self.config.max_transport_attempts = attempts;
        self
    }

    #[must_use]
    pub fn extraction_retries(mut self, retries: u32) -> Self {
        self.config.extraction_retries = retries;
        self
    }

    #[must_use]
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.max_workers = workers;
        self
    }

    #[must_use]
    pub fn block_pause_secs(mut self, secs: u64) -> Self {
        self.config.block_pause_secs = secs;
        self
    }

    #[must_use]
    pub fn user_agents(mut self, agents: Vec<String>) -> Self {
        self.config.user_agents = agents;
        self
    }

    /// Validate and finish the config
    ///
    /// # Errors
    ///
    /// Returns `RankError::Configuration` for inconsistent settings: inverted
    /// or negative delay bounds, a threshold outside `(0, 1]`, proxy mode with
    /// no proxies, empty selector or user-agent tables, URL templates without
    /// a `{query}` placeholder, or zero limits.
    pub fn build(self) -> RankResult<RankConfig> {
        let mut config = self.config;

        let (min, max) = config.delay_range_secs;
        if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
            return Err(RankError::config(format!(
                "delay_range_secs must satisfy 0 <= min <= max, got ({min}, {max})"
            )));
        }
        if !(config.match_threshold > 0.0 && config.match_threshold <= 1.0) {
            return Err(RankError::config(format!(
                "match_threshold must be in (0, 1], got {}",
                config.match_threshold
            )));
        }
        if config.use_proxy && config.proxy_list.is_empty() {
            return Err(RankError::config("use_proxy is set but proxy_list is empty"));
        }
        for (name, template) in [("search_url", &config.search_url), ("more_url", &config.more_url)] {
            if !template.contains("{query}") {
                return Err(RankError::config(format!(
                    "{name} must contain a {{query}} placeholder"
                )));
            }
        }
        if config.selectors.item_selectors.is_empty() || config.selectors.name_selectors.is_empty() {
            return Err(RankError::config("item and name selector tables must not be empty"));
        }
        if config.user_agents.is_empty() {
            return Err(RankError::config("user_agents must not be empty"));
        }
        if config.daily_request_limit == 0 {
            return Err(RankError::config("daily_request_limit must be positive"));
        }
        if config.failure_threshold == 0 {
            return Err(RankError::config("failure_threshold must be positive"));
        }
        if config.max_transport_attempts == 0 {
            return Err(RankError::config("max_transport_attempts must be positive"));
        }
        if config.fetch_timeout_secs == 0 {
            return Err(RankError::config("fetch_timeout_secs must be positive"));
        }
        if config.page_size == 0 {
            return Err(RankError::config("page_size must be positive"));
        }
        if config.pace_thresholds.iter().any(|t| !(t.factor >= 1.0)) {
            return Err(RankError::config("pace threshold factors must be >= 1.0"));
        }

        config.brand_aliases_compiled = config
            .brand_aliases
            .iter()
            .map(|p| compile_alias_pattern(p))
            .collect::<RankResult<Vec<_>>>()?;

        Ok(config)
    }
}
