//! Process-wide context, built once and passed by reference

use std::sync::Arc;

use crate::config::RankConfig;
use crate::error::RankResult;
use crate::extract::ResultExtractor;
use crate::fetch::PageFetcher;
use crate::gateway::{CaptchaDetector, PacingGovernor, ProxyPool, RequestGateway};
use crate::matcher::Matcher;
use crate::session::{RankSession, SessionLimits};

/// Everything sessions share: validated config, the proxy pool, and the
/// compiled extraction and matching tables
pub struct RankContext {
    config: Arc<RankConfig>,
    pool: Arc<ProxyPool>,
    extractor: ResultExtractor,
    matcher: Matcher,
    detector: CaptchaDetector,
}

impl RankContext {
    /// # Errors
    ///
    /// Returns a configuration error for unparseable proxies, selectors or
    /// alias patterns. Nothing touches the network here.
    pub fn new(config: RankConfig) -> RankResult<Self> {
        let pool = ProxyPool::from_config(&config)?;
        Ok(Self {
            extractor: ResultExtractor::from_config(&config)?,
            matcher: Matcher::from_config(&config)?,
            detector: CaptchaDetector::from_config(&config),
            pool: Arc::new(pool),
            config: Arc::new(config),
        })
    }

    #[must_use]
    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    #[must_use]
    pub fn extractor(&self) -> &ResultExtractor {
        &self.extractor
    }

    #[must_use]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// A gateway with its own pacing state, for one worker
    #[must_use]
    pub fn gateway(&self) -> RequestGateway {
        RequestGateway::new(
            Arc::clone(&self.pool),
            PacingGovernor::from_config(&self.config),
            self.detector.clone(),
            self.config.use_proxy(),
            self.config.fetch_timeout_secs(),
        )
    }

    #[must_use]
    pub fn session<'a, F: PageFetcher>(
        &'a self,
        gateway: &'a RequestGateway,
        fetcher: &'a F,
    ) -> RankSession<'a, F> {
        RankSession::new(
            gateway,
            &self.extractor,
            &self.matcher,
            fetcher,
            SessionLimits::from_config(&self.config),
        )
    }
}
