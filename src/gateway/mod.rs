//! Request gateway: the only path by which a session reaches the network
//!
//! Composes the shared `ProxyPool`, a per-worker `PacingGovernor`, the
//! `CaptchaDetector` and the hard fetch timeout.

pub mod captcha;
pub mod pacing;
pub mod proxy_pool;
pub mod timeout;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub use captcha::CaptchaDetector;
pub use pacing::{PacingGovernor, QuotaDecision};
pub use proxy_pool::{PoolSettings, PoolStats, ProxyEndpoint, ProxyPool, ProxyStatus};
pub use timeout::with_fetch_timeout;

use crate::error::{RankError, RankResult};
use crate::fetch::{FetchError, FetchedPage, PageFetcher};

/// Egress route for one request
#[derive(Debug, Clone)]
pub enum Route {
    Direct,
    Proxy(ProxyEndpoint),
}

impl Route {
    #[must_use]
    pub fn endpoint(&self) -> Option<&ProxyEndpoint> {
        match self {
            Route::Direct => None,
            Route::Proxy(endpoint) => Some(endpoint),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Route::Direct => "direct".to_string(),
            Route::Proxy(endpoint) => endpoint.server_url(),
        }
    }
}

/// How a successfully transported page should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    Ok,
    Blocked,
    RateLimited,
    HttpError(u16),
}

pub struct RequestGateway {
    pool: Arc<ProxyPool>,
    pacing: PacingGovernor,
    detector: CaptchaDetector,
    use_proxy: bool,
    fetch_timeout_secs: u64,
    /// Endpoint that carried the most recent request, owner of today's count
    last_endpoint: Mutex<Option<ProxyEndpoint>>,
}

impl RequestGateway {
    #[must_use]
    pub fn new(
        pool: Arc<ProxyPool>,
        pacing: PacingGovernor,
        detector: CaptchaDetector,
        use_proxy: bool,
        fetch_timeout_secs: u64,
    ) -> Self {
        Self {
            pool,
            pacing,
            detector,
            use_proxy,
            fetch_timeout_secs,
            last_endpoint: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &ProxyPool {
        &self.pool
    }

    #[must_use]
    pub fn pacing(&self) -> &PacingGovernor {
        &self.pacing
    }

    #[must_use]
    pub fn uses_proxy(&self) -> bool {
        self.use_proxy
    }

    /// Pick a route. `None` means proxying is required and nothing is viable.
    #[must_use]
    pub fn route(&self) -> Option<Route> {
        if !self.use_proxy {
            return Some(Route::Direct);
        }
        self.pool.acquire().map(Route::Proxy)
    }

    /// Quota gate before each request.
    ///
    /// Direct mode has a single identity, so a spent budget is final. Through
    /// proxies the budget belongs to the endpoint that spent it: the session's
    /// current route, or else whichever endpoint this gateway used last.
    pub fn check_quota(&self, current: Option<&Route>) -> QuotaDecision {
        let owner = self.budget_owner(current);
        self.pacing.check_quota(&self.pool, owner.as_ref())
    }

    /// Non-rotating form of `check_quota` for callers that only need to know
    /// whether any request can still go out today
    pub fn ensure_quota(&self) -> RankResult<()> {
        if self.pacing.quota_remaining() > 0 {
            return Ok(());
        }
        let owner = self.budget_owner(None);
        if owner.is_some() && self.pool.has_active_besides(owner.as_ref()) {
            return Ok(());
        }
        Err(self.quota_error())
    }

    #[must_use]
    pub fn quota_error(&self) -> RankError {
        RankError::QuotaExhausted {
            used: self.pacing.requests_today(),
            limit: self.pacing.daily_limit(),
        }
    }

    fn budget_owner(&self, current: Option<&Route>) -> Option<ProxyEndpoint> {
        if !self.use_proxy {
            return None;
        }
        current
            .and_then(Route::endpoint)
            .cloned()
            .or_else(|| self.last_endpoint.lock().clone())
    }

    fn note_request(&self, route: &Route) {
        self.pacing.record_request();
        if let Some(endpoint) = route.endpoint() {
            *self.last_endpoint.lock() = Some(endpoint.clone());
        }
    }

    /// Sleep for the adaptive delay, scaled by `factor`
    pub async fn pace(&self, factor: f64) -> Duration {
        self.pacing.delay_scaled(factor).await
    }

    pub async fn open<F: PageFetcher>(
        &self,
        fetcher: &F,
        query: &str,
        route: &Route,
    ) -> Result<(FetchedPage, F::Cursor), FetchError> {
        self.note_request(route);
        with_fetch_timeout(
            fetcher.open(query, route.endpoint()),
            self.fetch_timeout_secs,
            "page open",
        )
        .await
    }

    pub async fn more<F: PageFetcher>(
        &self,
        fetcher: &F,
        cursor: &mut F::Cursor,
        route: &Route,
    ) -> Result<FetchedPage, FetchError> {
        self.note_request(route);
        with_fetch_timeout(
            fetcher.more(cursor, route.endpoint()),
            self.fetch_timeout_secs,
            "load more",
        )
        .await
    }

    #[must_use]
    pub fn classify(&self, page: &FetchedPage) -> PageVerdict {
        if page.status == 429 {
            return PageVerdict::RateLimited;
        }
        if page.status >= 400 {
            return PageVerdict::HttpError(page.status);
        }
        if self.detector.is_blocked(&page.final_url, &page.body) {
            return PageVerdict::Blocked;
        }
        PageVerdict::Ok
    }

    pub fn report_success(&self, route: &Route) {
        self.pacing.record_outcome(true);
        if let Some(endpoint) = route.endpoint() {
            self.pool.report_outcome(endpoint, true, Some(200));
        }
    }

    pub fn report_failure(&self, route: &Route, http_status: Option<u16>) {
        self.pacing.record_outcome(false);
        if let Some(endpoint) = route.endpoint() {
            self.pool.report_outcome(endpoint, false, http_status);
        }
    }

    /// A challenge page counts as a rate limit against the route
    pub fn report_blocked(&self, route: &Route) {
        warn!("Anti-bot challenge on route {}", route.label());
        self.report_failure(route, Some(429));
    }

    /// Route-level report for a page that came back with a verdict
    pub fn report(&self, route: &Route, verdict: PageVerdict) {
        match verdict {
            PageVerdict::Ok => self.report_success(route),
            PageVerdict::Blocked => self.report_blocked(route),
            PageVerdict::RateLimited => self.report_failure(route, Some(429)),
            PageVerdict::HttpError(status) => self.report_failure(route, Some(status)),
        }
    }
}
