//! Adaptive request pacing and daily quotas
//!
//! The delay before each request is a uniform draw from the configured range,
//! multiplied by the highest request-count threshold crossed today and by a
//! penalty when the trailing failure rate is high.

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::proxy_pool::{ProxyEndpoint, ProxyPool};
use crate::config::{PaceThreshold, RankConfig};
use crate::utils::constants::{
    FAILURE_RATE_PENALTY, FAILURE_RATE_PENALTY_THRESHOLD, MIN_FAILURE_SAMPLES,
};

/// What to do once the daily counter is consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Budget left on the current identity
    Proceed,
    /// Budget spent here, but another endpoint can take over
    Rotate,
    /// Nothing left today
    Exhausted,
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug)]
struct PacingState {
    requests_today: u32,
    day: NaiveDate,
    recent: VecDeque<bool>,
}

pub struct PacingGovernor {
    delay_range: (f64, f64),
    thresholds: Vec<PaceThreshold>,
    daily_limit: u32,
    window: usize,
    state: Mutex<PacingState>,
    clock: Clock,
}

impl PacingGovernor {
    #[must_use]
    pub fn new(
        delay_range: (f64, f64),
        thresholds: Vec<PaceThreshold>,
        daily_limit: u32,
        window: usize,
    ) -> Self {
        Self::with_clock(delay_range, thresholds, daily_limit, window, Arc::new(|| {
            Local::now().date_naive()
        }))
    }

    /// Governor with an injected calendar, so day rollover can be tested
    #[must_use]
    pub fn with_clock(
        delay_range: (f64, f64),
        mut thresholds: Vec<PaceThreshold>,
        daily_limit: u32,
        window: usize,
        clock: Clock,
    ) -> Self {
        thresholds.sort_by_key(|t| t.after_requests);
        let day = clock();
        Self {
            delay_range,
            thresholds,
            daily_limit,
            window: window.max(1),
            state: Mutex::new(PacingState {
                requests_today: 0,
                day,
                recent: VecDeque::new(),
            }),
            clock,
        }
    }

    #[must_use]
    pub fn from_config(config: &RankConfig) -> Self {
        Self::new(
            config.delay_range_secs(),
            config.pace_thresholds().to_vec(),
            config.daily_request_limit(),
            config.failure_window(),
        )
    }

    /// Reset the counter if the calendar day changed. Returns true on rollover.
    fn roll_day(&self, state: &mut PacingState) -> bool {
        let today = (self.clock)();
        if today != state.day {
            info!(
                "Date changed ({} -> {}), resetting request counter ({} used)",
                state.day, today, state.requests_today
            );
            state.day = today;
            state.requests_today = 0;
            return true;
        }
        false
    }

    /// Combined multiplier from request volume and recent failures
    #[must_use]
    pub fn delay_factor(&self) -> f64 {
        let mut state = self.state.lock();
        self.roll_day(&mut state);

        // highest threshold crossed wins
        let mut factor = self
            .thresholds
            .iter()
            .rev()
            .find(|t| state.requests_today > t.after_requests)
            .map_or(1.0, |t| t.factor);

        if state.recent.len() >= MIN_FAILURE_SAMPLES {
            let failures = state.recent.iter().filter(|ok| !**ok).count();
            let rate = failures as f64 / state.recent.len() as f64;
            if rate > FAILURE_RATE_PENALTY_THRESHOLD {
                factor *= FAILURE_RATE_PENALTY;
            }
        }
        factor
    }

    /// Current `(min, max)` delay bounds after scaling, in seconds
    #[must_use]
    pub fn current_delay_bounds(&self) -> (f64, f64) {
        let factor = self.delay_factor();
        (self.delay_range.0 * factor, self.delay_range.1 * factor)
    }

    /// Draw the next delay without sleeping. `extra` scales the draw further.
    #[must_use]
    pub fn next_delay(&self, extra: f64) -> Duration {
        let (min, max) = self.current_delay_bounds();
        let (min, max) = (min * extra, max * extra);
        let secs = if max > min {
            rand::rng().random_range(min..=max)
        } else {
            min
        };
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Sleep for a freshly drawn delay and return how long that was
    pub async fn delay(&self) -> Duration {
        self.delay_scaled(1.0).await
    }

    /// Sleep for a delay scaled by `extra` (scroll pauses use a fraction)
    pub async fn delay_scaled(&self, extra: f64) -> Duration {
        let wait = self.next_delay(extra);
        debug!("Pacing delay {:.2}s", wait.as_secs_f64());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        wait
    }

    /// Count one issued request against today's budget
    pub fn record_request(&self) {
        let mut state = self.state.lock();
        self.roll_day(&mut state);
        state.requests_today = state.requests_today.saturating_add(1);
    }

    /// Feed the trailing failure-rate window
    pub fn record_outcome(&self, success: bool) {
        let mut state = self.state.lock();
        state.recent.push_back(success);
        while state.recent.len() > self.window {
            state.recent.pop_front();
        }
    }

    #[must_use]
    pub fn quota_remaining(&self) -> u32 {
        let mut state = self.state.lock();
        self.roll_day(&mut state);
        self.daily_limit.saturating_sub(state.requests_today)
    }

    #[must_use]
    pub fn requests_today(&self) -> u32 {
        let mut state = self.state.lock();
        self.roll_day(&mut state);
        state.requests_today
    }

    #[must_use]
    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Start a fresh daily budget
    pub fn daily_reset(&self) {
        let mut state = self.state.lock();
        state.requests_today = 0;
        state.day = (self.clock)();
    }

    /// Decide whether the next request may go out.
    ///
    /// When today's budget is spent by `current` and the pool still has
    /// another Active endpoint, `current` is marked as spent and the counter
    /// restarts for the new identity. Without a concrete endpoint to retire
    /// the budget is final. A calendar rollover also restarts per-proxy
    /// quotas.
    pub fn check_quota(&self, pool: &ProxyPool, current: Option<&ProxyEndpoint>) -> QuotaDecision {
        let rolled = {
            let mut state = self.state.lock();
            self.roll_day(&mut state)
        };
        if rolled {
            pool.reset_quotas();
        }

        if self.quota_remaining() > 0 {
            return QuotaDecision::Proceed;
        }

        if let Some(endpoint) = current
            && pool.has_active_besides(Some(endpoint))
        {
            pool.exhaust_quota(endpoint);
            info!(
                "Daily limit {} reached, rotating to another proxy",
                self.daily_limit
            );
            self.daily_reset();
            return QuotaDecision::Rotate;
        }

        QuotaDecision::Exhausted
    }
}
