//! `RankSession`: one keyword search from first request to outcome
//!
//! The loop is strictly sequential. Display order is what ranks are built
//! from, so no two loads of the same query are ever in flight together.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::outcome::SearchOutcome;
use super::state::{SessionPhase, SessionState};
use super::task::SearchTask;
use crate::config::RankConfig;
use crate::error::RankError;
use crate::extract::{ListingEntry, ResultExtractor, assign_ranks};
use crate::fetch::{FetchedPage, PageFetcher};
use crate::gateway::{PageVerdict, QuotaDecision, RequestGateway};
use crate::matcher::{MatchTarget, Matcher};
use crate::utils::SCROLL_DELAY_FACTOR;

/// Loop bounds for one session
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_scrolls: u32,
    pub max_transport_attempts: u32,
    pub extraction_retries: u32,
}

impl SessionLimits {
    #[must_use]
    pub fn from_config(config: &RankConfig) -> Self {
        Self {
            max_scrolls: config.max_scrolls(),
            max_transport_attempts: config.max_transport_attempts().max(1),
            extraction_retries: config.extraction_retries(),
        }
    }
}

/// Result of one pass through FETCHING
enum Fetch {
    Page(FetchedPage),
    /// Route failed; try again on another one
    Retry,
    Terminal(SearchOutcome),
}

pub struct RankSession<'a, F: PageFetcher> {
    gateway: &'a RequestGateway,
    extractor: &'a ResultExtractor,
    matcher: &'a Matcher,
    fetcher: &'a F,
    limits: SessionLimits,
}

impl<'a, F: PageFetcher> RankSession<'a, F> {
    #[must_use]
    pub fn new(
        gateway: &'a RequestGateway,
        extractor: &'a ResultExtractor,
        matcher: &'a Matcher,
        fetcher: &'a F,
        limits: SessionLimits,
    ) -> Self {
        Self {
            gateway,
            extractor,
            matcher,
            fetcher,
            limits,
        }
    }

    /// Run `task` to a terminal state. Always yields exactly one outcome.
    pub async fn run(&self, task: &SearchTask, cancel: &CancellationToken) -> SearchOutcome {
        info!(
            keyword = task.keyword(),
            target = task.target_name(),
            max_rank = task.max_rank(),
            "rank session started"
        );

        let mut state = SessionState::new();
        let mut cursor: Option<F::Cursor> = None;
        let outcome = self.drive(task, &mut state, &mut cursor, cancel).await;
        state.phase = outcome.terminal.into();
        if let Some(cursor) = cursor.take() {
            self.fetcher.close(cursor).await;
        }

        info!(
            keyword = task.keyword(),
            phase = ?state.phase,
            rank = ?outcome.rank,
            scanned = outcome.total_entries_scanned,
            requests = state.requests_issued,
            "{}",
            outcome.message
        );
        outcome
    }

    async fn drive(
        &self,
        task: &SearchTask,
        state: &mut SessionState,
        cursor: &mut Option<F::Cursor>,
        cancel: &CancellationToken,
    ) -> SearchOutcome {
        let max_rank = match u32::try_from(task.max_rank()) {
            Ok(n) if n > 0 => n,
            _ => {
                return SearchOutcome::exhausted(
                    task,
                    state,
                    format!("max_rank {} leaves nothing to search", task.max_rank()),
                );
            }
        };

        let target = task.target();
        let mut transport_failures = 0u32;
        let mut reloads_left = self.limits.extraction_retries;

        loop {
            let page = match self.fetch(task, state, cursor, cancel, &mut transport_failures).await {
                Fetch::Page(page) => page,
                Fetch::Retry => continue,
                Fetch::Terminal(outcome) => return outcome,
            };

            state.phase = SessionPhase::Extracting;
            let extraction = self.extractor.extract(&page.body);
            let first_load = state.entries_seen.is_empty();

            if extraction.is_empty() {
                if first_load && reloads_left > 0 {
                    reloads_left -= 1;
                    warn!("No listings extracted for '{}', reloading", task.keyword());
                    if let Some(stale) = cursor.take() {
                        self.fetcher.close(stale).await;
                    }
                    continue;
                }
                let message = if first_load {
                    RankError::ExtractionEmpty.to_string()
                } else {
                    format!(
                        "no further listings loaded after {} scrolls; '{}' not in top {}",
                        state.scroll_attempts,
                        display_target(&target),
                        state.ranked_so_far
                    )
                };
                return SearchOutcome::exhausted(task, state, message);
            }

            let fresh = self.fresh_entries(state, &page, extraction.entries);
            if fresh.is_empty() {
                let message = format!(
                    "nothing new after {} scrolls; '{}' not in top {}",
                    state.scroll_attempts,
                    display_target(&target),
                    state.ranked_so_far
                );
                return SearchOutcome::exhausted(task, state, message);
            }

            state.phase = SessionPhase::Matching;
            let hit = self.first_match(&target, &fresh, max_rank);
            state.absorb(fresh);
            if let Some((entry, rank)) = hit {
                return SearchOutcome::found(task, state, entry, rank);
            }

            if state.ranked_so_far >= max_rank {
                return SearchOutcome::exhausted(
                    task,
                    state,
                    format!("'{}' not in top {max_rank}", display_target(&target)),
                );
            }
            if state.scroll_attempts >= self.limits.max_scrolls {
                let message = format!(
                    "scroll budget of {} spent; '{}' not in top {}",
                    self.limits.max_scrolls,
                    display_target(&target),
                    state.ranked_so_far
                );
                return SearchOutcome::exhausted(task, state, message);
            }

            state.scroll_attempts += 1;
            state.phase = SessionPhase::Scrolling;
            debug!(
                "scroll {} for '{}' ({} ranked so far)",
                state.scroll_attempts,
                task.keyword(),
                state.ranked_so_far
            );
        }
    }

    /// FETCHING: cancellation, quota, route, pacing, then one load
    async fn fetch(
        &self,
        task: &SearchTask,
        state: &mut SessionState,
        cursor: &mut Option<F::Cursor>,
        cancel: &CancellationToken,
        transport_failures: &mut u32,
    ) -> Fetch {
        state.phase = SessionPhase::Fetching;

        if cancel.is_cancelled() {
            return Fetch::Terminal(SearchOutcome::exhausted(
                task,
                state,
                "cancelled before the next load".to_string(),
            ));
        }

        match self.gateway.check_quota(state.current_route.as_ref()) {
            QuotaDecision::Proceed => {}
            QuotaDecision::Rotate => state.current_route = None,
            QuotaDecision::Exhausted => {
                return Fetch::Terminal(SearchOutcome::exhausted(
                    task,
                    state,
                    self.gateway.quota_error().to_string(),
                ));
            }
        }

        let route = match state.current_route.clone().or_else(|| self.gateway.route()) {
            Some(route) => route,
            None => {
                return Fetch::Terminal(SearchOutcome::exhausted(
                    task,
                    state,
                    "no_route: no active proxy endpoint available".to_string(),
                ));
            }
        };
        state.current_route = Some(route.clone());

        let factor = if cursor.is_some() { SCROLL_DELAY_FACTOR } else { 1.0 };
        self.gateway.pace(factor).await;

        state.requests_issued += 1;
        let result = if let Some(open) = cursor.as_mut() {
            self.gateway.more(self.fetcher, open, &route).await
        } else {
            match self.gateway.open(self.fetcher, task.keyword(), &route).await {
                Ok((page, opened)) => {
                    *cursor = Some(opened);
                    Ok(page)
                }
                Err(e) => Err(e),
            }
        };

        let failure = match result {
            Ok(page) => match self.gateway.classify(&page) {
                PageVerdict::Ok => {
                    self.gateway.report_success(&route);
                    *transport_failures = 0;
                    return Fetch::Page(page);
                }
                PageVerdict::Blocked => {
                    self.gateway.report_blocked(&route);
                    state.current_route = None;
                    let blocked = RankError::Blocked {
                        url: page.final_url,
                    };
                    return Fetch::Terminal(SearchOutcome::blocked(
                        task,
                        state,
                        format!("{blocked} (route {})", route.label()),
                    ));
                }
                verdict => {
                    self.gateway.report(&route, verdict);
                    format!("HTTP {} from {}", page.status, page.final_url)
                }
            },
            Err(e) => {
                self.gateway.report_failure(&route, e.http_status());
                let err = RankError::from(e);
                if !err.is_transient() {
                    return Fetch::Terminal(SearchOutcome::exhausted(task, state, err.to_string()));
                }
                err.to_string()
            }
        };

        *transport_failures += 1;
        warn!(
            "Attempt {}/{} on route {} failed: {failure}",
            transport_failures,
            self.limits.max_transport_attempts,
            route.label()
        );
        state.current_route = None;

        if *transport_failures >= self.limits.max_transport_attempts {
            return Fetch::Terminal(SearchOutcome::exhausted(
                task,
                state,
                format!(
                    "transport failures exhausted after {} attempts: {failure}",
                    transport_failures
                ),
            ));
        }
        Fetch::Retry
    }

    /// Entries not seen before, ranked in display order.
    ///
    /// A cumulative page repeats everything loaded so far, so the boundary is
    /// the seen count. A paged slice is all new and continues the numbering.
    fn fresh_entries(
        &self,
        state: &SessionState,
        page: &FetchedPage,
        entries: Vec<ListingEntry>,
    ) -> Vec<ListingEntry> {
        if page.cumulative {
            entries.into_iter().skip(state.entries_seen.len()).collect()
        } else {
            let mut entries = entries;
            assign_ranks(&mut entries, state.ranked_so_far);
            entries
        }
    }

    fn first_match(
        &self,
        target: &MatchTarget,
        entries: &[ListingEntry],
        max_rank: u32,
    ) -> Option<(ListingEntry, u32)> {
        entries.iter().find_map(|entry| {
            let rank = entry.rank.filter(|_| !entry.is_sponsored)?;
            if rank > max_rank {
                return None;
            }
            self.matcher
                .is_match(target, entry)
                .then(|| (entry.clone(), rank))
        })
    }
}

fn display_target(target: &MatchTarget) -> &str {
    if target.name.is_empty() {
        target.id.as_deref().unwrap_or_default()
    } else {
        &target.name
    }
}
