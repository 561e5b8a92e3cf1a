//! End-to-end session behaviour over a scripted transport

use placerank::{
    FetchError, ProxyStatus, RankContext, SearchOutcome, SearchTask, TerminalState,
};
use tokio_util::sync::CancellationToken;

mod common;
use common::{Call, ScriptedFetcher, captcha_html, fast_config, listing_html, page, state_html};

const PROXIES: [&str; 3] = [
    "http://10.0.0.1:8080",
    "http://10.0.0.2:8080",
    "http://10.0.0.3:8080",
];

fn context(builder: placerank::RankConfigBuilder) -> RankContext {
    RankContext::new(builder.build().unwrap()).unwrap()
}

async fn run(ctx: &RankContext, fetcher: &ScriptedFetcher, task: &SearchTask) -> SearchOutcome {
    let gateway = ctx.gateway();
    let outcome = ctx
        .session(&gateway, fetcher)
        .run(task, &CancellationToken::new())
        .await;
    assert_outcome_consistent(&outcome);
    outcome
}

fn assert_outcome_consistent(outcome: &SearchOutcome) {
    assert!(!outcome.message.is_empty());
    if outcome.success {
        assert!(outcome.rank.is_some_and(|r| r >= 1));
        assert!(outcome.matched_entry.is_some());
        assert_eq!(outcome.terminal, TerminalState::Found);
    } else {
        assert_eq!(outcome.rank, None);
        assert!(outcome.matched_entry.is_none());
    }
}

fn task(target: &str, max_rank: i32) -> SearchTask {
    SearchTask::new("강남 치킨", target, None, max_rank).unwrap()
}

#[tokio::test]
async fn test_target_found_at_display_position() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![Ok(page(
        listing_html(&[
            ("A Cafe", false),
            ("B Mart", false),
            ("Target Store", false),
            ("D Shop", false),
        ]),
        false,
    ))]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert!(outcome.success);
    assert_eq!(outcome.rank, Some(3));
    assert_eq!(outcome.top_entries.len(), 4);
    assert_eq!(outcome.profile.region, "강남");
    assert_eq!(outcome.profile.category, "치킨");
}

#[tokio::test]
async fn test_sponsored_entries_do_not_count() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![Ok(page(
        listing_html(&[
            ("A Cafe", false),
            ("B Mart", true),
            ("Target Store", false),
            ("D Shop", false),
        ]),
        false,
    ))]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert!(outcome.success);
    assert_eq!(outcome.rank, Some(2));
}

#[tokio::test]
async fn test_sponsored_copy_of_target_is_skipped() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![Ok(page(
        state_html(&[
            ("1", "Target Store", true),
            ("2", "Other Place", false),
            ("3", "Target Store", false),
        ]),
        false,
    ))]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert_eq!(outcome.rank, Some(2));
    assert_eq!(
        outcome.matched_entry.unwrap().source_id.as_deref(),
        Some("3")
    );
}

#[tokio::test]
async fn test_identifier_beats_name() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![Ok(page(
        state_html(&[
            ("1001", "교촌치킨 역삼점", false),
            ("1002", "교촌치킨 강남점", false),
        ]),
        false,
    ))]);
    let task = SearchTask::new("강남 치킨", "교촌치킨", Some("1002".into()), 10).unwrap();

    let outcome = run(&ctx, &fetcher, &task).await;
    assert_eq!(outcome.rank, Some(2));
}

#[tokio::test]
async fn test_challenge_page_ends_blocked_without_retry() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(captcha_html(), false)),
        Ok(page(listing_html(&[("Target Store", false)]), false)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert_eq!(outcome.terminal, TerminalState::Blocked);
    assert!(outcome.blocked);
    assert_eq!(
        outcome.message,
        "Blocked by anti-bot challenge at https://m.search.naver.com/search.naver?query=test (route direct)"
    );
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_non_positive_max_rank_is_immediately_exhausted() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![]);

    for max_rank in [0, -5] {
        let outcome = run(&ctx, &fetcher, &task("Target Store", max_rank)).await;
        assert_eq!(outcome.terminal, TerminalState::Exhausted);
        assert_eq!(outcome.total_entries_scanned, 0);
    }
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_transport_failures_rotate_then_recover() {
    let ctx = context(fast_config().use_proxy(true).proxy_list(PROXIES).failure_threshold(1));
    let fetcher = ScriptedFetcher::new(vec![
        Err(FetchError::Connect("refused".into())),
        Err(FetchError::Timeout {
            operation: "page open".into(),
            secs: 5,
        }),
        Ok(page(state_html(&[("1", "Target Store", false)]), false)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert!(outcome.success);

    let calls = fetcher.calls();
    assert_eq!(
        calls,
        vec![Call::Open(Some(0)), Call::Open(Some(1)), Call::Open(Some(2))]
    );
    let stats = ctx.pool().stats();
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.active, 1);
}

#[tokio::test]
async fn test_transport_failures_are_bounded() {
    let ctx = context(fast_config().max_transport_attempts(2));
    let fetcher = ScriptedFetcher::new(vec![
        Err(FetchError::Connect("refused".into())),
        Err(FetchError::Connect("refused".into())),
        Ok(page(state_html(&[("1", "Target Store", false)]), false)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert!(outcome.message.contains("transport failures exhausted"), "{}", outcome.message);
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn test_not_found_status_ends_session_at_once() {
    let ctx = context(fast_config().use_proxy(true).proxy_list(PROXIES));
    let fetcher = ScriptedFetcher::new(vec![
        Err(FetchError::Status {
            status: 404,
            url: "https://m.search.naver.com/search.naver".into(),
        }),
        Ok(page(state_html(&[("1", "Target Store", false)]), false)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert_eq!(
        outcome.message,
        "Transport failure: HTTP 404 from https://m.search.naver.com/search.naver"
    );
    assert_eq!(fetcher.calls(), vec![Call::Open(Some(0))]);
}

#[tokio::test]
async fn test_paged_results_continue_numbering() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(
            state_html(&[("1", "One", false), ("2", "Two", true), ("3", "Three", false)]),
            false,
        )),
        Ok(page(
            state_html(&[("4", "Four", false), ("5", "Target Store", false)]),
            false,
        )),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert!(outcome.success);
    assert_eq!(outcome.rank, Some(4));
    assert_eq!(outcome.total_entries_scanned, 5);
    assert_eq!(fetcher.calls(), vec![Call::Open(None), Call::More(None)]);
}

#[tokio::test]
async fn test_cumulative_scroll_only_matches_new_entries() {
    let ctx = context(fast_config());
    let first = [("A Cafe", false), ("B Mart", true), ("C Deli", false)];
    let second = [
        ("A Cafe", false),
        ("B Mart", true),
        ("C Deli", false),
        ("D Shop", false),
        ("Target Store", false),
    ];
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(listing_html(&first), true)),
        Ok(page(listing_html(&second), true)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert!(outcome.success);
    assert_eq!(outcome.rank, Some(4));
    assert_eq!(outcome.total_entries_scanned, 5);
}

#[tokio::test]
async fn test_nothing_new_after_scroll_is_exhausted() {
    let ctx = context(fast_config());
    let items = [("A Cafe", false), ("B Mart", false), ("C Deli", false)];
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(listing_html(&items), true)),
        Ok(page(listing_html(&items), true)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert_eq!(outcome.total_entries_scanned, 3);
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn test_max_rank_stops_scrolling() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(
            state_html(&[("1", "One", false), ("2", "Two", false), ("3", "Three", false)]),
            false,
        )),
        Ok(page(state_html(&[("4", "Target Store", false)]), false)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 3)).await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert!(outcome.message.contains("not in top 3"), "{}", outcome.message);
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_match_beyond_max_rank_is_not_found() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![Ok(page(
        state_html(&[("1", "One", false), ("2", "Two", false), ("3", "Target Store", false)]),
        false,
    ))]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 2)).await;
    assert!(!outcome.success);
}

#[tokio::test]
async fn test_scroll_budget_is_bounded() {
    let ctx = context(fast_config().max_scrolls(1));
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(state_html(&[("1", "One", false)]), false)),
        Ok(page(state_html(&[("2", "Two", false)]), false)),
        Ok(page(state_html(&[("3", "Target Store", false)]), false)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 50)).await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert!(outcome.message.contains("scroll budget"), "{}", outcome.message);
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn test_empty_extraction_reloads_once() {
    let ctx = context(fast_config());
    let empty = || Ok(page("<html><body>loading</body></html>".to_string(), false));

    let fetcher = ScriptedFetcher::new(vec![
        empty(),
        Ok(page(state_html(&[("1", "Target Store", false)]), false)),
    ]);
    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert!(outcome.success);
    assert_eq!(fetcher.calls(), vec![Call::Open(None), Call::Open(None)]);

    let fetcher = ScriptedFetcher::new(vec![empty(), empty(), empty()]);
    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert_eq!(outcome.message, "No listings could be extracted from the page");
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn test_cancelled_session_issues_no_request() {
    let ctx = context(fast_config());
    let fetcher = ScriptedFetcher::new(vec![]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let gateway = ctx.gateway();
    let outcome = ctx
        .session(&gateway, &fetcher)
        .run(&task("Target Store", 10), &cancel)
        .await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_daily_quota_ends_session() {
    let ctx = context(fast_config().daily_request_limit(1));
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(state_html(&[("1", "One", false)]), false)),
        Ok(page(state_html(&[("2", "Target Store", false)]), false)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert_eq!(outcome.message, "Request quota exhausted (1/1)");
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_direct_quota_is_final_even_with_proxies_loaded() {
    let ctx = context(fast_config().proxy_list(PROXIES).daily_request_limit(1));
    let fetcher = ScriptedFetcher::new(
        (1..=9)
            .map(|i| Ok(page(state_html(&[(&i.to_string(), "Someone Else", false)]), false)))
            .collect(),
    );

    let gateway = ctx.gateway();
    let session = ctx.session(&gateway, &fetcher);
    let first = session.run(&task("Target Store", 50), &CancellationToken::new()).await;
    assert_eq!(first.terminal, TerminalState::Exhausted);
    assert!(first.message.contains("quota exhausted"), "{}", first.message);

    let second = session.run(&task("Target Store", 50), &CancellationToken::new()).await;
    assert_eq!(second.terminal, TerminalState::Exhausted);
    assert_eq!(fetcher.calls(), vec![Call::Open(None)]);
    assert!(gateway.ensure_quota().is_err());
}

#[tokio::test]
async fn test_spent_proxy_budget_rotates_to_next_endpoint() {
    let ctx = context(
        fast_config()
            .use_proxy(true)
            .proxy_list([PROXIES[0], PROXIES[1]])
            .daily_request_limit(1),
    );
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(state_html(&[("1", "One", false)]), false)),
        Ok(page(state_html(&[("2", "Target Store", false)]), false)),
    ]);

    let gateway = ctx.gateway();
    let session = ctx.session(&gateway, &fetcher);
    let outcome = session.run(&task("Target Store", 10), &CancellationToken::new()).await;
    assert!(outcome.success);
    assert_eq!(outcome.rank, Some(2));
    assert_eq!(fetcher.calls(), vec![Call::Open(Some(0)), Call::More(Some(1))]);
    assert_eq!(ctx.pool().get(0).unwrap().quota_max, Some(1));

    // the next session starts with no route but the budget still belongs to
    // endpoint 1, and endpoint 0 has nothing left to give
    let next = session.run(&task("Target Store", 10), &CancellationToken::new()).await;
    assert_eq!(next.terminal, TerminalState::Exhausted);
    assert!(next.message.contains("quota exhausted"), "{}", next.message);
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn test_rate_limit_while_scrolling_moves_to_another_proxy() {
    let ctx = context(fast_config().use_proxy(true).proxy_list(PROXIES));
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(state_html(&[("1", "One", false)]), false)),
        Err(FetchError::Status {
            status: 429,
            url: "https://m.search.naver.com/p/api/search/list".into(),
        }),
        Ok(page(state_html(&[("2", "Target Store", false)]), false)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert!(outcome.success);
    assert_eq!(outcome.rank, Some(2));
    assert_eq!(
        fetcher.calls(),
        vec![Call::Open(Some(0)), Call::More(Some(0)), Call::More(Some(1))]
    );
    assert_eq!(ctx.pool().get(0).unwrap().status, ProxyStatus::RateLimited);
}

#[tokio::test]
async fn test_challenge_while_scrolling_blocks_the_session() {
    let ctx = context(fast_config().use_proxy(true).proxy_list(PROXIES));
    let fetcher = ScriptedFetcher::new(vec![
        Ok(page(state_html(&[("1", "One", false)]), false)),
        Ok(page(captcha_html(), false)),
        Ok(page(state_html(&[("2", "Target Store", false)]), false)),
    ]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert_eq!(outcome.terminal, TerminalState::Blocked);
    assert!(outcome.blocked);
    assert_eq!(outcome.total_entries_scanned, 1);
    assert_eq!(fetcher.calls(), vec![Call::Open(Some(0)), Call::More(Some(0))]);
    assert_eq!(ctx.pool().get(0).unwrap().status, ProxyStatus::RateLimited);
}

#[tokio::test]
async fn test_rate_limited_endpoint_is_skipped() {
    let ctx = context(fast_config().use_proxy(true).proxy_list(PROXIES));
    let limited = ctx.pool().get(0).unwrap();
    ctx.pool().report_outcome(&limited, false, Some(429));
    assert_eq!(ctx.pool().get(0).unwrap().status, ProxyStatus::RateLimited);

    let fetcher = ScriptedFetcher::new(vec![Ok(page(
        state_html(&[("1", "Target Store", false)]),
        false,
    ))]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert!(outcome.success);
    assert_eq!(fetcher.calls(), vec![Call::Open(Some(1))]);
}

#[tokio::test]
async fn test_no_active_proxy_means_no_route() {
    let ctx = context(fast_config().use_proxy(true).proxy_list(["http://10.0.0.9:3128"]));
    let endpoint = ctx.pool().get(0).unwrap();
    ctx.pool().ban(&endpoint);
    let fetcher = ScriptedFetcher::new(vec![]);

    let outcome = run(&ctx, &fetcher, &task("Target Store", 10)).await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert!(outcome.message.starts_with("no_route"), "{}", outcome.message);
    assert!(fetcher.calls().is_empty());
}
