//! HTTP transport against a local mock server

use mockito::{Matcher, Server};
use placerank::{
    FetchError, HttpFetcher, PageFetcher, RankContext, SearchTask, TerminalState,
};
use tokio_util::sync::CancellationToken;

mod common;
use common::{captcha_html, fast_config, state_html};

fn templates(base: &str) -> (String, String) {
    (
        format!("{base}/search.naver?where=m&query={{query}}"),
        format!("{base}/list?query={{query}}&start={{start}}&display={{display}}"),
    )
}

#[tokio::test]
async fn test_open_then_page_through_results() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/search.naver")
        .match_query(Matcher::UrlEncoded("query".into(), "강남 치킨".into()))
        .match_header("accept-language", Matcher::Regex("ko-KR".into()))
        .with_status(200)
        .with_body(state_html(&[("1", "One", false), ("2", "Two", false)]))
        .create_async()
        .await;
    let second = server
        .mock("GET", "/list")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("start".into(), "3".into()),
            Matcher::UrlEncoded("display".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(state_html(&[("3", "Target Store", false)]))
        .create_async()
        .await;

    let (search, more) = templates(&server.url());
    let config = fast_config()
        .search_url(search)
        .more_url(more)
        .page_size(2)
        .build()
        .unwrap();
    let fetcher = HttpFetcher::new(&config).unwrap();
    let ctx = RankContext::new(config).unwrap();
    let gateway = ctx.gateway();

    let task = SearchTask::new("강남 치킨", "Target Store", None, 10).unwrap();
    let outcome = ctx
        .session(&gateway, &fetcher)
        .run(&task, &CancellationToken::new())
        .await;

    first.assert_async().await;
    second.assert_async().await;
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.rank, Some(3));
    assert_eq!(gateway.pacing().requests_today(), 2);
}

#[tokio::test]
async fn test_error_status_becomes_fetch_error() {
    let mut server = Server::new_async().await;
    let _limited = server
        .mock("GET", "/search.naver")
        .match_query(Matcher::Any)
        .with_status(429)
        .create_async()
        .await;

    let (search, more) = templates(&server.url());
    let config = fast_config().search_url(search).more_url(more).build().unwrap();
    let fetcher = HttpFetcher::new(&config).unwrap();

    match fetcher.open("pizza", None).await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 429),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("429 must not be treated as a page"),
    }
}

#[tokio::test]
async fn test_repeated_rate_limits_exhaust_the_session() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("GET", "/search.naver")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let (search, more) = templates(&server.url());
    let config = fast_config()
        .search_url(search)
        .more_url(more)
        .max_transport_attempts(2)
        .build()
        .unwrap();
    let fetcher = HttpFetcher::new(&config).unwrap();
    let ctx = RankContext::new(config).unwrap();
    let gateway = ctx.gateway();

    let task = SearchTask::new("pizza", "Target Store", None, 10).unwrap();
    let outcome = ctx
        .session(&gateway, &fetcher)
        .run(&task, &CancellationToken::new())
        .await;

    limited.assert_async().await;
    assert_eq!(outcome.terminal, TerminalState::Exhausted);
    assert!(outcome.message.contains("503"), "{}", outcome.message);
}

#[tokio::test]
async fn test_challenge_page_over_http_is_blocked() {
    let mut server = Server::new_async().await;
    let _challenge = server
        .mock("GET", "/search.naver")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(captcha_html())
        .create_async()
        .await;

    let (search, more) = templates(&server.url());
    let config = fast_config().search_url(search).more_url(more).build().unwrap();
    let fetcher = HttpFetcher::new(&config).unwrap();
    let ctx = RankContext::new(config).unwrap();
    let gateway = ctx.gateway();

    let task = SearchTask::new("pizza", "Target Store", None, 10).unwrap();
    let outcome = ctx
        .session(&gateway, &fetcher)
        .run(&task, &CancellationToken::new())
        .await;
    assert!(outcome.blocked);
}
