//! Shared fixtures for the placerank test suite

use parking_lot::Mutex;
use placerank::gateway::ProxyEndpoint;
use placerank::{FetchError, FetchedPage, PageFetcher, RankConfig, RankConfigBuilder};
use std::collections::VecDeque;

/// Config with no pacing delay, suitable for fast session tests
#[allow(dead_code)]
pub fn fast_config() -> RankConfigBuilder {
    RankConfig::builder()
        .delay_range_secs(0.0, 0.0)
        .block_pause_secs(0)
        .fetch_timeout_secs(5)
}

/// Listing markup the selector cascade understands. `true` marks a sponsored item.
#[allow(dead_code)]
pub fn listing_html(items: &[(&str, bool)]) -> String {
    let body: String = items
        .iter()
        .enumerate()
        .map(|(i, (name, sponsored))| {
            let badge = if *sponsored {
                r#"<span class="ad_badge">광고</span>"#
            } else {
                ""
            };
            format!(
                r#"<li class="place_unit" data-nclick="plc.list,i:{i}">{badge}<span class="place_bluelink">{name}</span><span>서울 강남구 테헤란로 {i}</span></li>"#
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>검색 결과</title></head><body><ul class="list_place">{body}</ul></body></html>"#
    )
}

/// Result page carrying an embedded state object; `(id, name, sponsored)`
#[allow(dead_code)]
pub fn state_html(records: &[(&str, &str, bool)]) -> String {
    let mut entries = Vec::new();
    let mut refs = Vec::new();
    for (id, name, sponsored) in records {
        let ad = if *sponsored { r#","adId":"ad-1""# } else { "" };
        entries.push(format!(
            r#""RestaurantListSummary:{id}":{{"id":"{id}","name":"{name}","category":"치킨"{ad}}}"#
        ));
        refs.push(format!(r#"{{"__ref":"RestaurantListSummary:{id}"}}"#));
    }
    format!(
        r#"<html><body><script>window.__APOLLO_STATE__ = {{{},"ROOT_QUERY":{{"restaurants":{{"items":[{}]}}}}}};</script></body></html>"#,
        entries.join(","),
        refs.join(",")
    )
}

#[allow(dead_code)]
pub fn captcha_html() -> String {
    "<html><body><p>보안문자를 입력해 주세요</p></body></html>".to_string()
}

#[allow(dead_code)]
pub fn page(body: String, cumulative: bool) -> FetchedPage {
    FetchedPage {
        final_url: "https://m.search.naver.com/search.naver?query=test".to_string(),
        status: 200,
        body,
        cumulative,
    }
}

/// Which call the fetcher saw, and through which proxy
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(Option<usize>),
    More(Option<usize>),
}

/// Replays a fixed list of responses, one per call
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<FetchedPage, FetchError>>>,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<FetchedPage, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn next(&self) -> Result<FetchedPage, FetchError> {
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Connect("script exhausted".into())))
    }
}

impl PageFetcher for ScriptedFetcher {
    type Cursor = ();

    async fn open(
        &self,
        _query: &str,
        route: Option<&ProxyEndpoint>,
    ) -> Result<(FetchedPage, ()), FetchError> {
        self.calls.lock().push(Call::Open(route.map(|r| r.id)));
        self.next().map(|page| (page, ()))
    }

    async fn more(
        &self,
        _cursor: &mut (),
        route: Option<&ProxyEndpoint>,
    ) -> Result<FetchedPage, FetchError> {
        self.calls.lock().push(Call::More(route.map(|r| r.id)));
        self.next()
    }
}
