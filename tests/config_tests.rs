//! Configuration loading, defaults and validation

use placerank::config::FetcherKind;
use placerank::{RankConfig, RankContext, RankError};
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = RankConfig::builder().build().unwrap();
    assert!(config.headless());
    assert_eq!(config.fetcher(), FetcherKind::Http);
    assert_eq!(config.delay_range_secs(), (5.0, 15.0));
    assert_eq!(config.max_rank(), 100);
    assert_eq!(config.daily_request_limit(), 450);
    assert!(!config.use_proxy());
    assert_eq!(config.failure_threshold(), 3);
    assert_eq!(config.match_threshold(), 0.6);
    assert_eq!(config.max_scrolls(), 15);
    assert_eq!(config.max_transport_attempts(), 3);
    assert_eq!(config.block_pause().as_secs(), 300);
    assert_eq!(config.brand_aliases_compiled().len(), config.brand_aliases().len());
}

#[tokio::test]
async fn test_json_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("placerank.json");
    tokio::fs::write(
        &path,
        r#"{
            "fetcher": "browser",
            "headless": false,
            "delay_range_secs": [1.0, 2.0],
            "max_rank": 30,
            "proxy_list": ["socks5://user-country-kr:pw@10.1.1.1:1080"],
            "use_proxy": true,
            "selectors": {"min_items": 5}
        }"#,
    )
    .await
    .unwrap();

    let config = RankConfig::from_json_file(&path).await.unwrap();
    assert_eq!(config.fetcher(), FetcherKind::Browser);
    assert!(!config.headless());
    assert_eq!(config.delay_range_secs(), (1.0, 2.0));
    assert_eq!(config.max_rank(), 30);
    assert_eq!(config.selectors().min_items, 5);
    // untouched nested defaults survive
    assert!(!config.selectors().item_selectors.is_empty());

    let ctx = RankContext::new(config).unwrap();
    let endpoint = ctx.pool().get(0).unwrap();
    assert_eq!(endpoint.country.as_deref(), Some("kr"));
}

#[test]
fn test_invalid_values_are_configuration_errors() {
    let cases = [
        RankConfig::builder().delay_range_secs(10.0, 2.0).build(),
        RankConfig::builder().match_threshold(0.0).build(),
        RankConfig::builder().use_proxy(true).build(),
        RankConfig::builder().search_url("https://example.test/").build(),
        RankConfig::builder().daily_request_limit(0).build(),
        RankConfig::builder().brand_aliases(vec!["(unclosed".into()]).build(),
    ];
    for case in cases {
        assert!(matches!(case, Err(RankError::Configuration(_))), "{case:?}");
    }
}

#[test]
fn test_malformed_json_is_rejected() {
    let err = RankConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, RankError::Configuration(_)));
}

#[test]
fn test_bad_proxy_fails_context_construction() {
    let config = RankConfig::builder()
        .proxy_list(["ftp://10.0.0.1:21"])
        .build()
        .unwrap();
    assert!(matches!(
        RankContext::new(config),
        Err(RankError::Configuration(_))
    ));
}

#[test]
fn test_effective_config_round_trips_through_json() {
    let config = RankConfig::builder().max_rank(42).build().unwrap();
    let json = config.to_json_pretty().unwrap();
    let reloaded = RankConfig::from_json_str(&json).unwrap();
    assert_eq!(reloaded.max_rank(), 42);
    assert_eq!(reloaded.brand_aliases(), config.brand_aliases());
}
