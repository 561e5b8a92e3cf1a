//! Shared configuration constants for placerank
//!
//! Default values used by `RankConfig` and the components it configures,
//! kept in one place to avoid magic numbers across the crate.

/// Mobile search endpoint. `{query}` is replaced with the url-encoded keyword.
pub const DEFAULT_SEARCH_URL: &str = "https://m.search.naver.com/search.naver?where=m&sm=top_sly.hst&fbm=0&acr=1&ie=utf8&query={query}";

/// Paged listing endpoint used by the HTTP fetcher to load more results.
///
/// `{query}` is the url-encoded keyword, `{start}` the 1-based offset of the
/// first listing on the page and `{display}` the page size.
pub const DEFAULT_MORE_URL: &str = "https://m.search.naver.com/search.naver?where=m_local&sm=tab_pge&query={query}&start={start}&display={display}";

/// Listings requested per page when paging over HTTP
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Inter-request delay bounds in seconds
///
/// Conservative pacing that kept long-running trackers under the host's
/// anti-bot thresholds. Tighten only for testing.
pub const DEFAULT_DELAY_RANGE_SECS: (f64, f64) = (5.0, 15.0);

/// Deepest rank inspected before a search is declared exhausted
pub const DEFAULT_MAX_RANK: i32 = 100;

/// Requests one identity may issue per calendar day
pub const DEFAULT_DAILY_REQUEST_LIMIT: u32 = 450;

/// Requests one proxy endpoint may carry before it is rotated out
pub const DEFAULT_PER_PROXY_QUOTA: u32 = 400;

/// Consecutive failures that demote a proxy to `Failed`
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Cooldown after an HTTP 429 response
pub const DEFAULT_RATE_LIMIT_COOLDOWN_SECS: u64 = 60;

/// Cooldown after a proxy crosses the failure threshold
pub const DEFAULT_FAILED_COOLDOWN_SECS: u64 = 3600;

/// Hard timeout around every fetch
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Load-more attempts per session
pub const DEFAULT_MAX_SCROLLS: u32 = 15;

/// Route rotations allowed for transport failures within one session
pub const DEFAULT_MAX_TRANSPORT_ATTEMPTS: u32 = 3;

/// Reloads allowed when every extraction strategy returns nothing
pub const DEFAULT_EXTRACTION_RETRIES: u32 = 1;

/// Name similarity needed for a fuzzy match (character-bigram Jaccard)
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Trailing outcomes considered for the failure-rate pacing penalty
pub const DEFAULT_FAILURE_WINDOW: usize = 20;

/// Minimum outcomes in the window before the penalty can apply
pub const MIN_FAILURE_SAMPLES: usize = 5;

/// Failure rate above which pacing is slowed down
pub const FAILURE_RATE_PENALTY_THRESHOLD: f64 = 0.5;

/// Multiplier applied when the failure rate is above the threshold
pub const FAILURE_RATE_PENALTY: f64 = 1.5;

/// Pause factor between scroll/paging loads of one session
pub const SCROLL_DELAY_FACTOR: f64 = 0.3;

/// Upper bound on batch workers regardless of pool size
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Pause a batch worker takes after hitting an anti-bot challenge
pub const DEFAULT_BLOCK_PAUSE_SECS: u64 = 300;

/// Display names kept on an outcome for diagnostics
pub const TOP_ENTRIES_KEPT: usize = 20;

/// Characters of raw item text kept on a listing for diagnostics
pub const RAW_SNIPPET_CHARS: usize = 200;

/// Scroll settle polls in the browser fetcher (0.5s apart)
pub const SCROLL_POLL_ATTEMPTS: u32 = 15;
pub const SCROLL_POLL_INTERVAL_MS: u64 = 500;

/// Request-count thresholds and the delay multiplier each one applies
pub const DEFAULT_PACE_THRESHOLDS: [(u32, f64); 3] = [(100, 1.5), (200, 2.0), (300, 3.0)];

pub const DEFAULT_BLOCK_URL_KEYWORDS: [&str; 4] = ["captcha", "block", "verify", "robot"];

/// Block-page text markers. Generic words such as "verify", "인증", "로봇" or
/// "차단" also show up in place names and reviews, so they are not listed.
pub const DEFAULT_BLOCK_TEXT_KEYWORDS: [&str; 3] = ["captcha", "보안문자", "자동입력"];

pub const DEFAULT_AD_MARKERS: [&str; 6] = [
    "[class*='ad_']",
    "[class*='sponsor']",
    "[class*='promotion']",
    ".ad_marker",
    ".ad_badge",
    "[data-ad]",
];

pub const DEFAULT_AD_KEYWORDS: [&str; 6] = ["광고", "sponsored", "ad", "promotion", "홍보", "협찬"];

pub const DEFAULT_ITEM_SELECTORS: [&str; 5] = [
    "li[data-nclick*='plc']",
    "li.place_unit",
    "li[data-place-id]",
    "ul.list_place li",
    ".place_list li",
];

pub const DEFAULT_NAME_SELECTORS: [&str; 6] = [
    ".place_bluelink",
    ".place_name",
    ".name",
    "a[href*='place'] span",
    "strong",
    "h3",
];

/// Page globals holding the serialized client-side listing cache
pub const DEFAULT_STATE_VARIABLES: [&str; 2] = ["__APOLLO_STATE__", "__PLACE_STATE__"];

pub const DEFAULT_LISTING_PREFIXES: [&str; 5] = [
    "RestaurantListSummary:",
    "PlaceSummary:",
    "HospitalListSummary:",
    "BeautyListSummary:",
    "AccommodationListSummary:",
];

/// Franchise aliases: two names match when both hit the same pattern
pub const DEFAULT_BRAND_ALIASES: [&str; 15] = [
    "(스타벅스|스벅|starbucks)",
    "(맥도날드|맥날|mcdonald)",
    "(교촌치킨|교촌|kyochon)",
    "(롯데리아|lotteria)",
    "(버거킹|burgerking|burger king)",
    "(파리바게뜨|paris baguette)",
    "(뚜레쥬르|tous les jours)",
    "(올리브영|oliveyoung|olive young)",
    "(이마트|e-mart|emart)",
    "(세븐일레븐|7-eleven|711)",
    "(cu편의점|\\bcu\\b)",
    "(gs25|지에스25)",
    "(이디야|ediya)",
    "(커피빈|coffeebean|coffee bean)",
    "(투썸플레이스|투썸|twosome)",
];

/// Mobile user agents rotated per request
pub const MOBILE_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Android 14; Mobile; rv:125.0) Gecko/125.0 Firefox/125.0",
    "Mozilla/5.0 (Linux; Android 14; SM-G998B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
];

/// Viewports matching the user agents above
pub const MOBILE_WINDOW_SIZES: [(u32, u32); 4] = [(375, 812), (390, 844), (393, 873), (360, 800)];
