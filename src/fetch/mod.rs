//! Page transports
//!
//! A `PageFetcher` loads the first result page for a query through a given
//! route and then loads more results on demand. Two transports ship with the
//! crate:
//! - `HttpFetcher`: plain HTTP, one client per proxy, more results by paging
//! - `BrowserFetcher`: headless Chromium, one browser per proxy, more results
//!   by scrolling the same page

pub mod browser;
pub mod browser_setup;
pub mod http;

use std::future::Future;
use thiserror::Error;

use crate::gateway::ProxyEndpoint;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

/// One loaded page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; challenge pages usually live on their own path
    pub final_url: String,
    pub status: u16,
    pub body: String,
    /// True when `body` re-renders everything loaded so far (scroll-to-load),
    /// false when it only holds the newly requested slice (paging)
    pub cumulative: bool,
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("{operation} timeout after {secs} seconds")]
    Timeout { operation: String, secs: u64 },

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Status code to report against the route, when there is one
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the same request may succeed over another route
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Connect(_) | FetchError::Request(_) => true,
            FetchError::Status { status, .. } => {
                *status == 429 || *status == 403 || (500..600).contains(status)
            }
            FetchError::Browser(_) => true,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout {
                operation: "HTTP request".into(),
                secs: 0,
            }
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
                url: e.url().map(ToString::to_string).unwrap_or_default(),
            }
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

impl From<chromiumoxide::error::CdpError> for FetchError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        FetchError::Browser(e.to_string())
    }
}

/// Transport seam used by `RankSession`.
///
/// `route` is `None` for direct egress. A cursor remembers how far a query
/// has been loaded; `more` may be called with a different route than `open`
/// after a rotation, and implementations must then continue from the same
/// depth on the new route.
pub trait PageFetcher: Send + Sync {
    type Cursor: Send;

    fn open(
        &self,
        query: &str,
        route: Option<&ProxyEndpoint>,
    ) -> impl Future<Output = Result<(FetchedPage, Self::Cursor), FetchError>> + Send;

    fn more(
        &self,
        cursor: &mut Self::Cursor,
        route: Option<&ProxyEndpoint>,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;

    /// Release whatever the cursor holds (browser tabs)
    fn close(&self, cursor: Self::Cursor) -> impl Future<Output = ()> + Send {
        drop(cursor);
        async {}
    }
}
