//! Plain HTTP transport
//!
//! One `reqwest::Client` per proxy endpoint, built lazily and reused. Each
//! request carries a user agent drawn from the configured pool. More results
//! are loaded by requesting the next page of the listing endpoint, so every
//! page after the first is a fresh slice.

use parking_lot::Mutex;
use rand::seq::IndexedRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Proxy, redirect};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::{FetchError, FetchedPage, PageFetcher};
use crate::config::RankConfig;
use crate::gateway::ProxyEndpoint;
use crate::utils::fill_template;

/// Paging position of one query
#[derive(Debug, Clone)]
pub struct HttpCursor {
    query: String,
    /// Pages loaded so far, including the first search page
    pages: u32,
}

impl HttpCursor {
    #[must_use]
    pub fn pages(&self) -> u32 {
        self.pages
    }
}

pub struct HttpFetcher {
    search_url: String,
    more_url: String,
    page_size: u32,
    user_agents: Vec<String>,
    timeout: Duration,
    direct: Client,
    by_route: Mutex<HashMap<usize, Client>>,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns an error if the direct client can't be built.
    pub fn new(config: &RankConfig) -> Result<Self, FetchError> {
        let timeout = config.fetch_timeout();
        Ok(Self {
            search_url: config.search_url().to_string(),
            more_url: config.more_url().to_string(),
            page_size: config.page_size(),
            user_agents: config.user_agents().to_vec(),
            timeout,
            direct: build_client(None, timeout)?,
            by_route: Mutex::new(HashMap::new()),
        })
    }

    fn client_for(&self, route: Option<&ProxyEndpoint>) -> Result<Client, FetchError> {
        let Some(route) = route else {
            return Ok(self.direct.clone());
        };
        let mut clients = self.by_route.lock();
        if let Some(client) = clients.get(&route.id) {
            return Ok(client.clone());
        }
        let client = build_client(Some(route), self.timeout)?;
        clients.insert(route.id, client.clone());
        Ok(client)
    }

    fn user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::rng())
            .map_or("", String::as_str)
    }

    fn search_url_for(&self, query: &str) -> String {
        let query = urlencoding::encode(query);
        fill_template(&self.search_url, &[("query", query.as_ref())])
    }

    /// URL of page `page` (1-based) of the listing endpoint
    fn page_url_for(&self, query: &str, page: u32) -> String {
        let query = urlencoding::encode(query);
        let start = ((page - 1) * self.page_size + 1).to_string();
        let page = page.to_string();
        let display = self.page_size.to_string();
        fill_template(
            &self.more_url,
            &[
                ("query", query.as_ref()),
                ("start", start.as_str()),
                ("page", page.as_str()),
                ("display", display.as_str()),
            ],
        )
    }

    async fn get(&self, client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
        debug!("GET {url}");
        let response = client
            .get(url)
            .header(USER_AGENT, self.user_agent())
            .send()
            .await?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let body = response.text().await?;
        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
            cumulative: false,
        })
    }
}

fn build_client(route: Option<&ProxyEndpoint>, timeout: Duration) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8"));

    let mut builder = Client::builder()
        .default_headers(headers)
        .redirect(redirect::Policy::limited(10))
        .timeout(timeout);

    if let Some(route) = route {
        let proxy = Proxy::all(route.proxy_url())
            .map_err(|e| FetchError::Request(format!("Invalid proxy {}: {e}", route.server_url())))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| FetchError::Request(format!("Failed to build HTTP client: {e}")))
}

impl PageFetcher for HttpFetcher {
    type Cursor = HttpCursor;

    async fn open(
        &self,
        query: &str,
        route: Option<&ProxyEndpoint>,
    ) -> Result<(FetchedPage, HttpCursor), FetchError> {
        let client = self.client_for(route)?;
        let page = self.get(&client, &self.search_url_for(query)).await?;
        Ok((
            page,
            HttpCursor {
                query: query.to_string(),
                pages: 1,
            },
        ))
    }

    async fn more(
        &self,
        cursor: &mut HttpCursor,
        route: Option<&ProxyEndpoint>,
    ) -> Result<FetchedPage, FetchError> {
        let client = self.client_for(route)?;
        let next = cursor.pages + 1;
        let page = self.get(&client, &self.page_url_for(&cursor.query, next)).await?;
        cursor.pages = next;
        Ok(page)
    }
}
