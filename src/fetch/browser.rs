//! Headless-browser transport
//!
//! One Chromium instance per route, launched on first use and kept for the
//! life of the fetcher. A cursor owns one tab; loading more results scrolls
//! that tab, so every page returned after the first is cumulative.

use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use rand::seq::IndexedRandom;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::browser_setup::{LaunchOptions, apply_stealth, launch_browser};
use super::{FetchError, FetchedPage, PageFetcher};
use crate::config::RankConfig;
use crate::gateway::ProxyEndpoint;
use crate::utils::constants::{MOBILE_WINDOW_SIZES, SCROLL_POLL_ATTEMPTS, SCROLL_POLL_INTERVAL_MS};
use crate::utils::fill_template;

/// Browser plus its CDP handler task.
///
/// The handler must be aborted when the browser goes away or it keeps
/// running after Chrome has exited.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {e}");
        }
    }

    fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take()
            && let Err(e) = std::fs::remove_dir_all(&path)
        {
            warn!("Failed to clean up profile directory {}: {e}", path.display());
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();
        self.cleanup_temp_dir();
    }
}

/// One open tab and how far it has been scrolled
pub struct BrowserCursor {
    page: Page,
    route_id: Option<usize>,
    query: String,
    scrolls: u32,
}

pub struct BrowserFetcher {
    search_url: String,
    headless: bool,
    user_agents: Vec<String>,
    request_timeout: Duration,
    /// CSS selector list used to count rendered listing items
    item_probe: String,
    browsers: Mutex<HashMap<Option<usize>, BrowserWrapper>>,
}

impl BrowserFetcher {
    #[must_use]
    pub fn new(config: &RankConfig) -> Self {
        Self {
            search_url: config.search_url().to_string(),
            headless: config.headless(),
            user_agents: config.user_agents().to_vec(),
            request_timeout: config.fetch_timeout(),
            item_probe: config.selectors().item_selectors.join(", "),
            browsers: Mutex::new(HashMap::new()),
        }
    }

    fn launch_options(&self, route: Option<&ProxyEndpoint>) -> LaunchOptions {
        let mut rng = rand::rng();
        LaunchOptions {
            headless: self.headless,
            user_agent: self.user_agents.choose(&mut rng).cloned().unwrap_or_default(),
            window_size: MOBILE_WINDOW_SIZES.choose(&mut rng).copied().unwrap_or((390, 844)),
            request_timeout: self.request_timeout,
            proxy: route.cloned(),
        }
    }

    /// Open a blank tab on the browser bound to `route`, launching it if needed
    async fn new_page(&self, route: Option<&ProxyEndpoint>) -> Result<Page, FetchError> {
        let key = route.map(|r| r.id);
        let mut browsers = self.browsers.lock().await;
        if !browsers.contains_key(&key) {
            let options = self.launch_options(route);
            let (browser, handler, dir) = launch_browser(&options)
                .await
                .map_err(|e| FetchError::Browser(format!("{e:#}")))?;
            info!(
                "Launched browser for route {}",
                route.map_or_else(|| "direct".to_string(), ProxyEndpoint::server_url)
            );
            browsers.insert(key, BrowserWrapper::new(browser, handler, dir));
        }
        let wrapper = browsers
            .get(&key)
            .ok_or_else(|| FetchError::Browser("browser vanished after launch".into()))?;
        let page = wrapper.browser.new_page("about:blank").await?;
        drop(browsers);

        apply_stealth(&page)
            .await
            .map_err(|e| FetchError::Browser(format!("{e:#}")))?;
        Ok(page)
    }

    async fn navigate(&self, page: &Page, query: &str) -> Result<(), FetchError> {
        let encoded = urlencoding::encode(query);
        let url = fill_template(&self.search_url, &[("query", encoded.as_ref())]);
        debug!("Navigating to {url}");
        page.goto(url.as_str()).await?;
        page.wait_for_navigation().await?;
        Ok(())
    }

    async fn item_count(&self, page: &Page) -> Result<u64, FetchError> {
        let probe = serde_json::to_string(&self.item_probe)
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        let js = format!("document.querySelectorAll({probe}).length");
        page.evaluate(js.as_str())
            .await?
            .into_value::<u64>()
            .map_err(|e| FetchError::Browser(format!("item count: {e}")))
    }

    /// Scroll to the bottom and wait for more items to render.
    ///
    /// Returns whether the item count grew before the polling budget ran out.
    async fn scroll(&self, page: &Page) -> Result<bool, FetchError> {
        let before = self.item_count(page).await?;
        page.evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;

        for _ in 0..SCROLL_POLL_ATTEMPTS {
            tokio::time::sleep(Duration::from_millis(SCROLL_POLL_INTERVAL_MS)).await;
            if self.item_count(page).await? > before {
                return Ok(true);
            }
        }
        debug!("Scroll produced no new items ({before} rendered)");
        Ok(false)
    }

    async fn snapshot(page: &Page) -> Result<FetchedPage, FetchError> {
        let final_url = page.url().await?.unwrap_or_default();
        let body = page.content().await?;
        Ok(FetchedPage {
            final_url,
            status: 200,
            body,
            cumulative: true,
        })
    }

    /// Close every browser and wait for the processes to exit
    pub async fn shutdown(&self) {
        let drained: Vec<BrowserWrapper> = {
            let mut browsers = self.browsers.lock().await;
            browsers.drain().map(|(_, wrapper)| wrapper).collect()
        };
        for wrapper in drained {
            wrapper.shutdown().await;
        }
    }
}

impl PageFetcher for BrowserFetcher {
    type Cursor = BrowserCursor;

    async fn open(
        &self,
        query: &str,
        route: Option<&ProxyEndpoint>,
    ) -> Result<(FetchedPage, BrowserCursor), FetchError> {
        let page = self.new_page(route).await?;
        self.navigate(&page, query).await?;
        let fetched = Self::snapshot(&page).await?;
        Ok((
            fetched,
            BrowserCursor {
                page,
                route_id: route.map(|r| r.id),
                query: query.to_string(),
                scrolls: 0,
            },
        ))
    }

    async fn more(
        &self,
        cursor: &mut BrowserCursor,
        route: Option<&ProxyEndpoint>,
    ) -> Result<FetchedPage, FetchError> {
        let route_id = route.map(|r| r.id);
        if route_id != cursor.route_id {
            // rotated: rebuild the same scroll depth on the new route
            let page = self.new_page(route).await?;
            self.navigate(&page, &cursor.query).await?;
            for _ in 0..cursor.scrolls {
                self.scroll(&page).await?;
            }
            let old = std::mem::replace(&mut cursor.page, page);
            cursor.route_id = route_id;
            if let Err(e) = old.close().await {
                debug!("Failed to close replaced tab: {e}");
            }
        }

        self.scroll(&cursor.page).await?;
        cursor.scrolls += 1;
        Self::snapshot(&cursor.page).await
    }

    async fn close(&self, cursor: BrowserCursor) {
        if let Err(e) = cursor.page.close().await {
            debug!("Failed to close tab: {e}");
        }
    }
}
