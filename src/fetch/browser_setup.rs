//! Chromium discovery and launch for the browser transport

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::cdp;
use chromiumoxide::fetcher::{BrowserFetcher as ChromiumDownloader, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::gateway::ProxyEndpoint;

/// Environment variable pointing at a Chrome/Chromium binary
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

/// Find Chrome/Chromium: `CHROMIUM_PATH`, then well-known install paths,
/// then `which`.
pub fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Using browser from {CHROMIUM_PATH_ENV}: {}", path.display());
            return Ok(path);
        }
        warn!(
            "{CHROMIUM_PATH_ENV} points to non-existent file: {}",
            path.display()
        );
    }

    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
        ]
    };

    if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        info!("Found browser at: {}", path.display());
        return Ok(path);
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    info!("Found browser using 'which': {found}");
                    return Ok(PathBuf::from(found));
                }
            }
        }
    }

    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Download a managed Chromium into the user cache directory
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("placerank")
        .join("chromium");
    tokio::fs::create_dir_all(&cache_dir)
        .await
        .context("Failed to create browser cache directory")?;

    info!("Downloading managed Chromium into {}", cache_dir.display());
    let downloader = ChromiumDownloader::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );
    let revision = downloader.fetch().await.context("Failed to fetch browser")?;
    Ok(revision.executable_path)
}

/// Launch parameters for one browser instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub user_agent: String,
    pub window_size: (u32, u32),
    pub request_timeout: Duration,
    pub proxy: Option<ProxyEndpoint>,
}

/// Launch Chromium with mobile emulation and anti-automation flags.
///
/// Returns the browser, its CDP handler task and the profile directory. The
/// caller owns all three and must abort the handler when done.
pub async fn launch_browser(options: &LaunchOptions) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    let chrome_path = match find_browser_executable() {
        Ok(path) => path,
        Err(_) => download_managed_browser().await?,
    };

    let route_tag = options
        .proxy
        .as_ref()
        .map_or_else(|| "direct".to_string(), |p| format!("p{}", p.id));
    let user_data_dir = std::env::temp_dir().join(format!(
        "placerank_chrome_{}_{}_{}",
        std::process::id(),
        route_tag,
        uuid::Uuid::new_v4().simple()
    ));
    tokio::fs::create_dir_all(&user_data_dir)
        .await
        .context("Failed to create user data directory")?;

    let (width, height) = options.window_size;
    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(options.request_timeout)
        .window_size(width, height)
        .user_data_dir(user_data_dir.clone())
        .chrome_executable(chrome_path);

    builder = if options.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    if let Some(proxy) = &options.proxy {
        if proxy.credentials.is_some() {
            // Chromium ignores credentials in --proxy-server
            warn!(
                "Proxy {} has credentials; browser mode needs an IP-allowlisted endpoint",
                proxy.server_url()
            );
        }
        builder = builder.arg(format!("--proxy-server={}", proxy.server_url()));
    }

    builder = builder
        .arg(format!("--user-agent={}", options.user_agent))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--disable-notifications")
        .arg("--disable-extensions")
        .arg("--disable-popup-blocking")
        .arg("--disable-background-networking")
        .arg("--disable-dev-shm-usage")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--no-sandbox")
        .arg("--lang=ko-KR")
        .arg("--mute-audio");

    let config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let msg = e.to_string();
                // chromiumoxide can't decode every CDP event; those are noise
                if msg.contains("data did not match any variant of untagged enum Message")
                    || msg.contains("Failed to deserialize WS response")
                {
                    trace!("Suppressed CDP decode error: {msg}");
                } else {
                    error!("Browser handler error: {e:?}");
                }
            }
        }
        info!("Browser handler task completed");
    });

    Ok((browser, handler_task, user_data_dir))
}

/// Hide the usual automation giveaways before any site script runs
pub async fn apply_stealth(page: &chromiumoxide::Page) -> Result<()> {
    page.execute(cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
        source: STEALTH_SCRIPT.to_string(),
        include_command_line_api: None,
        world_name: None,
        run_immediately: None,
    })
    .await
    .context("Failed to install stealth script")?;
    Ok(())
}

const STEALTH_SCRIPT: &str = r"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['ko-KR', 'ko', 'en-US'] });
    window.chrome = window.chrome || { runtime: {} };
";
