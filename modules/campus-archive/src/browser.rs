// Headless Chrome driver for listings that only reveal their full result set
// after repeated "load more" clicks.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::FetchError;

/// Result of one attempt to trigger the reveal-more affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Clicked,
    /// No element matched. Treated as "no more results".
    NotFound,
}

/// An open, stateful page. Each click depends on the DOM left by the previous one.
#[async_trait]
pub trait RevealPage: Send {
    async fn click(&mut self, selector: &str) -> Result<ClickOutcome, FetchError>;
    async fn content(&mut self) -> Result<String, FetchError>;
}

#[async_trait]
pub trait RevealDriver: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn RevealPage>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct RevealConfig {
    /// CSS selector of the "load more" button.
    pub selector: String,
    /// Wait after each click for new items to render.
    pub settle: Duration,
    /// Upper bound on clicks so a button that never disappears cannot loop forever.
    pub max_clicks: u32,
}

impl RevealConfig {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            settle: Duration::from_millis(1500),
            max_clicks: 50,
        }
    }

    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn max_clicks(mut self, max_clicks: u32) -> Self {
        self.max_clicks = max_clicks;
        self
    }
}

/// Click the affordance until it is gone (or the cap is hit), then return the
/// fully revealed document and the number of clicks performed. Sequential.
pub async fn reveal_all(
    page: &mut dyn RevealPage,
    config: &RevealConfig,
) -> Result<(String, u32), FetchError> {
    let mut clicks = 0;
    while clicks < config.max_clicks {
        match page.click(&config.selector).await? {
            ClickOutcome::Clicked => {
                clicks += 1;
                debug!(clicks, selector = config.selector.as_str(), "Revealed more results");
                tokio::time::sleep(config.settle).await;
            }
            ClickOutcome::NotFound => break,
        }
    }

    if clicks == config.max_clicks && config.max_clicks > 0 {
        warn!(clicks, selector = config.selector.as_str(), "Reveal click cap reached");
    }

    let html = page.content().await?;
    Ok((html, clicks))
}

// ---------------------------------------------------------------------------
// Chrome via the DevTools protocol
// ---------------------------------------------------------------------------

fn browser_err(e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(e.to_string())
}

/// Drives a local headless Chrome or a remote one (Browserless or any
/// DevTools websocket endpoint).
pub struct ChromeRevealDriver {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromeRevealDriver {
    pub async fn launch(chrome_bin: &str) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder()
            .chrome_executable(chrome_bin)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(FetchError::Browser)?;

        let (browser, handler) = Browser::launch(config).await.map_err(browser_err)?;
        info!(chrome_bin, "Chrome reveal driver launched");
        Ok(Self::with_handler(browser, handler))
    }

    pub async fn connect(ws_url: &str) -> Result<Self, FetchError> {
        let (browser, handler) = Browser::connect(ws_url).await.map_err(browser_err)?;
        info!("Chrome reveal driver connected to remote browser");
        Ok(Self::with_handler(browser, handler))
    }

    fn with_handler(browser: Browser, mut handler: chromiumoxide::Handler) -> Self {
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        Self { browser, handler }
    }
}

impl Drop for ChromeRevealDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl RevealDriver for ChromeRevealDriver {
    async fn open(&self, url: &str) -> Result<Box<dyn RevealPage>, FetchError> {
        let page = self.browser.new_page(url).await.map_err(browser_err)?;
        page.wait_for_navigation().await.map_err(browser_err)?;
        Ok(Box::new(ChromePage { page }))
    }
}

struct ChromePage {
    page: chromiumoxide::Page,
}

#[async_trait]
impl RevealPage for ChromePage {
    async fn click(&mut self, selector: &str) -> Result<ClickOutcome, FetchError> {
        let element = match self.page.find_element(selector).await {
            Ok(el) => el,
            Err(_) => return Ok(ClickOutcome::NotFound),
        };
        // The button is often detached between lookup and click while the
        // list re-renders; that is the same as it being gone.
        match element.click().await {
            Ok(_) => Ok(ClickOutcome::Clicked),
            Err(e) => {
                debug!(selector, error = %e, "Reveal element vanished before click");
                Ok(ClickOutcome::NotFound)
            }
        }
    }

    async fn content(&mut self) -> Result<String, FetchError> {
        self.page.content().await.map_err(browser_err)
    }
}
