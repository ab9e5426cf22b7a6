// Test doubles for the synchronization pass.
//
// - MockFetcher (PageFetcher): URL → HTML, counts fetches per URL
// - MockRevealDriver (RevealDriver): listing pages revealed chunk by chunk

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use campus_archive::{ClickOutcome, FetchError, PageFetcher, RevealDriver, RevealPage};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// HashMap-based page fetcher. Unregistered URLs fail with a 404.
/// Builder pattern: `.on_page()`, `.failing()`.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    failing: HashMap<String, u16>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Respond to `url` with an HTTP error status.
    pub fn failing(mut self, url: &str, status: u16) -> Self {
        self.failing.insert(url.to_string(), status);
        self
    }

    /// How many times `url` was fetched.
    pub fn fetches(&self, url: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.calls.lock().map(|calls| calls.values().sum()).unwrap_or(0)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(url.to_string()).or_default() += 1;
        }
        if let Some(status) = self.failing.get(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            });
        }
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

// ---------------------------------------------------------------------------
// MockRevealDriver
// ---------------------------------------------------------------------------

/// A listing whose items appear in chunks: the page shows the first chunk,
/// and every "load more" click appends the next one until none are left.
#[derive(Default)]
pub struct MockRevealDriver {
    listings: HashMap<String, Vec<String>>,
    clicks: Arc<Mutex<usize>>,
}

impl MockRevealDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_listing(mut self, url: &str, chunks: &[&str]) -> Self {
        self.listings
            .insert(url.to_string(), chunks.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn clicks(&self) -> usize {
        self.clicks.lock().map(|c| *c).unwrap_or(0)
    }
}

struct ChunkedPage {
    chunks: Vec<String>,
    shown: usize,
    clicks: Arc<Mutex<usize>>,
}

#[async_trait]
impl RevealPage for ChunkedPage {
    async fn click(&mut self, _selector: &str) -> Result<ClickOutcome, FetchError> {
        if self.shown >= self.chunks.len() {
            return Ok(ClickOutcome::NotFound);
        }
        self.shown += 1;
        if let Ok(mut clicks) = self.clicks.lock() {
            *clicks += 1;
        }
        Ok(ClickOutcome::Clicked)
    }

    async fn content(&mut self) -> Result<String, FetchError> {
        Ok(self.chunks[..self.shown].concat())
    }
}

#[async_trait]
impl RevealDriver for MockRevealDriver {
    async fn open(&self, url: &str) -> Result<Box<dyn RevealPage>, FetchError> {
        let chunks = self
            .listings
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Browser(format!("no scripted listing for {url}")))?;
        Ok(Box::new(ChunkedPage {
            shown: chunks.len().min(1),
            chunks,
            clicks: Arc::clone(&self.clicks),
        }))
    }
}
