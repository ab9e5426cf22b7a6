// Listing sources: where candidate detail URLs come from.
//
// Callers see one capability, `ListingSource::document()`. Whether the
// document came from a single GET or from a browser session that clicked
// "load more" until it vanished is invisible to extraction and merging.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::browser::{reveal_all, RevealConfig, RevealDriver};
use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::links::{extract_marked_links, LinkMarker};

#[async_trait]
pub trait ListingSource: Send + Sync {
    fn url(&self) -> &str;
    fn marker(&self) -> &LinkMarker;
    /// The full listing document.
    async fn document(&self) -> Result<String, FetchError>;
}

/// Single fetch; the listing shows everything on one page.
pub struct StaticListing {
    url: String,
    marker: LinkMarker,
    fetcher: Arc<dyn PageFetcher>,
}

impl StaticListing {
    pub fn new(url: impl Into<String>, marker: LinkMarker, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            url: url.into(),
            marker,
            fetcher,
        }
    }
}

#[async_trait]
impl ListingSource for StaticListing {
    fn url(&self) -> &str {
        &self.url
    }

    fn marker(&self) -> &LinkMarker {
        &self.marker
    }

    async fn document(&self) -> Result<String, FetchError> {
        self.fetcher.fetch(&self.url).await
    }
}

/// Fetch + repeated reveal-more step in a browser.
pub struct InteractiveListing {
    url: String,
    marker: LinkMarker,
    reveal: RevealConfig,
    driver: Arc<dyn RevealDriver>,
    fallback: Option<Arc<dyn PageFetcher>>,
}

impl InteractiveListing {
    pub fn new(
        url: impl Into<String>,
        marker: LinkMarker,
        reveal: RevealConfig,
        driver: Arc<dyn RevealDriver>,
    ) -> Self {
        Self {
            url: url.into(),
            marker,
            reveal,
            driver,
            fallback: None,
        }
    }

    /// When the browser fails, degrade to the first (unrevealed) page.
    pub fn with_fallback(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fallback = Some(fetcher);
        self
    }

    async fn revealed(&self) -> Result<String, FetchError> {
        let mut page = self.driver.open(&self.url).await?;
        let (html, clicks) = reveal_all(page.as_mut(), &self.reveal).await?;
        info!(url = self.url.as_str(), clicks, "Interactive listing fully revealed");
        Ok(html)
    }
}

#[async_trait]
impl ListingSource for InteractiveListing {
    fn url(&self) -> &str {
        &self.url
    }

    fn marker(&self) -> &LinkMarker {
        &self.marker
    }

    async fn document(&self) -> Result<String, FetchError> {
        match self.revealed().await {
            Ok(html) => Ok(html),
            Err(e) => match &self.fallback {
                Some(fetcher) => {
                    warn!(url = self.url.as_str(), error = %e, "Browser reveal failed, using first page only");
                    fetcher.fetch(&self.url).await
                }
                None => Err(e),
            },
        }
    }
}

/// `fetch_listing(source) -> candidate URLs`.
pub async fn fetch_listing(source: &dyn ListingSource) -> Result<Vec<String>, FetchError> {
    read_listing(source).await.map(|(_, links)| links)
}

async fn read_listing(source: &dyn ListingSource) -> Result<(String, Vec<String>), FetchError> {
    let html = source.document().await?;
    let links = extract_marked_links(&html, source.url(), source.marker());
    info!(url = source.url(), candidates = links.len(), "Listing extracted");
    Ok((html, links))
}

/// Everything read from a set of listings in one pass.
#[derive(Debug, Default)]
pub struct Harvest {
    /// Candidate detail URLs, deduplicated across all listings in first-seen order.
    pub urls: Vec<String>,
    /// Listing URL → the document it produced. Some listings carry content
    /// of their own besides links.
    pub documents: BTreeMap<String, String>,
    pub failed: u32,
}

/// Read several listings. A failing listing is logged and skipped.
pub async fn collect_candidates(sources: &[Arc<dyn ListingSource>]) -> Harvest {
    let mut seen = HashSet::new();
    let mut harvest = Harvest::default();

    for source in sources {
        match read_listing(source.as_ref()).await {
            Ok((html, links)) => {
                for link in links {
                    if seen.insert(link.clone()) {
                        harvest.urls.push(link);
                    }
                }
                harvest.documents.insert(source.url().to_string(), html);
            }
            Err(e) => {
                warn!(url = source.url(), error = %e, "Listing fetch failed, skipping source");
                harvest.failed += 1;
            }
        }
    }

    harvest
}
