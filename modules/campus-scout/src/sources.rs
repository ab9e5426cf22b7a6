// Where a synchronization pass starts: listing pages per dataset, plus the
// pages whose own content is harvested (home sections, reading groups).

use std::io::ErrorKind;
use std::path::Path;

use campus_archive::{LinkMarker, PageKind};
use tracing::{info, warn};

/// Path of the English site under the configured host.
pub const SITE_PATH: &str = "/mcmp/en";

/// Extra listing URLs, one per line, `#` for comments.
pub const IMPORTANT_URLS_FILE: &str = "important_urls.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListingKind {
    Events,
    People,
    Research,
    News,
}

impl ListingKind {
    pub fn marker(self) -> LinkMarker {
        match self {
            ListingKind::Events => LinkMarker::events(),
            ListingKind::People => LinkMarker::people(),
            ListingKind::Research => LinkMarker::research(),
            ListingKind::News => LinkMarker::news(),
        }
    }

    /// How detail pages found on this listing are extracted.
    pub fn detail_kind(self) -> PageKind {
        match self {
            ListingKind::Events => PageKind::EventDetail,
            ListingKind::People => PageKind::PersonDetail,
            ListingKind::Research => PageKind::ResearchDetail,
            ListingKind::News => PageKind::NewsDetail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPlan {
    pub url: String,
    pub kind: ListingKind,
    /// Needs repeated "load more" clicks in a browser.
    pub interactive: bool,
}

impl ListingPlan {
    fn fixed(url: String, kind: ListingKind) -> Self {
        Self { url, kind, interactive: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
    pub listings: Vec<ListingPlan>,
    /// Research pages fetched even when no listing links them.
    pub research_pages: Vec<String>,
    /// Landing page of the research section; research categories point here.
    pub research_index: String,
    /// Home page; its `h2` sections become general records.
    pub home: String,
    /// Events page carrying the reading group section.
    pub reading_groups: String,
}

impl SourcePlan {
    pub fn defaults(base_url: &str) -> Self {
        let site = format!("{}{SITE_PATH}", base_url.trim_end_matches('/'));
        let events_index = format!("{site}/events/index.html");
        let home = format!("{site}/index.html");
        let research_index = format!("{site}/research/index.html");

        Self {
            listings: vec![
                ListingPlan {
                    url: format!("{site}/latest-news/events-overview/index.html"),
                    kind: ListingKind::Events,
                    interactive: true,
                },
                ListingPlan::fixed(events_index.clone(), ListingKind::Events),
                ListingPlan::fixed(home.clone(), ListingKind::Events),
                ListingPlan::fixed(format!("{site}/people/index.html"), ListingKind::People),
                ListingPlan::fixed(research_index.clone(), ListingKind::Research),
                ListingPlan::fixed(format!("{site}/latest-news/news/index.html"), ListingKind::News),
            ],
            research_pages: vec![format!("{site}/research/philosophy-of-machine-learning/")],
            research_index,
            home,
            reading_groups: events_index,
        }
    }

    /// Add seed URLs. People directories in the seed list replace the
    /// default people listing; anything else is read as an event listing.
    pub fn with_important_urls(mut self, urls: Vec<String>) -> Self {
        let (people, other): (Vec<String>, Vec<String>) =
            urls.into_iter().partition(|u| u.to_lowercase().contains("people"));

        if !people.is_empty() {
            self.listings.retain(|l| l.kind != ListingKind::People);
        }
        let added = people
            .into_iter()
            .map(|u| ListingPlan::fixed(u, ListingKind::People))
            .chain(other.into_iter().map(|u| ListingPlan::fixed(u, ListingKind::Events)));
        for plan in added {
            if !self.listings.iter().any(|l| l.url == plan.url) {
                self.listings.push(plan);
            }
        }
        self
    }

    /// Defaults plus the seed file in `data_dir`.
    pub fn load(base_url: &str, data_dir: &Path) -> Self {
        Self::defaults(base_url).with_important_urls(load_important_urls(&data_dir.join(IMPORTANT_URLS_FILE)))
    }

    pub fn listings_of(&self, kind: ListingKind) -> impl Iterator<Item = &ListingPlan> {
        self.listings.iter().filter(move |l| l.kind == kind)
    }
}

pub fn parse_important_urls(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// A missing file means no extra sources.
pub fn load_important_urls(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let urls = parse_important_urls(&text);
            info!(path = %path.display(), count = urls.len(), "Loaded important URLs");
            urls
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "No important URL file, using default sources");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read important URL file, using default sources");
            Vec::new()
        }
    }
}
