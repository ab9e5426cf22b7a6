use std::collections::HashSet;

use campus_common::canonical_url;
use scraper::{Html, Selector};
use tracing::warn;

/// Which anchors on a listing page point at detail pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMarker {
    /// CSS selector for candidate anchors (usually class-based).
    pub selector: String,
    /// Keep only hrefs containing one of these (case-insensitive). Empty keeps all.
    pub href_patterns: Vec<String>,
    /// Drop hrefs containing any of these.
    pub exclude: Vec<String>,
}

impl LinkMarker {
    pub fn selector(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            href_patterns: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn patterns(mut self, patterns: &[&str]) -> Self {
        self.href_patterns = patterns.iter().map(|p| p.to_lowercase()).collect();
        self
    }

    pub fn excluding(mut self, exclude: &[&str]) -> Self {
        self.exclude = exclude.iter().map(|p| p.to_lowercase()).collect();
        self
    }

    /// Event teasers, plus anchors whose slug names an academic activity.
    pub fn events() -> Self {
        Self::selector("a[href]").patterns(&[
            "/event/",
            "talk-",
            "workshop-",
            "conference-",
            "colloquium-",
            "seminar-",
            "reading-group",
        ])
    }

    /// Profile links on a people directory.
    pub fn people() -> Self {
        Self::selector("a[href]")
            .patterns(&["contact-page/", "/faculty/", "/staff/"])
            .excluding(&["people/index.html"])
    }

    /// Research sub-pages, without the publication lists.
    pub fn research() -> Self {
        Self::selector("a[href]")
            .patterns(&["/research/"])
            .excluding(&["publications"])
    }

    /// News articles, without the event pages that share the news section.
    pub fn news() -> Self {
        Self::selector("a[href]")
            .patterns(&["/news/"])
            .excluding(&["/event/", "events-overview"])
    }

    pub fn accepts(&self, href: &str) -> bool {
        let lower = href.to_lowercase();
        if self.exclude.iter().any(|e| lower.contains(e.as_str())) {
            return false;
        }
        self.href_patterns.is_empty() || self.href_patterns.iter().any(|p| lower.contains(p.as_str()))
    }
}

/// Extract detail-page URLs from a listing document.
///
/// Anchors matching the marker are resolved against `base_url`,
/// canonicalized, and deduplicated in document order. The listing page
/// itself is never returned.
pub fn extract_marked_links(html: &str, base_url: &str, marker: &LinkMarker) -> Vec<String> {
    let selector = match Selector::parse(&marker.selector) {
        Ok(s) => s,
        Err(e) => {
            warn!(selector = marker.selector.as_str(), error = %e, "Invalid link selector");
            return Vec::new();
        }
    };

    let base = url::Url::parse(base_url).ok();
    let own = canonical_url(base_url, None);
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !marker.accepts(href) {
            continue;
        }
        let Some(resolved) = canonical_url(href, base.as_ref()) else {
            continue;
        };
        if own.as_deref() == Some(resolved.as_str()) {
            continue;
        }
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.example.edu/inst/en/events/index.html";

    fn all() -> LinkMarker {
        LinkMarker::selector("a")
    }

    #[test]
    fn href_links_are_extracted() {
        let html = r#"<a href="https://www.example.edu/inst/en/event/a.html">A</a>"#;
        let links = extract_marked_links(html, BASE, &all());
        assert_eq!(links, vec!["https://www.example.edu/inst/en/event/a.html"]);
    }

    #[test]
    fn class_selector_filters_anchors() {
        let html = r#"
            <a class="teaser__link" href="/inst/en/event/a.html">A</a>
            <a class="nav" href="/inst/en/contact.html">Contact</a>
        "#;
        let marker = LinkMarker::selector("a.teaser__link");
        let links = extract_marked_links(html, BASE, &marker);
        assert_eq!(links, vec!["https://www.example.edu/inst/en/event/a.html"]);
    }

    #[test]
    fn relative_hrefs_resolve_against_listing() {
        let html = r#"<a href="talk-jane-doe.html">Talk</a>"#;
        let links = extract_marked_links(html, BASE, &LinkMarker::events());
        assert_eq!(links, vec!["https://www.example.edu/inst/en/events/talk-jane-doe.html"]);
    }

    #[test]
    fn duplicate_targets_collapse() {
        let html = r#"
            <a href="/inst/en/event/a.html">one</a>
            <a href="/inst/en/event/a.html#details">two</a>
            <a href="https://www.example.edu/inst/en/event/a.html?utm_source=x">three</a>
        "#;
        let links = extract_marked_links(html, BASE, &all());
        assert_eq!(links, vec!["https://www.example.edu/inst/en/event/a.html"]);
    }

    #[test]
    fn listing_page_itself_is_skipped() {
        let html = r##"<a href="index.html">Events</a><a href="#top">top</a>"##;
        assert!(extract_marked_links(html, BASE, &all()).is_empty());
    }

    #[test]
    fn image_and_script_urls_are_not_links() {
        let html = r#"<img src="https://cdn.example.edu/a.png"><script src="/app.js"></script>"#;
        assert!(extract_marked_links(html, BASE, &all()).is_empty());
    }

    #[test]
    fn mailto_links_are_dropped() {
        let html = r#"<a href="mailto:office@example.edu">Mail</a>"#;
        assert!(extract_marked_links(html, BASE, &all()).is_empty());
    }

    #[test]
    fn people_marker_excludes_directory() {
        let html = r#"
            <a href="contact-page/doe-john/index.html">Doe, John</a>
            <a href="/inst/en/people/index.html">People</a>
        "#;
        let base = "https://www.example.edu/inst/en/people/index.html";
        let links = extract_marked_links(html, base, &LinkMarker::people());
        assert_eq!(
            links,
            vec!["https://www.example.edu/inst/en/people/contact-page/doe-john/"]
        );
    }

    #[test]
    fn invalid_selector_returns_empty() {
        let html = r#"<a href="/a">A</a>"#;
        assert!(extract_marked_links(html, BASE, &LinkMarker::selector("a[")).is_empty());
    }

    #[test]
    fn empty_html_returns_empty() {
        assert!(extract_marked_links("", BASE, &all()).is_empty());
    }
}
