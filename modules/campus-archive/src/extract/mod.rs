// HTML → semi-structured records.
//
// Listings yield candidate URLs; detail pages yield one Record with raw
// labeled `fields`. Normalization into typed metadata happens later.

mod event;
mod general;
mod person;
mod research;
pub mod sections;
pub mod text;

use campus_common::Record;
use scraper::Html;

use crate::error::ExtractionError;
use crate::links::{extract_marked_links, LinkMarker};

pub use general::{extract_general_sections, extract_reading_groups};

/// A fetched page: its canonical URL and decoded HTML.
#[derive(Debug, Clone)]
pub struct Document {
    pub url: String,
    pub html: String,
}

impl Document {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    EventListing,
    EventDetail,
    PersonListing,
    PersonDetail,
    ResearchDetail,
    NewsDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Canonical, deduplicated detail URLs.
    Listing(Vec<String>),
    Record(Box<Record>),
}

impl Extraction {
    pub fn into_record(self) -> Option<Record> {
        match self {
            Extraction::Record(record) => Some(*record),
            Extraction::Listing(_) => None,
        }
    }

    pub fn into_links(self) -> Vec<String> {
        match self {
            Extraction::Listing(links) => links,
            Extraction::Record(_) => Vec::new(),
        }
    }
}

/// `extract(raw_document, page_kind)`.
pub fn extract(doc: &Document, kind: PageKind) -> Result<Extraction, ExtractionError> {
    if doc.html.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument(doc.url.clone()));
    }

    let extraction = match kind {
        PageKind::EventListing => {
            Extraction::Listing(extract_marked_links(&doc.html, &doc.url, &LinkMarker::events()))
        }
        PageKind::PersonListing => {
            Extraction::Listing(extract_marked_links(&doc.html, &doc.url, &LinkMarker::people()))
        }
        PageKind::EventDetail => {
            let html = Html::parse_document(&doc.html);
            Extraction::Record(Box::new(event::extract_event(&html, &doc.url, false)?))
        }
        PageKind::NewsDetail => {
            let html = Html::parse_document(&doc.html);
            Extraction::Record(Box::new(event::extract_event(&html, &doc.url, true)?))
        }
        PageKind::PersonDetail => {
            let html = Html::parse_document(&doc.html);
            Extraction::Record(Box::new(person::extract_person(&html, &doc.url)?))
        }
        PageKind::ResearchDetail => {
            let html = Html::parse_document(&doc.html);
            Extraction::Record(Box::new(research::extract_research(&html, &doc.url)?))
        }
    };

    Ok(extraction)
}
