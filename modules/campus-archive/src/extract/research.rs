use std::sync::LazyLock;

use campus_common::{Record, RecordKind};
use scraper::{Html, Selector};

use super::sections::labeled_fields;
use super::text::{cap_chars, clean_text, element_lines, first_heading, MAX_DESCRIPTION_CHARS};
use crate::error::ExtractionError;

// Research pages without a real content container are navigation stubs.
static CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#r-main, main, article").expect("valid selector"));

pub(crate) fn extract_research(doc: &Html, url: &str) -> Result<Record, ExtractionError> {
    let root = doc
        .select(&CONTENT)
        .next()
        .ok_or_else(|| ExtractionError::MissingElement {
            url: url.to_string(),
            element: "main content",
        })?;

    let title = first_heading(doc).unwrap_or_else(|| "Research Project".to_string());

    let mut record = Record::new(RecordKind::Research, url, title);
    record.description = cap_chars(&clean_text(&element_lines(root)), MAX_DESCRIPTION_CHARS);
    record.fields = labeled_fields(root);
    Ok(record)
}
