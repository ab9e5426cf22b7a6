use campus_common::{Record, RecordKind};
use scraper::Html;

use super::sections::{address, labeled_fields, strip_chrome};
use super::text::{cap_chars, clean_text, element_lines, first_heading, main_content, title_from_url, MAX_DESCRIPTION_CHARS};
use crate::error::ExtractionError;

/// Event and news detail pages share one layout: a heading, labeled
/// sections, an optional address block, and running text.
pub(crate) fn extract_event(doc: &Html, url: &str, news: bool) -> Result<Record, ExtractionError> {
    let root = main_content(doc).ok_or_else(|| ExtractionError::MissingElement {
        url: url.to_string(),
        element: "main content",
    })?;

    let mut fields = labeled_fields(root);

    let title = fields
        .remove("title")
        .or_else(|| first_heading(doc))
        .unwrap_or_else(|| title_from_url(url));

    let location = address(doc).or_else(|| {
        fields
            .get("location")
            .map(|raw| strip_chrome(raw))
            .filter(|s| !s.is_empty())
    });
    match location {
        Some(location) => {
            fields.insert("location".to_string(), location);
        }
        None => {
            fields.remove("location");
        }
    }

    let abstract_text = fields.remove("abstract").filter(|a| !a.is_empty());

    let description = cap_chars(&clean_text(&element_lines(root)), MAX_DESCRIPTION_CHARS);
    if description.is_empty() && title.is_empty() {
        return Err(ExtractionError::EmptyDocument(url.to_string()));
    }

    let kind = if news { RecordKind::News } else { RecordKind::Event };
    let mut record = Record::new(kind, url, title);
    record.description = description;
    record.abstract_text = abstract_text;
    record.fields = fields;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.example.edu/inst/en/events/talk-jane-roe.html";

    fn event(html: &str) -> Record {
        extract_event(&Html::parse_document(html), URL, false).unwrap()
    }

    #[test]
    fn labeled_event_page() {
        let record = event(
            r#"<html><body><div id="r-main">
                <h1>Talk: Jane Roe (Oxford)</h1>
                <p>You are here: Home &gt; Events</p>
                <h3>Date:</h3><p>4 February 2026</p>
                <h3>Time:</h3><p>4:00 pm - 6:00 pm</p>
                <h3>Title:</h3><p>Causal Models and Explanation</p>
                <h3>Abstract:</h3><p>We study causal models.</p>
                <address>Ludwigstr. 31 <a href="/roomfinder">Room finder</a></address>
            </div></body></html>"#,
        );
        assert_eq!(record.kind, RecordKind::Event);
        assert_eq!(record.title, "Causal Models and Explanation");
        assert_eq!(record.field("date"), Some("4 February 2026"));
        assert_eq!(record.field("time"), Some("4:00 pm - 6:00 pm"));
        assert_eq!(record.field("location"), Some("Ludwigstr. 31"));
        assert_eq!(record.abstract_text.as_deref(), Some("We study causal models."));
        assert!(!record.description.contains("You are here"));
    }

    #[test]
    fn missing_abstract_is_absent_not_an_error() {
        let record = event("<main><h1>Workshop</h1><h3>Date</h3><p>1 March 2026</p></main>");
        assert!(record.abstract_text.is_none());
        assert_eq!(record.title, "Workshop");
    }

    #[test]
    fn title_falls_back_to_url_slug() {
        let record = event("<main><p>Some text</p></main>");
        assert_eq!(record.title, "Talk Jane Roe");
    }

    #[test]
    fn labeled_location_is_stripped_of_chrome() {
        let record = event("<main><h1>T</h1><h3>Location:</h3><p>Room 021 | Room finder</p></main>");
        assert_eq!(record.field("location"), Some("Room 021"));
    }

    #[test]
    fn long_descriptions_are_capped() {
        let body = "word ".repeat(3000);
        let record = event(&format!("<main><h1>T</h1><p>{body}</p></main>"));
        assert_eq!(record.description.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn news_kind() {
        let record = extract_event(&Html::parse_document("<main><h1>New chair</h1></main>"), URL, true).unwrap();
        assert_eq!(record.kind, RecordKind::News);
    }
}
