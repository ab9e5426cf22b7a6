use std::sync::LazyLock;

use campus_common::{canonical_url, Record, RecordKind};
use scraper::{ElementRef, Html, Selector};

use super::sections::labeled_fields;
use super::text::{cap_chars, clean_text, element_lines, element_text, main_content, MAX_DESCRIPTION_CHARS};
use crate::error::ExtractionError;

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid selector"));
static SUBHEADINGS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3").expect("valid selector"));
static IMAGES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").expect("valid selector"));

fn email(root: ElementRef<'_>) -> Option<String> {
    root.select(&ANCHORS).find_map(|a| {
        let text = element_text(a);
        if text.contains('@') {
            return Some(text);
        }
        a.value()
            .attr("href")
            .and_then(|href| href.strip_prefix("mailto:"))
            .map(|addr| addr.split('?').next().unwrap_or(addr).to_string())
    })
}

fn phone(root: ElementRef<'_>) -> Option<String> {
    root.select(&ANCHORS).find_map(|a| {
        let href = a.value().attr("href")?.strip_prefix("tel:")?;
        let text = element_text(a);
        Some(if text.is_empty() { href.to_string() } else { text })
    })
}

fn image(root: ElementRef<'_>, url: &str) -> Option<String> {
    let base = url::Url::parse(url).ok();
    root.select(&IMAGES)
        .filter_map(|img| img.value().attr("src"))
        .find_map(|src| canonical_url(src, base.as_ref()))
}

/// Text of every sibling after the "Research interests" heading up to the next heading.
fn research_interests(root: ElementRef<'_>) -> Option<String> {
    let heading = root
        .select(&SUBHEADINGS)
        .find(|h| element_text(*h).to_lowercase().contains("research interests"))?;

    let mut parts = Vec::new();
    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        if matches!(sibling.value().name(), "h1" | "h2" | "h3") {
            break;
        }
        let text = element_text(sibling);
        if !text.is_empty() {
            parts.push(text);
        }
    }
    let joined = parts.join(" ");
    (!joined.is_empty()).then_some(joined)
}

pub(crate) fn extract_person(doc: &Html, url: &str) -> Result<Record, ExtractionError> {
    let name = doc
        .select(&H1)
        .map(element_text)
        .find(|t| !t.is_empty())
        .ok_or_else(|| ExtractionError::MissingElement {
            url: url.to_string(),
            element: "h1",
        })?;

    let root = main_content(doc).ok_or_else(|| ExtractionError::MissingElement {
        url: url.to_string(),
        element: "main content",
    })?;

    let mut fields = labeled_fields(root);
    if let Some(email) = email(root) {
        fields.insert("email".to_string(), email);
    }
    if let Some(phone) = phone(root) {
        fields.insert("phone".to_string(), phone);
    }
    if let Some(image) = image(root, url) {
        fields.insert("image_url".to_string(), image);
    }
    if let Some(interests) = research_interests(root) {
        fields.insert("research_interests_text".to_string(), interests);
    }

    let mut record = Record::new(RecordKind::Person, url, name);
    record.description = cap_chars(&clean_text(&element_lines(root)), MAX_DESCRIPTION_CHARS);
    record.fields = fields;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.example.edu/inst/en/people/contact-page/roe-jane/";

    #[test]
    fn profile_fields() {
        let doc = Html::parse_document(
            r#"<div id="r-main">
                <h1>Dr. Jane Roe</h1>
                <img src="/img/roe.jpg">
                <p><strong>Position:</strong> Doctoral fellow</p>
                <a href="mailto:jane.roe@example.edu">jane.roe@example.edu</a>
                <a href="tel:+49891234">+49 89 1234</a>
                <h2>Research interests</h2>
                <p>Formal epistemology,</p>
                <ul><li>philosophy of science</li></ul>
                <h2>Publications</h2>
                <p>Many.</p>
            </div>"#,
        );
        let record = extract_person(&doc, URL).unwrap();
        assert_eq!(record.title, "Dr. Jane Roe");
        assert_eq!(record.field("position"), Some("Doctoral fellow"));
        assert_eq!(record.field("email"), Some("jane.roe@example.edu"));
        assert_eq!(record.field("phone"), Some("+49 89 1234"));
        assert_eq!(record.field("image_url"), Some("https://www.example.edu/img/roe.jpg"));
        assert_eq!(
            record.field("research_interests_text"),
            Some("Formal epistemology, philosophy of science")
        );
    }

    #[test]
    fn mailto_without_visible_address() {
        let doc = Html::parse_document(r#"<main><h1>A</h1><a href="mailto:a@example.edu?subject=hi">Mail</a></main>"#);
        let record = extract_person(&doc, URL).unwrap();
        assert_eq!(record.field("email"), Some("a@example.edu"));
    }

    #[test]
    fn missing_name_drops_the_record() {
        let doc = Html::parse_document("<main><p>No heading</p></main>");
        assert!(matches!(
            extract_person(&doc, URL),
            Err(ExtractionError::MissingElement { element: "h1", .. })
        ));
    }
}
