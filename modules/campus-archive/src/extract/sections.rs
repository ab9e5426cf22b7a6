// Label-driven field reading.
//
// Detail pages mark their fields with a heading ("Date:", "Location") whose
// next sibling holds the value. Definition lists (`dt`/`dd`) and inline bold
// labels (`<strong>Date:</strong> 4 February 2026`) follow the same shape.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use super::text::{collapse_ws, element_text};

static BLOCK_LABELS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3, h4, h5, h6, dt").expect("valid selector"));

static INLINE_LABELS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong, b").expect("valid selector"));

static ADDRESS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("address, .c-address, [itemprop='address'], [itemtype*='PostalAddress']")
        .expect("valid selector")
});

/// Links inside the address block that are navigation, not data.
pub const ADDRESS_CHROME: &[&str] = &["room finder", "roomfinder", "raumfinder", "show on map", "google maps"];

static CHROME_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = ADDRESS_CHROME.iter().map(|p| regex::escape(p)).collect();
    Regex::new(&format!("(?i)(?:{})", alternatives.join("|"))).expect("valid regex")
});

/// `"  Date :"` → `"date"`.
pub fn normalize_label(raw: &str) -> String {
    let collapsed = collapse_ws(raw).to_lowercase();
    collapsed.trim_end_matches(':').trim().to_string()
}

/// Map a normalized label onto a record field key. Unknown labels are ignored.
pub fn field_for_label(label: &str) -> Option<&'static str> {
    let key = match label {
        "date" | "dates" | "when" => "date",
        "time" => "time",
        "location" | "venue" | "place" | "where" => "location",
        "title" | "talk title" => "title",
        "abstract" | "summary" => "abstract",
        "speaker" | "speakers" => "speaker",
        "organizer" | "organizers" | "organiser" | "organisers" => "organizer",
        "position" => "position",
        "role" => "role",
        "funded by" | "funding" => "funded_by",
        "project duration" | "duration" => "duration",
        "people" | "team" | "project team" => "team",
        "chair" => "chair",
        _ => return None,
    };
    Some(key)
}

fn next_element_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Text following an inline label inside the same parent.
fn trailing_text(el: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for sibling in el.next_siblings() {
        match sibling.value() {
            Node::Text(t) => parts.push(t.text.to_string()),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(sibling) {
                    parts.push(child.text().collect::<Vec<_>>().join(" "));
                }
            }
            _ => {}
        }
    }
    collapse_ws(&parts.join(" "))
}

/// Scan headings, `dt`s and bold labels, returning recognized field → value.
/// The first occurrence of a field wins.
pub fn labeled_fields(root: ElementRef<'_>) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    for heading in root.select(&BLOCK_LABELS) {
        let Some(key) = field_for_label(&normalize_label(&element_text(heading))) else {
            continue;
        };
        let Some(value_el) = next_element_sibling(heading) else {
            continue;
        };
        let value = element_text(value_el);
        if !value.is_empty() {
            fields.entry(key.to_string()).or_insert(value);
        }
    }

    for label in root.select(&INLINE_LABELS) {
        let Some(key) = field_for_label(&normalize_label(&element_text(label))) else {
            continue;
        };
        let value = trailing_text(label);
        if !value.is_empty() {
            fields.entry(key.to_string()).or_insert(value);
        }
    }

    fields
}

/// Remove UI affordance text ("Room finder" …) and tidy the separators it leaves.
pub fn strip_chrome(text: &str) -> String {
    let stripped = CHROME_RE.replace_all(text, " ");
    collapse_ws(&stripped)
        .trim_matches(|c: char| c == ',' || c == '|' || c == '-' || c.is_whitespace())
        .to_string()
}

/// Postal address from its dedicated container, never from labeled sections.
pub fn address(doc: &Html) -> Option<String> {
    let el = doc.select(&ADDRESS).next()?;
    let lines: Vec<String> = el
        .text()
        .map(strip_chrome)
        .filter(|t| !t.is_empty())
        .collect();
    let joined = lines.join(", ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(doc: &Html) -> ElementRef<'_> {
        doc.root_element()
    }

    #[test]
    fn label_normalization() {
        assert_eq!(normalize_label("  Date :"), "date");
        assert_eq!(normalize_label("LOCATION:"), "location");
        assert_eq!(normalize_label("Talk\n  Title:"), "talk title");
    }

    #[test]
    fn heading_sibling_values() {
        let doc = Html::parse_document(
            r#"<div>
                <h3>Date:</h3><p>4 February 2026</p>
                <h3>Abstract</h3>
                <p>We study   models.</p>
                <h3>Newsletter</h3><p>ignored</p>
            </div>"#,
        );
        let fields = labeled_fields(root(&doc));
        assert_eq!(fields.get("date").unwrap(), "4 February 2026");
        assert_eq!(fields.get("abstract").unwrap(), "We study models.");
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn definition_list_values() {
        let doc = Html::parse_document(
            "<dl><dt>Time:</dt><dd>10:00 am - 12:00 pm</dd><dt>Speakers</dt><dd>Jane Roe</dd></dl>",
        );
        let fields = labeled_fields(root(&doc));
        assert_eq!(fields.get("time").unwrap(), "10:00 am - 12:00 pm");
        assert_eq!(fields.get("speaker").unwrap(), "Jane Roe");
    }

    #[test]
    fn inline_bold_labels() {
        let doc = Html::parse_document("<p><strong>Date:</strong> 28 January 2026</p>");
        let fields = labeled_fields(root(&doc));
        assert_eq!(fields.get("date").unwrap(), "28 January 2026");
    }

    #[test]
    fn heading_without_sibling_is_skipped() {
        let doc = Html::parse_document("<div><h3>Abstract</h3></div>");
        assert!(labeled_fields(root(&doc)).is_empty());
    }

    #[test]
    fn address_excludes_room_finder() {
        let doc = Html::parse_document(
            r#"<address>
                <span>Ludwigstr. 31</span>
                <span>Ground floor, room 021</span>
                <a href="/roomfinder?id=21">Room finder</a>
            </address>"#,
        );
        let location = address(&doc).unwrap();
        assert_eq!(location, "Ludwigstr. 31, Ground floor, room 021");
        assert!(!location.to_lowercase().contains("room finder"));
    }

    #[test]
    fn chrome_inside_running_text() {
        assert_eq!(strip_chrome("Geschwister-Scholl-Platz 1 | Room finder"), "Geschwister-Scholl-Platz 1");
    }

    #[test]
    fn no_address_container() {
        let doc = Html::parse_document("<p>Ludwigstr. 31</p>");
        assert!(address(&doc).is_none());
    }
}
