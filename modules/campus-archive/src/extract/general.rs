// Home-page sections and reading groups. Neither has detail pages of its
// own, so one document yields many records.

use std::sync::LazyLock;

use campus_common::{canonical_url, Record, RecordKind};
use scraper::{ElementRef, Html, Selector};

use super::text::{element_text, main_content, slugify};

static H2: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").expect("valid selector"));
static TOP_HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2").expect("valid selector"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

const MIN_SECTION_TITLE: usize = 3;
const MAX_GROUP_TITLE: usize = 100;

fn is_top_heading(el: &ElementRef<'_>) -> bool {
    matches!(el.value().name(), "h1" | "h2")
}

/// Siblings after `heading` up to the next `h1`/`h2`.
fn section_body<'a>(heading: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| !is_top_heading(el))
}

fn anchored(page_url: &str, title: &str) -> String {
    let slug: String = slugify(title).chars().take(30).collect();
    format!("{page_url}#{}", slug.trim_end_matches('-'))
}

/// One `General` record per `h2` section of the page's main content.
pub fn extract_general_sections(html: &str, page_url: &str) -> Vec<Record> {
    let doc = Html::parse_document(html);
    let Some(root) = main_content(&doc) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for heading in root.select(&H2) {
        let title = element_text(heading);
        if title.chars().count() < MIN_SECTION_TITLE {
            continue;
        }
        let body: Vec<String> = section_body(heading)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        if body.is_empty() {
            continue;
        }
        let mut record = Record::new(RecordKind::General, anchored(page_url, &title), format!("General: {title}"));
        record.description = body.join("\n");
        records.push(record);
    }
    records
}

/// Groups listed under the "Reading groups" heading of the events page.
///
/// A short block carrying a link starts a new group; following blocks are
/// its description.
pub fn extract_reading_groups(html: &str, page_url: &str) -> Vec<Record> {
    let doc = Html::parse_document(html);
    let Some(root) = main_content(&doc) else {
        return Vec::new();
    };
    let Some(header) = root
        .select(&TOP_HEADINGS)
        .find(|h| element_text(*h).to_lowercase().contains("reading groups"))
    else {
        return Vec::new();
    };

    let base = url::Url::parse(page_url).ok();
    let own = canonical_url(page_url, None);
    let mut groups: Vec<Record> = Vec::new();

    for block in section_body(header) {
        let text = element_text(block);
        if text.is_empty() {
            continue;
        }
        let link = block
            .select(&ANCHOR)
            .next()
            .or_else(|| (block.value().name() == "a").then_some(block));

        match link {
            Some(link) if text.chars().count() < MAX_GROUP_TITLE => {
                let target = link
                    .value()
                    .attr("href")
                    .and_then(|href| canonical_url(href, base.as_ref()));
                let url = match target {
                    Some(target) if Some(&target) != own.as_ref() => target,
                    _ => anchored(page_url, &text),
                };
                groups.push(Record::new(RecordKind::ReadingGroup, url, format!("Reading Group: {text}")));
            }
            _ => {
                if let Some(current) = groups.last_mut() {
                    if !current.description.is_empty() {
                        current.description.push('\n');
                    }
                    current.description.push_str(&text);
                }
            }
        }
    }
    groups
}
