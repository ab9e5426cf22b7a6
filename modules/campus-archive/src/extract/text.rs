use std::sync::LazyLock;

pub use campus_common::slugify;
use scraper::{ElementRef, Html, Selector};

/// Longest description kept on a record.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Navigation and share chrome that shows up as whole lines in page text.
const NOISE_LINES: &[&str] = &[
    "Home",
    "Latest news",
    "Events overview",
    "Event",
    "up",
    "Share",
    "To share copy",
    "Link",
    "Share on",
    "Facebook",
    "X",
    "LinkedIn",
    "Instagram",
];

const BREADCRUMB_MARKERS: &[&str] = &["You are in the following website hierarchy", "You are here:"];

static MAIN_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["div#r-main", "main", "article", "body"]
        .iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
});

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));

/// Collapse all whitespace runs to single spaces.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Element text with whitespace collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

/// Element text keeping one line per text node, for line-based cleaning.
pub fn element_lines(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The page's main content container, falling back to `<body>`.
pub fn main_content(doc: &Html) -> Option<ElementRef<'_>> {
    MAIN_SELECTORS
        .iter()
        .find_map(|sel| doc.select(sel).next())
}

pub fn first_heading(doc: &Html) -> Option<String> {
    doc.select(&H1)
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// Drop breadcrumb, navigation, share and footer lines.
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !BREADCRUMB_MARKERS.iter().any(|m| line.contains(m)))
        .filter(|line| !NOISE_LINES.contains(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate on a char boundary.
pub fn cap_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Title from the last URL segment: `talk-jane-doe.html` → `Talk Jane Doe`.
pub fn title_from_url(url: &str) -> String {
    let slug = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".html");
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
