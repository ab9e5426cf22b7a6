use std::sync::LazyLock;

use campus_common::MetaValue;
use regex::Regex;

/// Canonical role and the lowercase phrases that signal it. More specific
/// roles come before the roles they contain.
pub const ROLE_VOCABULARY: &[(&str, &[&str])] = &[
    ("Co-Director", &["co-director", "codirector"]),
    ("Director", &["director"]),
    ("Chair holder", &["chair holder", "holder of the chair", "chairholder"]),
    ("Head", &["head of"]),
    ("Group leader", &["research group leader", "group leader"]),
    ("Assistant Professor", &["assistant professor"]),
    ("Professor", &["professor"]),
    ("Postdoctoral fellow", &["postdoctoral fellow", "postdoc fellow"]),
    ("Postdoctoral researcher", &["postdoctoral researcher", "postdoc"]),
    ("Doctoral fellow", &["doctoral fellow"]),
    ("Doctoral student", &["doctoral student", "phd student", "doctoral candidate"]),
    ("Teaching fellow", &["teaching fellow"]),
    ("Visiting fellow", &["visiting fellow"]),
    ("Visiting researcher", &["visiting researcher", "visiting scholar"]),
    ("Research fellow", &["research fellow"]),
    ("Lecturer", &["lecturer"]),
    ("Akademischer Rat", &["akademischer rat", "akademische rätin"]),
    ("Secretary", &["secretary", "administration"]),
    ("Student assistant", &["student assistant"]),
    ("Emeritus", &["emeritus", "emerita"]),
];

/// The institute's chairs.
pub const ORG_UNITS: &[&str] = &[
    "Chair of Logic and Philosophy of Language",
    "Chair of Philosophy of Science",
    "Chair of Philosophy and Decision Theory",
    "Chair of Theoretical Philosophy",
    "Chair of Philosophy and Political Theory",
];

static CHAIR_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bChair of [A-Z][^,.;:\n()]{2,80}").expect("valid regex"));

/// Earliest-occurring vocabulary role in `text`. At equal positions the
/// vocabulary order decides.
pub fn find_role(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    ROLE_VOCABULARY
        .iter()
        .enumerate()
        .filter_map(|(rank, (role, phrases))| {
            phrases
                .iter()
                .filter_map(|p| lower.find(p))
                .min()
                .map(|pos| (pos, rank, *role))
        })
        .min()
        .map(|(_, _, role)| role)
}

/// Role from labeled profile fields first, then from free text.
pub fn role_from<'a>(labeled: impl IntoIterator<Item = &'a str>, free_text: &str) -> Option<&'static str> {
    labeled
        .into_iter()
        .find_map(find_role)
        .or_else(|| find_role(free_text))
}

/// Every known unit mentioned in `text`, in vocabulary order. When none of
/// the known units appear, any `Chair of …` phrase is taken verbatim.
pub fn find_units(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let known: Vec<String> = ORG_UNITS
        .iter()
        .filter(|u| lower.contains(&u.to_lowercase()))
        .map(|u| u.to_string())
        .collect();
    if !known.is_empty() {
        return known;
    }

    let mut found: Vec<String> = Vec::new();
    for m in CHAIR_OF.find_iter(text) {
        let unit = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
        if !found.contains(&unit) {
            found.push(unit);
        }
    }
    found
}

/// One unit is stored as text, several as a list.
pub fn units_value(mut units: Vec<String>) -> Option<MetaValue> {
    match units.len() {
        0 => None,
        1 => units.pop().map(MetaValue::Text),
        _ => Some(MetaValue::List(units)),
    }
}
