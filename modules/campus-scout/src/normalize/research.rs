use std::sync::LazyLock;

use campus_common::{Category, CategorizedDataset, Record};
use regex::Regex;

/// A fixed research area and the title keywords that bin projects into it.
pub struct ResearchArea {
    pub id: &'static str,
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Checked in order; the last area catches everything else.
pub const RESEARCH_AREAS: &[ResearchArea] = &[
    ResearchArea {
        id: "logic",
        name: "Logic and Philosophy of Language",
        keywords: &["logic", "language", "semantic", "truth"],
    },
    ResearchArea {
        id: "philsc",
        name: "Philosophy of Science",
        keywords: &["science", "physics", "biology", "explanation", "machine learning"],
    },
    ResearchArea {
        id: "decision",
        name: "Decision Theory",
        keywords: &["decision", "game theory", "rationality", "choice"],
    },
    ResearchArea {
        id: "structure",
        name: "Mathematical Philosophy",
        keywords: &["mathematical", "formal"],
    },
];

/// The area a project title falls into.
pub fn categorize(title: &str) -> &'static ResearchArea {
    let lower = title.to_lowercase();
    RESEARCH_AREAS
        .iter()
        .find(|area| area.keywords.iter().any(|k| lower.contains(k)))
        .unwrap_or(&RESEARCH_AREAS[RESEARCH_AREAS.len() - 1])
}

/// Bin research records into the fixed areas. Every area is present even
/// when empty so topic linking always sees the area names.
pub fn categorize_research(records: Vec<Record>, research_url: &str) -> CategorizedDataset {
    let mut dataset: CategorizedDataset = RESEARCH_AREAS
        .iter()
        .map(|area| {
            let mut category = Category::new(area.id, area.name);
            category.description = format!("Research area focusing on {}", area.name);
            category.url = research_url.to_string();
            (area.id.to_string(), category)
        })
        .collect();

    for record in records {
        let area = categorize(&record.title);
        if let Some(category) = dataset.get_mut(area.id) {
            category.insert(record);
        }
    }
    for category in dataset.values_mut() {
        category.subtopics = category.items.values().map(|r| r.title.clone()).collect();
    }
    dataset
}

/// Labeled values that follow one cue and stop at the next one.
static CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(funded by|project duration|people|chair|project page):").expect("valid regex")
});

static PROJECT_LEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([^(,;]+?)\s*\(project leader\)").expect("valid regex"));

fn cue_key(cue: &str) -> Option<&'static str> {
    match cue.to_lowercase().as_str() {
        "funded by" => Some("funded_by"),
        "project duration" => Some("duration"),
        "people" => Some("team"),
        "chair" => Some("chair"),
        _ => None,
    }
}

/// `funded_by`, `duration`, `team` and `chair` from running text such as
/// "Funded by: DFG Project duration: 2023 - 2026 People: …".
pub fn research_cues(text: &str) -> Vec<(&'static str, String)> {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let marks: Vec<_> = CUES.captures_iter(&flat).collect();

    let mut found = Vec::new();
    for (i, caps) in marks.iter().enumerate() {
        let (Some(whole), Some(cue)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = marks
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(flat.len(), |m| m.start());
        let value = flat[whole.end()..end].trim().trim_end_matches(['.', ',', ';']).trim();
        if let Some(key) = cue_key(cue.as_str()) {
            if !value.is_empty() && !found.iter().any(|(k, _)| *k == key) {
                found.push((key, value.to_string()));
            }
        }
    }
    found
}

/// The name marked "(Project leader)" in a team listing.
pub fn project_leader(team: &str) -> Option<String> {
    PROJECT_LEADER
        .captures(team)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}
