use std::collections::BTreeSet;

use campus_common::CategorizedDataset;

/// Research topics known independently of the research dataset.
pub const TOPIC_TAXONOMY: &[&str] = &[
    "Logic",
    "Philosophy of Language",
    "Philosophy of Science",
    "Philosophy of Mathematics",
    "Philosophy of Physics",
    "Philosophy of Biology",
    "Philosophy of Machine Learning",
    "Mathematical Philosophy",
    "Formal Epistemology",
    "Social Epistemology",
    "Decision Theory",
    "Game Theory",
    "Probability",
    "Causation",
    "Metaphysics",
    "Ethics",
    "Political Philosophy",
];

/// Substring matcher over a topic vocabulary.
#[derive(Debug, Clone)]
pub struct TopicMatcher {
    /// (lowercase needle, display label)
    terms: Vec<(String, String)>,
}

impl Default for TopicMatcher {
    fn default() -> Self {
        Self::new(TOPIC_TAXONOMY.iter().map(|t| t.to_string()))
    }
}

impl TopicMatcher {
    pub fn new(labels: impl IntoIterator<Item = String>) -> Self {
        let mut seen = BTreeSet::new();
        let terms = labels
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| l.chars().count() > 2)
            .filter(|l| seen.insert(l.to_lowercase()))
            .map(|l| (l.to_lowercase(), l))
            .collect();
        Self { terms }
    }

    /// The fixed taxonomy plus the research category names and subtopics.
    pub fn with_research(research: &CategorizedDataset) -> Self {
        let dynamic = research
            .values()
            .flat_map(|c| std::iter::once(c.name.clone()).chain(c.subtopics.iter().cloned()));
        Self::new(TOPIC_TAXONOMY.iter().map(|t| t.to_string()).chain(dynamic))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Sorted, deduplicated labels whose term occurs in `text`.
    pub fn match_topics(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let lower = text.to_lowercase();
        self.terms
            .iter()
            .filter(|(needle, _)| lower.contains(needle.as_str()))
            .map(|(_, label)| label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
