// Metadata Normalizer: raw labeled fields and free text → typed metadata.
//
// Every derived key is recomputed from `fields`, `title` and `description`
// alone, so normalizing an already-normalized record is a no-op.

pub mod dates;
pub mod research;
pub mod roles;
pub mod topics;

use campus_common::{MetaValue, Record, RecordKind};
use thiserror::Error;
use tracing::warn;

pub use research::{categorize, categorize_research, RESEARCH_AREAS};
pub use topics::TopicMatcher;

/// Keys owned by the normalizer. Cleared before each run.
const DERIVED_KEYS: &[&str] = &[
    "date",
    "date_raw",
    "year",
    "month",
    "time_start",
    "time_end",
    "location",
    "speaker",
    "role",
    "organizational_unit",
    "research_topics",
    "funded_by",
    "duration",
    "team",
    "leader",
];

/// A field that could not be interpreted. The raw value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable {field} on {url}: {raw:?}")]
pub struct NormalizationWarning {
    pub url: String,
    pub field: &'static str,
    pub raw: String,
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    topics: TopicMatcher,
}

impl Normalizer {
    pub fn new(topics: TopicMatcher) -> Self {
        Self { topics }
    }

    /// `normalize(raw_fields) -> metadata`, applied to a whole record and
    /// sealed with its content hash.
    pub fn normalize(&self, mut record: Record) -> (Record, Vec<NormalizationWarning>) {
        for key in DERIVED_KEYS {
            record.metadata.remove(*key);
        }

        let warnings = match record.kind {
            RecordKind::Event | RecordKind::News => self.event(&mut record),
            RecordKind::Person => {
                self.person(&mut record);
                Vec::new()
            }
            RecordKind::Research => {
                self.research(&mut record);
                Vec::new()
            }
            RecordKind::General | RecordKind::ReadingGroup => Vec::new(),
        };

        for w in &warnings {
            warn!(url = w.url.as_str(), field = w.field, raw = w.raw.as_str(), "Normalization warning, raw value kept");
        }
        (record.seal(), warnings)
    }

    fn event(&self, record: &mut Record) -> Vec<NormalizationWarning> {
        let mut warnings = Vec::new();
        let labeled_date = record.field("date").map(str::to_string);

        let date = labeled_date
            .as_deref()
            .and_then(dates::parse_date)
            .or_else(|| dates::parse_date(&record.description));
        match (date, labeled_date) {
            (Some(date), _) => record.metadata.extend(dates::date_metadata(date)),
            (None, Some(raw)) if !raw.trim().is_empty() => {
                record.metadata.insert("date_raw".into(), MetaValue::Text(raw.clone()));
                warnings.push(NormalizationWarning {
                    url: record.url.clone(),
                    field: "date",
                    raw,
                });
            }
            _ => {}
        }

        let times = ["time", "date"]
            .iter()
            .filter_map(|k| record.field(k))
            .find_map(dates::parse_time_range)
            .or_else(|| dates::parse_time_range(&record.description));
        if let Some((start, end)) = times {
            record.metadata.insert("time_start".into(), MetaValue::Text(start));
            if let Some(end) = end {
                record.metadata.insert("time_end".into(), MetaValue::Text(end));
            }
        }

        for key in ["location", "speaker"] {
            if let Some(value) = record.field(key).map(str::trim).filter(|v| !v.is_empty()) {
                let value = value.to_string();
                record.metadata.insert(key.into(), MetaValue::Text(value));
            }
        }
        warnings
    }

    fn person(&self, record: &mut Record) {
        let labeled = ["position", "role"].map(|k| record.field(k).unwrap_or_default());
        if let Some(role) = roles::role_from(labeled, &record.description) {
            record.metadata.insert("role".into(), MetaValue::Text(role.to_string()));
        }

        let unit_text = format!("{}\n{}", record.field("chair").unwrap_or_default(), record.description);
        if let Some(units) = roles::units_value(roles::find_units(&unit_text)) {
            record.metadata.insert("organizational_unit".into(), units);
        }

        let topic_text = format!(
            "{}\n{}",
            record.field("research_interests_text").unwrap_or_default(),
            record.description
        );
        self.link_topics(record, &topic_text);
    }

    fn research(&self, record: &mut Record) {
        let from_text = research::research_cues(&record.description);
        for key in ["funded_by", "duration", "team", "chair"] {
            let value = record
                .field(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or_else(|| from_text.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone()));
            let Some(value) = value else { continue };

            match key {
                "team" => {
                    if let Some(leader) = research::project_leader(&value) {
                        record.metadata.insert("leader".into(), MetaValue::Text(leader));
                    }
                    record.metadata.insert("team".into(), MetaValue::Text(value));
                }
                "chair" => {
                    let mut units = roles::find_units(&value);
                    if units.is_empty() {
                        units.push(value);
                    }
                    if let Some(units) = roles::units_value(units) {
                        record.metadata.insert("organizational_unit".into(), units);
                    }
                }
                _ => {
                    record.metadata.insert(key.into(), MetaValue::Text(value));
                }
            }
        }

        let topic_text = format!("{}\n{}", record.title, record.description);
        self.link_topics(record, &topic_text);
    }

    fn link_topics(&self, record: &mut Record, text: &str) {
        let topics = self.topics.match_topics(text);
        if !topics.is_empty() {
            record.metadata.insert("research_topics".into(), MetaValue::List(topics));
        }
    }
}
