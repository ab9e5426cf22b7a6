use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CommonError;

// --- Metadata ---

/// A normalized metadata value. Untagged so the persisted JSON stays flat:
/// `"year": 2026`, `"date": "2026-02-04"`, `"research_topics": ["Logic"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl MetaValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            MetaValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Int(n)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(items: Vec<String>) -> Self {
        MetaValue::List(items)
    }
}

/// Normalized key → typed value. Absent keys are valid everywhere.
pub type Metadata = BTreeMap<String, MetaValue>;

// --- Records ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Event,
    Person,
    Research,
    News,
    General,
    ReadingGroup,
}

/// One extracted and normalized unit of data, keyed by its canonical source URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Record {
    /// Canonical source URL. The merge key.
    pub url: String,
    pub kind: RecordKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Raw labeled values as read from the page, before normalization.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub content_hash: String,
    pub scraped_at: DateTime<Utc>,
}

impl Record {
    pub fn new(kind: RecordKind, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            title: title.into(),
            description: String::new(),
            abstract_text: None,
            fields: BTreeMap::new(),
            metadata: Metadata::new(),
            content_hash: String::new(),
            scraped_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.url
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn meta_text(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetaValue::as_text)
    }

    /// Hash of everything a crawl observes or derives. `scraped_at` and the
    /// hash itself are excluded so an unchanged page hashes identically.
    pub fn compute_hash(&self) -> String {
        let observed = serde_json::json!({
            "url": self.url,
            "kind": self.kind,
            "title": self.title,
            "description": self.description,
            "abstract": self.abstract_text,
            "fields": self.fields,
            "metadata": self.metadata,
        });
        content_hash(&observed.to_string())
    }

    /// Stamp the content hash. Call after normalization.
    pub fn seal(mut self) -> Self {
        self.content_hash = self.compute_hash();
        self
    }
}

/// Hex sha256 of a string.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

// --- Categorized datasets ---

/// A sub-category of a nested dataset (research area, news year, general group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default)]
    pub items: BTreeMap<String, Record>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            url: String::new(),
            subtopics: Vec::new(),
            items: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, record: Record) {
        self.items.insert(record.url.clone(), record);
    }
}

/// Identity → Record (events, people).
pub type FlatDataset = BTreeMap<String, Record>;

/// Category id → Category (research, news, general).
pub type CategorizedDataset = BTreeMap<String, Category>;

// --- Dataset kinds ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Events,
    People,
    Research,
    News,
    General,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::Events,
        DatasetKind::People,
        DatasetKind::Research,
        DatasetKind::News,
        DatasetKind::General,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            DatasetKind::Events => "events.json",
            DatasetKind::People => "people.json",
            DatasetKind::Research => "research.json",
            DatasetKind::News => "news.json",
            DatasetKind::General => "general.json",
        }
    }

    /// Nested datasets merge per sub-category instead of per identity.
    pub fn is_categorized(self) -> bool {
        matches!(
            self,
            DatasetKind::Research | DatasetKind::News | DatasetKind::General
        )
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetKind::Events => "events",
            DatasetKind::People => "people",
            DatasetKind::Research => "research",
            DatasetKind::News => "news",
            DatasetKind::General => "general",
        };
        f.pad(name)
    }
}

impl FromStr for DatasetKind {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "events" | "event" => Ok(DatasetKind::Events),
            "people" | "person" => Ok(DatasetKind::People),
            "research" => Ok(DatasetKind::Research),
            "news" => Ok(DatasetKind::News),
            "general" => Ok(DatasetKind::General),
            other => Err(CommonError::UnknownDataset(other.to_string())),
        }
    }
}
