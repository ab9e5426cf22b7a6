// The query tool contract consumed by the chat layer.
//
// Every tool reads the last completed synchronization snapshot and answers
// "nothing found" with an empty result. Unreadable datasets are logged and
// treated as empty.

use std::str::FromStr;
use std::sync::Arc;

use campus_common::{CategorizedDataset, Config, DatasetKind, FlatDataset, MetaValue, Record};
use campus_graph::{Edge, GraphCache, Node, Relation, GRAPH_JSON};
use campus_store::DatasetStore;
use chrono::{Days, Local, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::calendar::{calendar_entries, CalendarEntry};
use crate::error::ToolError;

pub const DEFAULT_LIMIT: usize = 10;

/// Metadata keys the same role has been stored under. Checked in order.
pub const ROLE_KEYS: &[&str] = &["role", "position"];

// --- Inputs ---

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[default]
    Upcoming,
    Today,
    ThisWeek,
    All,
}

/// Filters for `get_events`. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EventFilter {
    /// Preset range: "upcoming" (today on, the default), "today", "this_week"
    /// (the next seven days) or "all". Ignored when start_date or end_date is given.
    pub date_range: DateRange,
    /// Earliest event date (YYYY-MM-DD).
    pub start_date: Option<String>,
    /// Latest event date (YYYY-MM-DD), inclusive.
    pub end_date: Option<String>,
    /// Event type as it appears in the title, e.g. "Talk" or "Workshop".
    pub type_filter: Option<String>,
    /// Keyword searched in title, abstract and description.
    pub query: Option<String>,
    /// Maximum number of events returned (default 10).
    pub limit: Option<usize>,
}

/// Arguments of `search_people`.
#[derive(Debug, Default, Clone, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PeopleQuery {
    /// Name or keyword searched in names and profiles.
    #[serde(alias = "query")]
    pub name: Option<String>,
    /// Role to filter by, e.g. "Chair", "Postdoc", "Doctoral fellow".
    pub role_filter: Option<String>,
    /// Maximum number of people returned (default 10).
    pub limit: Option<usize>,
}

/// Arguments of `search_research`.
#[derive(Debug, Default, Clone, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ResearchQuery {
    /// Research topic, e.g. "Logic" or "Decision Theory". Omit for all areas.
    pub topic: Option<String>,
}

/// Arguments of `search_graph`.
#[derive(Debug, Default, Clone, Deserialize, JsonSchema)]
pub struct GraphQuery {
    /// Person or organizational unit name, or a node id such as "person:jane-roe".
    pub query: String,
    /// Only edges of this relation: "affiliated_with", "leads" or "supervises".
    #[serde(default)]
    pub relation: Option<String>,
}

// --- Results ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventHit {
    pub title: String,
    pub url: String,
    pub date: Option<String>,
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub location: Option<String>,
    pub speaker: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonHit {
    pub name: String,
    pub url: String,
    pub role: Option<String>,
    pub organizational_unit: Vec<String>,
    pub research_topics: Vec<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image_url: Option<String>,
    pub research_interests: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectHit {
    pub title: String,
    pub url: String,
    pub leader: Option<String>,
    pub funded_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchHit {
    pub id: String,
    pub area: String,
    pub description: String,
    pub url: String,
    pub subtopics: Vec<String>,
    pub projects: Vec<ProjectHit>,
}

/// One-hop neighborhood of the matched node. Empty when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphHit {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub text: String,
}

// --- Tool names ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    GetEvents,
    SearchPeople,
    SearchResearch,
    SearchGraph,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::GetEvents,
        ToolName::SearchPeople,
        ToolName::SearchResearch,
        ToolName::SearchGraph,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::GetEvents => "get_events",
            ToolName::SearchPeople => "search_people",
            ToolName::SearchResearch => "search_research",
            ToolName::SearchGraph => "search_graph",
        }
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

// --- Record helpers ---

fn text_of(record: &Record, key: &str) -> Option<String> {
    record
        .meta_text(key)
        .or_else(|| record.field(key))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn list_of(record: &Record, key: &str) -> Vec<String> {
    match record.metadata.get(key) {
        Some(MetaValue::List(items)) => items.clone(),
        Some(MetaValue::Text(text)) if !text.is_empty() => vec![text.clone()],
        _ => Vec::new(),
    }
}

/// The person's role under whichever key it was stored.
pub fn role_of(record: &Record) -> Option<String> {
    ROLE_KEYS.iter().find_map(|key| text_of(record, key))
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn lowered(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn parse_day(raw: &str, name: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(day) => Some(day),
        Err(_) => {
            warn!(argument = name, value = raw, "Ignoring date that is not YYYY-MM-DD");
            None
        }
    }
}

/// Inclusive date bounds. Explicit dates win over the preset range.
fn date_window(filter: &EventFilter, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let start = filter.start_date.as_deref().and_then(|d| parse_day(d, "start_date"));
    let end = filter.end_date.as_deref().and_then(|d| parse_day(d, "end_date"));
    if start.is_some() || end.is_some() {
        return (start, end);
    }
    match filter.date_range {
        DateRange::Upcoming => (Some(today), None),
        DateRange::Today => (Some(today), Some(today)),
        DateRange::ThisWeek => (Some(today), today.checked_add_days(Days::new(7))),
        DateRange::All => (None, None),
    }
}

fn event_date(record: &Record) -> Option<NaiveDate> {
    record
        .meta_text("date")
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

impl From<&Record> for EventHit {
    fn from(record: &Record) -> Self {
        Self {
            title: record.title.clone(),
            url: record.url.clone(),
            date: record.meta_text("date").map(str::to_string),
            time_start: record.meta_text("time_start").map(str::to_string),
            time_end: record.meta_text("time_end").map(str::to_string),
            location: text_of(record, "location"),
            speaker: text_of(record, "speaker"),
            abstract_text: record.abstract_text.clone(),
            description: record.description.clone(),
        }
    }
}

impl From<&Record> for PersonHit {
    fn from(record: &Record) -> Self {
        Self {
            name: record.title.clone(),
            url: record.url.clone(),
            role: role_of(record),
            organizational_unit: list_of(record, "organizational_unit"),
            research_topics: list_of(record, "research_topics"),
            email: text_of(record, "email"),
            phone: text_of(record, "phone"),
            image_url: text_of(record, "image_url"),
            research_interests: text_of(record, "research_interests_text"),
            description: record.description.clone(),
        }
    }
}

// --- Knowledge base ---

/// Read-only view over the persisted datasets and the graph snapshot.
pub struct KnowledgeBase {
    store: DatasetStore,
    graph: Arc<GraphCache>,
}

impl KnowledgeBase {
    pub fn new(store: DatasetStore, graph: Arc<GraphCache>) -> Self {
        Self { store, graph }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            DatasetStore::new(&config.data_dir),
            Arc::new(GraphCache::new(config.graph_dir().join(GRAPH_JSON))),
        )
    }

    pub fn graph_cache(&self) -> &Arc<GraphCache> {
        &self.graph
    }

    fn flat(&self, kind: DatasetKind) -> FlatDataset {
        match self.store.load(kind) {
            Ok(dataset) => dataset.into_flat().unwrap_or_default(),
            Err(e) => {
                warn!(kind = %kind, error = %e, "Dataset unreadable, answering from an empty one");
                FlatDataset::new()
            }
        }
    }

    fn categorized(&self, kind: DatasetKind) -> CategorizedDataset {
        match self.store.load(kind) {
            Ok(dataset) => dataset.into_categorized().unwrap_or_default(),
            Err(e) => {
                warn!(kind = %kind, error = %e, "Dataset unreadable, answering from an empty one");
                CategorizedDataset::new()
            }
        }
    }

    /// `get_events(filter?)` relative to the local date.
    pub fn get_events(&self, filter: &EventFilter) -> Vec<EventHit> {
        self.get_events_on(filter, Local::now().date_naive())
    }

    /// `get_events` with an explicit "today".
    ///
    /// Events without a readable date are never filtered out by date and
    /// sort after every dated event.
    pub fn get_events_on(&self, filter: &EventFilter, today: NaiveDate) -> Vec<EventHit> {
        let (start, end) = date_window(filter, today);
        let type_filter = lowered(&filter.type_filter);
        let query = lowered(&filter.query);

        let events = self.flat(DatasetKind::Events);
        let mut matched: Vec<(Option<NaiveDate>, &Record)> = events
            .values()
            .filter(|r| type_filter.as_deref().is_none_or(|t| contains_ci(&r.title, t)))
            .filter(|r| {
                query.as_deref().is_none_or(|q| {
                    contains_ci(&r.title, q)
                        || r.abstract_text.as_deref().is_some_and(|a| contains_ci(a, q))
                        || contains_ci(&r.description, q)
                })
            })
            .map(|r| (event_date(r), r))
            .filter(|(date, _)| match date {
                Some(date) => start.is_none_or(|s| *date >= s) && end.is_none_or(|e| *date <= e),
                None => true,
            })
            .collect();

        matched.sort_by(|(da, a), (db, b)| {
            da.is_none()
                .cmp(&db.is_none())
                .then_with(|| da.cmp(db))
                .then_with(|| a.meta_text("time_start").cmp(&b.meta_text("time_start")))
                .then_with(|| a.title.cmp(&b.title))
        });

        matched
            .into_iter()
            .take(filter.limit.unwrap_or(DEFAULT_LIMIT))
            .map(|(_, r)| EventHit::from(r))
            .collect()
    }

    /// `search_people(name?, role_filter?)`.
    pub fn search_people(&self, query: &PeopleQuery) -> Vec<PersonHit> {
        let name = lowered(&query.name);
        let role_filter = lowered(&query.role_filter);

        self.flat(DatasetKind::People)
            .values()
            .filter(|r| match &role_filter {
                Some(wanted) => role_of(r).is_some_and(|role| contains_ci(&role, wanted)),
                None => true,
            })
            .filter(|r| {
                name.as_deref()
                    .is_none_or(|n| contains_ci(&r.title, n) || contains_ci(&r.description, n))
            })
            .take(query.limit.unwrap_or(DEFAULT_LIMIT))
            .map(PersonHit::from)
            .collect()
    }

    /// `search_research(topic?)`: research areas whose name, description or
    /// project titles mention the topic.
    pub fn search_research(&self, query: &ResearchQuery) -> Vec<ResearchHit> {
        let topic = lowered(&query.topic);

        self.categorized(DatasetKind::Research)
            .into_values()
            .filter(|area| {
                topic.as_deref().is_none_or(|t| {
                    contains_ci(&area.name, t)
                        || contains_ci(&area.description, t)
                        || area.subtopics.iter().any(|s| contains_ci(s, t))
                })
            })
            .map(|area| ResearchHit {
                projects: area
                    .items
                    .values()
                    .map(|r| ProjectHit {
                        title: r.title.clone(),
                        url: r.url.clone(),
                        leader: text_of(r, "leader"),
                        funded_by: text_of(r, "funded_by"),
                    })
                    .collect(),
                id: area.id,
                area: area.name,
                description: area.description,
                url: area.url,
                subtopics: area.subtopics,
            })
            .collect()
    }

    /// `search_graph(query)`: the matched node, its incident edges and their
    /// other ends, plus a rendering for context injection.
    pub fn search_graph(&self, query: &GraphQuery) -> GraphHit {
        let relation = match query.relation.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => match Relation::parse(raw) {
                Some(relation) => Some(relation),
                None => {
                    warn!(relation = raw, "Unknown relation filter, returning all relations");
                    None
                }
            },
            None => None,
        };

        let index = match self.graph.get() {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "Graph unavailable, answering with an empty result");
                return GraphHit::default();
            }
        };

        match index.query(&query.query, relation) {
            Some(neighborhood) => GraphHit {
                text: neighborhood.render(),
                nodes: neighborhood.nodes().cloned().collect(),
                edges: neighborhood.edges,
            },
            None => GraphHit::default(),
        }
    }

    /// Dated events as calendar entries.
    pub fn calendar(&self) -> Vec<CalendarEntry> {
        calendar_entries(self.flat(DatasetKind::Events).values())
    }

    /// Dispatch a tool call by name with JSON arguments. `null` arguments
    /// mean "no arguments".
    pub fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool: ToolName = name.parse()?;
        let args = if args.is_null() { Value::Object(Default::default()) } else { args };
        let invalid = |source| ToolError::InvalidArguments { tool: tool.as_str(), source };

        let result = match tool {
            ToolName::GetEvents => {
                serde_json::to_value(self.get_events(&serde_json::from_value(args).map_err(invalid)?))
            }
            ToolName::SearchPeople => {
                serde_json::to_value(self.search_people(&serde_json::from_value(args).map_err(invalid)?))
            }
            ToolName::SearchResearch => {
                serde_json::to_value(self.search_research(&serde_json::from_value(args).map_err(invalid)?))
            }
            ToolName::SearchGraph => {
                serde_json::to_value(self.search_graph(&serde_json::from_value(args).map_err(invalid)?))
            }
        }?;

        info!(tool = tool.as_str(), "Tool call answered");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use campus_common::RecordKind;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    #[test]
    fn explicit_dates_take_precedence() {
        let filter = EventFilter {
            date_range: DateRange::Today,
            start_date: Some("2026-03-01".into()),
            ..Default::default()
        };
        assert_eq!(date_window(&filter, today()), (NaiveDate::from_ymd_opt(2026, 3, 1), None));
    }

    #[test]
    fn malformed_explicit_date_falls_back_to_preset() {
        let filter = EventFilter {
            date_range: DateRange::All,
            start_date: Some("March".into()),
            ..Default::default()
        };
        assert_eq!(date_window(&filter, today()), (None, None));
    }

    #[test]
    fn this_week_spans_seven_days() {
        let filter = EventFilter {
            date_range: DateRange::ThisWeek,
            ..Default::default()
        };
        assert_eq!(
            date_window(&filter, today()),
            (Some(today()), NaiveDate::from_ymd_opt(2026, 2, 8))
        );
    }

    #[test]
    fn role_falls_back_to_position() {
        let mut record = Record::new(RecordKind::Person, "https://x.edu/p", "A");
        record.metadata.insert("position".into(), "Doctoral fellow".into());
        assert_eq!(role_of(&record).as_deref(), Some("Doctoral fellow"));

        record.metadata.insert("role".into(), "Lecturer".into());
        assert_eq!(role_of(&record).as_deref(), Some("Lecturer"));
    }

    #[test]
    fn tool_names() {
        assert_eq!("search_graph".parse::<ToolName>().unwrap(), ToolName::SearchGraph);
        assert!(matches!("drop_tables".parse::<ToolName>(), Err(ToolError::UnknownTool(_))));
    }
}
