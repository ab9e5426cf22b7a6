use std::path::Path;
use std::sync::Arc;

use campus_api::{DateRange, EventFilter, GraphQuery, KnowledgeBase, PeopleQuery, ResearchQuery, ToolError};
use campus_common::{Category, DatasetKind, MetaValue, Record, RecordKind};
use campus_graph::{build_graph, write_graph, GraphCache, GRAPH_JSON};
use campus_store::{Dataset, DatasetStore};
use chrono::NaiveDate;
use serde_json::json;

const LOGIC_CHAIR: &str = "Chair of Logic and Philosophy of Language";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
}

fn event(slug: &str, title: &str, date: Option<&str>, start: Option<&str>) -> Record {
    let mut record = Record::new(
        RecordKind::Event,
        format!("https://www.example.edu/mcmp/en/events/event/{slug}.html"),
        title,
    );
    record.description = format!("{title}. Everyone is welcome.");
    if let Some(date) = date {
        record.metadata.insert("date".into(), date.into());
    }
    if let Some(start) = start {
        record.metadata.insert("time_start".into(), start.into());
    }
    record.seal()
}

fn person(slug: &str, name: &str, role: (&str, &str), unit: Option<&str>, description: &str) -> Record {
    let mut record = Record::new(
        RecordKind::Person,
        format!("https://www.example.edu/mcmp/en/people/contact-page/{slug}/"),
        name,
    );
    record.description = description.to_string();
    record.metadata.insert(role.0.into(), role.1.into());
    if let Some(unit) = unit {
        record.metadata.insert("organizational_unit".into(), unit.into());
    }
    record.fields.insert("email".into(), format!("{slug}@example.edu"));
    record.seal()
}

fn project(slug: &str, title: &str, leader: &str) -> Record {
    let mut record = Record::new(
        RecordKind::Research,
        format!("https://www.example.edu/mcmp/en/research/{slug}/"),
        title,
    );
    record.metadata.insert("leader".into(), MetaValue::Text(leader.into()));
    record.seal()
}

fn flat(records: Vec<Record>) -> Dataset {
    Dataset::Flat(records.into_iter().map(|r| (r.url.clone(), r)).collect())
}

/// A persisted snapshot: datasets plus the graph built from them.
fn knowledge_base(dir: &Path) -> KnowledgeBase {
    let store = DatasetStore::new(dir);
    store
        .merge_and_save(
            DatasetKind::Events,
            flat(vec![
                event("talk-roe", "Talk: Jane Roe (Munich)", Some("2026-02-04"), Some("16:00")),
                event("workshop-causality", "Workshop on Causality", Some("2026-03-10"), None),
                event("talk-past", "Talk: Past Speaker", Some("2026-01-10"), None),
                event("talk-today", "Talk: Early Bird", Some("2026-02-01"), Some("09:00")),
                event("colloquium-tba", "Colloquium (date TBA)", None, None),
            ]),
        )
        .unwrap();
    store
        .merge_and_save(
            DatasetKind::People,
            flat(vec![
                person("roe", "Dr. Jane Roe", ("position", "Doctoral fellow"), Some(LOGIC_CHAIR), "Works on truth."),
                person("doe", "Prof. John Doe", ("role", "Chair holder"), Some(LOGIC_CHAIR), "Logician."),
                person("poe", "Ann Poe", ("role", "Visiting fellow"), None, "Supervised by John Doe."),
            ]),
        )
        .unwrap();

    let mut logic = Category::new("logic", "Logic and Philosophy of Language");
    logic.description = "Research area focusing on logic and philosophy of language".into();
    logic.insert(project("theories-of-truth", "Theories of Truth", "John Doe"));
    logic.subtopics = vec!["Theories of Truth".into()];
    let mut decision = Category::new("decision", "Decision Theory");
    decision.description = "Research area focusing on decision theory".into();
    store
        .merge_and_save(
            DatasetKind::Research,
            Dataset::Categorized([("logic".to_string(), logic), ("decision".to_string(), decision)].into()),
        )
        .unwrap();

    let people = store.load(DatasetKind::People).unwrap().into_flat().unwrap();
    let research = store.load(DatasetKind::Research).unwrap().into_categorized().unwrap();
    let graph_dir = dir.join("graph");
    write_graph(&graph_dir, &build_graph(&people, &research).graph).unwrap();

    KnowledgeBase::new(store, Arc::new(GraphCache::new(graph_dir.join(GRAPH_JSON))))
}

fn titles(hits: &[campus_api::EventHit]) -> Vec<&str> {
    hits.iter().map(|h| h.title.as_str()).collect()
}

#[test]
fn upcoming_events_include_today_and_undated_last() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let hits = kb.get_events_on(&EventFilter::default(), today());
    assert_eq!(
        titles(&hits),
        vec![
            "Talk: Early Bird",
            "Talk: Jane Roe (Munich)",
            "Workshop on Causality",
            "Colloquium (date TBA)",
        ]
    );
    assert_eq!(hits[1].time_start.as_deref(), Some("16:00"));
}

#[test]
fn preset_ranges() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let filter = |date_range| EventFilter {
        date_range,
        type_filter: Some("talk".into()),
        ..Default::default()
    };
    assert_eq!(titles(&kb.get_events_on(&filter(DateRange::Today), today())), vec!["Talk: Early Bird"]);
    assert_eq!(
        titles(&kb.get_events_on(&filter(DateRange::ThisWeek), today())),
        vec!["Talk: Early Bird", "Talk: Jane Roe (Munich)"]
    );
    assert_eq!(kb.get_events_on(&filter(DateRange::All), today()).len(), 3);
}

#[test]
fn explicit_dates_override_the_preset() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let filter = EventFilter {
        date_range: DateRange::Today,
        start_date: Some("2026-01-01".into()),
        end_date: Some("2026-01-31".into()),
        ..Default::default()
    };
    assert_eq!(
        titles(&kb.get_events_on(&filter, today())),
        vec!["Talk: Past Speaker", "Colloquium (date TBA)"]
    );
}

#[test]
fn keyword_and_limit() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let causality = EventFilter {
        query: Some("CAUSALITY".into()),
        ..Default::default()
    };
    assert_eq!(titles(&kb.get_events_on(&causality, today())), vec!["Workshop on Causality"]);

    let first = EventFilter {
        date_range: DateRange::All,
        limit: Some(1),
        ..Default::default()
    };
    assert_eq!(titles(&kb.get_events_on(&first, today())), vec!["Talk: Past Speaker"]);
}

#[test]
fn role_filter_reads_either_legacy_key() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let fellows = kb.search_people(&PeopleQuery {
        role_filter: Some("Doctoral fellow".into()),
        ..Default::default()
    });
    assert_eq!(fellows.len(), 1);
    assert_eq!(fellows[0].name, "Dr. Jane Roe");
    assert_eq!(fellows[0].role.as_deref(), Some("Doctoral fellow"));
    assert_eq!(fellows[0].email.as_deref(), Some("roe@example.edu"));

    let any_fellow = kb.search_people(&PeopleQuery {
        role_filter: Some("fellow".into()),
        ..Default::default()
    });
    assert_eq!(any_fellow.len(), 2);

    let chair = kb.search_people(&PeopleQuery {
        name: Some("doe".into()),
        role_filter: Some("chair".into()),
        ..Default::default()
    });
    assert_eq!(chair.len(), 1);
    assert_eq!(chair[0].organizational_unit, vec![LOGIC_CHAIR.to_string()]);
}

#[test]
fn people_search_matches_profiles_too() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let hits = kb.search_people(&PeopleQuery {
        name: Some("truth".into()),
        ..Default::default()
    });
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Dr. Jane Roe");
}

#[test]
fn research_by_area_and_project() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    assert_eq!(kb.search_research(&ResearchQuery::default()).len(), 2);

    let by_project = kb.search_research(&ResearchQuery {
        topic: Some("truth".into()),
    });
    assert_eq!(by_project.len(), 1);
    assert_eq!(by_project[0].id, "logic");
    assert_eq!(by_project[0].projects[0].leader.as_deref(), Some("John Doe"));

    let by_area = kb.search_research(&ResearchQuery {
        topic: Some("decision".into()),
    });
    assert_eq!(by_area[0].area, "Decision Theory");
    assert!(by_area[0].projects.is_empty());
}

#[test]
fn graph_neighborhood_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let hit = kb.search_graph(&GraphQuery {
        query: "john doe".into(),
        relation: None,
    });
    assert_eq!(hit.nodes[0].id, "person:john-doe");
    assert!(hit.edges.iter().any(|e| e.relation.as_str() == "leads"));
    assert!(hit.edges.iter().any(|e| e.relation.as_str() == "supervises"));
    assert!(hit.text.starts_with("Institutional Context:"));
    assert!(hit.text.contains("Relationships:"));

    let supervision = kb.search_graph(&GraphQuery {
        query: "person:john-doe".into(),
        relation: Some("supervises".into()),
    });
    assert_eq!(supervision.edges.len(), 1);
    assert_eq!(supervision.edges[0].target, "person:ann-poe");
}

#[test]
fn graph_is_parsed_once_for_a_burst_of_queries() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    for _ in 0..20 {
        kb.search_graph(&GraphQuery {
            query: "Jane Roe".into(),
            relation: None,
        });
    }
    assert_eq!(kb.graph_cache().loads(), 1);
}

#[test]
fn no_match_is_an_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let nobody = kb.search_people(&PeopleQuery {
        name: Some("nobody at all".into()),
        ..Default::default()
    });
    assert!(nobody.is_empty());
    assert!(kb
        .search_research(&ResearchQuery {
            topic: Some("astrology".into())
        })
        .is_empty());
    let graph = kb.search_graph(&GraphQuery {
        query: "Unknown Person".into(),
        relation: None,
    });
    assert!(graph.nodes.is_empty() && graph.edges.is_empty() && graph.text.is_empty());
}

#[test]
fn empty_data_directory_answers_empty() {
    let dir = tempfile::tempdir().unwrap();
    let kb = KnowledgeBase::new(
        DatasetStore::new(dir.path()),
        Arc::new(GraphCache::new(dir.path().join("graph").join(GRAPH_JSON))),
    );

    assert!(kb.get_events_on(&EventFilter::default(), today()).is_empty());
    assert!(kb.search_people(&PeopleQuery::default()).is_empty());
    assert!(kb.search_research(&ResearchQuery::default()).is_empty());
    assert!(kb
        .search_graph(&GraphQuery {
            query: "x".into(),
            relation: None
        })
        .nodes
        .is_empty());
    assert!(kb.calendar().is_empty());
}

#[test]
fn dispatch_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let people = kb
        .call("search_people", json!({ "query": "roe", "role_filter": "doctoral" }))
        .unwrap();
    assert_eq!(people.as_array().unwrap().len(), 1);
    assert_eq!(people[0]["role"], "Doctoral fellow");

    let research = kb.call("search_research", serde_json::Value::Null).unwrap();
    assert_eq!(research.as_array().unwrap().len(), 2);

    assert!(matches!(kb.call("delete_everything", json!({})), Err(ToolError::UnknownTool(_))));
    assert!(matches!(
        kb.call("get_events", json!({ "date_range": "someday" })),
        Err(ToolError::InvalidArguments { tool: "get_events", .. })
    ));
    assert!(matches!(
        kb.call("search_graph", json!({})),
        Err(ToolError::InvalidArguments { tool: "search_graph", .. })
    ));
}

#[test]
fn calendar_projection() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge_base(dir.path());

    let entries = kb.calendar();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].start, "2026-01-10");
    assert!(entries[0].all_day);
    let talk = entries.iter().find(|e| e.title.starts_with("Talk: Jane Roe")).unwrap();
    assert_eq!(talk.start, "2026-02-04T16:00:00");
    assert!(!talk.all_day);
}
