//! Graph consistency against the people dataset it was built from.

use std::collections::BTreeSet;

use campus_common::{CategorizedDataset, FlatDataset, MetaValue, Record, RecordKind};
use campus_graph::builder::{person_node_id, unit_id, units_of};
use campus_graph::{build_graph, read_graph, write_graph, GraphCache, Relation, GRAPH_OUTLINE};

fn person(slug: &str, name: &str, role: &str, units: &[&str]) -> Record {
    let mut record = Record::new(
        RecordKind::Person,
        format!("https://www.example.edu/people/contact-page/{slug}/"),
        name,
    );
    record.metadata.insert("role".into(), role.into());
    match units {
        [] => {}
        [one] => {
            record.metadata.insert("organizational_unit".into(), (*one).into());
        }
        many => {
            record.metadata.insert(
                "organizational_unit".into(),
                MetaValue::List(many.iter().map(|u| u.to_string()).collect()),
            );
        }
    }
    record
}

fn dataset() -> FlatDataset {
    [
        person("leitgeb", "Prof. DDr. Hannes Leitgeb", "Chair holder", &["Chair of Logic and Philosophy of Language"]),
        person("hartmann", "Prof. Dr. Stephan Hartmann", "Chair holder", &["Chair of Philosophy of Science"]),
        person(
            "roe",
            "Dr. Jane Roe",
            "Postdoctoral fellow",
            &["Chair of Philosophy of Science", "Chair of Logic and Philosophy of Language"],
        ),
        person("doe", "John Doe", "Doctoral fellow", &[]),
        person("anonymous", "Prof. Dr.", "Visiting fellow", &["Chair of Philosophy of Science"]),
    ]
    .into_iter()
    .map(|r| (r.url.clone(), r))
    .collect()
}

#[test]
fn affiliation_edges_match_person_metadata_both_ways() {
    let people = dataset();
    let graph = build_graph(&people, &CategorizedDataset::new()).graph;

    let from_graph: BTreeSet<(String, String)> = graph
        .edges_of(Relation::AffiliatedWith)
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();

    let from_records: BTreeSet<(String, String)> = people
        .values()
        .flat_map(|p| {
            units_of(p)
                .into_iter()
                .map(move |u| (person_node_id(p), unit_id(&u)))
        })
        .collect();

    assert_eq!(from_graph, from_records);
    assert_eq!(from_graph.len(), 5);
}

#[test]
fn persisted_files_agree_and_cache_serves_queries() {
    let dir = tempfile::tempdir().unwrap();
    let graph = build_graph(&dataset(), &CategorizedDataset::new()).graph;
    let (json, outline) = write_graph(dir.path(), &graph).unwrap();

    assert_eq!(read_graph(&json).unwrap(), graph);
    assert_eq!(outline, dir.path().join(GRAPH_OUTLINE));
    let text = std::fs::read_to_string(outline).unwrap();
    for node in &graph.nodes {
        assert!(text.contains(&node.name), "outline is missing {}", node.name);
    }

    let cache = GraphCache::new(json);
    let index = cache.get().unwrap();
    let leaders = index
        .query("Chair of Philosophy of Science", Some(Relation::Leads))
        .unwrap();
    assert_eq!(leaders.neighbors.len(), 1);
    assert_eq!(leaders.neighbors[0].name, "Stephan Hartmann");
    assert!(index.query("Nobody Known", None).is_none());
}
