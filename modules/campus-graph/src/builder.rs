// Graph Builder: People/Research datasets → directed relationship graph.
//
// Affiliation edges come only from the structured `organizational_unit`
// metadata, so the graph and the people dataset agree on affiliation by
// construction. Supervision comes from textual cues and leadership from roles
// or a project's named leader, resolved against the person name index;
// anything unresolved is reported and skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use campus_common::{mentions, slugify, CategorizedDataset, FlatDataset, MetaValue, Record};
use regex::Regex;
use tracing::{info, warn};

use crate::error::GraphResolutionWarning;
use crate::model::{Edge, Graph, Node, NodeKind, Relation};

/// Roles that make a person the head of their organizational unit(s).
pub const LEADERSHIP_ROLES: &[&str] = &["chair holder", "director", "co-director", "head", "group leader"];

static TITLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bProf\.|\bDr\.|\bDDr\.|\bPD\b|\bM\.A\.|\bM\.Sc\.|\bM\.Phil\.|\bB\.A\.|\bM\.Mus\.|\bphil\.|\bhabil\.)")
        .expect("valid regex")
});

static PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));

/// "supervised by X", "under the supervision of X", "Supervisor: X".
static SUPERVISION_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:supervised by|supervision of|supervisors?:)\s*([^;\n]{1,120})").expect("valid regex")
});

/// Display name without academic titles or parenthesized notes.
pub fn clean_name(raw: &str) -> String {
    let without_titles = TITLES.replace_all(raw, " ");
    let without_parens = PARENS.replace_all(&without_titles, " ");
    without_parens
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

pub fn person_id(name: &str) -> String {
    format!("person:{}", slugify(&clean_name(name)))
}

/// Node id of a person record. A title that is nothing but honorifics
/// ("Prof. Dr.") falls back to the profile URL's last path segment.
pub fn person_node_id(record: &Record) -> String {
    if !clean_name(&record.title).is_empty() {
        return person_id(&record.title);
    }
    let segment = record
        .url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim_end_matches(".html");
    match slugify(segment) {
        slug if slug.is_empty() => format!("person:{}", slugify(&record.url)),
        slug => format!("person:{slug}"),
    }
}

fn display_name(record: &Record) -> String {
    match clean_name(&record.title) {
        name if name.is_empty() => record.title.trim().to_string(),
        name => name,
    }
}

pub fn unit_id(name: &str) -> String {
    format!("org:{}", slugify(name))
}

/// `organizational_unit` as stored: a single text value or a list.
pub fn units_of(record: &Record) -> Vec<String> {
    match record.metadata.get("organizational_unit") {
        Some(MetaValue::Text(unit)) if !unit.trim().is_empty() => vec![unit.trim().to_string()],
        Some(MetaValue::List(units)) => units
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

pub fn is_leadership_role(role: &str) -> bool {
    let role = role.trim().to_lowercase();
    LEADERSHIP_ROLES.iter().any(|l| role == *l)
}

#[derive(Debug, Clone, Default)]
pub struct GraphBuild {
    pub graph: Graph,
    pub warnings: Vec<GraphResolutionWarning>,
}

struct Builder {
    nodes: BTreeMap<String, Node>,
    edges: BTreeSet<Edge>,
}

impl Builder {
    fn unit(&mut self, name: &str) -> String {
        let id = unit_id(name);
        self.nodes.entry(id.clone()).or_insert_with(|| Node {
            id: id.clone(),
            name: name.to_string(),
            kind: NodeKind::OrgUnit,
            role: None,
            url: None,
        });
        id
    }
}

/// `build_graph(people_dataset, research_dataset) -> Graph`.
///
/// Fully rebuilt on every call; the graph is a disposable view.
pub fn build_graph(people: &FlatDataset, research: &CategorizedDataset) -> GraphBuild {
    let mut builder = Builder {
        nodes: BTreeMap::new(),
        edges: BTreeSet::new(),
    };

    // Units named by research projects exist even with no listed members.
    for item in research.values().flat_map(|c| c.items.values()) {
        for unit in units_of(item) {
            builder.unit(&unit);
        }
    }

    // Name index for supervision and leader resolution: cleaned name → person id.
    let mut index: Vec<(String, String)> = Vec::new();

    for person in people.values() {
        let id = person_node_id(person);
        let name = display_name(person);
        let role = person.meta_text("role").map(str::to_string);

        let cleaned = clean_name(&person.title).to_lowercase();
        if !cleaned.is_empty() {
            index.push((cleaned, id.clone()));
        }
        builder.nodes.insert(
            id.clone(),
            Node {
                id: id.clone(),
                name,
                kind: NodeKind::Person,
                role: role.clone(),
                url: Some(person.url.clone()),
            },
        );

        let leads = role.as_deref().is_some_and(is_leadership_role);
        for unit in units_of(person) {
            let unit_id = builder.unit(&unit);
            builder.edges.insert(Edge::new(&id, Relation::AffiliatedWith, &unit_id));
            if leads {
                builder.edges.insert(Edge::new(&id, Relation::Leads, &unit_id));
            }
        }
    }

    let mut warnings = Vec::new();
    let mut unresolved = |record: &Record, mention: String, what: &str| {
        let warning = GraphResolutionWarning {
            person: record.url.clone(),
            mention,
        };
        warn!(%warning, "{} edge skipped", what);
        warnings.push(warning);
    };

    for person in people.values() {
        let supervisee = person_node_id(person);
        let text = format!("{}\n{}", person.description, person.field("research_interests_text").unwrap_or(""));
        for cue in SUPERVISION_CUE.captures_iter(&text) {
            // Titles are gone after cleaning, so the first period ends the mention.
            let cleaned = clean_name(&cue[1]);
            let mention = cleaned.split('.').next().unwrap_or("").trim().to_string();
            if mention.is_empty() {
                continue;
            }
            let lowered = mention.to_lowercase();
            let supervisors: Vec<&String> = index
                .iter()
                .filter(|(name, id)| *id != supervisee && mentions(&lowered, name))
                .map(|(_, id)| id)
                .collect();
            if supervisors.is_empty() {
                unresolved(person, mention, "Supervision");
                continue;
            }
            for supervisor in supervisors {
                builder
                    .edges
                    .insert(Edge::new(supervisor.clone(), Relation::Supervises, &supervisee));
            }
        }
    }

    // A project leader leads the units the project belongs to.
    for item in research.values().flat_map(|c| c.items.values()) {
        let Some(leader) = item.meta_text("leader") else {
            continue;
        };
        let units = units_of(item);
        let mention = clean_name(leader);
        if units.is_empty() || mention.is_empty() {
            continue;
        }
        let lowered = mention.to_lowercase();
        let Some((_, leader_id)) = index.iter().find(|(name, _)| *name == lowered) else {
            unresolved(item, mention, "Leadership");
            continue;
        };
        for unit in units {
            builder.edges.insert(Edge::new(leader_id, Relation::Leads, unit_id(&unit)));
        }
    }

    let graph = Graph::from_parts(builder.nodes, builder.edges);
    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        warnings = warnings.len(),
        "Graph built"
    );
    GraphBuild { graph, warnings }
}

#[cfg(test)]
mod tests {
    use campus_common::{Category, RecordKind};

    use super::*;

    fn person(url: &str, name: &str, role: Option<&str>, unit: Option<&str>, description: &str) -> Record {
        let mut record = Record::new(RecordKind::Person, url, name);
        record.description = description.to_string();
        if let Some(role) = role {
            record.metadata.insert("role".into(), role.into());
        }
        if let Some(unit) = unit {
            record.metadata.insert("organizational_unit".into(), unit.into());
        }
        record
    }

    fn people(records: Vec<Record>) -> FlatDataset {
        records.into_iter().map(|r| (r.url.clone(), r)).collect()
    }

    const LOGIC: &str = "Chair of Logic and Philosophy of Language";

    #[test]
    fn clean_names() {
        assert_eq!(clean_name("Prof. DDr. Hannes Leitgeb"), "Hannes Leitgeb");
        assert_eq!(clean_name("Dr. Jane Roe (on leave)"), "Jane Roe");
        assert_eq!(person_id("Prof. Dr. Jane Roe"), "person:jane-roe");
    }

    #[test]
    fn affiliation_and_leadership() {
        let build = build_graph(
            &people(vec![
                person("u1", "Prof. Ada Head", Some("Chair holder"), Some(LOGIC), ""),
                person("u2", "Bob Member", Some("Doctoral fellow"), Some(LOGIC), ""),
                person("u3", "Cy Loose", None, None, ""),
            ]),
            &CategorizedDataset::new(),
        );
        let g = build.graph;
        let unit = unit_id(LOGIC);
        assert!(g.edges.contains(&Edge::new("person:ada-head", Relation::AffiliatedWith, &unit)));
        assert!(g.edges.contains(&Edge::new("person:ada-head", Relation::Leads, &unit)));
        assert!(g.edges.contains(&Edge::new("person:bob-member", Relation::AffiliatedWith, &unit)));
        assert!(!g.edges.contains(&Edge::new("person:bob-member", Relation::Leads, &unit)));
        assert_eq!(g.edges.len(), 3);
        assert_eq!(g.nodes.len(), 4);
    }

    #[test]
    fn duplicate_assertions_collapse() {
        let mut a = person("u1", "Ada", None, None, "");
        a.metadata.insert(
            "organizational_unit".into(),
            MetaValue::List(vec![LOGIC.into(), LOGIC.into()]),
        );
        let build = build_graph(&people(vec![a]), &CategorizedDataset::new());
        assert_eq!(build.graph.edges.len(), 1);
    }

    #[test]
    fn supervision_resolves_against_name_index() {
        let build = build_graph(
            &people(vec![
                person("u1", "Prof. Dr. Hannes Leitgeb", Some("Chair holder"), Some(LOGIC), ""),
                person("u2", "Jane Roe", Some("Doctoral fellow"), None, "She writes her thesis under the supervision of Prof. Hannes Leitgeb."),
            ]),
            &CategorizedDataset::new(),
        );
        assert!(build
            .graph
            .edges
            .contains(&Edge::new("person:hannes-leitgeb", Relation::Supervises, "person:jane-roe")));
        assert!(build.warnings.is_empty());
    }

    #[test]
    fn unresolved_supervisor_is_skipped_with_warning() {
        let build = build_graph(
            &people(vec![person("u2", "Jane Roe", None, None, "Supervised by Prof. Someone Else.")]),
            &CategorizedDataset::new(),
        );
        assert!(build.graph.edges_of(Relation::Supervises).next().is_none());
        assert_eq!(build.warnings.len(), 1);
        assert_eq!(build.warnings[0].mention, "Someone Else");
    }

    #[test]
    fn research_units_become_nodes() {
        let mut item = Record::new(RecordKind::Research, "r1", "Truth");
        item.metadata.insert("organizational_unit".into(), LOGIC.into());
        let mut category = Category::new("logic", "Logic");
        category.insert(item);
        let research: CategorizedDataset = [("logic".to_string(), category)].into();

        let build = build_graph(&FlatDataset::new(), &research);
        assert_eq!(build.graph.nodes.len(), 1);
        assert_eq!(build.graph.nodes[0].kind, NodeKind::OrgUnit);
    }

    fn project(url: &str, title: &str, leader: &str, unit: &str) -> CategorizedDataset {
        let mut item = Record::new(RecordKind::Research, url, title);
        item.metadata.insert("leader".into(), leader.into());
        item.metadata.insert("organizational_unit".into(), unit.into());
        let mut category = Category::new("logic", "Logic");
        category.insert(item);
        [("logic".to_string(), category)].into()
    }

    #[test]
    fn project_leader_leads_the_project_unit() {
        let build = build_graph(
            &people(vec![person("u1", "Ada Lovelace", Some("Postdoctoral fellow"), Some(LOGIC), "")]),
            &project("r1", "Analytical Engines", "Dr. Ada Lovelace", LOGIC),
        );
        assert!(build
            .graph
            .edges
            .contains(&Edge::new("person:ada-lovelace", Relation::Leads, unit_id(LOGIC))));
        assert!(build.warnings.is_empty());
    }

    #[test]
    fn unknown_project_leader_is_skipped_with_warning() {
        let build = build_graph(&FlatDataset::new(), &project("r1", "Truth", "Prof. Nobody Known", LOGIC));
        assert!(build.graph.edges_of(Relation::Leads).next().is_none());
        assert_eq!(build.warnings.len(), 1);
        assert_eq!(build.warnings[0].person, "r1");
        assert_eq!(build.warnings[0].mention, "Nobody Known");
    }

    #[test]
    fn head_and_group_leader_roles_lead() {
        assert!(is_leadership_role("Head"));
        assert!(is_leadership_role("Group leader"));
        assert!(!is_leadership_role("Doctoral fellow"));
    }

    #[test]
    fn honorific_only_title_still_gets_a_node_and_affiliation() {
        let build = build_graph(
            &people(vec![person(
                "https://www.example.edu/people/contact-page/anonymous/",
                "Prof. Dr.",
                None,
                Some(LOGIC),
                "",
            )]),
            &CategorizedDataset::new(),
        );
        let node = build.graph.nodes.iter().find(|n| n.kind == NodeKind::Person).unwrap();
        assert_eq!(node.id, "person:anonymous");
        assert_eq!(node.name, "Prof. Dr.");
        assert!(build
            .graph
            .edges
            .contains(&Edge::new("person:anonymous", Relation::AffiliatedWith, unit_id(LOGIC))));
    }

    #[test]
    fn short_names_do_not_match_inside_longer_ones() {
        let build = build_graph(
            &people(vec![
                person("u1", "Bob", None, None, ""),
                person("u2", "Jane Roe", None, None, "Supervised by Bobby Tables."),
            ]),
            &CategorizedDataset::new(),
        );
        assert!(build.graph.edges_of(Relation::Supervises).next().is_none());
        assert_eq!(build.warnings.len(), 1);
    }
}
