use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Person,
    OrgUnit,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Person => "Person",
            NodeKind::OrgUnit => "Organizational Unit",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Source record identity, for people.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Edge types. Directions are fixed:
/// `Person affiliated_with OrgUnit`, `Person leads OrgUnit`,
/// `Person(supervisor) supervises Person(supervisee)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    AffiliatedWith,
    Leads,
    Supervises,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::AffiliatedWith => "affiliated_with",
            Relation::Leads => "leads",
            Relation::Supervises => "supervises",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "affiliated_with" | "affiliation" | "member_of" => Some(Relation::AffiliatedWith),
            "leads" | "lead" | "head_of" => Some(Relation::Leads),
            "supervises" | "supervision" | "supervised_by" => Some(Relation::Supervises),
            _ => None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub relation: Relation,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, relation: Relation, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            relation,
            target: target.into(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// Directed attributed graph. Nodes are unique by id; at most one edge of a
/// relation per ordered pair. Both lists are kept sorted so the persisted
/// form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn from_parts(nodes: BTreeMap<String, Node>, edges: BTreeSet<Edge>) -> Self {
        Self {
            nodes: nodes.into_values().collect(),
            edges: edges.into_iter().collect(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edges_of(&self, relation: Relation) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.relation == relation)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
