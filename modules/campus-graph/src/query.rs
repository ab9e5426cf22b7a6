// Graph Query Layer. Read-only; one hop around a single matched node.

use std::collections::HashMap;

use campus_common::mentions;
use serde::Serialize;

use crate::model::{Edge, Graph, Node, Relation};

/// A matched node with its incident edges and the nodes at their other ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighborhood {
    pub node: Node,
    pub edges: Vec<Edge>,
    pub neighbors: Vec<Node>,
}

impl Neighborhood {
    /// Every node in the neighborhood, the matched node first.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        std::iter::once(&self.node).chain(self.neighbors.iter())
    }

    /// Natural-language rendering for context injection.
    pub fn render(&self) -> String {
        let names: HashMap<&str, &str> = self.nodes().map(|n| (n.id.as_str(), n.name.as_str())).collect();

        let mut out = String::from("Institutional Context:\n");
        for node in self.nodes() {
            out.push_str(&format!("- **{}** ({})", node.name, node.kind));
            if let Some(role) = &node.role {
                out.push_str(&format!(": Role: {role}"));
            }
            out.push('\n');
        }

        if !self.edges.is_empty() {
            out.push_str("\nRelationships:\n");
            for edge in &self.edges {
                let source = names.get(edge.source.as_str()).copied().unwrap_or(&edge.source);
                let target = names.get(edge.target.as_str()).copied().unwrap_or(&edge.target);
                out.push_str(&format!("- {source} **{}** {target}\n", edge.relation));
            }
        }
        out
    }
}

/// In-memory graph with id and lowercase-name lookups. Built once per load.
#[derive(Debug, Default)]
pub struct GraphIndex {
    graph: Graph,
    by_id: HashMap<String, usize>,
    lowered: Vec<String>,
}

impl GraphIndex {
    pub fn new(graph: Graph) -> Self {
        let by_id = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let lowered = graph.nodes.iter().map(|n| n.name.to_lowercase()).collect();
        Self { graph, by_id, lowered }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&i| &self.graph.nodes[i])
    }

    /// Resolve a node id or display name.
    ///
    /// Order: node id, exact name, case-insensitive name, then names
    /// containing the query (shortest wins), then names contained in the
    /// query (longest wins). Remaining ties go to the smaller id.
    pub fn resolve(&self, query: &str) -> Option<&Node> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(node) = self.node(query) {
            return Some(node);
        }
        let nodes = &self.graph.nodes;
        if let Some(node) = nodes.iter().find(|n| n.name == query) {
            return Some(node);
        }

        let q = query.to_lowercase();
        if let Some(i) = self.lowered.iter().position(|name| *name == q) {
            return Some(&nodes[i]);
        }

        let containing = self
            .lowered
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains(&q))
            .min_by(|(a, an), (b, bn)| an.len().cmp(&bn.len()).then_with(|| nodes[*a].id.cmp(&nodes[*b].id)));
        if let Some((i, _)) = containing {
            return Some(&nodes[i]);
        }

        self.lowered
            .iter()
            .enumerate()
            .filter(|(_, name)| mentions(&q, name))
            .max_by(|(a, an), (b, bn)| an.len().cmp(&bn.len()).then_with(|| nodes[*b].id.cmp(&nodes[*a].id)))
            .map(|(i, _)| &nodes[i])
    }

    /// `query_graph(query_text_or_node_id, relation_filter?)`.
    ///
    /// No match is `None`, never an error.
    pub fn query(&self, query: &str, relation: Option<Relation>) -> Option<Neighborhood> {
        let node = self.resolve(query)?;
        let edges: Vec<Edge> = self
            .graph
            .edges
            .iter()
            .filter(|e| e.touches(&node.id))
            .filter(|e| relation.is_none_or(|r| e.relation == r))
            .cloned()
            .collect();

        let mut neighbors: Vec<Node> = Vec::new();
        for edge in &edges {
            let other = if edge.source == node.id { &edge.target } else { &edge.source };
            if let Some(n) = self.node(other) {
                if !neighbors.iter().any(|existing| existing.id == n.id) {
                    neighbors.push(n.clone());
                }
            }
        }

        Some(Neighborhood {
            node: node.clone(),
            edges,
            neighbors,
        })
    }
}
