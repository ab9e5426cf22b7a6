use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Graph, NodeKind, Relation};

fn entry(name: &str, role: Option<&str>) -> String {
    match role {
        Some(role) => format!("{name} ({role})"),
        None => name.to_string(),
    }
}

/// Human-readable outline of the graph, grouped by organizational unit.
///
/// A pure projection of the structured graph: the outline never carries
/// anything the node/edge lists do not.
pub fn render_outline(graph: &Graph) -> String {
    let names: BTreeMap<&str, &str> = graph.nodes.iter().map(|n| (n.id.as_str(), n.name.as_str())).collect();
    let name = |id: &str| names.get(id).copied().unwrap_or("?").to_string();

    let mut out = String::from("# Institutional Graph\n");
    let mut affiliated: BTreeSet<&str> = BTreeSet::new();

    for unit in graph.nodes.iter().filter(|n| n.kind == NodeKind::OrgUnit) {
        out.push_str(&format!("\n## {}\n", unit.name));

        let leaders: Vec<String> = graph
            .edges_of(Relation::Leads)
            .filter(|e| e.target == unit.id)
            .map(|e| name(&e.source))
            .collect();
        if !leaders.is_empty() {
            out.push_str(&format!("- Led by: {}\n", leaders.join(", ")));
        }

        let members: Vec<&str> = graph
            .edges_of(Relation::AffiliatedWith)
            .filter(|e| e.target == unit.id)
            .map(|e| e.source.as_str())
            .collect();
        if members.is_empty() {
            out.push_str("- No listed members\n");
            continue;
        }
        out.push_str("- Members:\n");
        for member in members {
            affiliated.insert(member);
            let role = graph.node(member).and_then(|n| n.role.as_deref());
            out.push_str(&format!("  - {}\n", entry(&name(member), role)));
        }
    }

    let unaffiliated: Vec<_> = graph
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Person && !affiliated.contains(n.id.as_str()))
        .collect();
    if !unaffiliated.is_empty() {
        out.push_str("\n## Without organizational unit\n");
        for person in unaffiliated {
            out.push_str(&format!("- {}\n", entry(&person.name, person.role.as_deref())));
        }
    }

    let supervision: Vec<_> = graph.edges_of(Relation::Supervises).collect();
    if !supervision.is_empty() {
        out.push_str("\n## Supervision\n");
        for edge in supervision {
            out.push_str(&format!("- {} supervises {}\n", name(&edge.source), name(&edge.target)));
        }
    }

    out
}
