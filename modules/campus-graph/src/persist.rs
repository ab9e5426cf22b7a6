use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use campus_store::{write_atomic, write_bytes_atomic};
use tracing::{info, warn};

use crate::error::GraphError;
use crate::model::Graph;
use crate::outline::render_outline;

/// Structured node/edge lists, read by the query layer.
pub const GRAPH_JSON: &str = "graph.json";
/// Outline for direct context injection.
pub const GRAPH_OUTLINE: &str = "graph.md";

/// Write both representations from the same graph. Each file is replaced
/// atomically; the outline is always derived, never built separately.
pub fn write_graph(dir: &Path, graph: &Graph) -> Result<(PathBuf, PathBuf), GraphError> {
    let json_path = dir.join(GRAPH_JSON);
    let outline_path = dir.join(GRAPH_OUTLINE);

    write_atomic(&json_path, graph)?;
    write_bytes_atomic(&outline_path, render_outline(graph).as_bytes())?;

    info!(
        dir = %dir.display(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Graph files written"
    );
    Ok((json_path, outline_path))
}

/// The persisted graph. A missing file is an empty graph.
pub fn read_graph(path: &Path) -> Result<Graph, GraphError> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| GraphError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "No graph file yet, using an empty graph");
            Ok(Graph::default())
        }
        Err(source) => Err(GraphError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeKind};

    #[test]
    fn both_files_come_from_one_graph() {
        let dir = tempfile::tempdir().unwrap();
        let graph = Graph {
            nodes: vec![Node {
                id: "org:logic".into(),
                name: "Chair of Logic".into(),
                kind: NodeKind::OrgUnit,
                role: None,
                url: None,
            }],
            edges: vec![],
        };
        let (json, outline) = write_graph(dir.path(), &graph).unwrap();

        assert_eq!(read_graph(&json).unwrap(), graph);
        assert_eq!(fs::read_to_string(outline).unwrap(), render_outline(&graph));
    }

    #[test]
    fn missing_graph_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_graph(&dir.path().join(GRAPH_JSON)).unwrap().is_empty());
    }
}
