pub mod builder;
pub mod cache;
pub mod error;
pub mod model;
pub mod outline;
pub mod persist;
pub mod query;

pub use builder::{build_graph, GraphBuild, LEADERSHIP_ROLES};
pub use cache::GraphCache;
pub use error::{GraphError, GraphResolutionWarning};
pub use model::{Edge, Graph, Node, NodeKind, Relation};
pub use outline::render_outline;
pub use persist::{read_graph, write_graph, GRAPH_JSON, GRAPH_OUTLINE};
pub use query::{GraphIndex, Neighborhood};
