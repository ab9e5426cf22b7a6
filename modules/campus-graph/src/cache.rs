use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwapOption;
use tracing::{info, warn};

use crate::error::GraphError;
use crate::model::Graph;
use crate::persist::read_graph;
use crate::query::GraphIndex;

/// Lazily loaded, explicitly invalidated view of the persisted graph.
///
/// The first query after construction or invalidation parses the graph
/// file; every later query reuses the same snapshot until the next
/// `invalidate`. Readers never block each other.
pub struct GraphCache {
    path: PathBuf,
    inner: ArcSwapOption<GraphIndex>,
    load_lock: Mutex<()>,
    loaded_mtime: Mutex<Option<SystemTime>>,
    loads: AtomicUsize,
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl GraphCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: ArcSwapOption::empty(),
            load_lock: Mutex::new(()),
            loaded_mtime: Mutex::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current snapshot, loading it on first use.
    pub fn get(&self) -> Result<Arc<GraphIndex>, GraphError> {
        if let Some(index) = self.inner.load_full() {
            return Ok(index);
        }

        // One loader at a time; late arrivals pick up the fresh snapshot.
        let _guard = self.load_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(index) = self.inner.load_full() {
            return Ok(index);
        }

        let modified = mtime(&self.path);
        let index = Arc::new(GraphIndex::new(read_graph(&self.path)?));
        self.inner.store(Some(Arc::clone(&index)));
        *self.loaded_mtime.lock().unwrap_or_else(|p| p.into_inner()) = modified;
        let loads = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            path = %self.path.display(),
            nodes = index.graph().nodes.len(),
            loads,
            "Graph cache loaded"
        );
        Ok(index)
    }

    /// Install a freshly built graph without a round trip through the file.
    pub fn replace(&self, graph: Graph) {
        let _guard = self.load_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.inner.store(Some(Arc::new(GraphIndex::new(graph))));
        *self.loaded_mtime.lock().unwrap_or_else(|p| p.into_inner()) = mtime(&self.path);
        info!("Graph cache replaced");
    }

    /// Drop the snapshot. The next `get` reloads from disk.
    pub fn invalidate(&self) {
        self.inner.store(None);
        info!("Graph cache invalidated");
    }

    /// How many times the graph file has been parsed.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Whether the file changed since the current snapshot was loaded.
    pub fn is_stale(&self) -> bool {
        if self.inner.load().is_none() {
            return false;
        }
        let loaded = *self.loaded_mtime.lock().unwrap_or_else(|p| p.into_inner());
        mtime(&self.path) != loaded
    }

    /// Spawn a background loop that invalidates the cache whenever another
    /// process (the sync CLI) has rewritten the graph file.
    pub fn spawn_reload_loop(self: &Arc<Self>, interval: Duration) {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if cache.is_stale() {
                    cache.invalidate();
                    if let Err(e) = cache.get() {
                        warn!(error = %e, "Graph reload failed, will retry on next query");
                    }
                }
            }
        });

        info!(interval_secs = interval.as_secs(), "Graph reload loop started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeKind};
    use crate::persist::write_graph;

    fn graph(name: &str) -> Graph {
        Graph {
            nodes: vec![Node {
                id: "org:x".into(),
                name: name.into(),
                kind: NodeKind::OrgUnit,
                role: None,
                url: None,
            }],
            edges: vec![],
        }
    }

    #[test]
    fn burst_of_queries_parses_once() {
        let dir = tempfile::tempdir().unwrap();
        let (json, _) = write_graph(dir.path(), &graph("Chair of X")).unwrap();
        let cache = GraphCache::new(json);

        for _ in 0..50 {
            let index = cache.get().unwrap();
            assert!(index.query("chair", None).is_some());
        }
        assert_eq!(cache.loads(), 1);
    }

    #[test]
    fn invalidation_picks_up_the_new_graph() {
        let dir = tempfile::tempdir().unwrap();
        let (json, _) = write_graph(dir.path(), &graph("Old Name")).unwrap();
        let cache = GraphCache::new(json);
        assert!(cache.get().unwrap().resolve("Old Name").is_some());

        write_graph(dir.path(), &graph("New Name")).unwrap();
        // Stale but consistent until invalidated.
        assert!(cache.get().unwrap().resolve("Old Name").is_some());

        cache.invalidate();
        assert!(cache.get().unwrap().resolve("New Name").is_some());
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn replace_skips_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GraphCache::new(dir.path().join("graph.json"));
        cache.replace(graph("Installed"));
        assert!(cache.get().unwrap().resolve("Installed").is_some());
        assert_eq!(cache.loads(), 0);
    }

    #[test]
    fn missing_file_is_an_empty_graph() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GraphCache::new(dir.path().join("graph.json"));
        assert!(cache.get().unwrap().graph().is_empty());
    }
}
