use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use campus_archive::{
    collect_candidates, extract, extract_general_sections, extract_reading_groups, Document, InteractiveListing,
    ListingSource, PageFetcher, PageKind, RevealConfig, RevealDriver, StaticListing,
};
use campus_common::{canonical_url, CategorizedDataset, Category, Config, DatasetKind, FlatDataset, Record, RecordKind};
use campus_graph::{build_graph, write_graph, GraphBuild, GraphCache};
use campus_store::{merge_categories, Dataset, DatasetStore};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::normalize::{categorize_research, Normalizer, TopicMatcher};
use crate::sources::{ListingKind, SourcePlan};

#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncStats {
    pub listings_failed: u32,
    pub candidates: u32,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub records_dropped: u32,
    pub normalization_warnings: u32,
    pub extracted: BTreeMap<DatasetKind, u32>,
    pub persisted: BTreeMap<DatasetKind, usize>,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub unresolved_references: usize,
    pub cancelled: bool,
}

impl std::fmt::Display for SyncStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Sync Pass Complete ===")?;
        if self.cancelled {
            writeln!(f, "CANCELLED: nothing was written")?;
        }
        writeln!(f, "Listings failed:    {}", self.listings_failed)?;
        writeln!(f, "Candidate URLs:     {}", self.candidates)?;
        writeln!(f, "Pages fetched:      {}", self.pages_fetched)?;
        writeln!(f, "Pages failed:       {}", self.pages_failed)?;
        writeln!(f, "Records dropped:    {}", self.records_dropped)?;
        writeln!(f, "Norm. warnings:     {}", self.normalization_warnings)?;
        writeln!(f, "\nExtracted / persisted:")?;
        for kind in DatasetKind::ALL {
            let extracted = self.extracted.get(&kind).copied().unwrap_or(0);
            match self.persisted.get(&kind) {
                Some(total) => writeln!(f, "  {kind:<9} {extracted:>4} / {total}")?,
                None => writeln!(f, "  {kind:<9} {extracted:>4} / -")?,
            }
        }
        writeln!(f, "\nGraph:")?;
        writeln!(f, "  Nodes:      {}", self.graph_nodes)?;
        writeln!(f, "  Edges:      {}", self.graph_edges)?;
        writeln!(f, "  Unresolved: {}", self.unresolved_references)?;
        Ok(())
    }
}

enum Outcome {
    Extracted(Record),
    FetchFailed,
    Dropped,
    Skipped,
}

fn dataset_of(kind: ListingKind) -> DatasetKind {
    match kind {
        ListingKind::Events => DatasetKind::Events,
        ListingKind::People => DatasetKind::People,
        ListingKind::Research => DatasetKind::Research,
        ListingKind::News => DatasetKind::News,
    }
}

fn dataset_of_record(kind: RecordKind) -> DatasetKind {
    match kind {
        RecordKind::Event => DatasetKind::Events,
        RecordKind::Person => DatasetKind::People,
        RecordKind::Research => DatasetKind::Research,
        RecordKind::News => DatasetKind::News,
        RecordKind::General | RecordKind::ReadingGroup => DatasetKind::General,
    }
}

/// News items grouped by year.
fn categorize_news(records: Vec<Record>) -> CategorizedDataset {
    let mut dataset = CategorizedDataset::new();
    for record in records {
        let year = record.metadata.get("year").and_then(|y| y.as_int());
        let (id, name) = match year {
            Some(year) => (year.to_string(), format!("News {year}")),
            None => ("undated".to_string(), "Undated news".to_string()),
        };
        dataset
            .entry(id.clone())
            .or_insert_with(|| Category::new(id, name))
            .insert(record);
    }
    for category in dataset.values_mut() {
        category.subtopics = category.items.values().map(|r| r.title.clone()).collect();
    }
    dataset
}

fn general_category(id: &str, name: &str, url: &str, records: Vec<Record>) -> Option<(String, Category)> {
    if records.is_empty() {
        return None;
    }
    let mut category = Category::new(id, name);
    category.url = url.to_string();
    for record in records {
        category.insert(record);
    }
    category.subtopics = category.items.values().map(|r| r.title.clone()).collect();
    Some((id.to_string(), category))
}

/// Rebuild both graph files from the persisted people and research datasets.
pub fn rebuild_graph(store: &DatasetStore, graph_dir: &Path) -> Result<GraphBuild> {
    let people = store
        .load(DatasetKind::People)
        .context("loading people dataset")?
        .into_flat()
        .unwrap_or_default();
    let research = store
        .load(DatasetKind::Research)
        .context("loading research dataset")?
        .into_categorized()
        .unwrap_or_default();

    let build = build_graph(&people, &research);
    write_graph(graph_dir, &build.graph).context("writing graph files")?;
    Ok(build)
}

/// One synchronization pass: fetch → extract → normalize → merge → rebuild graph.
pub struct Scout {
    fetcher: Arc<dyn PageFetcher>,
    driver: Option<Arc<dyn RevealDriver>>,
    reveal: RevealConfig,
    store: DatasetStore,
    graph_dir: PathBuf,
    plan: SourcePlan,
    concurrency: usize,
    datasets: BTreeSet<DatasetKind>,
    cache: Option<Arc<GraphCache>>,
}

impl Scout {
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>, plan: SourcePlan) -> Self {
        Self {
            fetcher,
            driver: None,
            reveal: RevealConfig::new(config.reveal_selector.clone())
                .settle(config.reveal_settle)
                .max_clicks(config.reveal_max_clicks),
            store: DatasetStore::new(&config.data_dir),
            graph_dir: config.graph_dir(),
            plan,
            concurrency: config.fetch_concurrency.max(1),
            datasets: DatasetKind::ALL.into_iter().collect(),
            cache: None,
        }
    }

    /// Browser for listings that need "load more" clicks. Without one those
    /// listings are read as static pages.
    pub fn with_driver(mut self, driver: Arc<dyn RevealDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Snapshot to refresh once the new graph is on disk.
    pub fn with_cache(mut self, cache: Arc<GraphCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Restrict the pass to some datasets. An empty selection means all.
    pub fn only(mut self, datasets: impl IntoIterator<Item = DatasetKind>) -> Self {
        let selected: BTreeSet<_> = datasets.into_iter().collect();
        if !selected.is_empty() {
            self.datasets = selected;
        }
        self
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    fn wants(&self, kind: DatasetKind) -> bool {
        self.datasets.contains(&kind)
    }

    fn listing_sources(&self, kind: ListingKind) -> Vec<Arc<dyn ListingSource>> {
        self.plan
            .listings_of(kind)
            .map(|plan| -> Arc<dyn ListingSource> {
                match (&self.driver, plan.interactive) {
                    (Some(driver), true) => Arc::new(
                        InteractiveListing::new(&plan.url, kind.marker(), self.reveal.clone(), Arc::clone(driver))
                            .with_fallback(Arc::clone(&self.fetcher)),
                    ),
                    (None, true) => {
                        warn!(url = plan.url.as_str(), "No browser available, reading first page of listing only");
                        Arc::new(StaticListing::new(&plan.url, kind.marker(), Arc::clone(&self.fetcher)))
                    }
                    (_, false) => Arc::new(StaticListing::new(&plan.url, kind.marker(), Arc::clone(&self.fetcher))),
                }
            })
            .collect()
    }

    /// Fetch + extract one detail page.
    async fn process(&self, url: String, kind: PageKind) -> Outcome {
        let html = match self.fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = url.as_str(), error = %e, "Fetch failed, skipping page");
                return Outcome::FetchFailed;
            }
        };
        match extract(&Document::new(&url, html), kind).map(|e| e.into_record()) {
            Ok(Some(record)) => Outcome::Extracted(record),
            Ok(None) => Outcome::Dropped,
            Err(e) => {
                warn!(url = url.as_str(), error = %e, "Extraction failed, record dropped");
                Outcome::Dropped
            }
        }
    }

    /// A page already read as a listing, or a fresh fetch.
    async fn page(&self, documents: &BTreeMap<String, String>, url: &str, stats: &mut SyncStats) -> Option<String> {
        if let Some(html) = documents.get(url) {
            return Some(html.clone());
        }
        match self.fetcher.fetch(url).await {
            Ok(html) => {
                stats.pages_fetched += 1;
                Some(html)
            }
            Err(e) => {
                warn!(url, error = %e, "Fetch failed, skipping page");
                stats.pages_failed += 1;
                None
            }
        }
    }

    /// Run one full synchronization pass.
    ///
    /// Cancellation is honoured between pages. A cancelled pass writes
    /// nothing. Only persistence failures are errors; every per-page problem
    /// is logged and counted.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<SyncStats> {
        let mut stats = SyncStats::default();

        // 1. Listings → deduplicated candidate detail URLs.
        let mut seen = HashSet::new();
        let mut jobs: Vec<(String, PageKind)> = Vec::new();
        let mut documents = BTreeMap::new();

        for kind in [ListingKind::Events, ListingKind::People, ListingKind::Research, ListingKind::News] {
            if !self.wants(dataset_of(kind)) {
                continue;
            }
            let harvest = collect_candidates(&self.listing_sources(kind)).await;
            stats.listings_failed += harvest.failed;
            documents.extend(harvest.documents);

            let pinned: Vec<String> = match kind {
                ListingKind::Research => self
                    .plan
                    .research_pages
                    .iter()
                    .filter_map(|u| canonical_url(u, None))
                    .collect(),
                _ => Vec::new(),
            };
            for url in harvest.urls.into_iter().chain(pinned) {
                if seen.insert(url.clone()) {
                    jobs.push((url, kind.detail_kind()));
                }
            }
        }
        stats.candidates = jobs.len() as u32;
        info!(candidates = jobs.len(), listings_failed = stats.listings_failed, "Candidate URLs collected");

        // 2. Fetch + extract in parallel. Nothing shared is mutated here.
        let outcomes: Vec<Outcome> = stream::iter(jobs.into_iter().map(|(url, kind)| async move {
            if cancel.is_cancelled() {
                return Outcome::Skipped;
            }
            self.process(url, kind).await
        }))
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        let mut extracted: Vec<Record> = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Extracted(record) => {
                    stats.pages_fetched += 1;
                    extracted.push(record);
                }
                Outcome::FetchFailed => stats.pages_failed += 1,
                Outcome::Dropped => {
                    stats.pages_fetched += 1;
                    stats.records_dropped += 1;
                }
                Outcome::Skipped => {}
            }
        }

        if self.wants(DatasetKind::General) {
            if let Some(html) = self.page(&documents, &self.plan.home, &mut stats).await {
                extracted.extend(extract_general_sections(&html, &self.plan.home));
            }
            if let Some(html) = self.page(&documents, &self.plan.reading_groups, &mut stats).await {
                extracted.extend(extract_reading_groups(&html, &self.plan.reading_groups));
            }
        }

        if cancel.is_cancelled() {
            warn!(extracted = extracted.len(), "Sync pass cancelled before merge, nothing written");
            stats.cancelled = true;
            return Ok(stats);
        }

        // 3. Normalize. Topic linking sees the research areas as they will
        // be after this pass's merge.
        let persisted_research = self
            .store
            .load(DatasetKind::Research)
            .context("loading research dataset")?
            .into_categorized()
            .unwrap_or_default();
        let upcoming_research = if self.wants(DatasetKind::Research) {
            let fresh: Vec<Record> = extracted
                .iter()
                .filter(|r| r.kind == RecordKind::Research)
                .cloned()
                .collect();
            merge_categories(persisted_research, categorize_research(fresh, &self.plan.research_index))
        } else {
            persisted_research
        };
        let normalizer = Normalizer::new(TopicMatcher::with_research(&upcoming_research));

        let mut by_kind: BTreeMap<DatasetKind, Vec<Record>> = BTreeMap::new();
        for record in extracted {
            let (record, warnings) = normalizer.normalize(record);
            stats.normalization_warnings += warnings.len() as u32;
            let kind = dataset_of_record(record.kind);
            *stats.extracted.entry(kind).or_default() += 1;
            by_kind.entry(kind).or_default().push(record);
        }

        // 4. Merge, one dataset at a time.
        for kind in DatasetKind::ALL {
            if !self.wants(kind) {
                continue;
            }
            let records = by_kind.remove(&kind).unwrap_or_default();
            let incoming = match kind {
                DatasetKind::Events | DatasetKind::People => {
                    Dataset::Flat(records.into_iter().map(|r| (r.url.clone(), r)).collect::<FlatDataset>())
                }
                DatasetKind::Research => Dataset::Categorized(categorize_research(records, &self.plan.research_index)),
                DatasetKind::News => Dataset::Categorized(categorize_news(records)),
                DatasetKind::General => {
                    let (groups, sections): (Vec<Record>, Vec<Record>) =
                        records.into_iter().partition(|r| r.kind == RecordKind::ReadingGroup);
                    Dataset::Categorized(
                        [
                            general_category("about", "About", &self.plan.home, sections),
                            general_category("reading_groups", "Reading Groups", &self.plan.reading_groups, groups),
                        ]
                        .into_iter()
                        .flatten()
                        .collect(),
                    )
                }
            };
            let saved = self
                .store
                .merge_and_save(kind, incoming)
                .with_context(|| format!("merging {kind} dataset"))?;
            stats.persisted.insert(kind, saved.len());
        }

        // 5. Rebuild the graph from what is now persisted.
        let build = rebuild_graph(&self.store, &self.graph_dir)?;
        stats.graph_nodes = build.graph.nodes.len();
        stats.graph_edges = build.graph.edges.len();
        stats.unresolved_references = build.warnings.len();

        if let Some(cache) = &self.cache {
            cache.replace(build.graph);
        }

        info!("{stats}");
        Ok(stats)
    }
}
