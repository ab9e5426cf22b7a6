use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use campus_archive::{ChromeRevealDriver, FetchError, HttpFetcher, PageFetcher};
use campus_common::{Config, DatasetKind};
use campus_scout::scout::rebuild_graph;
use campus_scout::{Scout, SourcePlan};
use campus_store::DatasetStore;

#[derive(Parser)]
#[command(name = "campus-sync", about = "Synchronize the institute knowledge base")]
struct Cli {
    /// Data directory (overrides CAMPUS_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Parallel detail-page fetches (overrides CAMPUS_FETCH_CONCURRENCY)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Only these datasets, comma separated (events,people,research,news,general)
    #[arg(long, value_delimiter = ',')]
    datasets: Vec<DatasetKind>,

    /// Read interactive listings as static pages instead of starting a browser
    #[arg(long)]
    no_browser: bool,

    /// Print the pass statistics as JSON on stdout
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Remove one record from a dataset. Sync passes never remove anything.
    Remove { dataset: DatasetKind, identity: String },
}

async fn start_browser(config: &Config) -> Result<ChromeRevealDriver, FetchError> {
    match &config.browser_ws {
        Some(ws) => ChromeRevealDriver::connect(ws).await,
        None => ChromeRevealDriver::launch(&config.chrome_bin).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("campus=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(concurrency) = cli.concurrency {
        config.fetch_concurrency = concurrency.max(1);
    }
    config.log_summary();

    if let Some(Command::Remove { dataset, identity }) = cli.command {
        let store = DatasetStore::new(&config.data_dir);
        let removed = store
            .remove(dataset, &identity)
            .with_context(|| format!("removing {identity} from {dataset}"))?;
        if removed && matches!(dataset, DatasetKind::People | DatasetKind::Research) {
            rebuild_graph(&store, &config.graph_dir())?;
        }
        info!(dataset = %dataset, identity = identity.as_str(), removed, "Remove finished");
        return Ok(());
    }

    info!("Campus sync starting...");

    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(HttpFetcher::from_config(&config).context("building HTTP fetcher")?);
    let plan = SourcePlan::load(&config.base_url, &config.data_dir);
    let mut scout = Scout::new(&config, fetcher, plan).only(cli.datasets);

    if !cli.no_browser {
        match start_browser(&config).await {
            Ok(driver) => scout = scout.with_driver(Arc::new(driver)),
            Err(e) => warn!(error = %e, "Browser unavailable, interactive listings fall back to their first page"),
        }
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight pages and stopping");
            on_interrupt.cancel();
        }
    });

    let stats = scout.run(&cancel).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}
