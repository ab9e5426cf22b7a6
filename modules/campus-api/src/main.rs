use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use campus_api::{router, KnowledgeBase};
use campus_common::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("campus=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_summary();

    let kb = Arc::new(KnowledgeBase::from_config(&config));
    // Picks up graphs rewritten by `campus-sync` runs in other processes.
    kb.graph_cache().spawn_reload_loop(config.graph_reload_interval);

    let app = router(kb);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Campus API starting on {addr}");
    info!("Tool definitions at http://{addr}/tools");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
