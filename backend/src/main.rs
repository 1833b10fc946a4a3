//! HTTP surface of the magazine: public article and page reads, reader
//! comments and the admin lifecycle endpoints.

mod config;
mod handlers;
mod request_context;
mod routes;
mod scheduler;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use hlc_shared::{
    content_store::ContentStore,
    lifecycle::Lifecycle,
    local_store::LocalStore,
    remote::{RemoteConfig, RemoteContentStore, SanityClient},
    sync::ContentSync,
};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::ServerConfig::from_env();
    tracing::info!("Starting Humanities Last Chance backend");
    tracing::info!("Local store: {}", config.db_path.display());

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let local = LocalStore::open(&config.db_path)
        .with_context(|| format!("failed to open local store {}", config.db_path.display()))?;
    let store = ContentStore::load(local).context("failed to load content partitions")?;
    let lifecycle = Arc::new(Mutex::new(Lifecycle::new(store)));

    let remote: Option<Arc<dyn RemoteContentStore>> = match RemoteConfig::from_env() {
        Some(remote_config) => {
            tracing::info!(
                project = %remote_config.project_id,
                dataset = %remote_config.dataset,
                "remote content store enabled"
            );
            let client = SanityClient::new(remote_config).context("failed to build remote client")?;
            Some(Arc::new(client) as Arc<dyn RemoteContentStore>)
        },
        None => {
            tracing::info!("no remote content store configured, serving the local store");
            None
        },
    };

    if let Some(every) = config.sweep_every {
        tracing::info!(seconds = every.as_secs(), "scheduled publication sweep enabled");
        scheduler::spawn_schedule_sweeper(lifecycle.clone(), every);
    }

    let app_state = state::AppState::new(ContentSync::new(lifecycle, remote)).await;
    let app = routes::create_router(app_state);

    let addr = config.listen_addr();
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
