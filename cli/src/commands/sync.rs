//! `sync`.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use hlc_shared::{
    remote::{RemoteConfig, RemoteContentStore, SanityClient},
    sync::{ContentSync, Source},
};
use tokio::sync::Mutex;

use super::open_lifecycle;

/// Mirrors the remote published list into the local store.
pub async fn run(db_path: &Path) -> Result<()> {
    let config = RemoteConfig::from_env()
        .context("HLC_REMOTE_PROJECT_ID is not set; nothing to sync from")?;
    tracing::info!(project = %config.project_id, dataset = %config.dataset, "pulling published articles");

    let client = SanityClient::new(config).context("failed to build remote client")?;
    let remote: Arc<dyn RemoteContentStore> = Arc::new(client);
    let lifecycle = Arc::new(Mutex::new(open_lifecycle(db_path)?));
    let sync = ContentSync::new(lifecycle, Some(remote));

    let loaded = sync.load_published().await;
    match loaded.source {
        Source::Remote => {
            println!("Synced {} published article(s) from the remote store.", loaded.value.len());
            Ok(())
        },
        Source::Fallback | Source::Local => {
            let warning = loaded.warning.unwrap_or_else(|| "remote store unavailable".to_string());
            anyhow::bail!("{warning} ({} article(s) kept locally)", loaded.value.len())
        },
    }
}
