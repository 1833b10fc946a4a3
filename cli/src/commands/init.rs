//! `init`.

use std::path::Path;

use anyhow::Result;
use hlc_shared::ArticleStatus;

use super::open_lifecycle;

/// Opens or creates the store and reports what it holds.
pub fn run(db_path: &Path) -> Result<()> {
    // Loading seeds the system pages on first use.
    let lifecycle = open_lifecycle(db_path)?;
    let store = lifecycle.store();

    tracing::info!("Local store ready at {}", db_path.display());
    for status in ArticleStatus::ALL {
        tracing::info!("  {:<10} {} article(s)", status.as_str(), store.partition(status).len());
    }
    tracing::info!("  {:<10} {} page(s)", "pages", store.pages().len());
    Ok(())
}
