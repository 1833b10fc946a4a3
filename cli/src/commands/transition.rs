//! Lifecycle transitions: `schedule`, `publish`, `delete` and `publish-due`.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use hlc_shared::{dashboard::DashboardController, ArticleStatus};

use super::{confirm_pending, open_lifecycle, report};
use crate::utils::parse_schedule_time;

/// Schedules article `id` for `at`.
pub fn schedule(db_path: &Path, id: &str, at: &str) -> Result<()> {
    let when = parse_schedule_time(at)?;
    let mut lifecycle = open_lifecycle(db_path)?;
    let Some((status, _)) = lifecycle.store().find(id) else {
        anyhow::bail!("article `{id}` not found");
    };

    let mut dashboard = DashboardController::new(&mut lifecycle);
    dashboard.select_article(status, id)?;
    report(dashboard.schedule(when))
}

/// Publishes by id or title after confirmation.
pub fn publish(db_path: &Path, id: Option<String>, title: Option<String>, yes: bool) -> Result<()> {
    let mut lifecycle = open_lifecycle(db_path)?;
    let mut dashboard = DashboardController::new(&mut lifecycle);
    match (id, title) {
        (Some(id), _) => dashboard.request_publish(&id),
        (None, Some(title)) => dashboard.request_publish_by_title(&title),
        (None, None) => anyhow::bail!("either an id or --title is required"),
    };
    confirm_pending(&mut dashboard, yes)
}

/// Deletes article `id` from `partition` after confirmation.
pub fn delete(db_path: &Path, id: &str, partition: ArticleStatus, yes: bool) -> Result<()> {
    let mut lifecycle = open_lifecycle(db_path)?;
    let mut dashboard = DashboardController::new(&mut lifecycle);
    dashboard.request_delete(id, partition);
    confirm_pending(&mut dashboard, yes)
}

/// Publishes every due scheduled article.
pub fn publish_due(db_path: &Path) -> Result<()> {
    let mut lifecycle = open_lifecycle(db_path)?;
    let published = lifecycle.publish_due(Utc::now())?;
    if published.is_empty() {
        println!("Nothing is due.");
    }
    for article in &published {
        println!("published {} ({})", article.title, article.id);
    }
    Ok(())
}
