//! `list`.

use std::path::Path;

use anyhow::Result;
use hlc_shared::{dashboard::DashboardController, ArticleListItem, ArticleStatus};

use super::open_lifecycle;
use crate::cli::OutputFormat;

/// Prints one or every partition.
pub fn run(db_path: &Path, partition: Option<ArticleStatus>, format: OutputFormat) -> Result<()> {
    let mut lifecycle = open_lifecycle(db_path)?;
    let dashboard = DashboardController::new(&mut lifecycle);
    let partitions: Vec<ArticleStatus> = match partition {
        Some(status) => vec![status],
        None => ArticleStatus::ALL.to_vec(),
    };
    let items: Vec<ArticleListItem> = partitions
        .into_iter()
        .flat_map(|status| dashboard.list(status))
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Table => print_table(&items),
    }
    Ok(())
}

fn print_table(items: &[ArticleListItem]) {
    if items.is_empty() {
        println!("(no articles)");
        return;
    }
    println!("{:<10} {:<36} {:<11} {:<20} TITLE", "STATUS", "ID", "CATEGORY", "WHEN");
    for item in items {
        let when = match item.status {
            ArticleStatus::Scheduled => item
                .scheduled_date
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string()),
            ArticleStatus::Published => item
                .published_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string()),
            ArticleStatus::Draft => None,
        }
        .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<36} {:<11} {:<20} {}",
            item.status.as_str(),
            item.id,
            item.category.as_str(),
            when,
            item.title
        );
    }
}
