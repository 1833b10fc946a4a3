//! `pages` subcommands.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use hlc_shared::{content::markdown_to_html, dashboard::DashboardController};

use super::{confirm_pending, open_lifecycle, report};
use crate::cli::PagesCommand;

/// Runs a page subcommand.
pub fn run(db_path: &Path, command: PagesCommand) -> Result<()> {
    let mut lifecycle = open_lifecycle(db_path)?;
    let mut dashboard = DashboardController::new(&mut lifecycle);

    match command {
        PagesCommand::List => {
            for page in dashboard.pages() {
                let marker = if page.is_system { "system" } else { "" };
                println!(
                    "{:<20} {:<20} {:<6} {}",
                    page.id,
                    page.slug,
                    marker,
                    page.title
                );
            }
            Ok(())
        },
        PagesCommand::Save {
            id,
            title,
            slug,
            file,
            content,
        } => {
            let body = match (&file, content) {
                (Some(file), _) => {
                    let markdown = fs::read_to_string(file)
                        .with_context(|| format!("failed to read {}", file.display()))?;
                    Some(markdown_to_html(&markdown))
                },
                (None, content) => content,
            };
            let page = match id.as_deref() {
                Some(id) => dashboard.select_page(id)?,
                None => dashboard.new_page(),
            };
            page.title = title;
            if let Some(slug) = slug {
                page.slug = slug;
            }
            if let Some(body) = body {
                page.content = body;
            }
            report(dashboard.save_page())
        },
        PagesCommand::Delete { id, yes } => {
            dashboard.request_delete_page(&id);
            confirm_pending(&mut dashboard, yes)
        },
    }
}
