//! Subcommand implementations.

pub mod backup;
pub mod init;
pub mod list;
pub mod media;
pub mod pages;
pub mod sync;
pub mod transition;
pub mod write_draft;

use std::path::Path;

use anyhow::{Context, Result};
use hlc_shared::{
    content_store::ContentStore,
    dashboard::{DashboardController, Notice},
    lifecycle::Lifecycle,
    local_store::LocalStore,
};

use crate::{
    cli::{Cli, Commands},
    utils,
};

/// Runs the parsed command.
pub async fn run(cli: Cli) -> Result<()> {
    let db_path = cli.db_path;
    match cli.command {
        Commands::Init => init::run(&db_path),
        Commands::List { partition, format } => list::run(&db_path, partition.map(Into::into), format),
        Commands::WriteDraft {
            file,
            id,
            title,
            content,
            tags,
            category,
            author,
        } => write_draft::run(
            &db_path,
            write_draft::DraftOptions {
                file,
                id,
                title,
                content,
                tags,
                category,
                author,
            },
        ),
        Commands::Schedule { id, at } => transition::schedule(&db_path, &id, &at),
        Commands::Publish { id, title, yes } => transition::publish(&db_path, id, title, yes),
        Commands::Delete { id, partition, yes } => transition::delete(&db_path, &id, partition.into(), yes),
        Commands::PublishDue => transition::publish_due(&db_path),
        Commands::Pages { command } => pages::run(&db_path, command),
        Commands::Sync => sync::run(&db_path).await,
        Commands::Media { command } => media::run(&db_path, command),
        Commands::Backup { out, force } => backup::backup(&db_path, &out, force),
        Commands::Restore { file, yes } => backup::restore(&db_path, &file, yes),
    }
}

pub(crate) fn open_local(db_path: &Path) -> Result<LocalStore> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    LocalStore::open(db_path).with_context(|| format!("failed to open local store {}", db_path.display()))
}

pub(crate) fn open_lifecycle(db_path: &Path) -> Result<Lifecycle> {
    let store = ContentStore::load(open_local(db_path)?).context("failed to load content partitions")?;
    Ok(Lifecycle::new(store))
}

/// Prints a dashboard notice and turns failures into an error exit.
pub(crate) fn report(notice: Notice) -> Result<()> {
    if notice.is_failure() {
        anyhow::bail!("{}", notice.message);
    }
    println!("{notice}");
    Ok(())
}

/// Asks before running the staged dashboard action; declining cancels it.
pub(crate) fn confirm_pending(dashboard: &mut DashboardController<'_>, assume_yes: bool) -> Result<()> {
    let Some(prompt) = dashboard.pending().map(|action| action.prompt()) else {
        return Ok(());
    };
    if utils::confirm(&prompt, assume_yes)? {
        report(dashboard.confirm())
    } else {
        dashboard.cancel();
        println!("Cancelled.");
        Ok(())
    }
}
