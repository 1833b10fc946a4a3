//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hlc_shared::ArticleStatus;

/// Output format of listings.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns.
    Table,
    /// Pretty JSON.
    Json,
}

/// Partition names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartitionArg {
    /// Drafts.
    Draft,
    /// Scheduled articles.
    Scheduled,
    /// Published articles.
    Published,
}

impl From<PartitionArg> for ArticleStatus {
    fn from(value: PartitionArg) -> Self {
        match value {
            PartitionArg::Draft => ArticleStatus::Draft,
            PartitionArg::Scheduled => ArticleStatus::Scheduled,
            PartitionArg::Published => ArticleStatus::Published,
        }
    }
}

/// Top-level arguments.
#[derive(Parser)]
#[command(name = "hlc", version, about = "Humanities Last Chance content CLI")]
pub struct Cli {
    /// Local store (SQLite) path.
    #[arg(long, global = true, default_value = "./data/hlc.sqlite3")]
    pub db_path: PathBuf,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Create the local store and seed the system pages.
    Init,
    /// List articles in one or every partition.
    List {
        /// Only this partition.
        #[arg(long, value_enum)]
        partition: Option<PartitionArg>,
        /// Output format.
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Save a draft from a Markdown file or from flags.
    WriteDraft {
        /// Markdown file with optional YAML front matter.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Existing article id to update.
        #[arg(long)]
        id: Option<String>,
        /// Title (overrides front matter).
        #[arg(long)]
        title: Option<String>,
        /// Raw HTML body, used when no file is given.
        #[arg(long)]
        content: Option<String>,
        /// Comma-separated tags list (overrides front matter).
        #[arg(long)]
        tags: Option<String>,
        /// Section: blog, interviews or reviews (overrides front matter).
        #[arg(long)]
        category: Option<String>,
        /// Author (overrides front matter).
        #[arg(long)]
        author: Option<String>,
    },
    /// Schedule an article for publication.
    Schedule {
        /// Article id.
        id: String,
        /// Target time: RFC 3339, `YYYY-MM-DD HH:MM` (UTC) or `YYYY-MM-DD`.
        #[arg(long)]
        at: String,
    },
    /// Publish a draft or scheduled article by id or title.
    Publish {
        /// Article id.
        #[arg(required_unless_present = "title", conflicts_with = "title")]
        id: Option<String>,
        /// Exact title, case-insensitive.
        #[arg(long)]
        title: Option<String>,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Delete an article from a partition.
    Delete {
        /// Article id.
        id: String,
        /// Partition holding the article.
        #[arg(long, value_enum)]
        partition: PartitionArg,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Publish every scheduled article whose date has passed.
    PublishDue,
    /// Manage static pages.
    Pages {
        /// Page subcommand.
        #[command(subcommand)]
        command: PagesCommand,
    },
    /// Pull published articles from the remote store into the local store.
    Sync,
    /// Manage the media library index.
    Media {
        /// Media subcommand.
        #[command(subcommand)]
        command: MediaCommand,
    },
    /// Export every managed key into a snapshot file.
    Backup {
        /// Snapshot file to write.
        #[arg(long)]
        out: PathBuf,
        /// Write even if the backup interval has not elapsed.
        #[arg(long)]
        force: bool,
    },
    /// Replace the local store with a snapshot file.
    Restore {
        /// Snapshot file to read.
        file: PathBuf,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Page subcommands.
#[derive(Subcommand)]
pub enum PagesCommand {
    /// List pages.
    List,
    /// Create or update a page.
    Save {
        /// Existing page id to update.
        #[arg(long)]
        id: Option<String>,
        /// Page title.
        #[arg(long)]
        title: String,
        /// URL slug (derived from the title when omitted).
        #[arg(long)]
        slug: Option<String>,
        /// Markdown file holding the page body.
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,
        /// Raw HTML body.
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a non-system page.
    Delete {
        /// Page id.
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Media library subcommands.
#[derive(Subcommand)]
pub enum MediaCommand {
    /// List the media library.
    List,
    /// Register an uploaded asset.
    Add {
        /// Public URL of the uploaded file.
        #[arg(long)]
        url: String,
        /// Display filename (defaults to the last URL segment).
        #[arg(long)]
        filename: Option<String>,
        /// Alternative text.
        #[arg(long, default_value = "")]
        alt: String,
    },
}
