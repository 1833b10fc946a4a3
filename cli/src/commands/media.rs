//! `media` subcommands.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use hlc_shared::local_store::{hash_bytes, MediaAsset};

use super::open_local;
use crate::{cli::MediaCommand, utils::filename_from_url};

/// Runs a media subcommand.
pub fn run(db_path: &Path, command: MediaCommand) -> Result<()> {
    let local = open_local(db_path)?;
    match command {
        MediaCommand::List => {
            let assets = local.read_media_index()?;
            if assets.is_empty() {
                println!("(media library is empty)");
            }
            for asset in assets {
                println!("{:<16} {:<32} {}", asset.id, asset.filename, asset.url);
            }
            Ok(())
        },
        MediaCommand::Add { url, filename, alt } => {
            let url = url.trim().to_string();
            if url.is_empty() {
                anyhow::bail!("--url must not be empty");
            }
            let id = hash_bytes(url.as_bytes())[..16].to_string();
            let mut assets = local.read_media_index()?;
            if assets.iter().any(|asset| asset.id == id) {
                println!("Already registered: {id}");
                return Ok(());
            }
            let asset = MediaAsset {
                id: id.clone(),
                filename: filename.unwrap_or_else(|| filename_from_url(&url)),
                url,
                alt,
                uploaded_at: Utc::now(),
            };
            assets.push(asset);
            local.write_media_index(&assets)?;
            tracing::info!(id, "media asset registered");
            println!("Registered {id}");
            Ok(())
        },
    }
}
