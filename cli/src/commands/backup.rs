//! `backup` and `restore`.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::Utc;
use hlc_shared::local_store::StoreSnapshot;

use super::open_local;
use crate::utils::confirm;

/// Writes a snapshot to `out` when a backup is due or `force` is set.
pub fn backup(db_path: &Path, out: &Path, force: bool) -> Result<()> {
    let local = open_local(db_path)?;
    let mut schedule = local.read_backup_schedule()?;
    let now = Utc::now();
    if !force && !schedule.is_due(now) {
        println!(
            "Backup not due yet (interval {}h, last at {}). Use --force to write anyway.",
            schedule.interval_hours,
            schedule
                .last_backup_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        );
        return Ok(());
    }

    let snapshot = local.export_snapshot()?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(out, serde_json::to_vec_pretty(&snapshot)?)
        .with_context(|| format!("failed to write {}", out.display()))?;

    schedule.last_backup_at = Some(now);
    local.write_backup_schedule(&schedule)?;
    tracing::info!(keys = snapshot.entries.len(), checksum = %snapshot.checksum, "backup written");
    println!("Backup written to {}", out.display());
    Ok(())
}

/// Verifies and imports the snapshot in `file`.
pub fn restore(db_path: &Path, file: &Path, yes: bool) -> Result<()> {
    let raw = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let snapshot: StoreSnapshot = serde_json::from_slice(&raw).context("snapshot file is not valid JSON")?;
    if !snapshot.verify()? {
        anyhow::bail!("snapshot checksum mismatch; refusing to restore");
    }

    let prompt = format!(
        "Replace the local store at {} with the snapshot from {}? This cannot be undone.",
        db_path.display(),
        snapshot.created_at.to_rfc3339()
    );
    if !confirm(&prompt, yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    open_local(db_path)?.import_snapshot(&snapshot)?;
    println!("Restored {} key(s).", snapshot.entries.len());
    Ok(())
}
