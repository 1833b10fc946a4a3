//! Command-line tooling for the magazine's local store: draft import,
//! lifecycle transitions, pages, media index, remote sync and backups.

pub mod cli;
pub mod commands;
pub mod utils;
