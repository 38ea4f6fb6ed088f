//! `infralens cache`: inspect and maintain the narrative cache

use crate::error::CliError;
use crate::settings::Settings;
use clap::{Args, Subcommand};
use infralens_core::cache::SummaryCache;
use infralens_core::clock::SystemClock;
use infralens_core::config::CacheConfig;
use infralens_store::FsBackend;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Entry counts, sizes and age range
    Stats,
    /// Remove every entry
    Clear,
    /// Remove expired and unreadable entries, then enforce the size limit
    Purge,
}

pub fn execute(args: CacheArgs, settings: Settings) -> Result<(), CliError> {
    let dir = args.cache_dir.unwrap_or(settings.cache_dir);
    // Maintenance works on the directory even when lookups are disabled.
    let config = CacheConfig {
        enabled: true,
        ..settings.analysis.cache
    };
    let cache = SummaryCache::new(Arc::new(FsBackend::new(&dir)), &config, Arc::new(SystemClock));

    let output = match args.command {
        CacheCommand::Stats => serde_json::to_value(cache.stats())?,
        CacheCommand::Clear => json!({ "removed": cache.clear() }),
        CacheCommand::Purge => json!({
            "purged": cache.purge_expired(),
            "evicted": cache.enforce_capacity(),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
