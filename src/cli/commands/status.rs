//! Status command implementation.

use colored::Colorize;
use serde::Serialize;

use crate::cli::SourceArgs;
use crate::error::Result;
use crate::sync::Cache;

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput<'a> {
    cache: String,
    exists: bool,
    open_count: usize,
    closed_count: usize,
    #[serde(flatten)]
    entries: &'a Cache,
}

/// Execute status command.
///
/// A missing cache file is reported as empty, not as an error.
///
/// # Errors
///
/// Returns an error if the cache file exists but cannot be read or parsed.
pub fn execute(args: &SourceArgs, json: bool) -> Result<()> {
    let path = args.cache_path();
    let exists = path.exists();
    let cache = Cache::load(&path)?;

    if json {
        let output = StatusOutput {
            cache: path.display().to_string(),
            exists,
            open_count: cache.open.len(),
            closed_count: cache.closed.len(),
            entries: &cache,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{}", "Cache".bold());
    println!("  File:   {}", path.display());
    if !exists {
        println!("  {}", "(not created yet)".dimmed());
    }
    println!("  Open:   {}", cache.open.len());
    println!("  Closed: {}", cache.closed.len());

    if !cache.open.is_empty() {
        println!();
        println!("{}", "Open issues".bold());
        for (id, number) in &cache.open {
            println!("  {} #{number}", id.as_str().dimmed());
        }
    }
    Ok(())
}
