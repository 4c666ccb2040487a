//! Sync command implementation.
//!
//! Scans the root, renders items, reconciles them against GitHub and saves
//! the cache. The reconciler is async; a single-threaded pass over the items
//! is driven to completion with `block_on`.

use chrono::Utc;
use colored::Colorize;
use tracing::info;

use crate::cli::SyncArgs;
use crate::config::{BoardSettings, DEFAULT_GIT_REF, RepoSlug, is_enabled, non_empty, require};
use crate::error::{Error, Result};
use crate::scan::scan_corpus;
use crate::sync::{BoardSync, Cache, Reconciler, SourceLinks, SyncReport, render_item};
use crate::tracker::GitHubClient;

/// Execute the sync command.
///
/// Honors the global `--dry-run` flag: remote truth is still read, but
/// nothing is written to GitHub or to the cache file.
///
/// # Errors
///
/// Returns an error if a required setting is missing, the cache is
/// corrupt, or a non-recoverable GitHub call fails.
pub fn execute(args: &SyncArgs, json: bool) -> Result<()> {
    let dry_run = crate::is_dry_run();
    let repo: RepoSlug =
        require(args.github.repo.as_deref(), "repo", "GITHUB_REPOSITORY")?.parse()?;
    let token = require(args.github.token.as_deref(), "token", "GITHUB_TOKEN")?;

    let board = is_enabled(args.project.project_sync.as_deref()).then(|| {
        BoardSettings::resolve(
            &repo,
            args.project.project_title.as_deref(),
            &args.project.start_field,
            &args.project.end_field,
        )
    });

    let links = SourceLinks {
        web_url: args.github.server_url.clone(),
        repo: repo.to_string(),
        git_ref: non_empty(Some(&args.github.sha)).unwrap_or_else(|| DEFAULT_GIT_REF.to_string()),
    };

    let lines = scan_corpus(&args.source.root)?;
    let items: Vec<_> = lines.iter().map(|l| render_item(l, Some(&links))).collect();
    info!(items = items.len(), root = %args.source.root.display(), "Scanned checklist items");

    let cache_path = args.source.cache_path();
    let mut cache = Cache::load(&cache_path)?;

    let client = GitHubClient::new(&args.github.api_url, &token, &repo)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    let report = rt.block_on(async {
        let mut reconciler = Reconciler::new(&client, dry_run);
        if let Some(settings) = board {
            let today = Utc::now().date_naive();
            reconciler = reconciler.with_board(BoardSync::new(&client, settings, today));
        }
        reconciler.run(&items, &mut cache).await
    })?;

    if !dry_run {
        cache.save(&cache_path)?;
    }

    if json {
        let output = serde_json::json!({
            "repo": repo.to_string(),
            "cache": cache_path.display().to_string(),
            "report": report,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_report(&repo, &report);
    }
    Ok(())
}

fn print_report(repo: &RepoSlug, report: &SyncReport) {
    let heading = if report.dry_run {
        format!("Dry run against {repo}")
    } else {
        format!("Synced {repo}")
    };
    println!("{}", heading.bold());
    println!("  Items:      {}", report.items);

    let rows = [
        ("Created", report.created),
        ("Recreated", report.recreated),
        ("Updated", report.updated),
        ("Closed", report.vanished_closed),
        ("Duplicates", report.duplicates_closed),
        ("Labels", report.labels_created),
        ("Linked", report.board_items_linked),
    ];
    for (name, count) in rows.into_iter().filter(|(_, n)| *n > 0) {
        println!("  {:<11} {}", format!("{name}:"), count.to_string().green());
    }
    if report.unchanged > 0 {
        println!("  {:<11} {}", "Unchanged:", report.unchanged.to_string().dimmed());
    }
    if report.skipped_checked > 0 {
        println!("  {:<11} {}", "Skipped:", report.skipped_checked.to_string().dimmed());
    }

    if report.is_noop() {
        println!();
        println!("{}", "Everything is up to date.".dimmed());
    }
}
