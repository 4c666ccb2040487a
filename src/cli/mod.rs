//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{
    DEFAULT_API_URL, DEFAULT_END_FIELD, DEFAULT_GIT_REF, DEFAULT_SERVER_URL, DEFAULT_START_FIELD,
};
use crate::sync::DEFAULT_CACHE_PATH;

pub mod commands;

/// todosync - mirror Markdown checklists into GitHub issues
#[derive(Parser, Debug)]
#[command(name = "todosync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Compute the plan against GitHub without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile checklist items with GitHub issues
    Sync(SyncArgs),

    /// List checklist items found under the root
    Scan(ScanArgs),

    /// Summarize the cache file
    Status(SourceArgs),

    /// Print the task id derived for a checklist line
    Id {
        /// Path relative to the scan root, `/`-separated
        location: String,

        /// 1-based line number
        line: usize,

        /// Item text after the checkbox
        text: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Shared argument groups
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Directory scanned for Markdown files
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Cache file (default: <root>/.github/todos-cache.json)
    #[arg(long, env = "TODOSYNC_CACHE")]
    pub cache: Option<PathBuf>,
}

impl SourceArgs {
    /// Effective cache path.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .clone()
            .unwrap_or_else(|| self.root.join(DEFAULT_CACHE_PATH))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Directory scanned for Markdown files
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct GitHubArgs {
    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: Option<String>,

    /// API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Commit or branch source links point at
    #[arg(long, env = "GITHUB_SHA", default_value = DEFAULT_GIT_REF)]
    pub sha: String,

    /// REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Web base URL used in source links
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Link issues into a project board (0/false/no/off disable)
    #[arg(
        long,
        env = "GITHUB_PROJECT_SYNC",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub project_sync: Option<String>,

    /// Project title (default: repository name)
    #[arg(long, env = "GITHUB_PROJECT_TITLE")]
    pub project_title: Option<String>,

    /// DATE field stamped when an issue is first linked (empty disables)
    #[arg(long, env = "GITHUB_PROJECT_START_FIELD", default_value = DEFAULT_START_FIELD)]
    pub start_field: String,

    /// DATE field mirroring the due date (empty disables)
    #[arg(long, env = "GITHUB_PROJECT_END_FIELD", default_value = DEFAULT_END_FIELD)]
    pub end_field: String,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub github: GitHubArgs,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_flags() {
        let cli = Cli::try_parse_from([
            "todosync",
            "sync",
            "--repo",
            "octo-org/handbook",
            "--token",
            "t",
            "--project-sync",
            "--start-field",
            "",
            "--dry-run",
        ])
        .unwrap();

        assert!(cli.dry_run);
        let Commands::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.github.repo.as_deref(), Some("octo-org/handbook"));
        assert_eq!(args.project.project_sync.as_deref(), Some("true"));
        assert_eq!(args.project.start_field, "");
        assert_eq!(args.source.root, PathBuf::from("."));
    }

    #[test]
    fn test_cache_path_defaults_under_root() {
        let args = SourceArgs {
            root: PathBuf::from("/work/repo"),
            cache: None,
        };
        assert_eq!(
            args.cache_path(),
            PathBuf::from("/work/repo/.github/todos-cache.json")
        );

        let explicit = SourceArgs {
            cache: Some(PathBuf::from("c.json")),
            ..args
        };
        assert_eq!(explicit.cache_path(), PathBuf::from("c.json"));
    }
}
