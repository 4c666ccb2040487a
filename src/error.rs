//! Error types for todosync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=remote, 3=not_found, 4=validation, etc.)
//! - Retryability flags for callers that wrap the CLI
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for todosync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Remote (exit 2)
    TransportError,
    AuthError,
    ApiError,
    GraphQlError,

    // Not Found (exit 3)
    NotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Cache (exit 5)
    CacheCorrupt,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::TransportError => "TRANSPORT_ERROR",
            Self::AuthError => "AUTH_ERROR",
            Self::ApiError => "API_ERROR",
            Self::GraphQlError => "GRAPHQL_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::CacheCorrupt => "CACHE_CORRUPT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::TransportError | Self::AuthError | Self::ApiError | Self::GraphQlError => 2,
            Self::NotFound => 3,
            Self::InvalidArgument => 4,
            Self::CacheCorrupt => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether rerunning the same command may succeed.
    ///
    /// A run that aborted midway is safe to repeat: the next run heals the
    /// cache from remote state. Only transport-level failures are worth an
    /// automatic retry though.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportError | Self::ApiError)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in todosync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub rejected credentials ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Missing setting: {name}")]
    MissingSetting { name: &'static str, env: &'static str },

    #[error("Invalid repository '{0}': expected owner/name")]
    InvalidRepo(String),

    #[error("Cache file {path} is corrupt: {message}")]
    CacheCorrupt { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Http(_) => ErrorCode::TransportError,
            Self::Auth { .. } => ErrorCode::AuthError,
            Self::Api { .. } => ErrorCode::ApiError,
            Self::GraphQl(_) => ErrorCode::GraphQlError,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::MissingSetting { .. } | Self::InvalidRepo(_) => ErrorCode::ConfigError,
            Self::CacheCorrupt { .. } => ErrorCode::CacheCorrupt,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// True when the remote resource is missing or was deleted upstream.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingSetting { name, env } => Some(format!(
                "Pass --{name} or set the {env} environment variable."
            )),

            Self::InvalidRepo(_) => {
                Some("Use the `owner/name` form, e.g. `octo-org/handbook`.".to_string())
            }

            Self::Auth { .. } => Some(
                "Check that GITHUB_TOKEN is valid and has the `repo` scope \
                 (and `project` when project sync is enabled)."
                    .to_string(),
            ),

            Self::CacheCorrupt { path, .. } => Some(format!(
                "Delete {} and rerun; the cache is rebuilt from existing issues.",
                path.display()
            )),

            Self::GraphQl(msg) if msg.contains("project") => Some(
                "Project sync needs a token with the `project` scope. \
                 Disable it with GITHUB_PROJECT_SYNC=false."
                    .to_string(),
            ),

            Self::Http(_)
            | Self::Api { .. }
            | Self::GraphQl(_)
            | Self::NotFound { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
