//! Configuration resolution.
//!
//! Settings arrive through clap (flag, then environment variable, then
//! default). This module turns the raw strings into validated values:
//!
//! - [`RepoSlug`] - the `owner/name` pair every API call is scoped to
//! - [`BoardSettings`] - project board title and date field names
//! - [`is_enabled`] - the lenient on/off parsing used for
//!   `GITHUB_PROJECT_SYNC`

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// REST base URL for github.com.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Web base URL used for source links.
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Ref source links point at when no commit is given.
pub const DEFAULT_GIT_REF: &str = "main";

/// Board field stamped when an issue is first linked.
pub const DEFAULT_START_FIELD: &str = "Start date";

/// Board field mirroring the due date.
pub const DEFAULT_END_FIELD: &str = "Target date";

/// A repository in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::InvalidRepo(s.to_string())),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Lenient boolean parsing for environment toggles.
///
/// Unset, empty, `0`, `false`, `no` and `off` (any case) are off; anything
/// else is on.
#[must_use]
pub fn is_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        !matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off"
        )
    })
}

/// Trimmed value, or `None` when blank.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A required setting, or [`Error::MissingSetting`] naming its flag and
/// environment variable.
///
/// # Errors
///
/// Returns an error if `value` is unset or blank.
pub fn require(value: Option<&str>, name: &'static str, env: &'static str) -> Result<String> {
    non_empty(value).ok_or(Error::MissingSetting { name, env })
}

/// Where and how issues are linked into a project board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSettings {
    /// Project title, matched case-insensitively.
    pub project_title: String,

    /// DATE field stamped on first link; `None` disables it.
    pub start_field: Option<String>,

    /// DATE field mirroring the due date; `None` disables it.
    pub end_field: Option<String>,
}

impl BoardSettings {
    /// Build board settings; the title defaults to the repository name and
    /// a blank field name disables that field.
    #[must_use]
    pub fn resolve(repo: &RepoSlug, title: Option<&str>, start: &str, end: &str) -> Self {
        Self {
            project_title: non_empty(title).unwrap_or_else(|| repo.name.clone()),
            start_field: non_empty(Some(start)),
            end_field: non_empty(Some(end)),
        }
    }
}
