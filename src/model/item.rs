//! Checklist item model.
//!
//! A checklist line goes through two shapes: the raw [`ScannedLine`] the
//! Markdown scanner produces, and the rendered [`Item`] the reconciler
//! pushes to GitHub.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a task id in hex characters.
pub const TASK_ID_LEN: usize = 12;

/// Stable identity of a checklist item.
///
/// Always [`TASK_ID_LEN`] lowercase hex characters. Serialized as a plain
/// string so it can key JSON maps in the cache file; deserializing checks
/// the format like [`TaskId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Wrap an already-derived id.
    ///
    /// Returns `None` unless `raw` is exactly 12 hex characters. Uppercase
    /// input is normalized to lowercase.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        (raw.len() == TASK_ID_LEN && raw.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| Self(raw.to_ascii_lowercase()))
    }

    /// Build from a hex digest, keeping the first [`TASK_ID_LEN`] chars.
    pub(crate) fn from_digest(hex: &str) -> Self {
        Self(hex[..TASK_ID_LEN].to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw).ok_or_else(|| format!("invalid task id `{raw}`"))
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One checklist line as found in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedLine {
    /// Path relative to the scan root, `/`-separated.
    pub location: String,

    /// 1-based line number.
    pub line: usize,

    /// Text after the checkbox, trimmed.
    pub text: String,

    /// Whole line, trimmed (quoted verbatim in the issue body).
    pub raw: String,

    /// Checkbox state (`[x]` or `[X]`).
    pub checked: bool,

    /// Nearest preceding heading, if any.
    pub section: Option<String>,
}

/// A checklist item ready to be reconciled against GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: TaskId,
    pub checked: bool,
    pub title: String,
    pub body: String,
    /// Sorted, deduplicated.
    pub labels: Vec<String>,
    pub due: Option<NaiveDate>,
    pub location: String,
    pub line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_parse() {
        assert_eq!(
            TaskId::parse("0123456789ab").map(|t| t.to_string()),
            Some("0123456789ab".to_string())
        );
        assert_eq!(
            TaskId::parse("0123456789AB").map(|t| t.to_string()),
            Some("0123456789ab".to_string())
        );
        assert!(TaskId::parse("0123456789a").is_none());
        assert!(TaskId::parse("0123456789abc").is_none());
        assert!(TaskId::parse("0123456789ag").is_none());
    }

    #[test]
    fn test_task_id_serializes_as_string() {
        let id = TaskId::parse("abcdefabcdef").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abcdefabcdef\"");
    }

    #[test]
    fn test_task_id_deserialize_validates() {
        let id: TaskId = serde_json::from_str("\"ABCDEFABCDEF\"").unwrap();
        assert_eq!(id.as_str(), "abcdefabcdef");

        assert!(serde_json::from_str::<TaskId>("\"xyz\"").is_err());
        assert!(serde_json::from_str::<TaskId>("\"abcdefabcdefab\"").is_err());
    }
}
