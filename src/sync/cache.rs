//! Persistent task-id → issue-number cache.
//!
//! The cache is convenience state: it is loaded once at the start of a run,
//! healed from remote truth, mutated by the reconciler, and saved once at
//! the end. Losing it is harmless because the next run rebuilds the `open`
//! map from issue body markers.
//!
//! On disk it is pretty-printed JSON with sorted keys:
//!
//! ```json
//! {
//!   "open": { "0123456789ab": 17 },
//!   "closed": [ "ba9876543210" ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::TaskId;

use super::file::atomic_write;
use super::types::RemoteState;

/// Default cache location, relative to the scan root.
pub const DEFAULT_CACHE_PATH: &str = ".github/todos-cache.json";

/// Mapping persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    /// Items believed to still need a live issue.
    #[serde(default)]
    pub open: BTreeMap<TaskId, u64>,

    /// Items whose issue was closed because the line vanished.
    #[serde(default)]
    pub closed: BTreeSet<TaskId>,
}

impl Cache {
    /// Load the cache, or an empty one if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheCorrupt`] if the file exists but is not a
    /// valid cache document, or an I/O error if it cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No cache file, starting empty");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let cache: Self = serde_json::from_str(&content).map_err(|e| Error::CacheCorrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!(
            path = %path.display(),
            open = cache.open.len(),
            closed = cache.closed.len(),
            "Loaded cache"
        );
        Ok(cache)
    }

    /// Write the whole cache atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        atomic_write(path, &content)
    }

    /// Adopt every issue found in remote truth.
    ///
    /// Remote always wins: a stale or missing entry is overwritten, and an
    /// id that was filed under `closed` comes back to `open` so the
    /// reconciler looks at it again.
    pub fn absorb_remote(&mut self, remote: &RemoteState) {
        for (id, issue) in &remote.issues {
            let previous = self.open.insert(id.clone(), issue.number());
            if previous.is_some_and(|n| n != issue.number()) {
                debug!(task_id = %id, issue = issue.number(), "Cache entry healed from remote");
            }
            self.closed.remove(id);
        }
    }

    /// Move `id` from `open` to `closed`, returning its issue number.
    pub fn retire(&mut self, id: &TaskId) -> Option<u64> {
        let number = self.open.remove(id);
        self.closed.insert(id.clone());
        number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueSnapshot, IssueState, RemoteIssue};
    use tempfile::TempDir;

    fn id(s: &str) -> TaskId {
        TaskId::parse(s).unwrap()
    }

    fn remote_with(entries: &[(&str, u64)]) -> RemoteState {
        let mut state = RemoteState::default();
        for (tid, number) in entries {
            state.issues.insert(
                id(tid),
                RemoteIssue {
                    task_id: id(tid),
                    snapshot: IssueSnapshot {
                        number: *number,
                        state: IssueState::Open,
                        title: String::new(),
                        body: String::new(),
                        labels: Vec::new(),
                        is_pull_request: false,
                    },
                },
            );
        }
        state
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cache, Cache::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".github/todos-cache.json");

        let mut cache = Cache::default();
        cache.open.insert(id("bbbbbbbbbbbb"), 2);
        cache.open.insert(id("aaaaaaaaaaaa"), 1);
        cache.closed.insert(id("cccccccccccc"));
        cache.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let a = text.find("aaaaaaaaaaaa").unwrap();
        let b = text.find("bbbbbbbbbbbb").unwrap();
        assert!(a < b, "keys are written in sorted order");

        assert_eq!(Cache::load(&path).unwrap(), cache);
    }

    #[test]
    fn test_load_accepts_partial_and_duplicate_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, r#"{"closed": ["aaaaaaaaaaaa", "aaaaaaaaaaaa"]}"#).unwrap();

        let cache = Cache::load(&path).unwrap();
        assert!(cache.open.is_empty());
        assert_eq!(cache.closed.len(), 1);
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, "not json").unwrap();

        let err = Cache::load(&path).unwrap_err();
        assert!(matches!(err, Error::CacheCorrupt { .. }));
    }

    #[test]
    fn test_load_rejects_malformed_task_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");

        fs::write(&path, r#"{"open": {"not-a-task": 4}, "closed": []}"#).unwrap();
        let err = Cache::load(&path).unwrap_err();
        assert!(matches!(err, Error::CacheCorrupt { .. }));

        fs::write(&path, r#"{"open": {}, "closed": ["ABCDEF"]}"#).unwrap();
        let err = Cache::load(&path).unwrap_err();
        assert!(matches!(err, Error::CacheCorrupt { .. }));
    }

    #[test]
    fn test_absorb_remote_overrides_and_reopens() {
        let mut cache = Cache::default();
        cache.open.insert(id("aaaaaaaaaaaa"), 99);
        cache.closed.insert(id("bbbbbbbbbbbb"));

        cache.absorb_remote(&remote_with(&[("aaaaaaaaaaaa", 3), ("bbbbbbbbbbbb", 4)]));

        assert_eq!(cache.open.get(&id("aaaaaaaaaaaa")), Some(&3));
        assert_eq!(cache.open.get(&id("bbbbbbbbbbbb")), Some(&4));
        assert!(cache.closed.is_empty());
    }

    #[test]
    fn test_retire() {
        let mut cache = Cache::default();
        cache.open.insert(id("aaaaaaaaaaaa"), 7);

        assert_eq!(cache.retire(&id("aaaaaaaaaaaa")), Some(7));
        assert!(cache.open.is_empty());
        assert!(cache.closed.contains(&id("aaaaaaaaaaaa")));
    }
}
