//! Sync types shared by the loader, the reconciler and the CLI.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{RemoteIssue, TaskId};

/// Issues found on the tracker, one canonical issue per task id.
#[derive(Debug, Clone, Default)]
pub struct RemoteState {
    /// Canonical issue per task id (lowest issue number wins).
    pub issues: BTreeMap<TaskId, RemoteIssue>,

    /// Non-canonical issues that shared a task id with a canonical one.
    pub duplicates: Vec<RemoteIssue>,

    /// How many of `duplicates` were closed during loading.
    pub duplicates_closed: usize,
}

impl RemoteState {
    /// Canonical issue for `id` if it has the given number.
    #[must_use]
    pub fn issue_numbered(&self, id: &TaskId, number: u64) -> Option<&RemoteIssue> {
        self.issues.get(id).filter(|issue| issue.number() == number)
    }
}

/// Statistics for one reconciliation run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Checklist items considered.
    pub items: usize,
    /// Issues created (includes `recreated`).
    pub created: usize,
    /// Issues created because the cached issue was gone.
    pub recreated: usize,
    /// Issues patched.
    pub updated: usize,
    /// Issues already matching their item.
    pub unchanged: usize,
    /// Checked items with no issue, left alone.
    pub skipped_checked: usize,
    /// Issues closed because their line vanished.
    pub vanished_closed: usize,
    /// Duplicate issues closed.
    pub duplicates_closed: usize,
    /// Labels created.
    pub labels_created: usize,
    /// Issues newly linked into the project board.
    pub board_items_linked: usize,
    /// True when nothing was written.
    pub dry_run: bool,
}

impl SyncReport {
    /// Number of remote writes (or planned writes, in a dry run).
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.vanished_closed + self.duplicates_closed + self.labels_created
    }

    /// True when the run changed nothing remotely.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.mutations() == 0 && self.board_items_linked == 0
    }
}
