//! Remote truth loading.
//!
//! Rebuilds the task-id → issue mapping from the tracker itself, so the
//! cache can be lost or hand-edited without creating duplicate issues.
//! Issues are recognized by the provenance label plus the task id marker
//! in their body; anything else is not ours and is ignored.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{IssueSnapshot, RemoteIssue};
use crate::tracker::IssueTracker;

use super::metadata::PROVENANCE_LABEL;
use super::render::marker_task_id;
use super::types::RemoteState;

/// Page through every issue carrying the provenance label.
///
/// # Errors
///
/// Returns the first listing error; nothing is retried.
pub async fn fetch_issues<T: IssueTracker>(tracker: &T) -> Result<Vec<IssueSnapshot>> {
    let mut all = Vec::new();
    let mut page = 1;
    loop {
        let batch = tracker.list_issues(PROVENANCE_LABEL, page).await?;
        if batch.is_empty() {
            break;
        }
        all.extend(batch);
        page += 1;
    }
    Ok(all)
}

/// Pick one canonical issue per task id.
///
/// The lowest issue number wins; the rest are returned as duplicates in
/// ascending number order. Pull requests and issues without a marker are
/// dropped.
#[must_use]
pub fn index_issues(snapshots: Vec<IssueSnapshot>) -> RemoteState {
    let mut issues: BTreeMap<_, RemoteIssue> = BTreeMap::new();
    let mut duplicates = Vec::new();

    for snapshot in snapshots {
        if snapshot.is_pull_request {
            continue;
        }
        let Some(task_id) = marker_task_id(&snapshot.body) else {
            debug!(issue = snapshot.number, "Issue has no task marker, ignoring");
            continue;
        };

        let candidate = RemoteIssue { task_id, snapshot };
        match issues.get_mut(&candidate.task_id) {
            Some(existing) if candidate.number() < existing.number() => {
                duplicates.push(std::mem::replace(existing, candidate));
            }
            Some(_) => duplicates.push(candidate),
            None => {
                issues.insert(candidate.task_id.clone(), candidate);
            }
        }
    }

    duplicates.sort_by_key(RemoteIssue::number);
    RemoteState {
        issues,
        duplicates,
        duplicates_closed: 0,
    }
}

/// Load remote truth and close duplicate issues.
///
/// Closing a duplicate is best-effort: a failure is logged and the run
/// carries on, since the duplicate is excluded from the mapping either way.
/// With `dry_run` set, open duplicates are counted but left open.
///
/// # Errors
///
/// Returns an error if the issue listing fails.
pub async fn load_remote_truth<T: IssueTracker>(tracker: &T, dry_run: bool) -> Result<RemoteState> {
    let snapshots = fetch_issues(tracker).await?;
    let mut state = index_issues(snapshots);

    for duplicate in &state.duplicates {
        if duplicate.is_closed() {
            continue;
        }
        info!(
            task_id = %duplicate.task_id,
            issue = duplicate.number(),
            "Closing duplicate issue"
        );
        if dry_run {
            state.duplicates_closed += 1;
            continue;
        }
        match tracker.close_issue(duplicate.number()).await {
            Ok(()) => state.duplicates_closed += 1,
            Err(e) => warn!(
                issue = duplicate.number(),
                error = %e,
                "Failed to close duplicate issue"
            ),
        }
    }

    debug!(
        canonical = state.issues.len(),
        duplicates = state.duplicates.len(),
        "Loaded remote truth"
    );
    Ok(state)
}
