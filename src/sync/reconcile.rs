//! Reconciliation of checklist items against the tracker.
//!
//! One run walks every item in document order and decides, per task id:
//!
//! | cache        | checked | action                                  |
//! |--------------|---------|-----------------------------------------|
//! | hit          | any     | update (skipped when already identical) |
//! | miss         | no      | create                                  |
//! | miss         | yes     | nothing                                 |
//! | hit, vanished| -       | close and move to `closed`              |
//!
//! Remote truth is merged into the cache before anything else, so a lost or
//! stale cache never produces duplicate issues. An update that hits a
//! deleted issue is retried as a create; every other tracker error aborts
//! the run. Only the two cleanup paths (duplicate and vanished closes) are
//! allowed to fail quietly.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{IssueState, Item, TaskId};
use crate::tracker::{IssueTracker, ProjectBoard};

use super::board::BoardSync;
use super::cache::Cache;
use super::remote::load_remote_truth;
use super::types::{RemoteState, SyncReport};

/// Outcome of the cache-hit path for one item.
enum Existing {
    /// Issue number still valid.
    Kept(u64),
    /// Cached issue is gone upstream.
    Gone,
}

/// Drives one reconciliation run.
pub struct Reconciler<'a, T, B> {
    tracker: &'a T,
    board: Option<BoardSync<'a, B>>,
    dry_run: bool,
}

impl<'a, T: IssueTracker, B: ProjectBoard> Reconciler<'a, T, B> {
    pub fn new(tracker: &'a T, dry_run: bool) -> Self {
        Self {
            tracker,
            board: None,
            dry_run,
        }
    }

    /// Link every synced issue into a project board.
    #[must_use]
    pub fn with_board(mut self, board: BoardSync<'a, B>) -> Self {
        self.board = Some(board);
        self
    }

    /// Reconcile `items` and update `cache` in place.
    ///
    /// The cache is not saved here; callers persist it once the run
    /// succeeded (and never in a dry run).
    ///
    /// # Errors
    ///
    /// Returns the first tracker error outside the best-effort cleanup
    /// paths. Mutations made before the failure are not rolled back.
    pub async fn run(&mut self, items: &[Item], cache: &mut Cache) -> Result<SyncReport> {
        let mut report = SyncReport {
            items: items.len(),
            dry_run: self.dry_run,
            ..SyncReport::default()
        };

        let remote = load_remote_truth(self.tracker, self.dry_run).await?;
        report.duplicates_closed = remote.duplicates_closed;
        cache.absorb_remote(&remote);

        report.labels_created = self.ensure_labels(items).await?;

        for item in items {
            self.reconcile_item(item, &remote, cache, &mut report).await?;
        }

        let live: BTreeSet<&TaskId> = items.iter().map(|item| &item.id).collect();
        self.close_vanished(&live, &remote, cache, &mut report).await;

        info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            closed = report.vanished_closed,
            dry_run = self.dry_run,
            "Reconciliation finished"
        );
        Ok(report)
    }

    /// Create every label used by `items` that the repository lacks.
    ///
    /// Names compare case-insensitively, as GitHub does.
    async fn ensure_labels(&self, items: &[Item]) -> Result<usize> {
        let wanted: BTreeSet<&str> = items
            .iter()
            .flat_map(|item| item.labels.iter().map(String::as_str))
            .collect();
        if wanted.is_empty() {
            return Ok(0);
        }

        let mut existing = BTreeSet::new();
        let mut page = 1;
        loop {
            let batch = self.tracker.list_labels(page).await?;
            if batch.is_empty() {
                break;
            }
            existing.extend(batch.iter().map(|l| l.to_lowercase()));
            page += 1;
        }

        let mut created = 0;
        for label in wanted {
            if !existing.insert(label.to_lowercase()) {
                continue;
            }
            info!(label, "Creating label");
            if !self.dry_run {
                self.tracker.create_label(label).await?;
            }
            created += 1;
        }
        Ok(created)
    }

    async fn reconcile_item(
        &mut self,
        item: &Item,
        remote: &RemoteState,
        cache: &mut Cache,
        report: &mut SyncReport,
    ) -> Result<()> {
        let cached = cache.open.get(&item.id).copied();

        let existing = match cached {
            Some(number) => Some(self.update_existing(item, number, remote, report).await?),
            None => None,
        };

        let (number, recreated) = match existing {
            Some(Existing::Kept(number)) => (Some(number), false),
            Some(Existing::Gone) => {
                cache.open.remove(&item.id);
                (None, true)
            }
            None => (None, false),
        };

        let number = match number {
            Some(number) => Some(number),
            None if item.checked => {
                debug!(task_id = %item.id, location = %item.location, "Checked item has no issue, skipping");
                report.skipped_checked += 1;
                return Ok(());
            }
            None => self.create(item, recreated, report).await?,
        };

        let Some(number) = number else {
            // Dry run: nothing was created, so there is nothing to record.
            return Ok(());
        };
        cache.open.insert(item.id.clone(), number);

        if self.dry_run {
            return Ok(());
        }
        if let Some(board) = self.board.as_mut() {
            if board.sync_item(Some(number), item.due, item.checked).await? {
                report.board_items_linked += 1;
            }
        }
        Ok(())
    }

    async fn update_existing(
        &self,
        item: &Item,
        number: u64,
        remote: &RemoteState,
        report: &mut SyncReport,
    ) -> Result<Existing> {
        let draft = item.draft();
        let state = IssueState::for_checked(item.checked);

        if remote
            .issue_numbered(&item.id, number)
            .is_some_and(|issue| issue.matches(&draft, state))
        {
            debug!(task_id = %item.id, issue = number, "Issue up to date");
            report.unchanged += 1;
            return Ok(Existing::Kept(number));
        }

        info!(task_id = %item.id, issue = number, state = state.as_str(), "Updating issue");
        if self.dry_run {
            report.updated += 1;
            return Ok(Existing::Kept(number));
        }

        match self.tracker.update_issue(number, &draft, state).await {
            Ok(()) => {
                report.updated += 1;
                Ok(Existing::Kept(number))
            }
            Err(e) if e.is_not_found() => {
                warn!(task_id = %item.id, issue = number, "Cached issue is gone, recreating");
                Ok(Existing::Gone)
            }
            Err(e) => Err(e),
        }
    }

    /// Create the issue; `None` in a dry run.
    async fn create(
        &self,
        item: &Item,
        recreated: bool,
        report: &mut SyncReport,
    ) -> Result<Option<u64>> {
        report.created += 1;
        if recreated {
            report.recreated += 1;
        }

        if self.dry_run {
            info!(task_id = %item.id, title = %item.title, "Would create issue");
            return Ok(None);
        }

        let number = self.tracker.create_issue(&item.draft()).await?;
        info!(
            task_id = %item.id,
            issue = number,
            location = %item.location,
            line = item.line,
            "Created issue"
        );
        Ok(Some(number))
    }

    /// Close issues whose line disappeared. Failures are logged only.
    async fn close_vanished(
        &self,
        live: &BTreeSet<&TaskId>,
        remote: &RemoteState,
        cache: &mut Cache,
        report: &mut SyncReport,
    ) {
        let vanished: Vec<TaskId> = cache
            .open
            .keys()
            .filter(|id| !live.contains(id))
            .cloned()
            .collect();

        for id in vanished {
            let Some(number) = cache.retire(&id) else {
                continue;
            };
            if remote
                .issue_numbered(&id, number)
                .is_some_and(|issue| issue.is_closed())
            {
                debug!(task_id = %id, issue = number, "Vanished item already closed");
                continue;
            }

            info!(task_id = %id, issue = number, "Closing issue for vanished item");
            if self.dry_run {
                report.vanished_closed += 1;
                continue;
            }
            match self.tracker.close_issue(number).await {
                Ok(()) => report.vanished_closed += 1,
                Err(e) => warn!(task_id = %id, issue = number, error = %e, "Failed to close vanished issue"),
            }
        }
    }
}
