//! Remote tracker interface.
//!
//! The reconciler talks to the tracker only through these two traits:
//!
//! - [`IssueTracker`] - issue and label CRUD (GitHub REST)
//! - [`ProjectBoard`] - project board items and date fields (GitHub GraphQL)
//!
//! [`GitHubClient`] implements both. Calls are made one at a time; the
//! traits use `impl Future` so the client can be driven by a single
//! `block_on` in the command layer.
//!
//! Every mutation must be safe to repeat: the remote API has no
//! transactions, and an interrupted run is recovered by simply running
//! again.

pub mod github;
#[cfg(test)]
pub mod memory;

pub use github::GitHubClient;

use chrono::NaiveDate;
use std::future::Future;

use crate::error::Result;
use crate::model::{BoardItem, IssueDraft, IssueSnapshot, IssueState, ProjectField, ProjectRef};

/// Page size requested from paginated listings.
pub const PAGE_SIZE: u32 = 100;

/// Issue and label operations.
pub trait IssueTracker: Send + Sync {
    /// One page (1-based) of issues carrying `label`, in any state.
    ///
    /// An empty page marks the end of the listing.
    fn list_issues(
        &self,
        label: &str,
        page: u32,
    ) -> impl Future<Output = Result<Vec<IssueSnapshot>>> + Send;

    /// Create an open issue and return its number.
    fn create_issue(&self, draft: &IssueDraft) -> impl Future<Output = Result<u64>> + Send;

    /// Overwrite title, body, labels and state.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) when the issue
    /// no longer exists.
    fn update_issue(
        &self,
        number: u64,
        draft: &IssueDraft,
        state: IssueState,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Close an issue, leaving everything else as is.
    fn close_issue(&self, number: u64) -> impl Future<Output = Result<()>> + Send;

    /// One page (1-based) of label names.
    fn list_labels(&self, page: u32) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Create a label. Succeeds if the label already exists.
    fn create_label(&self, name: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Project board operations.
pub trait ProjectBoard: Send + Sync {
    /// Locate the owner's project titled `title` (case-insensitive), creating it if absent.
    fn find_or_create_project(&self, title: &str) -> impl Future<Output = Result<ProjectRef>> + Send;

    /// Fields defined on a project.
    fn project_fields(
        &self,
        project_id: &str,
    ) -> impl Future<Output = Result<Vec<ProjectField>>> + Send;

    /// Add a DATE field named `name`.
    fn create_date_field(
        &self,
        project_id: &str,
        name: &str,
    ) -> impl Future<Output = Result<ProjectField>> + Send;

    /// The issue's item on the project, linking it first if needed.
    ///
    /// `Ok(None)` when the issue cannot be resolved by number.
    fn find_or_create_item(
        &self,
        project_id: &str,
        issue_number: u64,
    ) -> impl Future<Output = Result<Option<BoardItem>>> + Send;

    /// Set a date field, or clear it when `date` is `None`.
    fn set_date_field(
        &self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        date: Option<NaiveDate>,
    ) -> impl Future<Output = Result<()>> + Send;
}
