//! Remote issue model.
//!
//! Issues are the only thing todosync writes to the tracker. Everything the
//! reconciler needs to know about an existing issue is captured in
//! [`IssueSnapshot`] when the issue list is paged in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::item::TaskId;

/// Open/closed state of a remote issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// State an item's issue should be in.
    #[must_use]
    pub const fn for_checked(checked: bool) -> Self {
        if checked { Self::Closed } else { Self::Open }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Fields sent when creating or updating an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// An issue as returned by the issue listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSnapshot {
    pub number: u64,
    pub state: IssueState,
    pub title: String,
    pub body: String,
    /// Sorted.
    pub labels: Vec<String>,
    pub is_pull_request: bool,
}

/// A snapshot whose body carries a task id marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIssue {
    pub task_id: TaskId,
    pub snapshot: IssueSnapshot,
}

impl RemoteIssue {
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.snapshot.number
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.snapshot.state == IssueState::Closed
    }

    /// True when updating to `draft`/`state` would change nothing.
    ///
    /// Label names compare case-insensitively, as GitHub resolves them.
    #[must_use]
    pub fn matches(&self, draft: &IssueDraft, state: IssueState) -> bool {
        self.snapshot.state == state
            && self.snapshot.title == draft.title
            && self.snapshot.body == draft.body
            && folded(&self.snapshot.labels) == folded(&draft.labels)
    }
}

fn folded(labels: &[String]) -> BTreeSet<String> {
    labels.iter().map(|l| l.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(state: IssueState) -> RemoteIssue {
        RemoteIssue {
            task_id: TaskId::parse("aaaaaaaaaaaa").unwrap(),
            snapshot: IssueSnapshot {
                number: 4,
                state,
                title: "Title".into(),
                body: "Body".into(),
                labels: vec!["from-markdown".into()],
                is_pull_request: false,
            },
        }
    }

    #[test]
    fn test_state_for_checked() {
        assert_eq!(IssueState::for_checked(true), IssueState::Closed);
        assert_eq!(IssueState::for_checked(false), IssueState::Open);
    }

    #[test]
    fn test_matches_compares_every_field() {
        let draft = IssueDraft {
            title: "Title".into(),
            body: "Body".into(),
            labels: vec!["from-markdown".into()],
        };
        assert!(remote(IssueState::Open).matches(&draft, IssueState::Open));
        assert!(!remote(IssueState::Closed).matches(&draft, IssueState::Open));

        let mut retitled = draft.clone();
        retitled.title = "Other".into();
        assert!(!remote(IssueState::Open).matches(&retitled, IssueState::Open));

        let mut relabeled = draft;
        relabeled.labels.push("auth".into());
        assert!(!remote(IssueState::Open).matches(&relabeled, IssueState::Open));
    }

    #[test]
    fn test_matches_ignores_label_case() {
        let mut issue = remote(IssueState::Open);
        issue.snapshot.labels = vec!["auth".into(), "from-markdown".into()];
        let draft = IssueDraft {
            title: "Title".into(),
            body: "Body".into(),
            labels: vec!["Auth".into(), "from-markdown".into()],
        };

        assert!(issue.matches(&draft, IssueState::Open));
    }
}
