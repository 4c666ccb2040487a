//! In-memory tracker used by tests.
//!
//! Behaves like GitHub for the calls the reconciler makes: paginated
//! listings, label filtering, 404 for unknown issues, and a board that links
//! each issue once. Every mutating call is appended to a log so tests can
//! assert on exactly what a run wrote.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::{
    BoardItem, IssueDraft, IssueSnapshot, IssueState, ProjectField, ProjectRef,
    project::DATE_FIELD_TYPE,
};

use super::{IssueTracker, PAGE_SIZE, ProjectBoard};

/// A mutating call, as recorded by [`MemoryTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateIssue { number: u64, title: String },
    UpdateIssue { number: u64, state: IssueState },
    CloseIssue { number: u64 },
    CreateLabel { name: String },
    CreateProject { title: String },
    CreateField { name: String },
    AddItem { issue: u64 },
    SetDate { field_id: String, issue: u64, date: Option<NaiveDate> },
}

#[derive(Debug, Default)]
struct State {
    issues: BTreeMap<u64, IssueSnapshot>,
    labels: BTreeSet<String>,
    next_number: u64,
    calls: Vec<Call>,
    failing_updates: HashSet<u64>,
    failing_closes: HashSet<u64>,
    projects: Vec<(String, String)>,
    fields: Vec<ProjectField>,
    failing_field_creates: HashSet<String>,
    /// issue number -> board item id
    board_items: BTreeMap<u64, String>,
    /// (item id, field id) -> date
    field_values: BTreeMap<(String, String), NaiveDate>,
    project_lookups: usize,
}

/// Fake GitHub.
#[derive(Debug, Default)]
pub struct MemoryTracker {
    state: Mutex<State>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        let tracker = Self::default();
        tracker.state.lock().unwrap().next_number = 1;
        tracker
    }

    /// Seed an issue without logging a call.
    pub fn seed_issue(&self, number: u64, state: IssueState, title: &str, body: &str, labels: &[&str]) {
        let mut s = self.state.lock().unwrap();
        let mut labels: Vec<String> = labels.iter().map(|l| (*l).to_string()).collect();
        labels.sort();
        s.issues.insert(
            number,
            IssueSnapshot {
                number,
                state,
                title: title.to_string(),
                body: body.to_string(),
                labels,
                is_pull_request: false,
            },
        );
        s.next_number = s.next_number.max(number + 1);
    }

    /// Seed a pull request (shares the issue number space).
    pub fn seed_pull_request(&self, number: u64, body: &str, labels: &[&str]) {
        self.seed_issue(number, IssueState::Open, "PR", body, labels);
        self.state
            .lock()
            .unwrap()
            .issues
            .get_mut(&number)
            .unwrap()
            .is_pull_request = true;
    }

    pub fn seed_label(&self, name: &str) {
        self.state.lock().unwrap().labels.insert(name.to_string());
    }

    pub fn seed_project(&self, id: &str, title: &str) {
        self.state
            .lock()
            .unwrap()
            .projects
            .push((id.to_string(), title.to_string()));
    }

    pub fn seed_field(&self, id: &str, name: &str, data_type: &str) {
        self.state.lock().unwrap().fields.push(ProjectField {
            id: id.to_string(),
            name: name.to_string(),
            data_type: data_type.to_string(),
        });
    }

    /// Drop an issue as if it was deleted upstream.
    pub fn delete_issue(&self, number: u64) {
        self.state.lock().unwrap().issues.remove(&number);
    }

    /// Make updates of `number` fail with a server error.
    pub fn fail_updates_of(&self, number: u64) {
        self.state.lock().unwrap().failing_updates.insert(number);
    }

    /// Make closing `number` fail with a server error.
    pub fn fail_closes_of(&self, number: u64) {
        self.state.lock().unwrap().failing_closes.insert(number);
    }

    /// Make creating the field `name` fail.
    pub fn fail_field_create(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_field_creates
            .insert(name.to_string());
    }

    pub fn issue(&self, number: u64) -> Option<IssueSnapshot> {
        self.state.lock().unwrap().issues.get(&number).cloned()
    }

    pub fn issue_count(&self) -> usize {
        self.state.lock().unwrap().issues.len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn project_lookups(&self) -> usize {
        self.state.lock().unwrap().project_lookups
    }

    /// Current value of a date field on the issue's board item.
    pub fn field_value(&self, issue: u64, field_id: &str) -> Option<NaiveDate> {
        let s = self.state.lock().unwrap();
        let item = s.board_items.get(&issue)?;
        s.field_values
            .get(&(item.clone(), field_id.to_string()))
            .copied()
    }
}

fn server_error() -> Error {
    Error::Api {
        status: 500,
        message: "injected failure".to_string(),
    }
}

/// Issue labels spelled the way the repository stores them, sorted.
fn stored_labels(repo: &BTreeSet<String>, wanted: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = wanted
        .iter()
        .map(|w| {
            repo.iter()
                .find(|l| l.eq_ignore_ascii_case(w))
                .unwrap_or(w)
                .clone()
        })
        .collect();
    labels.sort();
    labels.dedup();
    labels
}

fn page_of<T: Clone>(all: &[T], page: u32) -> Vec<T> {
    let size = PAGE_SIZE as usize;
    let start = (page.saturating_sub(1) as usize) * size;
    all.iter().skip(start).take(size).cloned().collect()
}

impl IssueTracker for MemoryTracker {
    async fn list_issues(&self, label: &str, page: u32) -> Result<Vec<IssueSnapshot>> {
        let s = self.state.lock().unwrap();
        let matching: Vec<IssueSnapshot> = s
            .issues
            .values()
            .filter(|i| i.labels.iter().any(|l| l == label))
            .cloned()
            .collect();
        Ok(page_of(&matching, page))
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<u64> {
        let mut s = self.state.lock().unwrap();
        let number = s.next_number;
        s.next_number += 1;
        let labels = stored_labels(&s.labels, &draft.labels);
        s.issues.insert(
            number,
            IssueSnapshot {
                number,
                state: IssueState::Open,
                title: draft.title.clone(),
                body: draft.body.clone(),
                labels,
                is_pull_request: false,
            },
        );
        s.calls.push(Call::CreateIssue {
            number,
            title: draft.title.clone(),
        });
        Ok(number)
    }

    async fn update_issue(&self, number: u64, draft: &IssueDraft, state: IssueState) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.failing_updates.contains(&number) {
            return Err(server_error());
        }
        let labels = stored_labels(&s.labels, &draft.labels);
        let Some(issue) = s.issues.get_mut(&number) else {
            return Err(Error::NotFound {
                resource: format!("issue #{number}"),
            });
        };
        issue.title = draft.title.clone();
        issue.body = draft.body.clone();
        issue.labels = labels;
        issue.state = state;
        s.calls.push(Call::UpdateIssue { number, state });
        Ok(())
    }

    async fn close_issue(&self, number: u64) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.failing_closes.contains(&number) {
            return Err(server_error());
        }
        let Some(issue) = s.issues.get_mut(&number) else {
            return Err(Error::NotFound {
                resource: format!("issue #{number}"),
            });
        };
        issue.state = IssueState::Closed;
        s.calls.push(Call::CloseIssue { number });
        Ok(())
    }

    async fn list_labels(&self, page: u32) -> Result<Vec<String>> {
        let s = self.state.lock().unwrap();
        let all: Vec<String> = s.labels.iter().cloned().collect();
        Ok(page_of(&all, page))
    }

    async fn create_label(&self, name: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.labels.iter().any(|l| l.eq_ignore_ascii_case(name)) {
            return Ok(());
        }
        if s.labels.insert(name.to_string()) {
            s.calls.push(Call::CreateLabel {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

impl ProjectBoard for MemoryTracker {
    async fn find_or_create_project(&self, title: &str) -> Result<ProjectRef> {
        let mut s = self.state.lock().unwrap();
        s.project_lookups += 1;
        let wanted = title.trim().to_lowercase();
        let found = s
            .projects
            .iter()
            .find(|(_, t)| t.trim().to_lowercase() == wanted)
            .map(|(id, _)| id.clone());
        let project_id = if let Some(id) = found {
            id
        } else {
            let id = format!("PVT_{}", s.projects.len() + 1);
            s.projects.push((id.clone(), title.to_string()));
            s.calls.push(Call::CreateProject {
                title: title.to_string(),
            });
            id
        };
        Ok(ProjectRef {
            project_id,
            owner_id: "OWNER_1".to_string(),
        })
    }

    async fn project_fields(&self, _project_id: &str) -> Result<Vec<ProjectField>> {
        Ok(self.state.lock().unwrap().fields.clone())
    }

    async fn create_date_field(&self, _project_id: &str, name: &str) -> Result<ProjectField> {
        let mut s = self.state.lock().unwrap();
        if s.failing_field_creates.contains(name) {
            return Err(Error::GraphQl(format!("cannot create field {name}")));
        }
        let field = ProjectField {
            id: format!("FIELD_{}", s.fields.len() + 1),
            name: name.to_string(),
            data_type: DATE_FIELD_TYPE.to_string(),
        };
        s.fields.push(field.clone());
        s.calls.push(Call::CreateField {
            name: name.to_string(),
        });
        Ok(field)
    }

    async fn find_or_create_item(
        &self,
        _project_id: &str,
        issue_number: u64,
    ) -> Result<Option<BoardItem>> {
        let mut s = self.state.lock().unwrap();
        if !s.issues.contains_key(&issue_number) {
            return Ok(None);
        }
        if let Some(id) = s.board_items.get(&issue_number) {
            return Ok(Some(BoardItem {
                id: id.clone(),
                created: false,
            }));
        }
        let id = format!("ITEM_{issue_number}");
        s.board_items.insert(issue_number, id.clone());
        s.calls.push(Call::AddItem {
            issue: issue_number,
        });
        Ok(Some(BoardItem { id, created: true }))
    }

    async fn set_date_field(
        &self,
        _project_id: &str,
        item_id: &str,
        field_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        let issue = s
            .board_items
            .iter()
            .find(|(_, id)| id.as_str() == item_id)
            .map(|(n, _)| *n)
            .unwrap_or_default();
        let key = (item_id.to_string(), field_id.to_string());
        match date {
            Some(d) => {
                s.field_values.insert(key, d);
            }
            None => {
                s.field_values.remove(&key);
            }
        }
        s.calls.push(Call::SetDate {
            field_id: field_id.to_string(),
            issue,
            date,
        });
        Ok(())
    }
}
