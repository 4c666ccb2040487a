//! Data models for todosync.
//!
//! This module contains all domain models:
//! - Item (checklist line and its rendered form)
//! - Issue (remote issue snapshots and drafts)
//! - Project (board, fields, board items)

pub mod issue;
pub mod item;
pub mod project;

pub use issue::{IssueDraft, IssueSnapshot, IssueState, RemoteIssue};
pub use item::{Item, ScannedLine, TASK_ID_LEN, TaskId};
pub use project::{BoardItem, ProjectContext, ProjectField, ProjectRef};
