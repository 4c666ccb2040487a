//! Checklist ↔ issue synchronization.
//!
//! A run flows through these stages:
//!
//! - **Render**: scanned lines → [`Item`](crate::model::Item)s with a
//!   stable task id, cleaned title, labels, due date and issue body
//! - **Remote truth**: every issue carrying the provenance label, indexed by
//!   the task id marker in its body, duplicates closed
//! - **Cache**: the persisted task-id → issue-number map, healed from remote
//!   truth
//! - **Reconcile**: create, update and close issues so they mirror the items
//! - **Board**: optional project board linking with start/end dates
//!
//! # Example
//!
//! ```ignore
//! use todosync::sync::{Cache, Reconciler, render_item};
//!
//! let items: Vec<_> = lines.iter().map(|l| render_item(l, Some(&links))).collect();
//! let mut cache = Cache::load(&cache_path)?;
//! let report = Reconciler::new(&client, false).run(&items, &mut cache).await?;
//! cache.save(&cache_path)?;
//! ```

mod board;
mod cache;
mod file;
mod hash;
pub mod metadata;
mod reconcile;
mod remote;
mod render;
mod types;

pub use board::BoardSync;
pub use cache::{Cache, DEFAULT_CACHE_PATH};
pub use file::atomic_write;
pub use hash::task_id;
pub use metadata::{MAX_TITLE_CHARS, Metadata, PROVENANCE_LABEL, extract};
pub use reconcile::Reconciler;
pub use remote::{fetch_issues, index_issues, load_remote_truth};
pub use render::{SourceLinks, marker_line, marker_task_id, render_item};
pub use types::{RemoteState, SyncReport};
