//! Task identity derivation.
//!
//! A task id is the SHA256 of `location:line:text`, truncated to
//! [`TASK_ID_LEN`](crate::model::TASK_ID_LEN) hex characters. The checkbox
//! state is not part of the text, so ticking a box keeps the id while any
//! edit to the wording or a move to another line produces a new one.

use sha2::{Digest, Sha256};

use crate::model::TaskId;

/// Derive the stable id of a checklist item.
///
/// # Example
///
/// ```
/// use todosync::sync::task_id;
///
/// let id = task_id("docs/todo.md", 5, "Fix login bug");
/// assert_eq!(id.as_str().len(), 12);
/// assert_eq!(id, task_id("docs/todo.md", 5, "Fix login bug"));
/// ```
#[must_use]
pub fn task_id(location: &str, line: usize, text: &str) -> TaskId {
    let mut hasher = Sha256::new();
    hasher.update(format!("{location}:{line}:{text}").as_bytes());
    TaskId::from_digest(&format!("{:x}", hasher.finalize()))
}
