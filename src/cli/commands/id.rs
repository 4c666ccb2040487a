//! Id command implementation.

use crate::error::{Error, Result};
use crate::sync::task_id;

/// Print the task id for `location:line:text`.
///
/// # Errors
///
/// Returns an error for a zero line number.
pub fn execute(location: &str, line: usize, text: &str, json: bool) -> Result<()> {
    if line == 0 {
        return Err(Error::InvalidArgument(
            "line numbers are 1-based".to_string(),
        ));
    }

    let id = task_id(location, line, text.trim());
    if json {
        let output = serde_json::json!({
            "id": id,
            "location": location,
            "line": line,
        });
        println!("{output}");
    } else {
        println!("{id}");
    }
    Ok(())
}
