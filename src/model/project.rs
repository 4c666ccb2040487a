//! Project board model.
//!
//! Projects are GitHub Projects (v2) boards. todosync links each synced
//! issue into one board and keeps two optional DATE fields on the board
//! item: a start date stamped when the item is first linked, and an end
//! date mirroring the checklist item's due date.

use serde::Serialize;

/// Data type name GitHub uses for date fields.
pub const DATE_FIELD_TYPE: &str = "DATE";

/// A board located (or created) by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    /// Node id of the project.
    pub project_id: String,

    /// Node id of the user or organization owning it.
    pub owner_id: String,
}

/// A field defined on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectField {
    pub id: String,
    pub name: String,
    pub data_type: String,
}

impl ProjectField {
    /// Case-insensitive name match restricted to DATE fields.
    #[must_use]
    pub fn is_date_named(&self, name: &str) -> bool {
        self.data_type == DATE_FIELD_TYPE && self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// An issue's entry on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardItem {
    pub id: String,

    /// True when this call linked the issue for the first time.
    pub created: bool,
}

/// Everything resolved once per run before items are linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectContext {
    pub project_id: String,
    pub owner_id: String,
    pub start_field_id: Option<String>,
    pub end_field_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_date_named() {
        let field = ProjectField {
            id: "F1".into(),
            name: "Target date".into(),
            data_type: DATE_FIELD_TYPE.into(),
        };
        assert!(field.is_date_named("target DATE"));
        assert!(field.is_date_named(" Target date "));
        assert!(!field.is_date_named("Start date"));

        let text = ProjectField {
            data_type: "TEXT".into(),
            ..field
        };
        assert!(!text.is_date_named("Target date"));
    }
}
