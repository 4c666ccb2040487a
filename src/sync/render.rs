//! Rendering scanned lines into issue-ready items.
//!
//! The issue body ends with a `_Task ID: `<id>`_` marker line. It is the
//! only link between an issue and its checklist line, so the remote truth
//! loader parses it back with [`marker_task_id`] and every render must emit
//! it unchanged.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use std::sync::LazyLock;

use crate::model::{IssueDraft, Item, ScannedLine, TaskId};

use super::hash::task_id;
use super::metadata::extract;

/// Marker on a line of its own. The quoted checklist line starts with `-`
/// or `*`, so item text never matches.
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^_Task ID:\s*`([0-9a-f]{12})`_\s*$").unwrap());

/// Characters left as-is in a source link path.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Where source links in issue bodies point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLinks {
    /// Web base, e.g. `https://github.com`.
    pub web_url: String,
    /// `owner/name`.
    pub repo: String,
    /// Commit or branch the blob link pins.
    pub git_ref: String,
}

impl SourceLinks {
    /// Blob URL for `location` at `line`.
    #[must_use]
    pub fn blob_url(&self, location: &str, line: usize) -> String {
        format!(
            "{}/{}/blob/{}/{}#L{line}",
            self.web_url.trim_end_matches('/'),
            self.repo,
            self.git_ref,
            utf8_percent_encode(location, PATH_SAFE)
        )
    }
}

/// The marker line embedded in every body.
#[must_use]
pub fn marker_line(id: &TaskId) -> String {
    format!("_Task ID: `{id}`_")
}

/// Task id embedded in an issue body, if any.
///
/// When several marker lines exist the last one wins.
#[must_use]
pub fn marker_task_id(body: &str) -> Option<TaskId> {
    MARKER_RE
        .captures_iter(body)
        .last()
        .and_then(|caps| TaskId::parse(&caps[1]))
}

/// Build the reconcilable item for a scanned line.
///
/// Without `links` the body names the source location without a URL.
#[must_use]
pub fn render_item(line: &ScannedLine, links: Option<&SourceLinks>) -> Item {
    let id = task_id(&line.location, line.line, &line.text);
    let meta = extract(&line.text);

    let source = match links {
        Some(links) => format!(
            "Source: [{loc}:{n}]({url})",
            loc = line.location,
            n = line.line,
            url = links.blob_url(&line.location, line.line)
        ),
        None => format!("Source: {}:{}", line.location, line.line),
    };

    let mut body = vec![source];
    if let Some(section) = &line.section {
        body.push(format!("Section: **{section}**"));
    }
    if let Some(due) = meta.due {
        body.push(format!("**Due:** {}", due.format("%Y-%m-%d")));
    }
    body.push(String::new());
    body.push("```md".to_string());
    body.push(line.raw.clone());
    body.push("```".to_string());
    body.push(String::new());
    body.push(marker_line(&id));

    Item {
        id,
        checked: line.checked,
        title: meta.title,
        body: body.join("\n"),
        labels: meta.labels.into_iter().collect(),
        due: meta.due,
        location: line.location.clone(),
        line: line.line,
    }
}

impl Item {
    /// Fields sent to the tracker for this item.
    #[must_use]
    pub fn draft(&self) -> IssueDraft {
        IssueDraft {
            title: self.title.clone(),
            body: self.body.clone(),
            labels: self.labels.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn scanned(text: &str, checked: bool) -> ScannedLine {
        let mark = if checked { 'x' } else { ' ' };
        ScannedLine {
            location: "docs/todo.md".into(),
            line: 5,
            text: text.into(),
            raw: format!("- [{mark}] {text}"),
            checked,
            section: Some("Backlog".into()),
        }
    }

    fn links() -> SourceLinks {
        SourceLinks {
            web_url: "https://github.com".into(),
            repo: "acme/handbook".into(),
            git_ref: "main".into(),
        }
    }

    #[test]
    fn test_render_end_to_end_example() {
        let line = scanned("Fix login bug due:2025-03-01 #auth !p1", false);
        let item = render_item(&line, Some(&links()));

        assert_eq!(item.title, "Fix login bug");
        assert_eq!(item.labels, vec!["auth", "from-markdown", "priority/p1"]);
        assert_eq!(item.due, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(!item.checked);

        let expected = format!(
            "Source: [docs/todo.md:5](https://github.com/acme/handbook/blob/main/docs/todo.md#L5)\n\
             Section: **Backlog**\n\
             **Due:** 2025-03-01\n\
             \n\
             ```md\n\
             - [ ] Fix login bug due:2025-03-01 #auth !p1\n\
             ```\n\
             \n\
             _Task ID: `{}`_",
            item.id
        );
        assert_eq!(item.body, expected);
    }

    #[test]
    fn test_checking_the_box_keeps_the_id() {
        let open = render_item(&scanned("Fix login bug", false), None);
        let done = render_item(&scanned("Fix login bug", true), None);

        assert_eq!(open.id, done.id);
        assert!(done.checked);
        assert_ne!(open.body, done.body);
    }

    #[test]
    fn test_body_marker_round_trips() {
        let item = render_item(&scanned("Anything", false), None);
        assert_eq!(marker_task_id(&item.body), Some(item.id.clone()));
    }

    #[test]
    fn test_marker_parsing() {
        assert_eq!(
            marker_task_id("text\n\n_task id: `0123456789ab`_"),
            TaskId::parse("0123456789ab")
        );
        assert_eq!(marker_task_id("_Task ID: `0123456789a`_"), None);
        assert_eq!(marker_task_id("no marker here"), None);
        assert_eq!(
            marker_task_id("see _Task ID: `0123456789ab`_ inline"),
            None
        );
    }

    #[test]
    fn test_marker_shaped_item_text_keeps_own_id() {
        let line = scanned("Document the _Task ID: `aaaaaaaaaaaa`_ marker", false);
        let item = render_item(&line, Some(&links()));

        assert_ne!(item.id.as_str(), "aaaaaaaaaaaa");
        assert_eq!(marker_task_id(&item.body), Some(item.id.clone()));
    }

    #[test]
    fn test_last_marker_line_wins() {
        let body = "_Task ID: `111111111111`_\ntext\n_Task ID: `222222222222`_\n";
        assert_eq!(marker_task_id(body), TaskId::parse("222222222222"));
    }

    #[test]
    fn test_blob_url_encodes_path() {
        let url = links().blob_url("notes/road map #2.md", 9);
        assert_eq!(
            url,
            "https://github.com/acme/handbook/blob/main/notes/road%20map%20%232.md#L9"
        );
    }

    #[test]
    fn test_body_without_links_or_section() {
        let mut line = scanned("Plain", false);
        line.section = None;
        let item = render_item(&line, None);
        assert!(item.body.starts_with("Source: docs/todo.md:5\n\n```md\n"));
        assert!(!item.body.contains("Section:"));
        assert!(!item.body.contains("**Due:**"));
    }
}
