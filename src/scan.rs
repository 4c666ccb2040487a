//! Markdown corpus scanner.
//!
//! Walks a directory tree for `*.md` files and extracts checklist lines
//! (`- [ ] text`, `* [x] text`) together with the nearest heading above
//! them. Files are visited in sorted order so item order, and therefore
//! issue creation order, is deterministic.

use regex::Regex;
use std::fs;
use std::path::{Component, Path};
use std::sync::LazyLock;
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;
use crate::model::ScannedLine;

/// Directory names never descended into.
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".github",
    "node_modules",
    "vendor",
    ".venv",
    "venv",
    "target",
];

static CHECKBOX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*]\s+\[(?P<checked>[ xX])\]\s+(?P<text>.+)$").unwrap()
});

/// Scan every Markdown file under `root`.
///
/// # Errors
///
/// Returns an error if a Markdown file cannot be read. Unreadable
/// directory entries are skipped.
pub fn scan_corpus(root: &Path) -> Result<Vec<ScannedLine>> {
    let mut lines = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

    for entry in walker.filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        let location = relative_location(root, entry.path());
        let bytes = fs::read(entry.path())?;
        let found = scan_text(&location, &String::from_utf8_lossy(&bytes));
        debug!(path = %location, items = found.len(), "Scanned file");
        lines.extend(found);
    }

    Ok(lines)
}

/// Extract checklist lines from one document.
#[must_use]
pub fn scan_text(location: &str, content: &str) -> Vec<ScannedLine> {
    let mut section: Option<String> = None;
    let mut lines = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.starts_with('#') {
            let heading = line.trim_matches(|c: char| c == '#' || c == ' ').trim();
            section = Some(heading.to_string());
        }

        let Some(caps) = CHECKBOX_RE.captures(line) else {
            continue;
        };

        let checked = caps["checked"].eq_ignore_ascii_case("x");
        let text = caps["text"].trim().to_string();
        trace!(location, line = idx + 1, checked, "Checklist line");

        lines.push(ScannedLine {
            location: location.to_string(),
            line: idx + 1,
            text,
            raw: line.trim().to_string(),
            checked,
            section: section.clone(),
        });
    }

    lines
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

/// Root-relative path with `/` separators.
fn relative_location(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
