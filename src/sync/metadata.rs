//! Metadata extraction from checklist text.
//!
//! Three independent matchers run over the raw text: due date, hashtag
//! labels and priority. Each returns what it found plus the byte spans it
//! claimed; the title is whatever is left once every claimed span is cut
//! out, or the whole text when nothing is left. Because spans are merged before cutting, the matchers can run in
//! any order and may overlap.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

/// Label added to every issue todosync manages.
pub const PROVENANCE_LABEL: &str = "from-markdown";

/// Titles longer than this are cut and suffixed with [`ELLIPSIS`].
pub const MAX_TITLE_CHARS: usize = 120;

const ELLIPSIS: char = '…';

static DUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdue:\s*(\d{4}-\d{2}-\d{2})\b").unwrap());

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#([A-Za-z0-9._/-]+)").unwrap());

static PRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)!(p[123])\b").unwrap());

/// What one matcher found and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    pub value: T,
    pub spans: Vec<Range<usize>>,
}

/// Everything pulled out of one line of checklist text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub due: Option<NaiveDate>,
    /// Hashtags, priority and the provenance label.
    pub labels: BTreeSet<String>,
}

/// First `due:YYYY-MM-DD` marker.
///
/// Every marker is claimed for stripping, but only a real calendar date
/// becomes the due date.
#[must_use]
pub fn due_date(text: &str) -> Extracted<Option<NaiveDate>> {
    let mut value = None;
    let mut spans = Vec::new();
    for caps in DUE_RE.captures_iter(text) {
        if spans.is_empty() {
            value = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
        }
        if let Some(m) = caps.get(0) {
            spans.push(m.range());
        }
    }
    Extracted { value, spans }
}

/// All `#tag` labels.
#[must_use]
pub fn hashtags(text: &str) -> Extracted<Vec<String>> {
    let mut value = Vec::new();
    let mut spans = Vec::new();
    for caps in LABEL_RE.captures_iter(text) {
        value.push(caps[1].to_string());
        if let Some(m) = caps.get(0) {
            spans.push(m.range());
        }
    }
    Extracted { value, spans }
}

/// First `!p1`..`!p3` marker, as a `priority/pN` label.
#[must_use]
pub fn priority(text: &str) -> Extracted<Option<String>> {
    let mut value = None;
    let mut spans = Vec::new();
    for caps in PRIORITY_RE.captures_iter(text) {
        if value.is_none() {
            value = Some(format!("priority/{}", caps[1].to_ascii_lowercase()));
        }
        if let Some(m) = caps.get(0) {
            spans.push(m.range());
        }
    }
    Extracted { value, spans }
}

/// Run every matcher and build the cleaned title.
#[must_use]
pub fn extract(text: &str) -> Metadata {
    let due = due_date(text);
    let tags = hashtags(text);
    let prio = priority(text);

    let mut labels: BTreeSet<String> = tags.value.into_iter().collect();
    labels.extend(prio.value);
    labels.insert(PROVENANCE_LABEL.to_string());

    let spans = due
        .spans
        .into_iter()
        .chain(tags.spans)
        .chain(prio.spans)
        .collect();

    // A line made only of tokens keeps them as its title.
    let mut title = clean_title(text, spans);
    if title.is_empty() {
        title = clean_title(text, Vec::new());
    }

    Metadata {
        title,
        due: due.value,
        labels,
    }
}

/// Cut `spans` out of `text`, collapse whitespace, cap the length.
fn clean_title(text: &str, mut spans: Vec<Range<usize>>) -> String {
    spans.sort_by_key(|r| r.start);

    let mut kept = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        if span.start > cursor {
            kept.push_str(&text[cursor..span.start]);
        }
        cursor = cursor.max(span.end);
    }
    kept.push_str(&text[cursor..]);

    truncate_title(&kept.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Cap a title at [`MAX_TITLE_CHARS`] characters.
#[must_use]
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let mut cut: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    cut.push(ELLIPSIS);
    cut
}
