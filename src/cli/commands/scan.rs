//! Scan command implementation.

use colored::Colorize;
use serde::Serialize;

use crate::cli::ScanArgs;
use crate::error::Result;
use crate::model::Item;
use crate::scan::scan_corpus;
use crate::sync::render_item;

#[derive(Serialize)]
struct ScanOutput<'a> {
    root: String,
    count: usize,
    items: Vec<ItemSummary<'a>>,
}

#[derive(Serialize)]
struct ItemSummary<'a> {
    id: &'a str,
    checked: bool,
    title: &'a str,
    labels: &'a [String],
    due: Option<String>,
    location: &'a str,
    line: usize,
}

impl<'a> From<&'a Item> for ItemSummary<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            id: item.id.as_str(),
            checked: item.checked,
            title: &item.title,
            labels: &item.labels,
            due: item.due.map(|d| d.format("%Y-%m-%d").to_string()),
            location: &item.location,
            line: item.line,
        }
    }
}

/// Execute the scan command.
///
/// # Errors
///
/// Returns an error if the root cannot be walked.
pub fn execute(args: &ScanArgs, json: bool) -> Result<()> {
    let lines = scan_corpus(&args.root)?;
    let items: Vec<Item> = lines.iter().map(|l| render_item(l, None)).collect();

    if json {
        let output = ScanOutput {
            root: args.root.display().to_string(),
            count: items.len(),
            items: items.iter().map(ItemSummary::from).collect(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No checklist items found under {}.", args.root.display());
        return Ok(());
    }

    for item in &items {
        let mark = if item.checked { "[x]".green() } else { "[ ]".normal() };
        let labels = item
            .labels
            .iter()
            .map(|l| format!("#{l}"))
            .collect::<Vec<_>>()
            .join(" ");
        let due = item
            .due
            .map(|d| format!(" due {}", d.format("%Y-%m-%d")))
            .unwrap_or_default();
        println!(
            "{} {mark} {}{} {}",
            item.id.as_str().dimmed(),
            item.title,
            due.yellow(),
            labels.cyan()
        );
        println!("    {}", format!("{}:{}", item.location, item.line).dimmed());
    }
    println!();
    println!("{} item(s)", items.len());
    Ok(())
}
