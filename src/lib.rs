//! todosync - Markdown checklists mirrored as GitHub issues
//!
//! This crate provides the core functionality for the `todosync` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (TaskId, Item, IssueSnapshot, ProjectContext)
//! - [`scan`] - Markdown corpus walker and checklist line parser
//! - [`sync`] - Identity, metadata, cache, remote truth and reconciliation
//! - [`tracker`] - GitHub REST/GraphQL client behind tracker traits
//! - [`config`] - Configuration resolution
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod scan;
pub mod sync;
pub mod tracker;

pub use error::{Error, Result};

/// Global dry-run flag for `--dry-run`.
///
/// When set, `sync` reads remote state and reports what it would do
/// without writing to GitHub or the cache file.
pub static DRY_RUN: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if dry-run mode is active.
#[inline]
pub fn is_dry_run() -> bool {
    DRY_RUN.load(std::sync::atomic::Ordering::Relaxed)
}
