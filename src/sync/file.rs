//! Atomic file operations.
//!
//! The cache file is rewritten in full at the end of every run. Writing to
//! a sibling temp file, syncing it, and renaming it over the target means a
//! crash mid-write leaves the previous cache intact.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Write content to a file atomically.
///
/// This function:
/// 1. Creates the parent directory if missing
/// 2. Writes content to `<name>.tmp` next to the target
/// 3. Calls `fsync` to ensure data is on disk
/// 4. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("cache"), OsString::from);
    name.push(".tmp");
    path.with_file_name(name)
}
