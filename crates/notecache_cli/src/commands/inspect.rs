//! Inspect command implementation.

use crate::error::CliError;
use notecache_core::{CacheDir, ContentStore};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Cache inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Account directory.
    pub path: String,
    /// Whether a snapshot exists.
    pub has_snapshot: bool,
    /// Persisted cursor.
    pub cursor: u64,
    /// Number of cached notes.
    pub note_count: usize,
    /// Number of cached notebooks.
    pub notebook_count: usize,
    /// Number of note bodies on disk.
    pub content_files: usize,
    /// Total size of note bodies in bytes.
    pub content_bytes: u64,
}

/// Reads the account directory without locking it.
pub fn inspect(cache_root: &Path, host: &str, user_id: i64) -> Result<InspectResult, CliError> {
    let path = CacheDir::account_path(cache_root, host, user_id);
    if !path.is_dir() {
        return Err(CliError::NoCache(path));
    }

    let snapshot = CacheDir::read_snapshot(&path)?;
    let mut result = InspectResult {
        path: path.display().to_string(),
        has_snapshot: snapshot.is_some(),
        cursor: 0,
        note_count: 0,
        notebook_count: 0,
        content_files: 0,
        content_bytes: 0,
    };
    if let Some(snapshot) = snapshot {
        result.cursor = snapshot.cursor.as_u64();
        result.note_count = snapshot.notes.len();
        result.notebook_count = snapshot.notebooks.len();
    }

    for entry in fs::read_dir(&path)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let name = entry.file_name();
        let is_content = name.to_str().is_some_and(ContentStore::is_valid_guid);
        if metadata.is_file() && is_content {
            result.content_files += 1;
            result.content_bytes += metadata.len();
        }
    }

    Ok(result)
}

/// Runs the inspect command.
pub fn run(cache_root: &Path, host: &str, user_id: i64, format: &str) -> Result<(), CliError> {
    let result = inspect(cache_root, host, user_id)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Note Cache Inspection");
    println!("=====================");
    println!();
    println!("Path: {}", result.path);
    println!();
    if !result.has_snapshot {
        println!("No snapshot yet (never synced)");
    }
    println!("Cursor:    {}", result.cursor);
    println!("Notes:     {}", result.note_count);
    println!("Notebooks: {}", result.notebook_count);
    println!(
        "Content:   {} file(s), {} bytes",
        result.content_files, result.content_bytes
    );
}
