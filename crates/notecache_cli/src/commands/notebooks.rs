//! Notebooks command implementation.

use crate::error::CliError;
use notecache_sync::{NoteCache, RemoteGateway};
use serde::Serialize;

/// One listed notebook.
#[derive(Debug, Serialize)]
pub struct NotebookRow {
    /// Notebook GUID.
    pub guid: String,
    /// Notebook name.
    pub name: String,
    /// Sequence number of the notebook's last change.
    pub usn: u64,
    /// Whether this is the account's default notebook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

/// Runs the notebooks command.
pub fn run<G: RemoteGateway>(
    cache: &mut NoteCache<G>,
    format: &str,
    no_sync: bool,
) -> Result<(), CliError> {
    if !no_sync {
        cache.sync()?;
    }

    let rows: Vec<NotebookRow> = cache
        .notebooks()
        .iter()
        .map(|nb| NotebookRow {
            guid: nb.guid.clone(),
            name: nb.name.clone(),
            usn: nb.update_sequence_num.as_u64(),
            default: nb.default_notebook,
        })
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            for row in &rows {
                let marker = if row.default == Some(true) { " (default)" } else { "" };
                println!("{}  {}{}", row.guid, row.name, marker);
            }
            println!("{} notebook(s)", rows.len());
        }
    }
    Ok(())
}
