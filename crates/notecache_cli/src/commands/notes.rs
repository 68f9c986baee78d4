//! Notes command implementation.

use crate::error::CliError;
use notecache_protocol::Note;
use notecache_sync::{NoteCache, RemoteGateway};
use serde::Serialize;
use std::collections::HashMap;

/// One listed note.
#[derive(Debug, Serialize)]
pub struct NoteRow {
    /// Note GUID.
    pub guid: String,
    /// Note title.
    pub title: String,
    /// Owning notebook GUID.
    pub notebook_guid: String,
    /// Owning notebook name, if the notebook is cached.
    pub notebook: Option<String>,
    /// Sequence number of the note's last change.
    pub usn: u64,
    /// Last modification time, ms since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
}

impl NoteRow {
    fn new(note: &Note, notebooks: &HashMap<String, String>) -> Self {
        Self {
            guid: note.guid.clone(),
            title: note.title.clone(),
            notebook_guid: note.notebook_guid.clone(),
            notebook: notebooks.get(&note.notebook_guid).cloned(),
            usn: note.update_sequence_num.as_u64(),
            updated: note.updated,
        }
    }
}

/// Collects rows in cache order.
pub fn rows<G: RemoteGateway>(cache: &NoteCache<G>) -> Vec<NoteRow> {
    let notebooks = cache.notebook_title_map();
    cache
        .notes()
        .iter()
        .map(|note| NoteRow::new(note, &notebooks))
        .collect()
}

/// Runs the notes command.
pub fn run<G: RemoteGateway>(
    cache: &mut NoteCache<G>,
    format: &str,
    no_sync: bool,
) -> Result<(), CliError> {
    if !no_sync {
        cache.sync()?;
    }

    let rows = rows(cache);
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            for row in &rows {
                println!(
                    "{}  {}  [{}]",
                    row.guid,
                    row.title,
                    row.notebook.as_deref().unwrap_or(&row.notebook_guid)
                );
            }
            println!("{} note(s)", rows.len());
        }
    }
    Ok(())
}
