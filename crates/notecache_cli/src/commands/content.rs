//! Content command implementation.

use crate::error::CliError;
use notecache_sync::{NoteCache, RemoteGateway};
use std::io::Write;

/// Returns a note body, syncing first unless `no_sync` is set.
pub fn fetch<G: RemoteGateway>(
    cache: &mut NoteCache<G>,
    guid: &str,
    no_sync: bool,
) -> Result<Vec<u8>, CliError> {
    if !no_sync {
        cache.sync()?;
    }
    Ok(cache.note_content(guid)?)
}

/// Runs the content command: writes the raw note body to stdout.
pub fn run<G: RemoteGateway>(
    cache: &mut NoteCache<G>,
    guid: &str,
    no_sync: bool,
) -> Result<(), CliError> {
    let content = fetch(cache, guid, no_sync)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content)?;
    if !content.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
