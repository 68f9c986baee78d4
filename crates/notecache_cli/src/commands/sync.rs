//! Sync command implementation.

use crate::error::CliError;
use notecache_sync::{NoteCache, RemoteGateway};

/// Runs the sync command.
pub fn run<G: RemoteGateway>(cache: &mut NoteCache<G>) -> Result<(), CliError> {
    let result = cache.sync()?;

    println!("Account {} at {}", cache.user_id(), cache.path().display());
    if !result.advanced() {
        println!("Already up to date (cursor {})", result.cursor_after);
        return Ok(());
    }

    let changes = &result.changes;
    println!(
        "Synced {} -> {} in {} chunk(s), {:.2?}",
        result.cursor_before, result.cursor_after, result.chunks, result.duration
    );
    println!(
        "  Notes:     {} updated, {} expunged",
        changes.notes_upserted, changes.notes_expunged
    );
    println!(
        "  Notebooks: {} updated, {} expunged",
        changes.notebooks_upserted, changes.notebooks_expunged
    );
    println!("  Content:   {} invalidated", changes.contents_invalidated);
    println!(
        "Cache holds {} note(s) in {} notebook(s)",
        cache.notes().len(),
        cache.notebooks().len()
    );
    Ok(())
}
