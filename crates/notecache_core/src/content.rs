//! Note content files.

use crate::dir::write_synced;
use crate::error::{StoreError, StoreResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix for content files being written.
const PARTIAL_SUFFIX: &str = ".part";

/// Longest GUID accepted as a file name.
const MAX_GUID_LEN: usize = 64;

/// Flat directory of note bodies, one file per note GUID.
///
/// Files are created only when content is first requested and deleted
/// whenever the owning note changes or is expunged. There is no stale flag:
/// a missing file is the only staleness signal.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Creates a store rooted at an account directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store's directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true if `guid` is usable as a content file name.
    ///
    /// Accepted: 1 to 64 ASCII alphanumerics, `-` or `_`. This keeps note
    /// files from escaping the directory or colliding with `user.dat` and
    /// `user.lock`.
    #[must_use]
    pub fn is_valid_guid(guid: &str) -> bool {
        !guid.is_empty()
            && guid.len() <= MAX_GUID_LEN
            && guid
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    /// Returns the content file path for a GUID.
    pub fn path_for(&self, guid: &str) -> StoreResult<PathBuf> {
        if !Self::is_valid_guid(guid) {
            return Err(StoreError::InvalidGuid {
                guid: guid.to_string(),
            });
        }
        Ok(self.root.join(guid))
    }

    /// Returns true if content for `guid` is cached.
    #[must_use]
    pub fn contains(&self, guid: &str) -> bool {
        self.path_for(guid).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Reads cached content.
    ///
    /// Returns `None` on a cache miss.
    pub fn read(&self, guid: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(guid)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stores content verbatim.
    ///
    /// The bytes go to `<guid>.part` first and are renamed into place, so a
    /// failed write never leaves a partial content file behind.
    pub fn write(&self, guid: &str, content: &[u8]) -> StoreResult<()> {
        let path = self.path_for(guid)?;
        let partial = self.root.join(format!("{guid}{PARTIAL_SUFFIX}"));

        let result = write_synced(&partial, content).and_then(|()| fs::rename(&partial, &path));
        if let Err(e) = result {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        debug!(guid, bytes = content.len(), "cached note content");
        Ok(())
    }

    /// Deletes every content file whose GUID `keep` rejects, plus leftover
    /// `.part` files from interrupted writes. Returns the number of files
    /// removed.
    ///
    /// Files that are not content files (`user.dat`, `user.lock`, anything
    /// with an invalid GUID name) and directories are left alone.
    pub fn retain(&self, keep: impl Fn(&str) -> bool) -> StoreResult<u64> {
        let mut removed = 0;
        for entry in fs::read_dir(self.root())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            let stale = match name.strip_suffix(PARTIAL_SUFFIX) {
                Some(guid) => Self::is_valid_guid(guid),
                None => Self::is_valid_guid(name) && !keep(name),
            };
            if !stale {
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!(file = name, "removed orphaned content");
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    /// Deletes cached content.
    ///
    /// Deleting a file that does not exist is not an error, and neither is an
    /// invalid GUID (no file can exist for it). Any other failure propagates.
    /// Returns true if a file was removed.
    pub fn invalidate(&self, guid: &str) -> StoreResult<bool> {
        let Ok(path) = self.path_for(guid) else {
            return Ok(false);
        };

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(guid, "invalidated note content");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
