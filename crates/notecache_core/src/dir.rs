//! Cache directory management.
//!
//! Each account gets its own directory:
//!
//! ```text
//! <cache_root>/<host>/<user_id>/
//! ├─ user.dat        # Snapshot
//! ├─ user.dat.tmp    # Transient, only during a snapshot write
//! ├─ user.lock       # Advisory lock for the single owner
//! └─ <note_guid>     # Content files (see `ContentStore`)
//! ```
//!
//! The lock file ensures only one cache instance owns the directory at a
//! time, since the in-memory index has no internal locking and a sync may
//! delete content files out from under another reader.

use crate::error::{StoreError, StoreResult};
use crate::snapshot::Snapshot;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Snapshot file name.
pub(crate) const SNAPSHOT_FILE: &str = "user.dat";
/// Temporary file for atomic snapshot writes.
const SNAPSHOT_TEMP: &str = "user.dat.tmp";
/// Lock file name.
const LOCK_FILE: &str = "user.lock";

/// Owns an account's cache directory.
///
/// # Thread Safety
///
/// A `CacheDir` holds an exclusive advisory lock on its directory. A second
/// `CacheDir` for the same directory fails with [`StoreError::Locked`] until
/// the first is dropped.
#[derive(Debug)]
pub struct CacheDir {
    /// Account directory.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl CacheDir {
    /// Returns the account directory for a cache root, host and user.
    #[must_use]
    pub fn account_path(cache_root: &Path, host: &str, user_id: i64) -> PathBuf {
        cache_root.join(host).join(user_id.to_string())
    }

    /// Opens or creates an account directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - The directory cannot be created
    /// - Another owner holds the lock (`Locked`)
    pub fn open(path: &Path, create_if_missing: bool) -> StoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
                debug!(path = %path.display(), "created cache directory");
            } else {
                return Err(StoreError::MissingDirectory {
                    path: path.to_path_buf(),
                });
            }
        }

        if !path.is_dir() {
            return Err(StoreError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked {
                path: path.to_path_buf(),
            });
        }

        // A temp snapshot only survives a crash mid-write; user.dat is intact.
        match fs::remove_file(path.join(SNAPSHOT_TEMP)) {
            Ok(()) => debug!(path = %path.display(), "removed stale snapshot temp file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the account directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.path.join(SNAPSHOT_FILE)
    }

    /// Loads the snapshot.
    ///
    /// Returns `None` if there is no snapshot yet (cold start).
    pub fn load_snapshot(&self) -> StoreResult<Option<Snapshot>> {
        Self::read_snapshot(&self.path)
    }

    /// Reads the snapshot in `path` without taking the lock.
    ///
    /// For offline inspection; the owner may replace the file at any time.
    pub fn read_snapshot(path: &Path) -> StoreResult<Option<Snapshot>> {
        let data = match fs::read(path.join(SNAPSHOT_FILE)) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if data.is_empty() {
            return Ok(None);
        }

        Snapshot::decode(&data).map(Some)
    }

    /// Saves an encoded snapshot atomically.
    ///
    /// Uses write-then-rename:
    /// 1. Write to the temporary file
    /// 2. Sync the temporary file to disk
    /// 3. Rename it over `user.dat`
    /// 4. Fsync the directory so the rename is durable
    ///
    /// On failure the previous snapshot is left untouched.
    pub fn save_snapshot(&self, encoded: &[u8]) -> StoreResult<()> {
        let temp_path = self.path.join(SNAPSHOT_TEMP);

        let result = write_synced(&temp_path, encoded)
            .and_then(|()| fs::rename(&temp_path, self.snapshot_path()));
        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        self.sync_directory()?;
        info!(path = %self.snapshot_path().display(), bytes = encoded.len(), "wrote snapshot");
        Ok(())
    }

    /// Syncs the directory so created, renamed and deleted entries are durable.
    #[cfg(unix)]
    pub(crate) fn sync_directory(&self) -> StoreResult<()> {
        let dir = File::open(&self.path)?;
        dir.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    pub(crate) fn sync_directory(&self) -> StoreResult<()> {
        // NTFS journals metadata; directory handles cannot be fsynced
        Ok(())
    }
}

/// Writes `data` to `path` and fsyncs it.
pub(crate) fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}
