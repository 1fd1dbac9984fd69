//! Advisory cross-process lock for a buffer directory.
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on
//! Windows). The lock serializes the drain critical section (readiness
//! check, read, submit, clear) across concurrently scheduled runs.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{BufferError, BufferResult};

/// Name of the lock file inside the buffer directory. Never counted as a
/// record and never removed by `clear`.
pub const LOCK_FILE_NAME: &str = ".lock";

/// RAII guard over the buffer directory's advisory lock.
///
/// The lock is released (and the lock file removed) on drop.
#[derive(Debug)]
pub struct BufferLock {
    file: File,
    path: PathBuf,
}

impl BufferLock {
    pub(crate) fn acquire(directory: &Path) -> BufferResult<Self> {
        let path = directory.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| BufferError::io(&path, e))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                return Err(BufferError::Locked(directory.to_path_buf()));
            }
            Err(e) => return Err(BufferError::io(&path, e)),
        }

        // Record the holder's PID for diagnostics; failure is harmless.
        let mut locked = file;
        let _ = writeln!(locked, "{}", std::process::id());
        let _ = locked.flush();

        debug!(path = %path.display(), "acquired buffer lock");
        Ok(Self { file: locked, path })
    }

    /// Path of the underlying lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BufferLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
        debug!(path = %self.path.display(), "released buffer lock");
    }
}
