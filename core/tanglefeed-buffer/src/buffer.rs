//! Durable accumulation of sensor readings on local disk.
//!
//! Each reading is written as its own file inside the buffer directory,
//! named `{unix_timestamp}.{micros}_{40-hex content fingerprint}`. The
//! directory listing is the only index; the file bytes are the exact
//! payload handed to [`Buffer::add`]. State survives process restarts by
//! construction.

use std::path::{Path, PathBuf};
use std::{fs, io};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{BufferError, BufferResult};
use crate::lock::{BufferLock, LOCK_FILE_NAME};

/// Suffix used for in-progress writes. Files carrying it are never
/// counted, read or returned; `clear` removes them.
const TMP_SUFFIX: &str = ".tmp";

/// Regenerations of a colliding record name before switching to a counter
/// suffix. The clock advances every microsecond, so this only triggers on
/// a frozen or very coarse clock.
const MAX_NAME_RETRIES: u32 = 8;

/// A directory-backed buffer of opaque JSON payloads.
///
/// Accumulates payloads across process invocations until `capacity`
/// records are present, at which point [`Buffer::is_ready`] reports true
/// and the caller is expected to [`Buffer::read`] the batch, submit it,
/// and [`Buffer::clear`]. The buffer itself does not enforce that
/// ordering; a capacity of zero means every single record is flushed.
#[derive(Debug)]
pub struct Buffer {
    directory: PathBuf,
    capacity: usize,
}

impl Buffer {
    /// Opens (creating if necessary) the buffer directory.
    ///
    /// Pre-existing directories are accepted as-is, including non-empty
    /// ones left over from an earlier unfinished run.
    pub fn open(directory: impl Into<PathBuf>, capacity: usize) -> BufferResult<Self> {
        let directory = directory.into();
        if directory.as_os_str().is_empty() {
            return Err(BufferError::Config(
                "buffer directory must be a non-empty path".into(),
            ));
        }
        fs::create_dir_all(&directory).map_err(|e| BufferError::io(&directory, e))?;
        Ok(Self {
            directory,
            capacity,
        })
    }

    /// The directory holding the buffered records.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The configured readiness threshold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Durably appends one payload as a new record.
    ///
    /// The record name combines the current wall-clock time (microsecond
    /// resolution) with a content fingerprint, so identical payloads
    /// written in the same tick still land in distinct records. The
    /// payload is written to a temporary sibling and renamed into place,
    /// so a partially written record is never visible to a reader.
    pub fn add(&self, payload: &[u8]) -> BufferResult<()> {
        // Identical payload in the same microsecond would compose the same
        // name; wait out the tick rather than overwrite the record, and
        // disambiguate with a counter if the clock refuses to advance.
        let mut name = self.fresh_record_name(payload)?;
        let mut attempts = 0u32;
        while self.directory.join(&name).exists() {
            attempts += 1;
            name = self.fresh_record_name(payload)?;
            if attempts > MAX_NAME_RETRIES {
                name = format!("{name}_{attempts}");
            }
        }
        let final_path = self.directory.join(&name);
        let tmp_path = self.directory.join(format!("{name}{TMP_SUFFIX}"));

        fs::write(&tmp_path, payload).map_err(|e| BufferError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| BufferError::io(&final_path, e))?;

        debug!(record = %name, bytes = payload.len(), "buffered payload");
        Ok(())
    }

    /// Reads every buffered record back as parsed JSON, oldest first.
    ///
    /// Record names sort chronologically, and the returned order follows
    /// that sort. Any record that is not valid UTF-8 JSON aborts the whole
    /// read with [`BufferError::CorruptRecord`]; nothing is skipped and
    /// nothing is removed.
    pub fn read(&self) -> BufferResult<Vec<serde_json::Value>> {
        let mut values = Vec::new();
        for path in self.record_paths()? {
            let bytes = fs::read(&path).map_err(|e| BufferError::io(&path, e))?;
            let value = serde_json::from_slice(&bytes).map_err(|e| BufferError::CorruptRecord {
                path: path.clone(),
                source: e,
            })?;
            values.push(value);
        }
        Ok(values)
    }

    /// Removes every record (and any stale temporary file), leaving the
    /// empty directory behind. A no-op on an already-empty buffer.
    ///
    /// If one removal fails the error propagates and the remaining files
    /// stay in place; a later `clear` can finish the job.
    pub fn clear(&self) -> BufferResult<()> {
        let mut removed = 0usize;
        for path in walk_files(&self.directory)? {
            if path.file_name().is_some_and(|n| n == LOCK_FILE_NAME) {
                continue;
            }
            fs::remove_file(&path).map_err(|e| BufferError::io(&path, e))?;
            removed += 1;
        }
        debug!(removed, "cleared buffer");
        Ok(())
    }

    /// Number of complete records currently buffered.
    pub fn len(&self) -> BufferResult<usize> {
        Ok(self.record_paths()?.len())
    }

    /// True when no complete records are buffered.
    pub fn is_empty(&self) -> BufferResult<bool> {
        Ok(self.len()? == 0)
    }

    /// True once the record count has reached the capacity threshold.
    ///
    /// Purely observational; a capacity of zero is always ready.
    pub fn is_ready(&self) -> BufferResult<bool> {
        Ok(self.len()? >= self.capacity)
    }

    /// Takes the exclusive advisory lock on this buffer directory.
    ///
    /// Repeated scheduler invocations racing on the same directory would
    /// otherwise lose or duplicate records between `read` and `clear`.
    /// Fails immediately with [`BufferError::Locked`] if another process
    /// holds the lock.
    pub fn lock(&self) -> BufferResult<BufferLock> {
        BufferLock::acquire(&self.directory)
    }

    fn fresh_record_name(&self, payload: &[u8]) -> BufferResult<String> {
        record_name(payload).map_err(|e| BufferError::io(&self.directory, e))
    }

    /// All complete record files, sorted by name (chronological by
    /// construction of the record names).
    fn record_paths(&self) -> BufferResult<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = walk_files(&self.directory)?
            .into_iter()
            .filter(|p| {
                let Some(name) = p.file_name().and_then(|n| n.to_str()) else {
                    return false;
                };
                name != LOCK_FILE_NAME && !name.ends_with(TMP_SUFFIX)
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}

/// Recursively collects every regular file under `dir`. Subdirectories
/// are not expected in practice but are traversed for completeness.
fn walk_files(dir: &Path) -> BufferResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| BufferError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BufferError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| BufferError::io(&path, e))?;
        if file_type.is_dir() {
            files.extend(walk_files(&path)?);
        } else if file_type.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Composes the record file name: wall-clock seconds since the Unix epoch
/// with a zero-padded microsecond fraction, then the first 160 bits of the
/// payload's SHA-256 digest in hex. The timestamp gives directory listings
/// a chronological lexical order; the fingerprint keeps two payloads added
/// within the same tick from colliding. Errs only when the system clock
/// reads before the epoch.
fn record_name(payload: &[u8]) -> io::Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("system clock before Unix epoch: {e}")))?;
    let digest = Sha256::digest(payload);
    Ok(format!(
        "{}.{:06}_{}",
        now.as_secs(),
        now.subsec_micros(),
        hex::encode(&digest[..20])
    ))
}

#[cfg(test)]
mod tests {
    use super::record_name;

    #[test]
    fn record_name_has_timestamp_and_40_hex_fingerprint() {
        let name = record_name(b"{\"t\":21.5}").unwrap();
        let (stamp, fingerprint) = name.split_once('_').unwrap();
        let (secs, micros) = stamp.split_once('.').unwrap();
        assert!(secs.parse::<u64>().is_ok());
        assert_eq!(micros.len(), 6);
        assert_eq!(fingerprint.len(), 40);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn record_name_fingerprint_is_content_addressed() {
        let a = record_name(b"same").unwrap();
        let b = record_name(b"same").unwrap();
        let c = record_name(b"different").unwrap();
        let fp = |n: &str| n.split_once('_').map(|(_, f)| f.to_string()).unwrap();
        assert_eq!(fp(&a), fp(&b));
        assert_ne!(fp(&a), fp(&c));
    }
}
