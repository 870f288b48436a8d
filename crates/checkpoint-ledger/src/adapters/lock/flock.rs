//! # File Lock Implementation
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on Windows).

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use super::security::{
    is_process_running, validate_lock_path, DEFAULT_LOCK_TIMEOUT, MAX_RETRY_DELAY,
};
use crate::domain::errors::LedgerError;

/// Errors from database locking
#[derive(Debug)]
pub enum LockError {
    /// Lock file could not be created
    CreateFailed(io::Error),
    /// Data directory is already locked by another holder
    AlreadyLocked { pid: Option<u32>, path: PathBuf },
    /// Failed to write PID to lock file
    WriteFailed(io::Error),
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockError::CreateFailed(e) => write!(f, "Failed to create lock file: {}", e),
            LockError::AlreadyLocked { pid, path } => {
                if let Some(p) = pid {
                    write!(
                        f,
                        "Database already in use by process {} ({})",
                        p,
                        path.display()
                    )
                } else {
                    write!(f, "Database already in use ({})", path.display())
                }
            }
            LockError::WriteFailed(e) => write!(f, "Failed to write PID to lock file: {}", e),
        }
    }
}

impl std::error::Error for LockError {}

impl From<LockError> for LedgerError {
    fn from(err: LockError) -> Self {
        LedgerError::DatabaseLocked {
            message: err.to_string(),
        }
    }
}

/// Exclusive lock on a ledger data directory.
///
/// Released on drop. The `LOCK` file itself is left in place.
///
/// ```ignore
/// let lock = DatabaseLock::acquire(Path::new("/data/ledger"))?;
/// // Lock is held until `lock` goes out of scope
/// ```
pub struct DatabaseLock {
    /// Kept open to hold the flock
    file: File,
    path: PathBuf,
    pid: u32,
}

impl DatabaseLock {
    /// Lock file name
    const LOCK_FILE: &'static str = "LOCK";

    /// Acquire with `DEFAULT_LOCK_TIMEOUT`.
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire_with_timeout(data_dir, DEFAULT_LOCK_TIMEOUT)
    }

    /// Acquire an exclusive lock on the data directory.
    ///
    /// Retries with exponential backoff until `timeout` expires. The kernel
    /// drops the flock of an exited holder, so its leftover `LOCK` file is
    /// simply locked again and its PID overwritten.
    ///
    /// # Errors
    ///
    /// Returns `LockError::AlreadyLocked` if another holder keeps the lock
    /// past the timeout.
    pub fn acquire_with_timeout(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let deadline = Instant::now() + timeout;
        let lock_path = data_dir.join(Self::LOCK_FILE);
        let mut retry_delay = Duration::from_millis(10);
        let mut warned_foreign_holder = false;

        loop {
            if lock_path.exists() && !validate_lock_path(data_dir, &lock_path) {
                return Err(LockError::CreateFailed(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "Lock path escapes data directory",
                )));
            }

            // Never truncate before holding the lock: the PID belongs to the holder.
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&lock_path)
                .map_err(LockError::CreateFailed)?;

            match file.try_lock_exclusive() {
                Ok(()) => {
                    let pid = std::process::id();
                    let mut locked_file = file;
                    locked_file.set_len(0).map_err(LockError::WriteFailed)?;
                    writeln!(locked_file, "{}", pid).map_err(LockError::WriteFailed)?;
                    locked_file.sync_all().map_err(LockError::WriteFailed)?;

                    tracing::debug!(path = %lock_path.display(), pid, "[ledger] 🔒 Data directory locked");

                    return Ok(Self {
                        file: locked_file,
                        path: lock_path,
                        pid,
                    });
                }
                Err(_) => {
                    drop(file);
                    let existing_pid = Self::read_existing_pid(&lock_path);

                    // The flock is still held, so the file is never removed here.
                    if let Some(pid) = existing_pid {
                        if !warned_foreign_holder && !is_process_running(pid) {
                            tracing::warn!(
                                pid,
                                path = %lock_path.display(),
                                "[ledger] Lock held although recorded PID is not visible \
                                 (other PID namespace?), waiting"
                            );
                            warned_foreign_holder = true;
                        }
                    }

                    if Instant::now() >= deadline {
                        return Err(LockError::AlreadyLocked {
                            pid: existing_pid,
                            path: lock_path,
                        });
                    }

                    std::thread::sleep(retry_delay);
                    retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
                }
            }
        }
    }

    /// Get the PID of the process holding the lock
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Get the path to the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        #[allow(clippy::incompatible_msrv)]
        let _ = self.file.unlock();
    }
}
