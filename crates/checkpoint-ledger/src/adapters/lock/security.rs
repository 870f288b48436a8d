//! # Lock Security
//!
//! - **Timeout Protection**: acquisition gives up after a bounded wait
//! - **Holder Diagnostics**: report a held lock whose recorded PID is not visible

use std::path::Path;
use std::time::Duration;

/// Default lock timeout for waiting operations.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the backoff between acquisition attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Checks if a process with the given PID is still running.
pub fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        Path::new(&format!("/proc/{}", pid)).exists()
    }

    #[cfg(not(unix))]
    {
        // Assume running when we cannot tell
        let _ = pid;
        true
    }
}

/// Validates that a lock file path is within the expected data directory.
pub fn validate_lock_path(data_dir: &Path, lock_path: &Path) -> bool {
    lock_path
        .canonicalize()
        .ok()
        .and_then(|canonical| {
            data_dir
                .canonicalize()
                .ok()
                .map(|data_canonical| canonical.starts_with(&data_canonical))
        })
        .unwrap_or(false)
}
