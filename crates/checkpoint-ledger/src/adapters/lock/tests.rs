//! # Lock Tests

use super::*;
use std::fs;
use std::time::Duration;

const SHORT_TIMEOUT: Duration = Duration::from_millis(100);

#[test]
fn test_lock_acquire_creates_file() {
    let dir = tempfile::tempdir().unwrap();

    let lock = DatabaseLock::acquire(dir.path()).expect("Should acquire lock");
    assert!(lock.path().exists());
    assert_eq!(lock.pid(), std::process::id());
}

#[test]
fn test_lock_contains_pid() {
    let dir = tempfile::tempdir().unwrap();

    let lock = DatabaseLock::acquire(dir.path()).expect("Should acquire lock");
    let content = fs::read_to_string(lock.path()).unwrap();
    let stored_pid: u32 = content.trim().parse().unwrap();
    assert_eq!(stored_pid, std::process::id());
}

#[test]
fn test_double_lock_fails_with_holder_pid() {
    let dir = tempfile::tempdir().unwrap();

    let _lock1 = DatabaseLock::acquire(dir.path()).expect("First lock should succeed");

    let result = DatabaseLock::acquire_with_timeout(dir.path(), SHORT_TIMEOUT);
    match result {
        Err(LockError::AlreadyLocked { pid, .. }) => assert_eq!(pid, Some(std::process::id())),
        Err(other) => panic!("Expected AlreadyLocked, got {}", other),
        Ok(_) => panic!("Second lock must not succeed"),
    }
}

#[test]
fn test_lock_released_on_drop() {
    let dir = tempfile::tempdir().unwrap();

    {
        let _lock = DatabaseLock::acquire(dir.path()).expect("Should acquire");
    }

    let _lock2 = DatabaseLock::acquire_with_timeout(dir.path(), SHORT_TIMEOUT)
        .expect("Should acquire after release");
}

#[test]
fn test_leftover_lock_file_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("LOCK"), "4294967294\n").unwrap();

    let lock = DatabaseLock::acquire_with_timeout(dir.path(), SHORT_TIMEOUT)
        .expect("Unheld lock file should be taken over");
    let content = fs::read_to_string(lock.path()).unwrap();
    assert_eq!(content.trim(), std::process::id().to_string());
}

#[test]
#[cfg(unix)]
fn test_held_lock_with_unknown_pid_is_not_removed() {
    use std::os::unix::fs::MetadataExt;

    let dir = tempfile::tempdir().unwrap();
    let holder = DatabaseLock::acquire(dir.path()).expect("First lock should succeed");
    let inode = fs::metadata(holder.path()).unwrap().ino();

    // A holder whose PID this process cannot see.
    fs::write(holder.path(), "4294967294\n").unwrap();

    let result = DatabaseLock::acquire_with_timeout(dir.path(), SHORT_TIMEOUT);
    match result {
        Err(LockError::AlreadyLocked { pid, .. }) => assert_eq!(pid, Some(4_294_967_294)),
        Err(other) => panic!("Expected AlreadyLocked, got {}", other),
        Ok(_) => panic!("Second lock must not succeed while the flock is held"),
    }
    assert_eq!(fs::metadata(holder.path()).unwrap().ino(), inode);
}

#[test]
fn test_lock_error_maps_to_database_locked() {
    use crate::domain::errors::LedgerError;

    let err: LedgerError = LockError::AlreadyLocked {
        pid: Some(42),
        path: "/data/LOCK".into(),
    }
    .into();
    match err {
        LedgerError::DatabaseLocked { message } => assert!(message.contains("process 42")),
        other => panic!("Expected DatabaseLocked, got {:?}", other),
    }
}
